//! Assembles display packets into timed subtitle pages.
//!
//! Teletext is stateful per magazine : a header packet opens or closes the page being broadcast on
//! its magazine, display packets then fill rows until the next header. Subtitles ride on this by
//! transmitting an empty page between captions, so onset and clear times fall out of the header
//! transitions.

use std::collections::BTreeMap;

use crate::{
    charset::teletext::{G0Charset, NationalOption, g0},
    coding::odd_parity,
    control::ControlCode,
};

use super::{DisplayRowPacket, PacketView, PageHeader, parse};

//
// -----

/// One cell of a display row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Glyph(char),
    /// A spacing attribute. Occupies the cell, displays as a space, applies to the rest of the row.
    Spacing(ControlCode),
    Space,
}

pub type DisplayRow = Vec<Cell>;

/// A fully received subtitle page with its display interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePage {
    /// Full page number including the magazine digit, e.g. 0x888.
    pub page: u16,
    pub onset_us: u64,
    pub clear_us: u64,
    /// Sparse : only rows with at least one glyph are kept.
    pub rows: BTreeMap<u8, DisplayRow>,
}

//
// -----

#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblerOptions {
    /// Only keep this page (e.g. 0x888). [None] accepts any page with the subtitle control bit.
    pub page: Option<u16>,
    /// G0 family of the service. Latin reads the national option from each page header.
    pub charset: G0Charset,
    /// Bytes per packet in the stream fed to [extract](super::extract). Auto-detected when [None].
    pub packet_size: Option<usize>,
}

/// Feeds on raw packets, produces [SubtitlePage]s.
pub struct PageAssembler {
    options: AssemblerOptions,
    magazines: [Magazine; 8],
    finished: Vec<SubtitlePage>,
}

struct Magazine {
    open: Option<OpenPage>,
    // Row buffers are reused across pages, a page is bounded at 24 rows of 40 cells
    rows: [DisplayRow; 24],
}

struct OpenPage {
    page: u16,
    onset_us: u64,
    national: NationalOption,
}

impl Magazine {
    fn new() -> Magazine {
        Magazine {
            open: None,
            rows: std::array::from_fn(|_| Vec::with_capacity(40)),
        }
    }

    fn close(&mut self, clear_us: u64) -> Option<SubtitlePage> {
        let meta = self.open.take()?;

        let mut rows = BTreeMap::new();
        for (index, cells) in self.rows.iter_mut().enumerate() {
            while matches!(cells.last(), Some(Cell::Space)) {
                cells.pop();
            }
            // A row without a single glyph displays nothing
            if cells.iter().any(|c| matches!(c, Cell::Glyph(_))) {
                rows.insert(index as u8, std::mem::take(cells));
            } else {
                cells.clear();
            }
        }

        if rows.is_empty() {
            return None;
        }
        Some(SubtitlePage {
            page: meta.page,
            onset_us: meta.onset_us,
            clear_us,
            rows,
        })
    }
}

impl PageAssembler {
    pub fn new(options: AssemblerOptions) -> PageAssembler {
        PageAssembler {
            options,
            magazines: std::array::from_fn(|_| Magazine::new()),
            finished: Vec::new(),
        }
    }

    /// Feed one packet with the presentation timestamp attached to it by the demux stage.
    ///
    /// Packets that fail their bit protection or belong to non-subtitle pages are dropped silently.
    pub fn feed(&mut self, packet: &[u8], pts_us: u64) {
        match parse(packet) {
            Some(PacketView::Header(header)) => self.header(header, pts_us),
            Some(PacketView::Row(row)) => self.row(row),
            Some(PacketView::Service { .. }) | None => {}
        }
    }

    fn header(&mut self, header: PageHeader, pts_us: u64) {
        let magazine = &mut self.magazines[(header.magazine() - 1) as usize];

        // A new page or an erase transition closes whatever was showing
        let closes = match &magazine.open {
            Some(open) => open.page != header.page || header.control.erase_page(),
            None => false,
        };
        if closes {
            if let Some(page) = magazine.close(pts_us) {
                self.finished.push(page);
            }
        }

        let wanted = header.control.subtitle()
            && self.options.page.is_none_or(|page| page == header.page);
        if magazine.open.is_none() && wanted {
            magazine.open = Some(OpenPage {
                page: header.page,
                onset_us: pts_us,
                national: NationalOption::from_control_bits(header.control.national_option()),
            });
        }
    }

    fn row(&mut self, packet: DisplayRowPacket) {
        let magazine = &mut self.magazines[(packet.magazine - 1) as usize];
        let Some(open) = &magazine.open else {
            return;
        };
        if !(1..=23).contains(&packet.row) {
            return;
        }

        // Later packets overwrite earlier ones at the same row
        let cells = &mut magazine.rows[packet.row as usize];
        cells.clear();

        for &raw in packet.data.iter().take(40) {
            let (value, _parity_ok) = odd_parity(raw);
            cells.push(if value < 0x20 {
                match ControlCode::from_byte(value) {
                    Some(code) => Cell::Spacing(code),
                    None => Cell::Space,
                }
            } else if value == 0x20 {
                Cell::Space
            } else {
                match g0(self.options.charset, open.national, value) {
                    Some(c) => Cell::Glyph(c),
                    None => Cell::Space,
                }
            });
        }
    }

    /// Close any still-open page and return everything assembled, ordered by onset time.
    pub fn finish(mut self, end_us: u64) -> Vec<SubtitlePage> {
        for magazine in &mut self.magazines {
            if let Some(page) = magazine.close(end_us) {
                self.finished.push(page);
            }
        }
        self.finished.sort_by_key(|page| page.onset_us);
        self.finished
    }
}

//
// -----

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Color;

    const HAM: [u8; 16] = [
        0x15, 0x02, 0x49, 0x5E, 0x64, 0x73, 0x38, 0x2F, 0xD0, 0xC7, 0x8C, 0x9B, 0xA1, 0xB6, 0xFD,
        0xEA,
    ];

    fn parity(byte: u8) -> u8 {
        if byte.count_ones() & 1 == 1 {
            byte
        } else {
            byte | 0x80
        }
    }

    fn header(page: u8, erase: bool, subtitle: bool) -> Vec<u8> {
        let mut packet = vec![parity(0x20); 40];
        packet[0] = HAM[0]; // magazine 8
        packet[1] = HAM[0];
        packet[2] = HAM[(page & 0x0F) as usize];
        packet[3] = HAM[(page >> 4) as usize];
        packet[4] = HAM[0];
        packet[5] = HAM[if erase { 0x8 } else { 0x0 }];
        packet[6] = HAM[0];
        packet[7] = HAM[if subtitle { 0x8 } else { 0x0 }];
        packet[8] = HAM[0];
        packet[9] = HAM[0];
        packet
    }

    fn display_row(row: u8, text: &[u8]) -> Vec<u8> {
        let mut packet = vec![parity(0x20); 40];
        packet[0] = HAM[((row & 1) << 3) as usize]; // magazine 8
        packet[1] = HAM[(row >> 1) as usize];
        for (cell, byte) in packet[2..].iter_mut().zip(text) {
            *cell = parity(*byte);
        }
        packet
    }

    #[test]
    fn page_lifecycle() {
        let mut assembler = PageAssembler::new(AssemblerOptions::default());

        assembler.feed(&header(0x88, true, true), 1_000_000);
        assembler.feed(&display_row(20, b"\x0BHello"), 1_010_000);
        // Next caption on the same page
        assembler.feed(&header(0x88, true, true), 3_000_000);
        assembler.feed(&display_row(20, b"\x0BWorld"), 3_010_000);

        let pages = assembler.finish(5_000_000);
        assert_eq!(pages.len(), 2);

        assert_eq!(pages[0].page, 0x888);
        assert_eq!(pages[0].onset_us, 1_000_000);
        assert_eq!(pages[0].clear_us, 3_000_000);
        assert_eq!(
            pages[0].rows[&20],
            vec![
                Cell::Spacing(ControlCode::StartBox),
                Cell::Glyph('H'),
                Cell::Glyph('e'),
                Cell::Glyph('l'),
                Cell::Glyph('l'),
                Cell::Glyph('o'),
            ]
        );

        assert_eq!(pages[1].onset_us, 3_000_000);
        assert_eq!(pages[1].clear_us, 5_000_000);
    }

    #[test]
    fn non_subtitle_pages_are_dropped() {
        let mut assembler = PageAssembler::new(AssemblerOptions::default());
        assembler.feed(&header(0x00, true, false), 0);
        assembler.feed(&display_row(10, b"news"), 1);
        assert!(assembler.finish(2).is_empty());
    }

    #[test]
    fn page_filter() {
        let options = AssemblerOptions {
            page: Some(0x888),
            ..Default::default()
        };
        let mut assembler = PageAssembler::new(options);
        assembler.feed(&header(0x77, true, true), 0);
        assembler.feed(&display_row(10, b"other page"), 1);
        assert!(assembler.finish(2).is_empty());
    }

    #[test]
    fn rows_overwrite() {
        let mut assembler = PageAssembler::new(AssemblerOptions::default());
        assembler.feed(&header(0x88, true, true), 0);
        assembler.feed(&display_row(5, b"first"), 1);
        assembler.feed(&display_row(5, b"\x01second"), 2);

        let pages = assembler.finish(3);
        assert_eq!(pages.len(), 1);
        let row = &pages[0].rows[&5];
        assert_eq!(row[0], Cell::Spacing(ControlCode::AlphaColor(Color::Red)));
        assert_eq!(row[1], Cell::Glyph('s'));
    }

    #[test]
    fn empty_page_not_emitted() {
        let mut assembler = PageAssembler::new(AssemblerOptions::default());
        assembler.feed(&header(0x88, true, true), 0);
        assembler.feed(&header(0x88, true, true), 1);
        assert!(assembler.finish(2).is_empty());
    }
}
