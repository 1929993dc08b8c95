//! Teletext packet parsing (ETSI EN 300 706).
//!
//! A packet addresses one row of one magazine. Row 0 is the page header carrying the page number,
//! subcode and control bits, rows 1..=24 are display rows, and everything above is service data a
//! subtitle decoder can ignore.

pub mod page;

use crate::coding::{REVERSE, hamming_8_4};

/// Remnant of the clock run-in some capture tools keep in front of each line.
pub const CLOCK_RUN_IN: u8 = 0x55;
/// Framing code in transmission bit order. Bit-reversed captures show [REVERSED_FRAMING_CODE].
pub const FRAMING_CODE: u8 = 0xE4;
pub const REVERSED_FRAMING_CODE: u8 = 0x27;

//
// -----

/// One parsed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketView {
    Header(PageHeader),
    Row(DisplayRowPacket),
    /// Rows above 24 carry service or enhancement data. Packet 26 in particular holds enhancement
    /// data that subtitles do not need.
    Service { magazine: u8, row: u8 },
}

/// Page header contents (packet 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    /// Full page number, e.g. 0x888 for the usual subtitle page. The magazine is the top digit.
    pub page: u16,
    pub subcode: u16,
    pub control: ControlBits,
}

impl PageHeader {
    pub fn magazine(&self) -> u8 {
        (self.page >> 8) as u8
    }
}

/// A display row (packets 1..=24) with its still-parity-coded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRowPacket {
    pub magazine: u8,
    pub row: u8,
    pub data: Vec<u8>,
}

//
// -----

/// Control bits C4..=C14 from the page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBits(u16);

impl ControlBits {
    const ERASE_PAGE_BIT: u16 = 1; // C4
    const NEWSFLASH_BIT: u16 = 2; // C5
    const SUBTITLE_BIT: u16 = 4; // C6
    const SUPPRESS_HEADER_BIT: u16 = 8; // C7
    const UPDATE_BIT: u16 = 16; // C8
    const INTERRUPTED_BIT: u16 = 32; // C9
    const INHIBIT_DISPLAY_BIT: u16 = 64; // C10
    const MAGAZINE_SERIAL_BIT: u16 = 128; // C11

    /// "Erase page" : previously displayed content for this page is dropped.
    pub fn erase_page(&self) -> bool {
        (self.0 & Self::ERASE_PAGE_BIT) != 0
    }

    pub fn newsflash(&self) -> bool {
        (self.0 & Self::NEWSFLASH_BIT) != 0
    }

    /// This page is a subtitle page. Everything else gets dropped by the assembler.
    pub fn subtitle(&self) -> bool {
        (self.0 & Self::SUBTITLE_BIT) != 0
    }

    pub fn suppress_header(&self) -> bool {
        (self.0 & Self::SUPPRESS_HEADER_BIT) != 0
    }

    pub fn update(&self) -> bool {
        (self.0 & Self::UPDATE_BIT) != 0
    }

    pub fn interrupted_sequence(&self) -> bool {
        (self.0 & Self::INTERRUPTED_BIT) != 0
    }

    pub fn inhibit_display(&self) -> bool {
        (self.0 & Self::INHIBIT_DISPLAY_BIT) != 0
    }

    pub fn magazine_serial(&self) -> bool {
        (self.0 & Self::MAGAZINE_SERIAL_BIT) != 0
    }

    /// C12..=C14, the default G0 national option designation (C12 most significant).
    pub fn national_option(&self) -> u8 {
        ((self.0 >> 8) & 0x07) as u8
    }
}

//
// -----

/// Decode a whole packet stream at once.
///
/// `timestamps` pairs byte offsets into `stream` with presentation times in microseconds, sorted
/// by offset. Each packet takes the time of the last pair at or before its own offset, which
/// matches how demuxers report one pts per field or per PES packet rather than per line.
pub fn extract(
    stream: &[u8],
    timestamps: &[(usize, u64)],
    options: page::AssemblerOptions,
) -> Vec<page::SubtitlePage> {
    let packet_size = options.packet_size.unwrap_or_else(|| {
        // A stream of framed lines is a multiple of 42, bare payloads a multiple of 40
        if stream.len() % 42 == 0 { 42 } else { 40 }
    });

    let mut assembler = page::PageAssembler::new(options);
    let mut pts_us = 0;
    let mut next_timestamp = 0;
    for (index, packet) in stream.chunks_exact(packet_size).enumerate() {
        let offset = index * packet_size;
        while next_timestamp < timestamps.len() && timestamps[next_timestamp].0 <= offset {
            pts_us = timestamps[next_timestamp].1;
            next_timestamp += 1;
        }
        assembler.feed(packet, pts_us);
    }
    assembler.finish(pts_us)
}

/// Parse one packet as delivered by the demuxer.
///
/// Accepts 42-byte lines (2 framing bytes + 40-byte payload) and bare 40-byte payloads, in natural
/// or bit-reversed transmission order. Returns [None] when the addressing fields fail their
/// Hamming protection, the packet is simply dropped in that case.
pub fn parse(packet: &[u8]) -> Option<PacketView> {
    let (payload, reversed) = split(packet)?;

    let byte = |index: usize| {
        let b = payload[index];
        if reversed { REVERSE[b as usize] } else { b }
    };

    // Magazine and row address group
    let address_low = hamming_8_4(byte(0))?;
    let address_high = hamming_8_4(byte(1))?;
    let magazine = match address_low & 0x07 {
        0 => 8,
        m => m,
    };
    let row = (address_low >> 3) | (address_high << 1);

    match row {
        0 => {
            if payload.len() < 10 {
                return None;
            }

            let units = hamming_8_4(byte(2))?;
            let tens = hamming_8_4(byte(3))?;
            let s1 = hamming_8_4(byte(4))?;
            let s2_c4 = hamming_8_4(byte(5))?;
            let s3 = hamming_8_4(byte(6))?;
            let s4_c5_c6 = hamming_8_4(byte(7))?;
            let c7_c10 = hamming_8_4(byte(8))?;
            let c11_c14 = hamming_8_4(byte(9))?;

            let subcode = (s1 as u16)
                | (((s2_c4 & 0x07) as u16) << 4)
                | ((s3 as u16) << 7)
                | (((s4_c5_c6 & 0x03) as u16) << 11);

            // Repack C4..=C14 with C4 as bit 0
            let control = ((s2_c4 >> 3) as u16)
                | (((s4_c5_c6 >> 2) as u16) << 1)
                | ((c7_c10 as u16) << 3)
                | (((c11_c14 & 0x01) as u16) << 7)
                | ((reorder_national(c11_c14) as u16) << 8);

            Some(PacketView::Header(PageHeader {
                page: ((magazine as u16) << 8) | ((tens as u16) << 4) | units as u16,
                subcode,
                control: ControlBits(control),
            }))
        }
        1..=24 => {
            let data = if reversed {
                payload[2..].iter().map(|&b| REVERSE[b as usize]).collect()
            } else {
                payload[2..].to_vec()
            };
            Some(PacketView::Row(DisplayRowPacket {
                magazine,
                row,
                data,
            }))
        }
        _ => Some(PacketView::Service { magazine, row }),
    }
}

// The hamming nibble arrives C11 C12 C13 C14 from LSB up, the designation code reads C12 as its
// most significant bit
fn reorder_national(c11_c14: u8) -> u8 {
    ((c11_c14 >> 1) & 0x01) << 2 | ((c11_c14 >> 2) & 0x01) << 1 | (c11_c14 >> 3) & 0x01
}

/// Locate the 40-byte payload inside a raw line and detect bit reversal.
fn split(packet: &[u8]) -> Option<(&[u8], bool)> {
    match packet.len() {
        42 => {
            // Framed : the two leading bytes are fixed values
            if packet[1] == FRAMING_CODE {
                Some((&packet[2..], false))
            } else if packet[1] == REVERSED_FRAMING_CODE {
                Some((&packet[2..], true))
            } else {
                // No framing, this is an MRAG-first capture. Use the Hamming protection of the
                // first address byte to pick the bit order.
                detect_order(packet)
            }
        }
        40 => detect_order(packet),
        _ => None,
    }
}

fn detect_order(payload: &[u8]) -> Option<(&[u8], bool)> {
    if hamming_8_4(payload[0]).is_some() {
        Some((payload, false))
    } else if hamming_8_4(REVERSE[payload[0] as usize]).is_some() {
        Some((payload, true))
    } else {
        None
    }
}

//
// -----

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coding::REVERSE;

    // Valid Hamming bytes for each nibble value
    const HAM: [u8; 16] = [
        0x15, 0x02, 0x49, 0x5E, 0x64, 0x73, 0x38, 0x2F, 0xD0, 0xC7, 0x8C, 0x9B, 0xA1, 0xB6, 0xFD,
        0xEA,
    ];

    fn header_packet(magazine: u8, page: u8, control_nibbles: [u8; 4]) -> Vec<u8> {
        let mut packet = vec![0x20u8; 40];
        packet[0] = HAM[(magazine & 0x07) as usize];
        packet[1] = HAM[0];
        packet[2] = HAM[(page & 0x0F) as usize];
        packet[3] = HAM[(page >> 4) as usize];
        packet[4] = HAM[0];
        packet[5] = HAM[control_nibbles[0] as usize];
        packet[6] = HAM[0];
        packet[7] = HAM[control_nibbles[1] as usize];
        packet[8] = HAM[control_nibbles[2] as usize];
        packet[9] = HAM[control_nibbles[3] as usize];
        packet
    }

    #[test]
    fn header() {
        // Subtitle bit (C6) set, erase bit (C4) set
        let packet = header_packet(8, 0x88, [0x8, 0x8, 0x0, 0x0]);
        let view = parse(&packet).unwrap();

        let PacketView::Header(header) = view else {
            panic!("expected a header");
        };
        assert_eq!(header.page, 0x888);
        assert_eq!(header.magazine(), 8);
        assert!(header.control.erase_page());
        assert!(header.control.subtitle());
        assert!(!header.control.newsflash());
    }

    #[test]
    fn display_row() {
        let mut packet = vec![0u8; 40];
        // Magazine 1, row 5 : address nibbles 0b1001 and 0b0010
        packet[0] = HAM[0b1001];
        packet[1] = HAM[0b0010];
        for b in packet.iter_mut().skip(2) {
            *b = b'H';
        }

        let view = parse(&packet).unwrap();
        let PacketView::Row(row) = view else {
            panic!("expected a row");
        };
        assert_eq!(row.magazine, 1);
        assert_eq!(row.row, 5);
        assert_eq!(row.data.len(), 38);
        assert_eq!(row.data[0], b'H');
    }

    #[test]
    fn framed_and_reversed() {
        let bare = header_packet(1, 0x00, [0, 0, 0, 0]);

        let mut framed = vec![CLOCK_RUN_IN, FRAMING_CODE];
        framed.extend_from_slice(&bare);
        framed.truncate(42);
        assert!(matches!(
            parse(&framed).unwrap(),
            PacketView::Header(_)
        ));

        let mut reversed = vec![CLOCK_RUN_IN, REVERSED_FRAMING_CODE];
        reversed.extend(bare.iter().map(|&b| REVERSE[b as usize]));
        reversed.truncate(42);
        assert_eq!(parse(&reversed).unwrap(), parse(&framed).unwrap());
    }

    #[test]
    fn corrupted_address_drops_packet() {
        let mut packet = header_packet(1, 0x00, [0, 0, 0, 0]);
        // Two bit flips in the first address byte make it uncorrectable
        packet[0] ^= 0b0000_0011;
        assert_eq!(parse(&packet), None);
    }

    #[test]
    fn national_option_bits() {
        // C11..C14 nibble : C12 set -> designation code 4
        let packet = header_packet(1, 0x00, [0, 0, 0, 0b0010]);
        let PacketView::Header(header) = parse(&packet).unwrap() else {
            panic!();
        };
        assert_eq!(header.control.national_option(), 4);
    }
}
