//! Emits an STL file from assembled subtitle pages.

use std::io::{self, Write};

use crate::{
    charset::stl::latin_encode,
    teletext::page::{Cell, SubtitlePage},
    timecode::{Rate, Timecode},
};

use super::{GSI_LENGTH, LAST_BLOCK, LINE_BREAK, PADDING, TEXT_FIELD_LENGTH, TtiBlock};

/// Serialize pages into a complete STL file.
pub fn write(pages: &[SubtitlePage], rate: Rate) -> Vec<u8> {
    let blocks = blocks(pages, rate);

    let mut out = Vec::with_capacity(GSI_LENGTH + blocks.len() * super::TTI_LENGTH);
    out.extend_from_slice(&gsi(rate, blocks.len(), pages.len()));
    for block in &blocks {
        out.extend_from_slice(&block.to_bytes());
    }
    out
}

/// Same as [write], into a sink. Only fails on sink I/O errors.
pub fn write_to<W: Write>(sink: &mut W, pages: &[SubtitlePage], rate: Rate) -> io::Result<()> {
    sink.write_all(&write(pages, rate))
}

//
// -----

fn gsi(rate: Rate, block_count: usize, subtitle_count: usize) -> [u8; GSI_LENGTH] {
    let mut buf = [b' '; GSI_LENGTH];

    buf[..3].copy_from_slice(b"850");
    let disk_format: &[u8; 8] = if rate.fps().round() as u32 == 30 {
        b"STL30.01"
    } else {
        b"STL25.01"
    };
    buf[3..11].copy_from_slice(disk_format);
    // Teletext level 1 display standard, Latin table
    buf[11] = b'1';
    buf[12..14].copy_from_slice(b"00");
    buf[14..16].copy_from_slice(b"00");
    buf[238..243].copy_from_slice(format!("{block_count:05}").as_bytes());
    buf[243..248].copy_from_slice(format!("{subtitle_count:05}").as_bytes());

    buf
}

fn blocks(pages: &[SubtitlePage], rate: Rate) -> Vec<TtiBlock> {
    let mut blocks = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let number = (index % (u16::MAX as usize + 1)) as u16;
        let stream = serialize_rows(page);
        let time_in = Timecode::from_us(page.onset_us, rate);
        let time_out = Timecode::from_us(page.clear_us, rate);
        let vertical_position = page.rows.keys().next().copied().unwrap_or(0);

        let chunks: Vec<&[u8]> = stream.chunks(TEXT_FIELD_LENGTH).collect();
        let count = chunks.len();
        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let mut text = [PADDING; TEXT_FIELD_LENGTH];
            text[..chunk.len()].copy_from_slice(chunk);

            blocks.push(TtiBlock {
                group: 0,
                number,
                extension: if chunk_index + 1 == count {
                    LAST_BLOCK
                } else {
                    (chunk_index + 1) as u8
                },
                cumulative: 0,
                time_in,
                time_out,
                vertical_position,
                justification: 0,
                comment: 0,
                text,
            });
        }
    }

    blocks
}

// One row of up to 40 STL bytes per display row, rows joined by line breaks
fn serialize_rows(page: &SubtitlePage) -> Vec<u8> {
    let mut stream = Vec::new();

    for (index, row) in page.rows.iter() {
        if *index != *page.rows.keys().next().unwrap() {
            stream.push(LINE_BREAK);
        }
        for cell in row {
            match cell {
                // Attribute events map one-for-one onto text field control codes
                Cell::Spacing(code) => stream.push(code.to_byte()),
                Cell::Space => stream.push(b' '),
                Cell::Glyph(c) => {
                    if !latin_encode(*c, &mut stream) {
                        stream.push(b' ');
                    }
                }
            }
        }
    }

    stream
}

//
// -----
