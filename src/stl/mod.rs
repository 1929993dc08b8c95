//! EBU Tech 3264-E file structure : one GSI block followed by TTI blocks.

pub mod reader;
pub mod segment;
pub mod writer;

use crate::{charset::CharacterCodeTable, timecode::Timecode};

pub const GSI_LENGTH: usize = 1024;
pub const TTI_LENGTH: usize = 128;
pub const TEXT_FIELD_LENGTH: usize = 112;

/// Line break inside a text field.
pub const LINE_BREAK: u8 = 0x8A;
/// Padding : ends the meaningful part of a text field.
pub const PADDING: u8 = 0x8F;
/// EBN value marking the last block of a subtitle.
pub const LAST_BLOCK: u8 = 0xFF;

//
// -----

/// General Subtitle Information, the fixed 1024-byte file header.
///
/// Only the fields the decoding path consumes are kept, the rest of the block is descriptive
/// metadata (titles, contacts, editing dates).
#[derive(Debug, Clone)]
pub struct Gsi {
    /// Code Page Number, e.g. "850". Display only, does not affect text field decoding.
    pub code_page: [u8; 3],
    /// Disk Format Code, e.g. "STL25.01". Yields the frame rate.
    pub disk_format: String,
    /// Display Standard Code.
    pub display_standard: u8,
    /// Raw Character Code Table field, two ASCII hex digits.
    pub character_table_raw: [u8; 2],
    /// Parsed character table. [None] when the field holds an unknown value.
    pub character_table: Option<CharacterCodeTable>,
    /// Language Code, two ASCII hex digits.
    pub language: [u8; 2],
    /// Total Number of TTI Blocks, when the field parses as decimal.
    pub block_count: Option<u32>,
    /// Total Number of Subtitles.
    pub subtitle_count: Option<u32>,
}

impl Gsi {
    /// Field offsets, from Tech 3264-E section 2.
    const CODE_PAGE: usize = 0;
    const DISK_FORMAT: usize = 3;
    const DISPLAY_STANDARD: usize = 11;
    const CHARACTER_TABLE: usize = 12;
    const LANGUAGE: usize = 14;
    const BLOCK_COUNT: usize = 238;
    const SUBTITLE_COUNT: usize = 243;

    /// Read from the first 1024 bytes of a file. Lenient : unparseable numeric fields become
    /// [None], the caller decides what is fatal.
    pub fn from_buf(buf: &[u8]) -> Gsi {
        let character_table_raw = [buf[Self::CHARACTER_TABLE], buf[Self::CHARACTER_TABLE + 1]];

        Gsi {
            code_page: [
                buf[Self::CODE_PAGE],
                buf[Self::CODE_PAGE + 1],
                buf[Self::CODE_PAGE + 2],
            ],
            disk_format: String::from_utf8_lossy(&buf[Self::DISK_FORMAT..Self::DISK_FORMAT + 8])
                .trim()
                .to_string(),
            display_standard: buf[Self::DISPLAY_STANDARD],
            character_table: ascii_hex(character_table_raw).and_then(CharacterCodeTable::from_number),
            character_table_raw,
            language: [buf[Self::LANGUAGE], buf[Self::LANGUAGE + 1]],
            block_count: ascii_decimal(&buf[Self::BLOCK_COUNT..Self::BLOCK_COUNT + 5]),
            subtitle_count: ascii_decimal(&buf[Self::SUBTITLE_COUNT..Self::SUBTITLE_COUNT + 5]),
        }
    }
}

fn ascii_hex(digits: [u8; 2]) -> Option<u8> {
    let text = std::str::from_utf8(&digits).ok()?;
    u8::from_str_radix(text.trim(), 16).ok()
}

fn ascii_decimal(digits: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(digits).ok()?;
    text.trim().parse().ok()
}

//
// -----

/// Text and Timing Information, one fixed 128-byte block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtiBlock {
    /// Subtitle Group Number.
    pub group: u8,
    /// Subtitle Number. Blocks of one subtitle share it.
    pub number: u16,
    /// Extension Block Number : 1..=254 for intermediate blocks, 0xFF for the last.
    pub extension: u8,
    /// Cumulative Status. 0 on blocks of a well-formed continuation chain.
    pub cumulative: u8,
    pub time_in: Timecode,
    pub time_out: Timecode,
    /// Vertical Position, a teletext row number for teletext-sourced files.
    pub vertical_position: u8,
    /// Justification Code : 0 unchanged, 1 left, 2 centered, 3 right.
    pub justification: u8,
    /// Comment Flag : nonzero blocks carry operator comments, not display text.
    pub comment: u8,
    pub text: [u8; TEXT_FIELD_LENGTH],
}

impl TtiBlock {
    pub fn from_buf(buf: &[u8; TTI_LENGTH]) -> TtiBlock {
        let mut text = [0u8; TEXT_FIELD_LENGTH];
        text.copy_from_slice(&buf[16..]);

        TtiBlock {
            group: buf[0],
            number: u16::from_le_bytes([buf[1], buf[2]]),
            extension: buf[3],
            cumulative: buf[4],
            time_in: Timecode::from_bytes([buf[5], buf[6], buf[7], buf[8]]),
            time_out: Timecode::from_bytes([buf[9], buf[10], buf[11], buf[12]]),
            vertical_position: buf[13],
            justification: buf[14],
            comment: buf[15],
            text,
        }
    }

    pub fn to_bytes(&self) -> [u8; TTI_LENGTH] {
        let mut buf = [0u8; TTI_LENGTH];
        buf[0] = self.group;
        buf[1..3].copy_from_slice(&self.number.to_le_bytes());
        buf[3] = self.extension;
        buf[4] = self.cumulative;
        buf[5..9].copy_from_slice(&self.time_in.to_bytes());
        buf[9..13].copy_from_slice(&self.time_out.to_bytes());
        buf[13] = self.vertical_position;
        buf[14] = self.justification;
        buf[15] = self.comment;
        buf[16..].copy_from_slice(&self.text);
        buf
    }

    /// The meaningful prefix of the text field, everything up to the first padding byte.
    pub fn visible_text(&self) -> &[u8] {
        let end = self
            .text
            .iter()
            .position(|&b| b == PADDING)
            .unwrap_or(TEXT_FIELD_LENGTH);
        &self.text[..end]
    }
}

//
// -----
