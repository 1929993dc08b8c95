//! Control codes shared by teletext display rows and STL text fields.
//!
//! Teletext spacing attributes (EN 300 706 table 4) and the Tech 3264-E text field control codes
//! use the same values for everything a subtitle needs, so the writer can map attribute events
//! one-for-one. A spacing attribute occupies one display cell, shows as a space, and applies to the
//! rest of its row.

/// The 8 colors of the teletext palette, also used by STL alpha color codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub fn from_index(index: u8) -> Option<Color> {
        Some(match index {
            0x0 => Color::Black,
            0x1 => Color::Red,
            0x2 => Color::Green,
            0x3 => Color::Yellow,
            0x4 => Color::Blue,
            0x5 => Color::Magenta,
            0x6 => Color::Cyan,
            0x7 => Color::White,
            _ => return None,
        })
    }

    pub const fn index(&self) -> u8 {
        match self {
            Color::Black => 0x0,
            Color::Red => 0x1,
            Color::Green => 0x2,
            Color::Yellow => 0x3,
            Color::Blue => 0x4,
            Color::Magenta => 0x5,
            Color::Cyan => 0x6,
            Color::White => 0x7,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Magenta => "magenta",
            Color::Cyan => "cyan",
            Color::White => "white",
        }
    }
}

//
// -----

/// A control code found in the 0x00..=0x1F range of a display row or text field.
///
/// Mosaic and graphics codes have no meaning in a subtitle, they are kept around as [Ignored](ControlCode::Ignored)
/// so a row still accounts for the cell they occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCode {
    /// 0x00..=0x07, set the foreground color for the rest of the row.
    AlphaColor(Color),
    /// 0x08
    Flash,
    /// 0x09
    Steady,
    /// 0x0A
    EndBox,
    /// 0x0B
    StartBox,
    /// 0x0C
    NormalHeight,
    /// 0x0D
    DoubleHeight,
    /// 0x18
    Conceal,
    /// 0x1C, background becomes black.
    BlackBackground,
    /// 0x1D, background adopts the current foreground color.
    NewBackground,
    /// Mosaic colors, graphics modes, reserved size codes. No subtitle meaning.
    Ignored(u8),
}

impl ControlCode {
    /// Classify one byte of the control range. Returns [None] for bytes >= 0x20.
    pub fn from_byte(byte: u8) -> Option<ControlCode> {
        Some(match byte {
            0x00..=0x07 => ControlCode::AlphaColor(Color::from_index(byte).unwrap()),
            0x08 => ControlCode::Flash,
            0x09 => ControlCode::Steady,
            0x0A => ControlCode::EndBox,
            0x0B => ControlCode::StartBox,
            0x0C => ControlCode::NormalHeight,
            0x0D => ControlCode::DoubleHeight,
            0x18 => ControlCode::Conceal,
            0x1C => ControlCode::BlackBackground,
            0x1D => ControlCode::NewBackground,
            0x0E..=0x1F => ControlCode::Ignored(byte),
            _ => return None,
        })
    }

    pub const fn to_byte(&self) -> u8 {
        match self {
            ControlCode::AlphaColor(c) => c.index(),
            ControlCode::Flash => 0x08,
            ControlCode::Steady => 0x09,
            ControlCode::EndBox => 0x0A,
            ControlCode::StartBox => 0x0B,
            ControlCode::NormalHeight => 0x0C,
            ControlCode::DoubleHeight => 0x0D,
            ControlCode::Conceal => 0x18,
            ControlCode::BlackBackground => 0x1C,
            ControlCode::NewBackground => 0x1D,
            ControlCode::Ignored(b) => *b,
        }
    }
}

//
// -----
