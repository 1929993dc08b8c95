//! Turns a decoded text field into a caption with styled runs.
//!
//! The control/glyph stream drives a small state machine : every control code that changes the
//! style closes the current run and opens a new one. Like teletext receivers (and Adobe Premiere,
//! which is the consumer people actually care about), the foreground color falls back to white at
//! every line break while the remaining attributes ride across.

use crate::{
    charset::CharacterCodeTable,
    control::{Color, ControlCode},
};

use super::{LINE_BREAK, PADDING};

//
// -----

/// A caption as surfaced to callers.
///
/// `style` and `segments` are mutually exclusive : a single non-default style covering the whole
/// text lands in `style`, mixed styling lands in `segments`, fully default text carries neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    /// Display interval in microseconds.
    pub start: u64,
    pub end: u64,
    pub start_timecode: String,
    pub end_timecode: String,
    pub text: String,
    pub style: Option<Style>,
    pub layout: Option<Layout>,
    pub segments: Option<Vec<Segment>>,
}

/// One styled run of a caption with mixed styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    /// Absent on runs that display with the default style.
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Teletext row, 0..=23.
    pub vertical_position: u8,
    /// Absent when the justification code says "unchanged".
    pub text_align: Option<TextAlign>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn from_justification(code: u8) -> Option<TextAlign> {
        match code {
            1 => Some(TextAlign::Left),
            2 => Some(TextAlign::Center),
            3 => Some(TextAlign::Right),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

//
// -----

/// Display attributes of a run. [Style::default] is white on transparent, steady, normal height,
/// and is never emitted on a caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: Color,
    /// Background color. [None] is transparent.
    pub background: Option<Color>,
    /// Not produced by teletext control codes, carried for writer-side hints.
    pub italic: bool,
    /// Not produced by teletext control codes, carried for writer-side hints.
    pub bold: bool,
    /// Not produced by teletext control codes, carried for writer-side hints.
    pub underline: bool,
    pub flash: bool,
    pub double_height: bool,
}

impl Default for Style {
    fn default() -> Style {
        Style {
            color: Color::White,
            background: None,
            italic: false,
            bold: false,
            underline: false,
            flash: false,
            double_height: false,
        }
    }
}

impl Style {
    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }

    /// The style as dictionary entries, default attributes omitted.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if self.color != Color::White {
            pairs.push(("color", self.color.name().to_string()));
        }
        if let Some(background) = self.background {
            pairs.push(("background-color", background.name().to_string()));
        }
        if self.italic {
            pairs.push(("font-style", "italic".to_string()));
        }
        if self.bold {
            pairs.push(("font-weight", "bold".to_string()));
        }
        if self.underline {
            pairs.push(("text-decoration", "underline".to_string()));
        }
        if self.flash {
            pairs.push(("visibility", "blink".to_string()));
        }
        if self.double_height {
            pairs.push(("line-height", "double".to_string()));
        }
        pairs
    }
}

//
// -----

/// Outcome of segmenting one text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmented {
    pub text: String,
    pub style: Option<Style>,
    pub segments: Option<Vec<Segment>>,
}

/// Walk the text field bytes of one logical subtitle and build its styled runs.
///
/// `bytes` is the concatenation of the visible text of every block of the subtitle.
pub fn segment(bytes: &[u8], table: CharacterCodeTable) -> Segmented {
    let mut runs: Vec<(String, Style)> = Vec::new();
    let mut text = String::new();
    let mut style = Style::default();
    let mut pending = style;

    let mut offset = 0;
    while offset < bytes.len() {
        let byte = bytes[offset];

        match byte {
            PADDING => break,
            LINE_BREAK => {
                // The break belongs to the run it ends, the next line starts back at white
                flush_pending(&mut runs, &mut text, &mut style, pending);
                text.push('\n');
                pending.color = Color::White;
                offset += 1;
            }
            0x00..=0x1F => {
                match ControlCode::from_byte(byte) {
                    Some(ControlCode::AlphaColor(color)) => pending.color = color,
                    Some(ControlCode::Flash) => pending.flash = true,
                    Some(ControlCode::Steady) => pending.flash = false,
                    Some(ControlCode::DoubleHeight) => pending.double_height = true,
                    Some(ControlCode::NormalHeight) => pending.double_height = false,
                    Some(ControlCode::BlackBackground) => pending.background = Some(Color::Black),
                    Some(ControlCode::NewBackground) => pending.background = Some(pending.color),
                    // Boxing bounds the displayed area, it does not style the text
                    Some(ControlCode::StartBox | ControlCode::EndBox) => {}
                    Some(ControlCode::Conceal | ControlCode::Ignored(_)) | None => {}
                }
                offset += 1;
            }
            // Open-subtitle files carry italics and underline as text field codes. Teletext never
            // produces these, they come from the authoring side.
            0x80..=0x85 => {
                match byte {
                    0x80 => pending.italic = true,
                    0x81 => pending.italic = false,
                    0x82 => pending.underline = true,
                    0x83 => pending.underline = false,
                    // Boxing on/off, no text style
                    _ => {}
                }
                offset += 1;
            }
            _ => {
                flush_pending(&mut runs, &mut text, &mut style, pending);
                offset += table.push_glyph(&bytes[offset..], &mut text);
            }
        }
    }

    if !text.is_empty() {
        runs.push((text, style));
    }

    // Trailing breaks carry no content
    while let Some(last) = runs.last_mut() {
        while last.0.ends_with('\n') {
            last.0.pop();
        }
        if last.0.is_empty() {
            runs.pop();
        } else {
            break;
        }
    }

    let text: String = runs.iter().map(|(t, _)| t.as_str()).collect();

    let all_default = runs.iter().all(|(_, s)| s.is_default());
    let unified = runs
        .first()
        .map(|(_, first)| runs.iter().all(|(_, s)| s == first))
        .unwrap_or(true);

    if runs.is_empty() || all_default {
        Segmented {
            text,
            style: None,
            segments: None,
        }
    } else if unified {
        Segmented {
            text,
            style: Some(runs[0].1),
            segments: None,
        }
    } else {
        let segments = runs
            .into_iter()
            .map(|(text, style)| Segment {
                text,
                style: (!style.is_default()).then_some(style),
            })
            .collect();
        Segmented {
            text,
            style: None,
            segments: Some(segments),
        }
    }
}

// Close the current run when a style change arrives with text already accumulated
fn flush_pending(
    runs: &mut Vec<(String, Style)>,
    text: &mut String,
    style: &mut Style,
    pending: Style,
) {
    if *style != pending {
        if !text.is_empty() {
            runs.push((std::mem::take(text), *style));
        }
        *style = pending;
    }
}

//
// -----

#[cfg(test)]
mod tests {
    use super::*;

    fn latin(bytes: &[u8]) -> Segmented {
        segment(bytes, CharacterCodeTable::Latin)
    }

    #[test]
    fn plain_text() {
        let out = latin(b"Hello");
        assert_eq!(out.text, "Hello");
        assert_eq!(out.style, None);
        assert_eq!(out.segments, None);
    }

    #[test]
    fn uniform_color_is_a_single_style() {
        // Color code before any text : one run, one style
        let out = latin(&[0x02, b'h', b'i']);
        assert_eq!(out.text, "hi");
        assert_eq!(
            out.style,
            Some(Style {
                color: Color::Green,
                ..Default::default()
            })
        );
        assert_eq!(out.segments, None);
    }

    #[test]
    fn multi_color_segments() {
        // [blue]blue [green]green[LF]Hello world
        let mut bytes = vec![0x04];
        bytes.extend_from_slice(b"blue ");
        bytes.push(0x02);
        bytes.extend_from_slice(b"green");
        bytes.push(LINE_BREAK);
        bytes.extend_from_slice(b"Hello world");

        let out = latin(&bytes);
        assert_eq!(out.text, "blue green\nHello world");
        assert_eq!(out.style, None);
        assert_eq!(
            out.segments,
            Some(vec![
                Segment {
                    text: "blue ".to_string(),
                    style: Some(Style {
                        color: Color::Blue,
                        ..Default::default()
                    }),
                },
                Segment {
                    text: "green\n".to_string(),
                    style: Some(Style {
                        color: Color::Green,
                        ..Default::default()
                    }),
                },
                Segment {
                    text: "Hello world".to_string(),
                    style: None,
                },
            ])
        );
    }

    #[test]
    fn color_resets_on_line_break() {
        let mut bytes = vec![0x01];
        bytes.extend_from_slice(b"Line1");
        bytes.push(LINE_BREAK);
        bytes.extend_from_slice(b"Line2");

        let out = latin(&bytes);
        assert_eq!(out.text, "Line1\nLine2");
        assert_eq!(
            out.segments,
            Some(vec![
                Segment {
                    text: "Line1\n".to_string(),
                    style: Some(Style {
                        color: Color::Red,
                        ..Default::default()
                    }),
                },
                Segment {
                    text: "Line2".to_string(),
                    style: None,
                },
            ])
        );
    }

    #[test]
    fn attributes_persist_across_line_breaks() {
        // Flash stays on after the break, only the color resets
        let mut bytes = vec![0x08, 0x01];
        bytes.extend_from_slice(b"a");
        bytes.push(LINE_BREAK);
        bytes.extend_from_slice(b"b");

        let out = latin(&bytes);
        let segments = out.segments.unwrap();
        assert_eq!(segments[0].style.unwrap().color, Color::Red);
        assert!(segments[0].style.unwrap().flash);
        assert_eq!(segments[1].style.unwrap().color, Color::White);
        assert!(segments[1].style.unwrap().flash);
    }

    #[test]
    fn authoring_hints() {
        // Italics on, one word, italics off
        let out = latin(&[0x80, b'h', b'i', 0x81, b' ', b't', b'h', b'e', b'r', b'e']);
        assert_eq!(out.text, "hi there");
        let segments = out.segments.unwrap();
        assert!(segments[0].style.unwrap().italic);
        assert_eq!(segments[0].text, "hi");
        assert_eq!(segments[1].style, None);
    }

    #[test]
    fn trailing_breaks_trimmed() {
        let out = latin(&[b'h', b'i', LINE_BREAK, LINE_BREAK, PADDING]);
        assert_eq!(out.text, "hi");
        assert_eq!(out.segments, None);
    }

    #[test]
    fn new_background_adopts_foreground() {
        let bytes = [0x03, 0x1D, b'x'];
        let out = latin(&bytes);
        let style = out.style.unwrap();
        assert_eq!(style.color, Color::Yellow);
        assert_eq!(style.background, Some(Color::Yellow));
    }

    #[test]
    fn padding_stops_decoding() {
        let out = latin(&[b'h', b'i', PADDING, b'x']);
        assert_eq!(out.text, "hi");
    }

    #[test]
    fn style_dictionary() {
        let style = Style {
            color: Color::Red,
            background: Some(Color::Black),
            flash: true,
            double_height: true,
            ..Default::default()
        };
        assert_eq!(
            style.pairs(),
            vec![
                ("color", "red".to_string()),
                ("background-color", "black".to_string()),
                ("visibility", "blink".to_string()),
                ("line-height", "double".to_string()),
            ]
        );
        assert!(Style::default().pairs().is_empty());
        assert!(Style::default().is_default());
    }
}
