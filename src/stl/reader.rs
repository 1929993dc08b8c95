//! Reads an STL file into captions.
//!
//! The reader is lenient on purpose : real files miss terminators, carry bogus continuation
//! bookkeeping and get truncated by transfer tools. Anything recoverable is decoded, structural
//! problems are summarized in a single diagnostic per read.

use log::warn;

use crate::{
    charset::CharacterCodeTable,
    error::{Diagnostic, ReadError, WarningMode},
    timecode::{Rate, us_to_smpte},
};

use super::{
    GSI_LENGTH, Gsi, LAST_BLOCK, TTI_LENGTH, TtiBlock,
    segment::{Caption, Layout, TextAlign, segment},
};

/// How many reassembled groups the structural validation looks at.
const VALIDATED_GROUPS: usize = 9;

//
// -----

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Replaces the frame rate derived from the disk format code, without touching it.
    pub fps_override: Option<f64>,
    pub structural: WarningMode,
}

#[derive(Debug)]
pub struct ReadOutput {
    pub captions: Vec<Caption>,
    pub gsi: Gsi,
    pub rate: Rate,
    /// The structural warning, when violations were found and not suppressed.
    pub diagnostic: Option<Diagnostic>,
}

//
// -----

/// Parse a whole STL file.
///
/// Fatal errors are a missing GSI block and an unknown frame rate. Everything past the GSI is
/// best-effort : the reader never aborts on mid-stream corruption, it decodes to end of input and
/// surfaces what it could parse.
pub fn read(buf: &[u8], options: &ReadOptions) -> Result<ReadOutput, ReadError> {
    if buf.len() < GSI_LENGTH {
        return Err(ReadError::InputTooShort(buf.len()));
    }
    let gsi = Gsi::from_buf(buf);

    let rate = match options.fps_override.and_then(Rate::new) {
        Some(rate) => rate,
        None => match gsi.disk_format.as_str() {
            "STL25.01" => Rate::F25,
            "STL30.01" => Rate::F30,
            other => return Err(ReadError::UnrecognizedFrameRate(other.to_string())),
        },
    };

    let table = gsi.character_table.unwrap_or_default();

    // A truncated final block is tolerated, chunks_exact just drops it
    let mut blocks = Vec::new();
    for chunk in buf[GSI_LENGTH..].chunks_exact(TTI_LENGTH) {
        let block = TtiBlock::from_buf(chunk.try_into().unwrap());
        // Comment blocks carry operator notes, not display text
        if block.comment == 0 {
            blocks.push(block);
        }
    }

    let groups = group_blocks(blocks);
    let violations = count_violations(&groups);

    let captions = groups
        .iter()
        .map(|group| caption(group, table, rate))
        .collect();

    let mut messages = Vec::new();
    if violations > 0 {
        messages.push(format!(
            "{violations} of first {} TTI block(s) have intermediate EBN with invalid CS",
            groups.len().min(VALIDATED_GROUPS)
        ));
    }
    if gsi.character_table.is_none() {
        messages.push(format!(
            "unknown character code table {:?}, assuming Latin",
            String::from_utf8_lossy(&gsi.character_table_raw)
        ));
    }

    let diagnostic = if messages.is_empty() {
        None
    } else {
        let diagnostic = Diagnostic::structural(messages.join("; "));
        match options.structural {
            WarningMode::Suppress => None,
            WarningMode::Observe => {
                warn!("{diagnostic}");
                Some(diagnostic)
            }
            WarningMode::Error => return Err(ReadError::Structural(diagnostic)),
        }
    };

    Ok(ReadOutput {
        captions,
        gsi,
        rate,
        diagnostic,
    })
}

//
// -----

// Contiguous blocks with the same subtitle number form one subtitle, closed by the 0xFF
// terminator or by the number changing under us
fn group_blocks(blocks: Vec<TtiBlock>) -> Vec<Vec<TtiBlock>> {
    let mut groups = Vec::new();
    let mut current: Vec<TtiBlock> = Vec::new();

    for block in blocks {
        if let Some(first) = current.first() {
            if first.number != block.number {
                groups.push(std::mem::take(&mut current));
            }
        }

        let terminated = block.extension == LAST_BLOCK;
        current.push(block);
        if terminated {
            groups.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

// Continuation protocol : intermediate blocks must carry EBN 1..=254 and CS 0. Only the first
// few groups are sampled, a systematically broken file does not need a thousand counts
fn count_violations(groups: &[Vec<TtiBlock>]) -> usize {
    let mut violations = 0;
    for group in groups.iter().take(VALIDATED_GROUPS) {
        for block in &group[..group.len() - 1] {
            if !(1..=254).contains(&block.extension) || block.cumulative != 0 {
                violations += 1;
            }
        }
    }
    violations
}

fn caption(group: &[TtiBlock], table: CharacterCodeTable, rate: Rate) -> Caption {
    let first = &group[0];

    let mut bytes = Vec::new();
    for block in group {
        bytes.extend_from_slice(block.visible_text());
    }
    let segmented = segment(&bytes, table);

    let start = first.time_in.to_us(rate);
    let end = first.time_out.to_us(rate).max(start);

    Caption {
        start,
        end,
        start_timecode: us_to_smpte(start, rate),
        end_timecode: us_to_smpte(end, rate),
        text: segmented.text,
        style: segmented.style,
        layout: Some(Layout {
            vertical_position: first.vertical_position.min(23),
            text_align: TextAlign::from_justification(first.justification),
        }),
        segments: segmented.segments,
    }
}

//
// -----
