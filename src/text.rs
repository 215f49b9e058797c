//! Chapter text preparation.
//!
//! DMZJ chapter files are plain text sprinkled with HTML line breaks and
//! entities. This module turns them into clean lines ready for layout.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::Path;

const UTF8_BOM: &str = "\u{feff}";

static LINE_BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>").expect("valid regex"));

static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#(\d+)|#[xX]([0-9a-fA-F]+)|([a-zA-Z]+));").expect("valid regex")
});

/// Reads one chapter file as UTF-8, dropping a leading byte order mark.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file can't be read and
/// [`Error::InvalidUtf8`] if it isn't valid UTF-8.
pub fn read_chapter(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            Error::invalid_utf8(path)
        } else {
            Error::io(path, e)
        }
    })?;

    Ok(match content.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// Converts a DMZJ fragment into plain text with `\n` line separators.
///
/// Line-break tags become newlines, every other tag is dropped and
/// character entities are decoded.
#[must_use]
pub fn clean_fragment(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    decode_entities(&text).into_owned()
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let decoded = if let Some(dec) = caps.get(1) {
            dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
        } else if let Some(hex) = caps.get(2) {
            u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
        } else {
            caps.get(3).and_then(|name| named_entity(name.as_str()))
        };

        decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
    })
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "nbsp" => Some(' '),
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "hellip" => Some('…'),
        "mdash" => Some('—'),
        "ldquo" => Some('“'),
        "rdquo" => Some('”'),
        _ => None,
    }
}

/// Returns true for glyphs that occupy a full em (CJK, kana, hangul,
/// full-width forms).
#[must_use]
pub fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD)
}

fn char_width(c: char) -> usize {
    if is_wide(c) { 2 } else { 1 }
}

/// Splits one line into pieces no wider than `budget` half-em units.
///
/// Breaks prefer the last whitespace inside the window so western text
/// isn't cut mid-word; runs without whitespace (CJK) are cut anywhere.
#[must_use]
pub fn wrap_line(line: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(2);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0;
    let mut last_space: Option<usize> = None;

    for c in line.chars() {
        let w = char_width(c);
        if width + w > budget && !current.is_empty() {
            match last_space {
                Some(at) if at > 0 => {
                    let rest = current.split_off(at);
                    pieces.push(current.trim_end().to_string());
                    current = rest.trim_start().to_string();
                }
                _ => pieces.push(std::mem::take(&mut current)),
            }
            width = current.chars().map(char_width).sum();
            last_space = None;
        }

        if c.is_whitespace() {
            last_space = Some(current.len());
        }
        current.push(c);
        width += w;
    }

    if !current.is_empty() || pieces.is_empty() {
        pieces.push(current);
    }

    pieces
}
