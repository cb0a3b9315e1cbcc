//! Text metrics constants, character classes, greedy line fragmentation
//! and the measurement cache.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::surface::{Font, Surface};

/// Share of the font size that sits below the baseline.
pub const BASELINE_RATIO: f32 = 0.26;
/// Distance from the em middle to the baseline, as a fraction of the size.
pub const MIDDLE_RATIO: f32 = (BASELINE_RATIO + 1.0) / 2.0 - BASELINE_RATIO;
/// Alpha used for label backgrounds so that fully transparent pixels never
/// bleed black into filtered edges.
pub const INVISIBLE_ALPHA: u8 = 1;
/// Font size reported when shrink-to-fit has no solution.
pub const MIN_FONT_SIZE_SENTINEL: f32 = 0.1;

/// Round to two decimals.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

pub fn is_unicode_space(ch: char) -> bool {
    matches!(
        ch as u32,
        9..=13
            | 32
            | 133
            | 160
            | 5760
            | 8192..=8202
            | 8232
            | 8233
            | 8239
            | 8287
            | 12288
    )
}

/// Characters that may break a line on their own (Chinese, Japanese and
/// Korean blocks).
pub fn is_unicode_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        // Chinese
        0x4E00..=0x9FFF
            | 0x3400..=0x4DFF
            // Japanese
            | 0x3000..=0x303F
            | 0x3040..=0x309F
            | 0x30A0..=0x30FF
            | 0xFF00..=0xFFEF
            | 0x2605..=0x2606
            | 0x2190..=0x2195
            | 0x203B
            // Korean
            | 0x1100..=0x11FF
            | 0x3130..=0x318F
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7AF
            | 0xD7B0..=0xD7FF
    )
}

/// Split `text` into wrap tokens: a CJK character alone, or a word with its
/// trailing spaces.
fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, ch) in text.char_indices() {
        if is_unicode_cjk(ch) {
            if i > start {
                out.push(&text[start..i]);
            }
            let end = i + ch.len_utf8();
            out.push(&text[i..end]);
            start = end;
            in_space = false;
        } else if is_unicode_space(ch) {
            in_space = true;
        } else if in_space {
            out.push(&text[start..i]);
            start = i;
            in_space = false;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Break one paragraph into lines no wider than `max_width`.
///
/// `all_width` is the measured width of the whole paragraph; when it fits
/// the paragraph is returned untouched. Words wider than a line are split
/// per character, and every line keeps at least one character.
pub fn fragment_text(
    text: &str,
    all_width: f32,
    max_width: f32,
    measure: &mut dyn FnMut(&str) -> f32,
) -> Vec<String> {
    if all_width <= max_width || text.is_empty() {
        return vec![text.to_owned()];
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for token in tokens(text) {
        let candidate = format!("{current}{token}");
        if measure(candidate.trim_end()) <= max_width {
            current = candidate;
            continue;
        }
        if !current.trim().is_empty() {
            lines.push(current.trim().to_owned());
            current.clear();
        }
        if measure(token.trim_end()) <= max_width {
            current.push_str(token.trim_start());
            continue;
        }
        for ch in token.chars() {
            let mut next = current.clone();
            next.push(ch);
            if measure(next.trim_end()) > max_width && !current.trim().is_empty() {
                lines.push(current.trim().to_owned());
                current.clear();
                if is_unicode_space(ch) {
                    continue;
                }
                current.push(ch);
            } else {
                current = next;
            }
        }
    }
    if !current.trim().is_empty() || lines.is_empty() {
        lines.push(current.trim().to_owned());
    }
    lines
}

// ── Measurement cache ───────────────────────────────────────────────

/// LRU cache of text widths keyed by font description and text.
pub struct MeasureCache {
    cache: LruCache<(String, String), f32>,
}

impl MeasureCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Width of `text` in `font`, measured on `surface` on a miss.
    pub fn measure(&mut self, surface: &mut dyn Surface, font: &Font, text: &str) -> f32 {
        let key = (font.to_string(), text.to_owned());
        if let Some(width) = self.cache.get(&key) {
            return *width;
        }
        if surface.font() != font {
            surface.set_font(font);
        }
        let width = surface.measure_text(text);
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        self.cache.put(key, width);
        width
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
