//! Bitmap path: one quad per letter, sampled from a shared atlas (letters
//! rasterized on demand) or from a pre-baked bitmap font.
//!
//! Coordinates are label-local with y pointing up. Line 0 sits at
//! `y = 0` and later lines step down by the line height; the alignment
//! pass then lifts everything by `letter_offset_y`.

use super::{GlyphSource, TextProcessing};
use crate::atlas::GlyphDefinition;
use crate::geometry::{Rect, Size};
use crate::layout::{HorizontalAlign, LayoutDescriptor, LayoutOutput, Overflow, VerticalAlign};
use crate::output::{RenderOutput, RenderVertex};
use crate::style::{Color, LabelInfo, StyleDescriptor};
use crate::text_utils::{is_unicode_cjk, is_unicode_space, round2, MIN_FONT_SIZE_SENTINEL};

/// Placement of one character after wrapping.
///
/// Placeholders (`\n`, `\r`, characters with no glyph) keep `valid = false`
/// and are skipped when quads are built.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LetterInfo {
    pub ch: char,
    pub valid: bool,
    pub x: f32,
    pub y: f32,
    pub line: usize,
    /// Unscaled glyph width.
    pub width: f32,
}

impl LetterInfo {
    fn placeholder(ch: char, line: usize) -> Self {
        Self {
            ch,
            line,
            ..Default::default()
        }
    }
}

/// One wrap candidate. Shrink searches produce many of these and keep the
/// last one that was evaluated.
#[derive(Clone, Debug, Default)]
struct WrapResult {
    scale: f32,
    letters: Vec<LetterInfo>,
    lines_width: Vec<f32>,
    number_of_lines: usize,
    desired_height: f32,
    content_size: Size,
    tailored_top_y: f32,
    tailored_bottom_y: f32,
}

impl WrapResult {
    fn is_vertical_clamp(&self) -> bool {
        self.desired_height > self.content_size.height
    }

    fn needs_horizontal_shrink(&self) -> bool {
        self.lines_width
            .iter()
            .any(|&width| width > self.content_size.width)
    }

    fn is_horizontal_clamp(&self, layout: &LayoutDescriptor) -> bool {
        if layout.text_width_temp <= 0.0 {
            return false;
        }
        let content_width = self.content_size.width;
        self.letters.iter().filter(|l| l.valid).any(|letter| {
            let px = letter.x + letter.width * self.scale;
            if layout.wrapping {
                let line_width = self.lines_width.get(letter.line).copied().unwrap_or(0.0);
                line_width > content_width && (px > content_width || px < 0.0)
            } else {
                px > content_width
            }
        })
    }

    fn parsed_string(&self) -> Vec<String> {
        let mut lines = vec![String::new(); self.number_of_lines.max(1)];
        for letter in self.letters.iter().filter(|l| l.valid) {
            if let Some(line) = lines.get_mut(letter.line) {
                line.push(letter.ch);
            }
        }
        lines
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShrinkAxis {
    Vertical,
    Horizontal,
}

/// Line-breaking over one string with one glyph source.
struct Wrapper<'w, 's> {
    source: &'w mut GlyphSource<'s>,
    info: &'w LabelInfo,
    layout: &'w LayoutDescriptor,
    chars: &'w [char],
    line_height: f32,
}

impl Wrapper<'_, '_> {
    fn glyph(&mut self, ch: char) -> Option<GlyphDefinition> {
        self.source.resolve(ch, self.info)
    }

    /// Length of the token starting at `start`: a single CJK character,
    /// space or newline, or a run up to the next break that fits the line.
    fn first_word_len(&mut self, start: usize, scale: f32) -> usize {
        let ch = self.chars[start];
        if is_unicode_cjk(ch) || ch == '\n' || ch == '\r' || is_unicode_space(ch) {
            return 1;
        }
        let Some(def) = self.glyph(ch) else {
            return 1;
        };

        let max_width = self.layout.max_line_width;
        let spacing = self.layout.spacing_x;
        let mut len = 1;
        let mut next_x = def.x_advance * scale + spacing;
        for index in start + 1..self.chars.len() {
            let ch = self.chars[index];
            if ch == '\n' || ch == '\r' {
                break;
            }
            let Some(def) = self.glyph(ch) else {
                break;
            };
            let letter_x = next_x + def.offset_x * scale;
            if max_width > 0.0 && letter_x + def.w * scale > max_width && !is_unicode_space(ch) {
                return len;
            }
            next_x += def.x_advance * scale + spacing;
            if is_unicode_space(ch) || is_unicode_cjk(ch) {
                break;
            }
            len += 1;
        }
        len
    }

    fn wrap(&mut self, scale: f32) -> WrapResult {
        let layout = self.layout;
        let chars = self.chars;
        let len = chars.len();
        let line_advance = self.line_height
            * if layout.overflow == Overflow::Shrink {
                scale
            } else {
                1.0
            };
        let margin = self.info.margin;
        let kerning = &layout.horizontal_kerning;

        let mut letters: Vec<LetterInfo> = chars
            .iter()
            .map(|&ch| LetterInfo::placeholder(ch, 0))
            .collect();
        let mut lines_width = Vec::new();
        let mut line = 0usize;
        let mut next_token_x = 0.0f32;
        let mut next_token_y = 0.0f32;
        let mut longest_line = 0.0f32;
        let mut letter_right = 0.0f32;
        let mut highest_y = 0.0f32;
        let mut lowest_y = 0.0f32;

        let mut index = 0;
        while index < len {
            let ch = chars[index];
            if ch == '\n' {
                lines_width.push(letter_right);
                letter_right = 0.0;
                line += 1;
                next_token_x = 0.0;
                next_token_y -= line_advance;
                letters[index] = LetterInfo::placeholder(ch, line);
                index += 1;
                continue;
            }

            let token_len = self.first_word_len(index, scale).min(len - index);
            let mut token_highest_y = highest_y;
            let mut token_lowest_y = lowest_y;
            let mut token_right = letter_right;
            let mut next_letter_x = next_token_x;
            let mut new_line = false;

            for letter_index in index..index + token_len {
                let ch = chars[letter_index];
                if ch == '\r' {
                    letters[letter_index] = LetterInfo::placeholder(ch, line);
                    continue;
                }
                let Some(def) = self.glyph(ch) else {
                    letters[letter_index] = LetterInfo::placeholder(ch, line);
                    log::warn!(
                        "TextProcessing: no glyph for {ch:?} in {}",
                        self.source.name(self.info)
                    );
                    continue;
                };

                let letter_x = next_letter_x + def.offset_x * scale - margin;
                if layout.wrapping
                    && layout.max_line_width > 0.0
                    && next_token_x > 0.0
                    && letter_x + def.w * scale > layout.max_line_width
                    && !is_unicode_space(ch)
                {
                    lines_width.push(letter_right);
                    letter_right = 0.0;
                    line += 1;
                    next_token_x = 0.0;
                    next_token_y -= line_advance;
                    new_line = true;
                    break;
                }

                let y = next_token_y - def.offset_y * scale;
                letters[letter_index] = LetterInfo {
                    ch,
                    valid: def.valid,
                    x: letter_x,
                    y,
                    line,
                    width: def.w,
                };

                if letter_index + 1 < kerning.len() && letter_index + 1 < len {
                    next_letter_x += kerning[letter_index + 1] * scale;
                }
                next_letter_x += def.x_advance * scale + layout.spacing_x;

                token_right = letter_x + def.w * scale;
                token_highest_y = token_highest_y.max(y);
                token_lowest_y = token_lowest_y.min(y - def.h * scale);
            }

            if new_line {
                continue;
            }

            next_token_x = next_letter_x;
            letter_right = token_right;
            highest_y = highest_y.max(token_highest_y);
            lowest_y = lowest_y.min(token_lowest_y);
            longest_line = longest_line.max(letter_right);
            index += token_len;
        }
        lines_width.push(letter_right);

        let number_of_lines = line + 1;
        let desired_height = number_of_lines as f32 * line_advance;

        let mut content_size = Size::new(layout.text_width_temp, layout.text_height_temp);
        if layout.text_width_temp <= 0.0 {
            content_size.width = round2(longest_line) + margin * 2.0;
        }
        if layout.text_height_temp <= 0.0 {
            content_size.height = round2(desired_height) + margin * 2.0;
        }

        let tailored_top_y = if highest_y > 0.0 {
            content_size.height + highest_y
        } else {
            content_size.height
        };
        let tailored_bottom_y = if lowest_y < -desired_height {
            desired_height + lowest_y
        } else {
            0.0
        };

        WrapResult {
            scale,
            letters,
            lines_width,
            number_of_lines,
            desired_height,
            content_size,
            tailored_top_y,
            tailored_bottom_y,
        }
    }

    /// Binary search for the largest integer font size whose wrap no longer
    /// clamps on `axis`. Leaves the winning wrap in `result`; when no size
    /// fits the font size becomes the sentinel and the last candidate stays.
    fn shrink(
        &mut self,
        result: &mut WrapResult,
        style: &mut StyleDescriptor,
        base: f32,
        axis: ShrinkAxis,
    ) {
        let mut left = 0i32;
        let mut right = style.actual_font_size as i32;
        while left < right {
            let mid = (left + right + 1) >> 1;
            if mid <= 0 {
                break;
            }
            let candidate = self.wrap(mid as f32 / base);
            let clamps = match axis {
                ShrinkAxis::Vertical => candidate.is_vertical_clamp(),
                ShrinkAxis::Horizontal => candidate.is_horizontal_clamp(self.layout),
            };
            if clamps {
                right = mid - 1;
            } else {
                left = mid;
            }
            style.bmfont_scale = candidate.scale;
            *result = candidate;
        }

        if left > 0 {
            style.actual_font_size = left as f32;
            style.bmfont_scale = left as f32 / base;
            *result = self.wrap(style.bmfont_scale);
        } else {
            log::debug!(
                "TextProcessing: cannot shrink {:?} to fit {}x{}",
                self.chars.iter().collect::<String>(),
                result.content_size.width,
                result.content_size.height
            );
            style.actual_font_size = MIN_FONT_SIZE_SENTINEL;
        }
    }
}

impl GlyphSource<'_> {
    /// Size the glyphs were authored at.
    fn origin_font_size(&self, style: &StyleDescriptor) -> f32 {
        match self {
            GlyphSource::Letters { .. } => style.font_size,
            GlyphSource::Bitmap(font) => font.font_size(),
        }
    }

    fn label_info(&self, style: &StyleDescriptor, line_height: f32, font_scale: f32) -> LabelInfo {
        match self {
            GlyphSource::Letters { .. } => LabelInfo::for_letters(style, line_height, font_scale),
            GlyphSource::Bitmap(font) => {
                LabelInfo::for_bitmap_font(style, line_height, font.font_size())
            }
        }
    }
}

fn bitmap_line_height(layout: &LayoutDescriptor, style: &StyleDescriptor) -> f32 {
    if layout.line_height > 0.0 {
        layout.line_height
    } else {
        style.font_size
    }
}

impl TextProcessing {
    pub(super) fn process_bitmap(
        &mut self,
        source: &mut GlyphSource<'_>,
        style: &mut StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &mut LayoutOutput,
        input: &str,
    ) {
        let chars: Vec<char> = input.chars().collect();
        let origin = source.origin_font_size(style);

        style.actual_font_size = style.font_size;
        self.font_scale = if source.is_bitmap_font() {
            1.0
        } else {
            self.style_font_scale(origin, style.font_scale)
        };
        let line_height = bitmap_line_height(layout, style);
        let info = source.label_info(style, line_height, self.font_scale);

        self.setup_overflow_metrics(layout, out);
        let base = origin * self.font_scale;
        style.bmfont_scale = if base > 0.0 {
            style.actual_font_size / base
        } else {
            1.0
        };
        compute_kerning(source, layout, &chars);

        let result = {
            let mut wrapper = Wrapper {
                source: &mut *source,
                info: &info,
                layout: &*layout,
                chars: &chars,
                line_height,
            };
            let mut result = wrapper.wrap(style.bmfont_scale);
            if layout.overflow == Overflow::Shrink && base > 0.0 {
                if style.font_size > 0.0 && result.is_vertical_clamp() {
                    wrapper.shrink(&mut result, style, base, ShrinkAxis::Vertical);
                }
                if style.font_size > 0.0 && result.needs_horizontal_shrink() {
                    wrapper.shrink(&mut result, style, base, ShrinkAxis::Horizontal);
                }
            }
            result
        };

        style.font = style.font_at(style.actual_font_size);
        out.parsed_string = result.parsed_string();
        out.node_content_size = result.content_size;
        layout.lines_width = result.lines_width;
        layout.number_of_lines = result.number_of_lines;
        layout.text_desired_height = result.desired_height;
        layout.tailored_top_y = result.tailored_top_y;
        layout.tailored_bottom_y = result.tailored_bottom_y;
        self.letters = result.letters;
    }

    fn setup_overflow_metrics(&self, layout: &mut LayoutDescriptor, out: &LayoutOutput) {
        let mut width = out.node_content_size.width;
        let mut height = out.node_content_size.height;
        match layout.overflow {
            Overflow::ResizeHeight => height = 0.0,
            Overflow::None => {
                width = 0.0;
                height = 0.0;
            }
            Overflow::Clamp | Overflow::Shrink => {}
        }
        layout.text_width_temp = width;
        layout.text_height_temp = height;
        layout.max_line_width = width;
    }

    pub(super) fn render_bitmap(
        &mut self,
        source: &mut GlyphSource<'_>,
        style: &StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &LayoutOutput,
        render: &mut RenderOutput,
        input: &str,
    ) {
        render.clear();
        render.texture_id = Some(source.texture_id());
        render.texture_size = source.texture_size();
        render.color = style.color;

        if self.letters.len() != input.chars().count() {
            log::warn!("TextProcessing: layout is stale for {input:?}, process it first");
            return;
        }

        let line_height = bitmap_line_height(layout, style);
        self.compute_alignment_offset(source, style, layout, out, line_height);
        let info = source.label_info(style, line_height, self.font_scale);
        self.update_quads(source, &info, style, layout, out, render);
    }

    fn compute_alignment_offset(
        &self,
        source: &GlyphSource<'_>,
        style: &StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &LayoutOutput,
        line_height: f32,
    ) {
        let content = out.node_content_size;
        layout.lines_offset_x = match layout.horizontal_align {
            HorizontalAlign::Left => vec![0.0; layout.number_of_lines],
            HorizontalAlign::Center => layout
                .lines_width
                .iter()
                .map(|width| (content.width - width) / 2.0)
                .collect(),
            HorizontalAlign::Right => layout
                .lines_width
                .iter()
                .map(|width| content.width - width)
                .collect(),
        };

        layout.letter_offset_y = content.height;
        if layout.vertical_align != VerticalAlign::Top {
            let line_scale = if layout.overflow == Overflow::Shrink {
                style.bmfont_scale
            } else {
                1.0
            };
            let origin = source.origin_font_size(style);
            let blank = content.height - layout.text_desired_height + line_height * line_scale
                - origin * self.font_scale * style.bmfont_scale;
            match layout.vertical_align {
                VerticalAlign::Bottom => layout.letter_offset_y -= blank,
                _ => layout.letter_offset_y -= blank / 2.0,
            }
        }
    }

    fn update_quads(
        &self,
        source: &GlyphSource<'_>,
        info: &LabelInfo,
        style: &StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &LayoutOutput,
        render: &mut RenderOutput,
    ) {
        let content = out.node_content_size;
        let anchor_x = render.anchor_x * content.width;
        let anchor_y = render.anchor_y * content.height;
        let scale = style.bmfont_scale;
        let texture_size = source.texture_size();
        let frame = source.sprite_frame();

        for letter in self.letters.iter().filter(|l| l.valid) {
            let Some(def) = source.cached(letter.ch, info) else {
                log::warn!(
                    "TextProcessing: {:?} vanished from {}",
                    letter.ch,
                    source.name(info)
                );
                continue;
            };

            let mut rect = def.rect();
            let mut py = letter.y + layout.letter_offset_y;
            if layout.text_height_temp > 0.0 {
                if py > layout.tailored_top_y {
                    let clip_top = py - layout.tailored_top_y;
                    rect.y += clip_top;
                    rect.height = (rect.height - clip_top).max(0.0);
                    py -= clip_top;
                }
                if py - rect.height * scale < layout.tailored_bottom_y
                    && layout.overflow == Overflow::Clamp
                {
                    rect.height = if py < layout.tailored_bottom_y {
                        0.0
                    } else {
                        (py - layout.tailored_bottom_y) / scale
                    };
                }
            }

            let line_offset = layout
                .lines_offset_x
                .get(letter.line)
                .copied()
                .unwrap_or(0.0);
            let px = letter.x + rect.width / 2.0 * scale + line_offset;
            if layout.text_width_temp > 0.0
                && layout.overflow == Overflow::Clamp
                && is_letter_clamped(layout, content, px, letter.line)
            {
                rect.width = 0.0;
            }

            if rect.height > 0.0 && rect.width > 0.0 {
                let rotated = frame.is_some_and(|frame| frame.map_glyph_rect(&mut rect));
                render.push_quad(letter_quad(
                    rect,
                    rotated,
                    texture_size,
                    letter.x + line_offset - anchor_x,
                    py - anchor_y,
                    scale,
                    style.color,
                ));
            }
        }
    }
}

/// Kerning between each letter and the one before it. Only bitmap fonts
/// carry kerning tables.
fn compute_kerning(source: &GlyphSource<'_>, layout: &mut LayoutDescriptor, chars: &[char]) {
    layout.horizontal_kerning.clear();
    let GlyphSource::Bitmap(font) = source else {
        return;
    };
    layout.horizontal_kerning.resize(chars.len(), 0.0);
    for (i, pair) in chars.windows(2).enumerate() {
        layout.horizontal_kerning[i + 1] = font.kerning_amount(pair[0], pair[1]);
    }
}

fn is_letter_clamped(layout: &LayoutDescriptor, content: Size, px: f32, line: usize) -> bool {
    let over = px > content.width || px < 0.0;
    if layout.wrapping {
        let line_width = layout.lines_width.get(line).copied().unwrap_or(0.0);
        line_width > content.width && over
    } else {
        over
    }
}

/// Four vertices for a glyph whose top-left corner lands at `(x, y)`.
fn letter_quad(
    rect: Rect,
    rotated: bool,
    texture: Size,
    x: f32,
    y: f32,
    scale: f32,
    color: Color,
) -> [RenderVertex; 4] {
    let norm = |value: f32, size: f32| if size > 0.0 { value / size } else { 0.0 };
    let l = norm(rect.x, texture.width);
    let t = norm(rect.y, texture.height);
    let uv = if rotated {
        let r = norm(rect.x + rect.height, texture.width);
        let b = norm(rect.y + rect.width, texture.height);
        [(l, t), (l, b), (r, t), (r, b)]
    } else {
        let r = norm(rect.x + rect.width, texture.width);
        let b = norm(rect.y + rect.height, texture.height);
        [(l, b), (r, b), (l, t), (r, t)]
    };

    let (w, h) = (rect.width * scale, rect.height * scale);
    let pos = [(x, y - h), (x + w, y - h), (x, y), (x + w, y)];
    let mut quad = [RenderVertex::default(); 4];
    for (vertex, ((px, py), (u, v))) in quad.iter_mut().zip(pos.into_iter().zip(uv)) {
        *vertex = RenderVertex {
            x: px,
            y: py,
            z: 0.0,
            u,
            v,
            color,
        };
    }
    quad
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::atlas::LetterAtlas;
    use crate::bitmap_font::{BitmapFont, BitmapFontConfig, FntGlyph, KerningPair, SpriteFrame};
    use crate::config::EngineConfig;
    use crate::pool::CanvasPool;
    use crate::processing::RenderStrategy;

    fn glyph(x: f32, w: f32, h: f32, advance: f32) -> FntGlyph {
        FntGlyph {
            rect: Rect::new(x, 0.0, w, h),
            x_offset: 0.0,
            y_offset: 0.0,
            x_advance: advance,
        }
    }

    /// 20px font, every glyph a 10x20 cell laid out left to right.
    fn mono_config() -> BitmapFontConfig {
        let glyphs: HashMap<u32, FntGlyph> = ['a', 'b', 'c', ' ']
            .iter()
            .enumerate()
            .map(|(i, &ch)| (ch as u32, glyph(i as f32 * 10.0, 10.0, 20.0, 10.0)))
            .collect();
        BitmapFontConfig {
            atlas_name: "mono".into(),
            font_size: 20.0,
            common_height: 20.0,
            texture_width: 100,
            texture_height: 100,
            glyphs,
            kerning: Vec::new(),
            sprite_frame: None,
        }
    }

    struct Label {
        engine: TextProcessing,
        style: StyleDescriptor,
        layout: LayoutDescriptor,
        out: LayoutOutput,
        render: RenderOutput,
    }

    fn label(layout: LayoutDescriptor, width: f32, height: f32) -> Label {
        let mut pool = CanvasPool::fixed_pitch(1);
        Label {
            engine: TextProcessing::new(EngineConfig::default(), &mut pool),
            style: StyleDescriptor::new("mono", 20.0),
            layout,
            out: LayoutOutput::with_content_size(width, height),
            render: RenderOutput::new(),
        }
    }

    impl Label {
        fn process(&mut self, font: &BitmapFont, text: &str) {
            let mut strategy = RenderStrategy::bitmap(font);
            self.engine.processing_string(
                &mut strategy,
                &mut self.style,
                &mut self.layout,
                &mut self.out,
                text,
            );
        }

        fn render(&mut self, font: &BitmapFont, text: &str) {
            self.process(font, text);
            let mut strategy = RenderStrategy::bitmap(font);
            self.engine.generate_render_info(
                &mut strategy,
                &mut self.style,
                &mut self.layout,
                &mut self.out,
                &mut self.render,
                text,
            );
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_single_line_quads() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.render(&font, "abc");

        assert_eq!(l.out.parsed_string, vec!["abc"]);
        assert_eq!(l.out.node_content_size, Size::new(30.0, 20.0));
        let xs: Vec<f32> = l.engine.letters().iter().map(|l| l.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0]);

        assert_eq!(l.render.quad_count, 12);
        assert_eq!(l.render.texture_id, Some(font.texture_id()));
        let a: Vec<_> = l.render.quads().next().unwrap().to_vec();
        assert_eq!((a[0].x, a[0].y), (-15.0, -10.0));
        assert_eq!((a[3].x, a[3].y), (-5.0, 10.0));
        assert!(approx(a[1].u, 0.1) && approx(a[0].v, 0.2) && a[2].v == 0.0);
    }

    #[test]
    fn test_bitmap_label_info_uses_authored_size() {
        let font = BitmapFont::from_config(mono_config());
        let source = GlyphSource::Bitmap(&font);
        let style = StyleDescriptor::new("mono", 40.0);

        let info = source.label_info(&style, 20.0, 1.0);
        assert_eq!(info.font_size, 20.0);
        assert_eq!(info.font_size, source.origin_font_size(&style));
        assert_eq!(info.margin, 0.0);
    }

    #[test]
    fn test_kerning_pairs_every_neighbour() {
        let mut config = mono_config();
        config.kerning.push(KerningPair {
            first: 'a' as u32,
            second: 'b' as u32,
            amount: -2.0,
        });
        let font = BitmapFont::from_config(config);
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.process(&font, "abab");

        assert_eq!(l.layout.horizontal_kerning, vec![0.0, -2.0, 0.0, -2.0]);
        let xs: Vec<f32> = l.engine.letters().iter().map(|l| l.x).collect();
        assert_eq!(xs, vec![0.0, 8.0, 18.0, 26.0]);
    }

    #[test]
    fn test_wrap_breaks_before_word() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Clamp, true), 25.0, 100.0);
        l.process(&font, "ab ab");

        assert_eq!(l.layout.number_of_lines, 2);
        assert_eq!(l.out.parsed_string, vec!["ab ", "ab"]);
        assert_eq!(l.layout.lines_width, vec![30.0, 20.0]);
        let second = l.engine.letters()[3];
        assert_eq!((second.x, second.y, second.line), (0.0, -20.0, 1));
    }

    #[test]
    fn test_newline_and_carriage_return_are_placeholders() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.process(&font, "a\r\nb");

        assert_eq!(l.out.parsed_string, vec!["a", "b"]);
        let letters = l.engine.letters();
        assert!(!letters[1].valid && !letters[2].valid);
        assert_eq!(l.layout.text_desired_height, 40.0);
    }

    #[test]
    fn test_missing_glyph_is_skipped() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.render(&font, "a?b");

        assert!(!l.engine.letters()[1].valid);
        assert_eq!(l.engine.letters()[2].x, 10.0);
        assert_eq!(l.out.parsed_string, vec!["ab"]);
        assert_eq!(l.render.quad_count, 8);
    }

    #[test]
    fn test_clamp_drops_letters_past_the_right_edge() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Clamp, false), 24.0, 20.0);
        l.render(&font, "abc");
        assert_eq!(l.render.quad_count, 8);
    }

    #[test]
    fn test_clamp_trims_bottom_line() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Clamp, false), 100.0, 30.0);
        l.render(&font, "a\nb");

        let quads: Vec<Vec<RenderVertex>> = l.render.quads().map(|q| q.to_vec()).collect();
        assert_eq!(quads.len(), 2);
        let b = &quads[1];
        assert_eq!((b[0].x, b[0].y), (-50.0, -15.0));
        assert_eq!(b[2].y, -5.0);
        assert!(approx(b[0].v, 0.1), "uv follows the trimmed height");
    }

    #[test]
    fn test_center_alignment() {
        let font = BitmapFont::from_config(mono_config());
        let layout = LayoutDescriptor::new(Overflow::Clamp, false)
            .aligned(HorizontalAlign::Center, VerticalAlign::Center);
        let mut l = label(layout, 100.0, 60.0);
        l.render(&font, "ab");

        assert_eq!(l.layout.lines_offset_x, vec![40.0]);
        assert_eq!(l.layout.letter_offset_y, 40.0);
        let a = l.render.quads().next().unwrap().to_vec();
        assert_eq!((a[0].x, a[0].y, a[2].y), (-10.0, -10.0, 10.0));
    }

    #[test]
    fn test_bottom_right_alignment() {
        let font = BitmapFont::from_config(mono_config());
        let layout = LayoutDescriptor::new(Overflow::Clamp, false)
            .aligned(HorizontalAlign::Right, VerticalAlign::Bottom);
        let mut l = label(layout, 100.0, 60.0);
        l.render(&font, "ab");

        let last = l.render.quads().last().unwrap().to_vec();
        assert_eq!((last[1].x, last[1].y), (50.0, -30.0));
    }

    #[test]
    fn test_vertical_shrink() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Shrink, false), 100.0, 30.0);
        l.process(&font, "a\nb");

        assert_eq!(l.style.actual_font_size, 15.0);
        assert!(approx(l.style.bmfont_scale, 0.75));
        assert!(approx(l.layout.text_desired_height, 30.0));
    }

    #[test]
    fn test_horizontal_shrink() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Shrink, false), 25.0, 100.0);
        l.process(&font, "abc");

        assert_eq!(l.style.actual_font_size, 16.0);
        assert!(approx(l.layout.lines_width[0], 24.0));
    }

    #[test]
    fn test_shrink_is_idempotent() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Shrink, false), 100.0, 30.0);
        l.process(&font, "a\nb");
        let first = (l.style.actual_font_size, l.out.clone(), l.engine.letters().to_vec());
        l.process(&font, "a\nb");
        assert_eq!(first, (l.style.actual_font_size, l.out.clone(), l.engine.letters().to_vec()));
    }

    #[test]
    fn test_impossible_shrink_hits_sentinel() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::Shrink, false), 1.0, 0.5);
        l.process(&font, "ab");

        assert_eq!(l.style.actual_font_size, MIN_FONT_SIZE_SENTINEL);
        assert!(approx(l.style.bmfont_scale, 0.05), "smallest candidate is kept");
        assert_eq!(l.out.parsed_string, vec!["ab"]);
    }

    #[test]
    fn test_rotated_sprite_frame_uvs() {
        let mut config = mono_config();
        let mut frame = SpriteFrame::new(
            Rect::new(0.0, 0.0, 100.0, 100.0),
            Size::new(200.0, 200.0),
        );
        frame.rotated = true;
        config.sprite_frame = Some(frame);
        let font = BitmapFont::from_config(config);
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.render(&font, "a");

        let q = l.render.quads().next().unwrap().to_vec();
        let uv: Vec<(f32, f32)> = q.iter().map(|v| (v.u, v.v)).collect();
        let expected = [(0.4, 0.0), (0.4, 0.05), (0.5, 0.0), (0.5, 0.05)];
        for (got, want) in uv.iter().zip(expected) {
            assert!(approx(got.0, want.0) && approx(got.1, want.1), "{got:?} != {want:?}");
        }
    }

    #[test]
    fn test_stale_layout_renders_nothing() {
        let font = BitmapFont::from_config(mono_config());
        let mut l = label(LayoutDescriptor::new(Overflow::None, false), 0.0, 0.0);
        l.process(&font, "abc");
        let mut strategy = RenderStrategy::bitmap(&font);
        l.engine.generate_render_info(
            &mut strategy,
            &mut l.style,
            &mut l.layout,
            &mut l.out,
            &mut l.render,
            "abcabc",
        );
        assert_eq!(l.render.quad_count, 0);
    }

    #[test]
    fn test_letters_are_rasterized_once() {
        let mut pool = CanvasPool::fixed_pitch(2);
        let mut atlas = LetterAtlas::new(256, 256);
        let mut engine = TextProcessing::new(EngineConfig::default(), &mut pool);
        let mut style = StyleDescriptor::new("Arial", 20.0);
        let mut layout = LayoutDescriptor::new(Overflow::None, false);
        let mut out = LayoutOutput::default();
        let mut render = RenderOutput::new();

        for _ in 0..2 {
            let mut strategy = RenderStrategy::letters(&mut atlas, &mut pool);
            engine.processing_string(&mut strategy, &mut style, &mut layout, &mut out, "aba");
            engine.generate_render_info(
                &mut strategy,
                &mut style,
                &mut layout,
                &mut out,
                &mut render,
                "aba",
            );
        }

        assert_eq!(atlas.glyph_count(), 2);
        assert_eq!(engine.letters()[1].x, 10.0);
        assert_eq!(out.parsed_string, vec!["aba"]);
        assert_eq!(render.quad_count, 12);
        assert_eq!(render.texture_id, Some(atlas.texture_id()));
        assert!(layout.horizontal_kerning.is_empty());
    }
}
