//! Canvas path: the whole string is measured and drawn on one surface,
//! then uploaded as the label's texture.

use super::{line_height, TextProcessing};
use crate::geometry::{Size, Vec2};
use crate::layout::{HorizontalAlign, LayoutDescriptor, LayoutOutput, Overflow, VerticalAlign};
use crate::output::{DescriptorSetCache, RenderOutput, RenderVertex};
use crate::style::{Color, StyleDescriptor};
use crate::surface::{LineJoin, ShadowStyle, Surface, TextAlign};
use crate::text_utils::{
    fragment_text, MeasureCache, BASELINE_RATIO, INVISIBLE_ALPHA, MIN_FONT_SIZE_SENTINEL,
};

/// Extra right padding of italic text, `tan(12°)` of the font size.
const ITALIC_SLANT: f32 = 0.212_556_56;

/// UVs of a label texture, bottom-left / bottom-right / top-left / top-right.
const LABEL_UV: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];

impl TextProcessing {
    fn canvas_parts(&mut self) -> Option<(&mut Box<dyn Surface>, &mut MeasureCache)> {
        let cache = &mut self.measure_cache;
        self.surface.as_mut().map(|surface| (surface, cache))
    }

    pub(super) fn process_canvas(
        &mut self,
        style: &mut StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &mut LayoutOutput,
        input: &str,
    ) {
        if self.surface.is_none() {
            log::warn!("TextProcessing: no surface, cannot lay out {input:?}");
            return;
        }
        let paragraphs: Vec<&str> = input.split('\n').collect();

        self.font_scale = self.style_font_scale(style.font_size, style.font_scale);
        out.canvas_size = out.node_content_size;
        self.update_padding_rect(style, out);
        self.calculate_label_font(&paragraphs, style, layout, out);

        // Canvas too big: retry with a smaller scale, then give up on scaling.
        let max = self.config.max_canvas_size;
        let retries = self.config.max_calculation_retries;
        let mut loop_time = 0;
        while (out.canvas_size.width > max || out.canvas_size.height > max) && loop_time <= retries
        {
            loop_time += 1;
            if loop_time > retries {
                self.font_scale = 1.0;
            } else {
                let ratio = max / out.canvas_size.width.max(out.canvas_size.height);
                self.font_scale = (self.font_scale * ratio).max(1.0);
            }
            self.update_padding_rect(style, out);
            self.calculate_label_font(&paragraphs, style, layout, out);
        }
        if out.canvas_size.width > max || out.canvas_size.height > max {
            log::debug!(
                "TextProcessing: canvas {}x{} will be clamped to {max}",
                out.canvas_size.width,
                out.canvas_size.height
            );
        }
    }

    fn update_padding_rect(&self, style: &StyleDescriptor, out: &mut LayoutOutput) {
        let (mut top, mut bottom, mut left, mut right) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        let mut outline_width = 0.0;
        out.content_size_extend = Size::ZERO;

        if let Some(outline) = style.outline {
            outline_width = outline.width;
            top = outline_width;
            bottom = outline_width;
            left = outline_width;
            right = outline_width;
            out.content_size_extend = Size::new(outline_width * 2.0, outline_width * 2.0);
        }
        if let Some(shadow) = style.shadow {
            let shadow_width = shadow.blur + outline_width;
            left = left.max(-shadow.offset_x + shadow_width);
            right = right.max(shadow.offset_x + shadow_width);
            top = top.max(shadow.offset_y + shadow_width);
            bottom = bottom.max(-shadow.offset_y + shadow_width);
        }
        if style.is_italic {
            let offset = style.font_size * ITALIC_SLANT;
            right += offset;
            out.content_size_extend.width += offset;
        }
        out.canvas_padding.x = left;
        out.canvas_padding.y = top;
        out.canvas_padding.width = left + right;
        out.canvas_padding.height = top + bottom;
    }

    fn calculate_label_font(
        &mut self,
        paragraphs: &[&str],
        style: &mut StyleDescriptor,
        layout: &mut LayoutDescriptor,
        out: &mut LayoutOutput,
    ) {
        style.actual_font_size = style.font_size * self.font_scale;
        if self.config.integer_font_sizes && style.font_size > 0.0 {
            style.actual_font_size = style.actual_font_size.floor();
            self.font_scale = style.actual_font_size / style.font_size;
        }
        style.font = style.font_at(style.actual_font_size);
        out.parsed_string = paragraphs.iter().map(|p| p.to_string()).collect();

        let fs = self.font_scale;
        match layout.overflow {
            Overflow::None => {
                let Some((surface, cache)) = self.canvas_parts() else {
                    return;
                };
                let raw_width = paragraphs
                    .iter()
                    .map(|p| cache.measure(&mut **surface, &style.font, p))
                    .fold(0.0, f32::max);
                let raw_height = (paragraphs.len() as f32 + BASELINE_RATIO)
                    * line_height(layout.line_height, style.actual_font_size, style.font_size);

                out.canvas_size = Size::new(
                    raw_width + out.canvas_padding.width * fs,
                    raw_height + out.canvas_padding.height * fs,
                );
                out.node_content_size = Size::new(
                    (raw_width + out.content_size_extend.width * fs) / fs,
                    (raw_height + out.content_size_extend.height * fs) / fs,
                );
            }
            Overflow::Shrink => {
                self.calculate_shrink_font(paragraphs, style, layout, out);
                self.calculate_wrap_text(paragraphs, style, layout, out);
                out.canvas_size = Size::new(
                    out.node_content_size.width * fs,
                    out.node_content_size.height * fs,
                );
            }
            Overflow::Clamp => {
                self.calculate_wrap_text(paragraphs, style, layout, out);
                out.canvas_size = Size::new(
                    out.node_content_size.width * fs,
                    out.node_content_size.height * fs,
                );
            }
            Overflow::ResizeHeight => {
                self.calculate_wrap_text(paragraphs, style, layout, out);
                let raw_height = (out.parsed_string.len() as f32 + BASELINE_RATIO)
                    * line_height(layout.line_height, style.actual_font_size, style.font_size);
                out.canvas_size = Size::new(
                    out.node_content_size.width * fs,
                    raw_height + out.canvas_padding.height * fs,
                );
                out.node_content_size.height =
                    (raw_height + out.content_size_extend.height * fs) / fs;
            }
        }
    }

    /// Largest font size whose layout fits the label box.
    fn calculate_shrink_font(
        &mut self,
        paragraphs: &[&str],
        style: &mut StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &LayoutOutput,
    ) {
        let fs = self.font_scale;
        let node = out.node_content_size;
        let padding_width = out.canvas_padding.width;
        let Some((surface, cache)) = self.canvas_parts() else {
            return;
        };

        let size = if layout.wrapping {
            let max_width = node.width * fs;
            let max_height = node.height * fs;
            if max_width < 0.0 || max_height < 0.0 {
                return;
            }
            let mut left = 0i32;
            let mut right = (style.actual_font_size + 1.0) as i32;
            while left < right {
                let mid = (left + right + 1) >> 1;
                if mid <= 0 {
                    break;
                }
                let font = style.font_at(mid as f32);
                let lh = line_height(layout.line_height, mid as f32, style.font_size);
                let mut measure = |text: &str| cache.measure(&mut **surface, &font, text);
                let lines: usize = paragraphs
                    .iter()
                    .map(|&p| {
                        let all = measure(p);
                        fragment_text(p, all, max_width, &mut measure).len()
                    })
                    .sum();
                if lines as f32 * lh > max_height {
                    right = mid - 1;
                } else {
                    left = mid;
                }
            }
            left as f32
        } else {
            let lh = line_height(layout.line_height, style.actual_font_size, style.font_size);
            let total_height = paragraphs.len() as f32 * lh;
            let max_length = paragraphs
                .iter()
                .map(|p| cache.measure(&mut **surface, &style.font, p))
                .fold(0.0, f32::max);
            let scale_x = (node.width - padding_width) * fs / max_length;
            let scale_y = node.height * fs / total_height;
            (style.actual_font_size * 1f32.min(scale_x).min(scale_y)).trunc()
        };

        style.actual_font_size = if size > 0.0 {
            size
        } else {
            log::debug!("TextProcessing: cannot shrink {} to fit the label", style.font);
            MIN_FONT_SIZE_SENTINEL
        };
        style.font = style.font_at(style.actual_font_size);
    }

    fn calculate_wrap_text(
        &mut self,
        paragraphs: &[&str],
        style: &mut StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &mut LayoutOutput,
    ) {
        if !layout.wrapping {
            return;
        }
        let max_width = out.node_content_size.width * self.font_scale;
        let font = style.font_at(style.actual_font_size);
        let Some((surface, cache)) = self.canvas_parts() else {
            return;
        };
        let mut measure = |text: &str| cache.measure(&mut **surface, &font, text);
        out.parsed_string = paragraphs
            .iter()
            .flat_map(|&p| {
                let all = measure(p);
                fragment_text(p, all, max_width, &mut measure)
            })
            .collect();
        style.font = font;
    }

    // ── Rasterization ───────────────────────────────────────────────

    pub(super) fn render_canvas(
        &mut self,
        style: &StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &mut LayoutOutput,
        render: &mut RenderOutput,
        descriptor_cache: Option<&mut (dyn DescriptorSetCache + '_)>,
    ) {
        self.update_label_dimensions(style, layout, out);
        self.update_texture(style, layout, out, render, descriptor_cache);
        generate_vertex_data(out, render);
    }

    fn update_label_dimensions(
        &mut self,
        style: &StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &mut LayoutOutput,
    ) {
        let max = self.config.max_canvas_size;
        out.canvas_size.width = out.canvas_size.width.min(max);
        out.canvas_size.height = out.canvas_size.height.min(max);

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.resize(
            out.canvas_size.width.max(0.0) as u32,
            out.canvas_size.height.max(0.0) as u32,
        );
        surface.set_font(&style.font);
        surface.set_text_align(TextAlign::from(layout.horizontal_align));
    }

    /// Baseline of the first line, in canvas pixels.
    fn fill_text_start_position(
        &self,
        style: &StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &LayoutOutput,
    ) -> Vec2 {
        let actual = style.actual_font_size;
        let lh = line_height(layout.line_height, actual, style.font_size);
        let lines = out.parsed_string.len().max(1) as f32;
        let canvas = out.canvas_size;
        let padding = out.canvas_padding;

        let label_x = match layout.horizontal_align {
            HorizontalAlign::Left => 0.0,
            HorizontalAlign::Center => (canvas.width - padding.width) / 2.0,
            HorizontalAlign::Right => canvas.width - padding.width,
        };

        let mut first_line_y = actual * (1.0 - BASELINE_RATIO / 2.0);
        if layout.vertical_align != VerticalAlign::Top {
            let mut blank = lh * (lines - 1.0) + padding.height + actual - canvas.height;
            match layout.vertical_align {
                VerticalAlign::Bottom => {
                    blank += BASELINE_RATIO / 2.0 * actual;
                    first_line_y -= blank;
                }
                _ => first_line_y -= blank / 2.0,
            }
        }
        first_line_y += self.config.baseline_offset * actual;

        Vec2::new(label_x + padding.x, first_line_y + padding.y)
    }

    fn update_texture(
        &mut self,
        style: &StyleDescriptor,
        layout: &LayoutDescriptor,
        out: &mut LayoutOutput,
        render: &mut RenderOutput,
        descriptor_cache: Option<&mut (dyn DescriptorSetCache + '_)>,
    ) {
        out.start_position = self.fill_text_start_position(style, layout, out);
        let start = out.start_position;
        let fs = self.font_scale;
        let lh = line_height(layout.line_height, style.actual_font_size, style.font_size);
        let Some((surface, cache)) = self.canvas_parts() else {
            return;
        };
        let (w, h) = (surface.width() as f32, surface.height() as f32);

        surface.set_shadow(None);
        surface.clear_rect(0.0, 0.0, w, h);
        surface.set_font(&style.font);

        let background = style.outline.map_or(style.color, |o| o.color);
        surface.set_fill_color(background.with_alpha(INVISIBLE_ALPHA));
        surface.fill_rect(0.0, 0.0, w, h);
        surface.set_fill_color(style.color.with_alpha(255));

        let shadow = style.shadow.map(|s| ShadowStyle {
            color: s.color,
            blur: s.blur * fs,
            offset_x: s.offset_x * fs,
            offset_y: -s.offset_y * fs,
        });

        for (i, line) in out.parsed_string.iter().enumerate() {
            let y = start.y + i as f32 * lh;
            if let Some(shadow) = shadow {
                surface.set_shadow(Some(shadow));
                surface.fill_text(line, start.x, y);
            }
            if let Some(outline) = style.outline {
                surface.set_shadow(None);
                surface.set_stroke(outline.color, outline.width * 2.0 * fs, LineJoin::Round);
                surface.stroke_text(line, start.x, y);
            }
            if shadow.is_none() || style.outline.is_some() {
                surface.fill_text(line, start.x, y);
            }
            if let Some(underline) = style.underline {
                surface.set_shadow(None);
                let width = cache.measure(&mut **surface, &style.font, line);
                let x = match layout.horizontal_align {
                    HorizontalAlign::Left => start.x,
                    HorizontalAlign::Center => start.x - width / 2.0,
                    HorizontalAlign::Right => start.x - width,
                };
                surface.fill_rect(
                    x,
                    y + style.actual_font_size / 8.0,
                    width,
                    underline.height * fs,
                );
            }
        }
        surface.set_shadow(None);

        self.upload_texture(render, descriptor_cache);
    }

    fn upload_texture(
        &mut self,
        render: &mut RenderOutput,
        descriptor_cache: Option<&mut (dyn DescriptorSetCache + '_)>,
    ) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let (w, h) = (surface.width(), surface.height());
        if w == 0 || h == 0 {
            return;
        }
        let Some(texture) = render.texture.as_mut() else {
            log::debug!("TextProcessing: label has no texture, skipping upload");
            return;
        };

        let old = texture.resource_id();
        texture.upload(&surface.to_bitmap());
        render.texture_id = Some(texture.resource_id());
        render.texture_size = Size::new(w as f32, h as f32);
        if let Some(frame) = render.sprite_frame.as_mut() {
            frame.reset_to_texture(w as f32, h as f32);
        }
        if let Some(cache) = descriptor_cache {
            cache.release(old);
        }
    }
}

/// One quad covering the label box.
fn generate_vertex_data(out: &LayoutOutput, render: &mut RenderOutput) {
    let size = out.node_content_size;
    let app_x = render.anchor_x * size.width;
    let app_y = render.anchor_y * size.height;
    let (l, b) = (-app_x, -app_y);
    let (r, t) = (size.width - app_x, size.height - app_y);
    let uv = render.sprite_frame.as_ref().map_or(LABEL_UV, |frame| frame.uv);

    let corner = |i: usize, x: f32, y: f32| RenderVertex {
        x,
        y,
        z: 0.0,
        u: uv[i * 2],
        v: uv[i * 2 + 1],
        color: Color::WHITE,
    };
    render.clear();
    render.push_quad([corner(0, l, b), corner(1, r, b), corner(2, l, t), corner(3, r, t)]);
}
