//! RGBA pixel buffer shared by the surface backends.

use std::collections::HashMap;

use super::{Bitmap, ShadowStyle};
use crate::style::Color;

#[derive(Clone, Debug)]
pub(crate) struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width as usize * height as usize * 4, 0);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Pixel span covered by `[start, start + len)`, clamped to `limit`.
    fn span(start: f32, len: f32, limit: u32) -> (i32, i32) {
        let lo = start.round().max(0.0) as i32;
        let hi = (start + len).round().min(limit as f32) as i32;
        (lo, hi)
    }

    pub fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let (x0, x1) = Self::span(x, width, self.width);
        let (y0, y1) = Self::span(y, height, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                if let Some(i) = self.index(px, py) {
                    self.data[i..i + 4].fill(0);
                }
            }
        }
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let (x0, x1) = Self::span(x, width, self.width);
        let (y0, y1) = Self::span(y, height, self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 255);
            }
        }
    }

    /// Source-over blend of `color` scaled by `coverage`.
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: u8) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let sa = color.a as u32 * coverage as u32 / 255;
        if sa == 0 {
            return;
        }
        let dst = &mut self.data[i..i + 4];
        let da = dst[3] as u32;
        let keep = da * (255 - sa) / 255;
        let out_a = sa + keep;
        if out_a == 0 {
            return;
        }
        let src = [color.r, color.g, color.b];
        for c in 0..3 {
            dst[c] = ((src[c] as u32 * sa + dst[c] as u32 * keep) / out_a) as u8;
        }
        dst[3] = out_a.min(255) as u8;
    }

    /// Separable box blur of the alpha-weighted image.
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let r = radius as i32;
        let (w, h) = (self.width as i32, self.height as i32);
        for horizontal in [true, false] {
            let src = self.data.clone();
            for y in 0..h {
                for x in 0..w {
                    let mut acc = [0u32; 4];
                    let mut count = 0u32;
                    for d in -r..=r {
                        let (sx, sy) = if horizontal { (x + d, y) } else { (x, y + d) };
                        if sx < 0 || sy < 0 || sx >= w || sy >= h {
                            continue;
                        }
                        let j = ((sy * w + sx) * 4) as usize;
                        for c in 0..4 {
                            acc[c] += src[j + c] as u32;
                        }
                        count += 1;
                    }
                    let i = ((y * w + x) * 4) as usize;
                    for c in 0..4 {
                        self.data[i + c] = (acc[c] / count.max(1)) as u8;
                    }
                }
            }
        }
    }

    /// Blend `layer` on top of this buffer.
    pub fn composite(&mut self, layer: &PixelBuffer) {
        for (i, px) in layer.data.chunks_exact(4).enumerate() {
            if px[3] == 0 {
                continue;
            }
            let x = (i as u32 % layer.width) as i32;
            let y = (i as u32 / layer.width) as i32;
            self.blend(x, y, Color::rgba(px[0], px[1], px[2], px[3]), 255);
        }
    }

    /// Run `paint` once for the shadow (offset, blurred) and once for the
    /// shape itself.
    pub fn paint_shadowed(
        &mut self,
        shadow: Option<&ShadowStyle>,
        color: Color,
        mut paint: impl FnMut(&mut PixelBuffer, Color, f32, f32),
    ) {
        if let Some(shadow) = shadow.filter(|s| s.color.a > 0) {
            let mut layer = PixelBuffer::new(self.width, self.height);
            paint(&mut layer, shadow.color, shadow.offset_x, shadow.offset_y);
            layer.box_blur((shadow.blur / 2.0).round().max(0.0) as u32);
            self.composite(&layer);
        }
        paint(self, color, 0.0, 0.0);
    }

    pub fn to_bitmap(&self) -> Bitmap {
        Bitmap {
            width: self.width,
            height: self.height,
            data: self.data.clone(),
        }
    }
}

/// Pixel offsets covering a disc of `radius`, used to fake round-joined
/// strokes by dilating a fill.
pub(crate) fn disc_offsets(radius: f32) -> Vec<(i32, i32)> {
    let r = radius.ceil() as i32;
    if r <= 0 {
        return vec![(0, 0)];
    }
    let limit = radius * radius;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if (dx * dx + dy * dy) as f32 <= limit {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Glyph coverage keyed by pixel. Overlapping stamps keep the strongest
/// coverage so a dilated stroke blends exactly once per pixel.
#[derive(Clone, Debug, Default)]
pub(crate) struct CoverageMask {
    cells: HashMap<(i32, i32), u8>,
}

impl CoverageMask {
    pub fn stamp(&mut self, x: i32, y: i32, alpha: u8) {
        if alpha == 0 {
            return;
        }
        let cell = self.cells.entry((x, y)).or_insert(0);
        *cell = (*cell).max(alpha);
    }

    /// Mask grown by every offset in `offsets`.
    pub fn dilate(&self, offsets: &[(i32, i32)]) -> CoverageMask {
        let mut out = CoverageMask::default();
        for (&(x, y), &alpha) in &self.cells {
            for &(dx, dy) in offsets {
                out.stamp(x + dx, y + dy, alpha);
            }
        }
        out
    }

    #[cfg(test)]
    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.cells.get(&(x, y)).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.cells.iter().map(|(&(x, y), &a)| (x, y, a))
    }
}
