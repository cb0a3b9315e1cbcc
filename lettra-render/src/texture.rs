//! GPU-backed pixel targets.
//!
//! [`GpuTexture`] lets the letter atlas and canvas labels write straight
//! into a `wgpu::Texture`. [`BindGroupCache`] keeps one bind group per
//! texture resource and drops it when the engine replaces that resource.

use std::collections::HashMap;
use std::sync::Arc;

use lettra_text::{Bitmap, DescriptorSetCache, PixelTarget, TextureId};
use wgpu::{
    Device, Extent3d, Queue, Texture, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView,
};

pub const LABEL_TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

pub struct GpuTexture {
    device: Arc<Device>,
    queue: Arc<Queue>,
    texture: Texture,
    width: u32,
    height: u32,
    id: TextureId,
}

impl GpuTexture {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>, width: u32, height: u32) -> Self {
        let texture = create_texture(&device, width, height);
        Self {
            device,
            queue,
            texture,
            width,
            height,
            id: TextureId::next(),
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn create_view(&self) -> TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn create_texture(device: &Device, width: u32, height: u32) -> Texture {
    device.create_texture(&TextureDescriptor {
        label: Some("lettra_label_texture"),
        // wgpu rejects zero-sized textures.
        size: Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: LABEL_TEXTURE_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

impl PixelTarget for GpuTexture {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn copy_region(&mut self, bitmap: &Bitmap, x: u32, y: u32) {
        if x >= self.width || y >= self.height || bitmap.is_empty() {
            return;
        }
        let width = bitmap.width.min(self.width - x);
        let height = bitmap.height.min(self.height - y);

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &bitmap.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bitmap.width * 4), // RGBA = 4 bytes per pixel
                rows_per_image: Some(bitmap.height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.texture = create_texture(&self.device, width, height);
        self.width = width;
        self.height = height;
        self.id = TextureId::next();
        log::debug!("GpuTexture: recreated {width}x{height} as {:?}", self.id);
    }

    fn resource_id(&self) -> TextureId {
        self.id
    }
}

/// Bind groups keyed by the texture resource they sample.
pub struct BindGroupCache<G = wgpu::BindGroup> {
    groups: HashMap<TextureId, G>,
}

impl<G> Default for BindGroupCache<G> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}

impl<G> BindGroupCache<G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, texture: TextureId) -> Option<&G> {
        self.groups.get(&texture)
    }

    /// Cached group for `texture`, building it with `create` on a miss.
    pub fn get_or_create(&mut self, texture: TextureId, create: impl FnOnce() -> G) -> &G {
        self.groups.entry(texture).or_insert_with(create)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<G> DescriptorSetCache for BindGroupCache<G> {
    fn release(&mut self, texture: TextureId) {
        if self.groups.remove(&texture).is_some() {
            log::trace!("BindGroupCache: released {texture:?}");
        }
    }
}
