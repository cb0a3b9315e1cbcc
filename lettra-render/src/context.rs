//! GPU context. Owns the `wgpu::Device` and `Queue` label textures are
//! created on.
//!
//! Only the headless path exists: labels render into textures that the
//! host engine composites, so no surface is ever configured here.

use std::sync::Arc;

use thiserror::Error;
use wgpu::{Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, Queue, RequestAdapterOptions};

use crate::texture::GpuTexture;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Device and queue shared by every texture built from this context.
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    pub adapter: Adapter,
}

impl GpuContext {
    /// Create a headless context (no window, no surface).
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("lettra-headless"),
                    ..Default::default()
                },
                None,
            )
            .await?;
        log::info!("GpuContext: using {}", adapter.get_info().name);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter,
        })
    }

    /// A `width` x `height` RGBA texture usable as an atlas or label target.
    pub fn create_texture(&self, width: u32, height: u32) -> GpuTexture {
        GpuTexture::new(self.device.clone(), self.queue.clone(), width, height)
    }
}

// ===================================================================
// Tests
// ===================================================================
