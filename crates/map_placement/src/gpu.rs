//! Compute-device handle and host readback helpers.
//!
//! [`GpuContext`] owns (or wraps) the `wgpu` device/queue pair the placement
//! pipeline dispatches on. The headless constructor is sufficient for tests,
//! benches and tools; applications that already own a device wrap it with
//! [`GpuContext::from_device`].
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared handle to a compute device.
///
/// Cloning is cheap; all clones refer to the same device and queue.
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

fn backends_from_env() -> wgpu::Backends {
    if let Ok(s) = std::env::var("WGPU_BACKENDS").or_else(|_| std::env::var("WGPU_BACKEND")) {
        let s = s.to_lowercase();
        if s.contains("metal") {
            return wgpu::Backends::METAL;
        }
        if s.contains("vulkan") {
            return wgpu::Backends::VULKAN;
        }
        if s.contains("dx12") {
            return wgpu::Backends::DX12;
        }
        if s.contains("gl") {
            return wgpu::Backends::GL;
        }
    }
    wgpu::Backends::all()
}

impl GpuContext {
    /// Acquire an adapter and device without a surface.
    ///
    /// The backend can be forced through the `WGPU_BACKENDS` environment
    /// variable. Fails with [`Error::Device`] when no adapter is available.
    pub fn headless() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: backends_from_env(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| Error::Device("no suitable adapter".into()))?;

        let mut limits = adapter.limits();
        limits = limits.using_resolution(wgpu::Limits::downlevel_defaults());
        limits.max_storage_buffers_per_shader_stage =
            limits.max_storage_buffers_per_shader_stage.max(8);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("map_placement-device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
            },
            None,
        ))
        .map_err(|e| Error::Device(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }

    /// Wrap an existing device/queue pair owned by the caller.
    pub fn from_device(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Storage-buffer sub-range offsets must be multiples of this.
    pub fn storage_alignment(&self) -> u64 {
        self.device.limits().min_storage_buffer_offset_alignment as u64
    }
}

/// Synchronously read a mappable buffer range back to the host.
///
/// The buffer must have been created with `MAP_READ` usage and the copy into
/// it must already be submitted.
pub(crate) fn read_mappable_buffer(ctx: &GpuContext, buffer: &wgpu::Buffer) -> Result<Vec<u8>> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    ctx.device().poll(wgpu::Maintain::Wait);

    pollster::block_on(receiver.receive())
        .ok_or_else(|| Error::DeviceLost("map_async callback dropped".into()))?
        .map_err(|e| Error::DeviceLost(format!("buffer map failed: {e:?}")))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();
    Ok(data)
}
