//! Result views over a finished placement dispatch.
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tracing::debug;

use crate::error::{Error, Result};
use crate::gpu::{read_mappable_buffer, GpuContext};
use crate::pipeline::scratch::{BufferRange, ELEMENT_SIZE};

/// One placed object: world position plus the index of the class that
/// claimed it.
///
/// The layout matches the GPU-side candidate element: `position` occupies
/// the `xyz` lanes and `class_index` the `w` lane of a 16-byte slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PlacedElement {
    pub position: Vec3,
    pub class_index: u32,
}

/// Handle to a submitted but not yet synchronized placement dispatch.
///
/// There is no async runtime behind this: the handle carries the staging
/// buffer and ranges, and [`read_result`](Self::read_result) blocks on the
/// device.
pub struct FutureResult {
    ctx: GpuContext,
    num_classes: u32,
    pending: Option<Pending>,
}

struct Pending {
    scratch: Arc<wgpu::Buffer>,
    output: BufferRange,
    counters_staging: wgpu::Buffer,
}

impl FutureResult {
    /// A future that reads back as an empty result; used for empty regions.
    pub(crate) fn empty(ctx: GpuContext, num_classes: u32) -> Self {
        Self {
            ctx,
            num_classes,
            pending: None,
        }
    }

    pub(crate) fn pending(
        ctx: GpuContext,
        num_classes: u32,
        scratch: Arc<wgpu::Buffer>,
        output: BufferRange,
        counters_staging: wgpu::Buffer,
    ) -> Self {
        Self {
            ctx,
            num_classes,
            pending: Some(Pending {
                scratch,
                output,
                counters_staging,
            }),
        }
    }

    pub fn num_classes(&self) -> u32 {
        self.num_classes
    }

    /// Wait for the device and snapshot the partitioned output.
    ///
    /// The snapshot is copied both to the host and to a retained device
    /// buffer, so later dispatches reusing the scratch cannot disturb it.
    pub fn read_result(self) -> Result<PlacementResult> {
        let num_classes = self.num_classes as usize;
        let Some(pending) = self.pending else {
            return Ok(PlacementResult {
                ctx: self.ctx,
                class_counts: vec![0; num_classes],
                class_offsets: vec![0; num_classes],
                elements: Vec::new(),
                buffer: None,
            });
        };

        let counter_bytes = read_mappable_buffer(&self.ctx, &pending.counters_staging)?;
        let class_counts: Vec<u32> = bytemuck::cast_slice(&counter_bytes).to_vec();
        debug_assert_eq!(class_counts.len(), num_classes);

        let mut class_offsets = Vec::with_capacity(num_classes);
        let mut total: u32 = 0;
        for &count in &class_counts {
            class_offsets.push(total);
            total += count;
        }
        debug!("Placement result ready: {total} elements.");

        if total == 0 {
            return Ok(PlacementResult {
                ctx: self.ctx,
                class_counts,
                class_offsets,
                elements: Vec::new(),
                buffer: None,
            });
        }

        let byte_len = total as u64 * ELEMENT_SIZE;
        debug_assert!(byte_len <= pending.output.size);

        let device = self.ctx.device();
        let retained = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("map_placement-result"),
            size: byte_len,
            usage: wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("map_placement-result-staging"),
            size: byte_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("map_placement-result-readback"),
        });
        encoder.copy_buffer_to_buffer(
            &pending.scratch,
            pending.output.offset,
            &retained,
            0,
            byte_len,
        );
        encoder.copy_buffer_to_buffer(
            &pending.scratch,
            pending.output.offset,
            &staging,
            0,
            byte_len,
        );
        self.ctx.queue().submit(std::iter::once(encoder.finish()));

        let element_bytes = read_mappable_buffer(&self.ctx, &staging)?;
        let elements: Vec<PlacedElement> = bytemuck::cast_slice(&element_bytes).to_vec();

        Ok(PlacementResult {
            ctx: self.ctx,
            class_counts,
            class_offsets,
            elements,
            buffer: Some(retained),
        })
    }
}

/// A compacted, class-partitioned placement result.
///
/// Elements of class `k` occupy the contiguous range
/// `[class_offset(k), class_offset(k) + class_element_count(k))`. The view
/// is a snapshot: re-reading it always yields the same data.
pub struct PlacementResult {
    ctx: GpuContext,
    class_counts: Vec<u32>,
    class_offsets: Vec<u32>,
    elements: Vec<PlacedElement>,
    buffer: Option<wgpu::Buffer>,
}

impl PlacementResult {
    pub fn num_classes(&self) -> u32 {
        self.class_counts.len() as u32
    }

    /// Total number of placed elements over all classes.
    pub fn element_array_length(&self) -> usize {
        self.elements.len()
    }

    /// Number of elements of one class.
    ///
    /// # Panics
    /// Panics when `class_index` is out of range.
    pub fn class_element_count(&self, class_index: u32) -> usize {
        self.class_counts[class_index as usize] as usize
    }

    /// All elements, partitioned by class in class order.
    pub fn elements(&self) -> &[PlacedElement] {
        &self.elements
    }

    /// The contiguous slice holding one class's elements.
    ///
    /// # Panics
    /// Panics when `class_index` is out of range.
    pub fn class_elements(&self, class_index: u32) -> &[PlacedElement] {
        let k = class_index as usize;
        let start = self.class_offsets[k] as usize;
        &self.elements[start..start + self.class_counts[k] as usize]
    }

    /// Copy all elements to the host.
    pub fn copy_all_to_host(&self) -> Vec<PlacedElement> {
        self.elements.clone()
    }

    /// Copy one class's elements to the host.
    pub fn copy_class_to_host(&self, class_index: u32) -> Vec<PlacedElement> {
        self.class_elements(class_index).to_vec()
    }

    /// Copy all elements into a caller-owned device buffer.
    ///
    /// The destination needs `COPY_DST` usage and room for
    /// `element_array_length() · 16` bytes at offset 0.
    pub fn copy_all_to(&self, destination: &wgpu::Buffer) -> Result<()> {
        let Some(source) = &self.buffer else {
            return Ok(());
        };
        let byte_len = self.elements.len() as u64 * ELEMENT_SIZE;
        if !destination.usage().contains(wgpu::BufferUsages::COPY_DST) {
            return Err(Error::InvalidConfig(
                "destination buffer is missing COPY_DST usage".into(),
            ));
        }
        if destination.size() < byte_len {
            return Err(Error::InvalidConfig(format!(
                "destination buffer holds {} bytes, result needs {byte_len}",
                destination.size()
            )));
        }

        let mut encoder = self
            .ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("map_placement-result-copy"),
            });
        encoder.copy_buffer_to_buffer(source, 0, destination, 0, byte_len);
        self.ctx.queue().submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}
