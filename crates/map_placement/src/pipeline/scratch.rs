//! Scratch buffer layout and lifecycle.
//!
//! All pipeline stages work inside one storage buffer, carved into
//! sub-ranges packed at [`RANGE_ALIGNMENT`] and validated against the
//! device's storage-buffer offset alignment before binding:
//!
//! ```text
//! [ candidate[N] | world_uv[N] | density[N] | index[N] | class_count[K] | output[N] ]
//! ```
use std::num::NonZeroU64;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::pipeline::result::PlacedElement;

pub(crate) const ELEMENT_SIZE: u64 = std::mem::size_of::<PlacedElement>() as u64;

/// Sub-range packing alignment: the WebGPU default limit for
/// `min_storage_buffer_offset_alignment`.
pub(crate) const RANGE_ALIGNMENT: u64 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BufferRange {
    pub offset: u64,
    pub size: u64,
}

impl BufferRange {
    pub fn binding<'a>(&self, buffer: &'a wgpu::Buffer) -> wgpu::BufferBinding<'a> {
        wgpu::BufferBinding {
            buffer,
            offset: self.offset,
            size: NonZeroU64::new(self.size),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScratchLayout {
    pub candidates: BufferRange,
    pub world_uv: BufferRange,
    pub density: BufferRange,
    pub indices: BufferRange,
    pub class_counters: BufferRange,
    pub output: BufferRange,
    pub total_size: u64,
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

impl ScratchLayout {
    /// Carve the sub-ranges for `candidate_count` candidates and
    /// `class_count` classes, packed at [`RANGE_ALIGNMENT`].
    pub fn compute(candidate_count: u64, class_count: u64) -> Self {
        let mut cursor = 0u64;
        let mut take = |size: u64| {
            let offset = align_up(cursor, RANGE_ALIGNMENT);
            cursor = offset + size;
            BufferRange { offset, size }
        };

        Self {
            candidates: take(candidate_count * ELEMENT_SIZE),
            world_uv: take(candidate_count * 8),
            density: take(candidate_count * 4),
            indices: take(candidate_count * 4),
            class_counters: take(class_count * 4),
            output: take(candidate_count * ELEMENT_SIZE),
            total_size: cursor,
        }
    }

    /// Check every sub-range offset against the alignment the device
    /// actually demands. Packing uses the WebGPU default limit, so a device
    /// reporting a coarser `min_storage_buffer_offset_alignment` fails here
    /// instead of corrupting results at bind time.
    pub fn validate(&self, device_alignment: u64) -> Result<()> {
        for range in [
            self.candidates,
            self.world_uv,
            self.density,
            self.indices,
            self.class_counters,
            self.output,
        ] {
            if range.offset % device_alignment != 0 {
                return Err(Error::Alignment {
                    offset: range.offset,
                    required: device_alignment,
                });
            }
        }
        Ok(())
    }
}

/// The reusable device buffer backing [`ScratchLayout`].
///
/// Grows geometrically and never shrinks. Handed out as an `Arc` so results
/// read from an older, since-replaced buffer stay valid.
pub(crate) struct ScratchBuffer {
    buffer: Option<Arc<wgpu::Buffer>>,
    capacity: u64,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self {
            buffer: None,
            capacity: 0,
        }
    }

    pub fn ensure(&mut self, device: &wgpu::Device, size: u64) -> Arc<wgpu::Buffer> {
        if self.buffer.is_none() || self.capacity < size {
            let capacity = size.next_power_of_two();
            debug!("Growing placement scratch buffer to {capacity} bytes.");
            self.buffer = Some(Arc::new(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("map_placement-scratch"),
                size: capacity,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })));
            self.capacity = capacity;
        }
        Arc::clone(self.buffer.as_ref().expect("buffer ensured above"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_aligned_and_ordered() {
        let layout = ScratchLayout::compute(4096, 5);
        let ranges = [
            layout.candidates,
            layout.world_uv,
            layout.density,
            layout.indices,
            layout.class_counters,
            layout.output,
        ];

        let mut end = 0;
        for range in ranges {
            assert_eq!(range.offset % RANGE_ALIGNMENT, 0);
            assert!(range.offset >= end, "ranges overlap");
            end = range.offset + range.size;
        }
        assert_eq!(layout.total_size, end);
    }

    #[test]
    fn range_sizes_follow_candidate_and_class_counts() {
        let layout = ScratchLayout::compute(64, 3);
        assert_eq!(layout.candidates.size, 64 * 16);
        assert_eq!(layout.world_uv.size, 64 * 8);
        assert_eq!(layout.density.size, 64 * 4);
        assert_eq!(layout.indices.size, 64 * 4);
        assert_eq!(layout.class_counters.size, 3 * 4);
        assert_eq!(layout.output.size, 64 * 16);
    }

    #[test]
    fn small_counts_pack_one_range_per_alignment_slot() {
        let layout = ScratchLayout::compute(4, 1);
        assert_eq!(layout.candidates.offset, 0);
        assert_eq!(layout.world_uv.offset, 256);
        assert_eq!(layout.density.offset, 512);
        assert_eq!(layout.indices.offset, 768);
        assert_eq!(layout.class_counters.offset, 1024);
        assert_eq!(layout.output.offset, 1280);
        assert_eq!(layout.total_size, 1280 + 4 * ELEMENT_SIZE);
    }

    #[test]
    fn validate_accepts_alignments_the_packing_covers() {
        let layout = ScratchLayout::compute(4096, 5);
        for alignment in [16, 32, 64, 128, 256] {
            layout.validate(alignment).unwrap();
        }
    }

    #[test]
    fn validate_rejects_coarser_device_alignment() {
        let layout = ScratchLayout::compute(4, 1);
        // world_uv sits at offset 256, an odd multiple of 256.
        let err = layout.validate(512).unwrap_err();
        match err {
            Error::Alignment { offset, required } => {
                assert_eq!(offset, 256);
                assert_eq!(required, 512);
            }
            other => panic!("expected alignment error, got {other}"),
        }
    }

    #[test]
    fn align_up_is_identity_on_multiples() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }
}
