// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-frame uniform buffers addressed through dynamic offsets.

use super::resource::BufferId;

/// Rounds `size` up to the next multiple of `alignment`.
///
/// An alignment of zero is treated as one.
pub const fn align_to(size: u32, alignment: u32) -> u32 {
    let alignment = if alignment == 0 { 1 } else { alignment };
    size.div_ceil(alignment) * alignment
}

/// A uniform block replicated once per in-flight frame slot.
///
/// Each frame slot owns its own backing buffer holding `element_count` elements,
/// each padded to the device's minimum uniform-offset alignment, so that a single
/// descriptor can address any element through a dynamic offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    buffers: Vec<BufferId>,
    element_size: u32,
    aligned_element_size: u32,
    element_count: u32,
}

impl Uniform {
    /// Describes a uniform backed by `buffers` (one per frame slot).
    ///
    /// `min_alignment` is the device's minimum uniform-buffer offset alignment.
    pub fn new(
        buffers: Vec<BufferId>,
        element_size: u32,
        element_count: u32,
        min_alignment: u32,
    ) -> Self {
        Self {
            buffers,
            element_size,
            aligned_element_size: align_to(element_size, min_alignment),
            element_count,
        }
    }

    /// The backing buffer for a frame slot, if the slot exists.
    pub fn buffer(&self, frame_index: u32) -> Option<BufferId> {
        self.buffers.get(frame_index as usize).copied()
    }

    /// All backing buffers, indexed by frame slot.
    pub fn buffers(&self) -> &[BufferId] {
        &self.buffers
    }

    /// The unpadded size of one element, in bytes.
    pub fn element_size(&self) -> u32 {
        self.element_size
    }

    /// The size of one element padded to the offset alignment, in bytes.
    pub fn aligned_element_size(&self) -> u32 {
        self.aligned_element_size
    }

    /// How many elements each backing buffer holds.
    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    /// The dynamic offset that selects `element`.
    pub fn element_offset(&self, element: u32) -> u32 {
        self.aligned_element_size * element
    }

    /// The size every backing buffer must have, in bytes.
    pub fn buffer_size(&self) -> u64 {
        self.aligned_element_size as u64 * self.element_count as u64
    }
}
