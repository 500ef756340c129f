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

use crate::renderer::api::{
    BufferId, CommandPoolKind, DescriptorSetId, FramebufferId, NativeCommandBufferId,
    RenderPipelineId, RenderpassId,
};
use crate::renderer::error::CommandError;

/// Parameters of a uniform descriptor write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDescriptorWrite {
    /// The pipeline whose layout the descriptor set must match.
    pub pipeline: RenderPipelineId,
    /// The descriptor set index.
    pub set: u32,
    /// The binding inside the set.
    pub binding: u32,
    /// The buffer to expose at the binding.
    pub buffer: BufferId,
    /// Byte offset of the bound range inside `buffer`.
    pub offset: u64,
    /// Byte size of the bound range.
    pub range: u64,
    /// A previously written descriptor set to update in place, if any.
    pub target: Option<DescriptorSetId>,
}

/// The native operations the command translator needs from a graphics backend.
///
/// Every `cmd_*` call targets a native buffer that is between `begin_recording`
/// and `end_recording`. Implementations log and skip calls that reference an
/// unknown resource; only allocation, recording boundaries and descriptor writes
/// report failure to the caller.
pub trait CommandBackend {
    /// Allocates `count` native command buffers from `pool`.
    fn allocate_command_buffers(
        &mut self,
        pool: CommandPoolKind,
        count: u32,
    ) -> Result<Vec<NativeCommandBufferId>, CommandError>;

    /// Returns native command buffers to the pool they were allocated from.
    fn free_command_buffers(&mut self, pool: CommandPoolKind, buffers: &[NativeCommandBufferId]);

    /// Starts native recording, discarding whatever the buffer held before.
    fn begin_recording(&mut self, buffer: NativeCommandBufferId) -> Result<(), CommandError>;

    /// Finishes native recording.
    fn end_recording(&mut self, buffer: NativeCommandBufferId) -> Result<(), CommandError>;

    /// Begins `renderpass` on the target `framebuffer` holds for `frame_index`.
    fn cmd_begin_renderpass(
        &mut self,
        buffer: NativeCommandBufferId,
        renderpass: RenderpassId,
        framebuffer: FramebufferId,
        frame_index: u32,
    );

    /// Ends the current render pass.
    fn cmd_end_renderpass(&mut self, buffer: NativeCommandBufferId);

    /// Binds a graphics pipeline.
    fn cmd_bind_graphics_pipeline(
        &mut self,
        buffer: NativeCommandBufferId,
        pipeline: RenderPipelineId,
    );

    /// Binds vertex buffers to consecutive slots starting at zero, at offset zero.
    fn cmd_bind_vertex_buffers(&mut self, buffer: NativeCommandBufferId, buffers: &[BufferId]);

    /// Binds a 32-bit index buffer at offset zero.
    fn cmd_bind_index_buffer(&mut self, buffer: NativeCommandBufferId, index_buffer: BufferId);

    /// Writes (or rewrites) a uniform descriptor and returns the set it lives in.
    fn write_uniform_descriptor(
        &mut self,
        write: &UniformDescriptorWrite,
    ) -> Result<DescriptorSetId, CommandError>;

    /// Binds a written descriptor set with a single dynamic offset.
    fn cmd_bind_descriptor_set(
        &mut self,
        buffer: NativeCommandBufferId,
        pipeline: RenderPipelineId,
        set: u32,
        descriptor: DescriptorSetId,
        dynamic_offset: u32,
    );

    /// Issues an indexed draw of one instance.
    fn cmd_draw_indexed(&mut self, buffer: NativeCommandBufferId, index_count: u32, first_index: u32);
}
