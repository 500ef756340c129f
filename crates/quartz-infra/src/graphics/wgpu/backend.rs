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

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::ops::Range;

use quartz_core::renderer::api::{
    BufferId, CommandPoolKind, DescriptorSetId, FramebufferId, NativeCommandBufferId,
    RenderPipelineId, RenderpassDescriptor, RenderpassId,
};
use quartz_core::renderer::error::CommandError;
use quartz_core::renderer::traits::{CommandBackend, UniformDescriptorWrite};

use super::context::WgpuContext;
use super::conversions::IntoWgpu;

/// The colour targets (one per in-flight frame slot) and optional depth target a
/// render pass draws into.
struct WgpuFramebuffer {
    color_views: Vec<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,
}

/// One allocated native command buffer.
///
/// wgpu has no reusable command buffers: recording creates a fresh encoder and
/// finishing it yields a `wgpu::CommandBuffer` that is consumed on submit.
struct NativeSlot {
    pool: CommandPoolKind,
    // Dropped before `encoder` is finished.
    pass: Option<wgpu::RenderPass<'static>>,
    encoder: Option<wgpu::CommandEncoder>,
    finished: Option<wgpu::CommandBuffer>,
}

/// A [`CommandBackend`] that replays recorded commands into `wgpu` encoders.
///
/// Resources are registered up front and referred to by the opaque ids the
/// command log carries. Replay calls that name an unknown id, or that need an
/// open render pass when there is none, are logged and skipped.
pub struct WgpuCommandBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    slots: Vec<Option<NativeSlot>>,
    free_slots: Vec<usize>,

    buffers: HashMap<BufferId, wgpu::Buffer>,
    render_pipelines: HashMap<RenderPipelineId, wgpu::RenderPipeline>,
    renderpasses: HashMap<RenderpassId, RenderpassDescriptor>,
    framebuffers: HashMap<FramebufferId, WgpuFramebuffer>,
    descriptor_sets: HashMap<DescriptorSetId, wgpu::BindGroup>,
    next_id: usize,
}

impl WgpuCommandBackend {
    /// Creates a backend on an existing device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            slots: Vec::new(),
            free_slots: Vec::new(),
            buffers: HashMap::new(),
            render_pipelines: HashMap::new(),
            renderpasses: HashMap::new(),
            framebuffers: HashMap::new(),
            descriptor_sets: HashMap::new(),
            next_id: 0,
        }
    }

    /// Creates a backend sharing the device and queue of `context`.
    pub fn from_context(context: &WgpuContext) -> Self {
        Self::new(context.device.clone(), context.queue.clone())
    }

    /// The device resources must be created on.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- Resource registration ---

    /// Makes a buffer addressable by recorded commands.
    pub fn register_buffer(&mut self, buffer: wgpu::Buffer) -> BufferId {
        let id = BufferId(self.next_id());
        self.buffers.insert(id, buffer);
        id
    }

    /// Makes a render pipeline addressable by recorded commands.
    ///
    /// Uniforms bound through `BindUniform` need their layout entries declared with
    /// `has_dynamic_offset: true`.
    pub fn register_render_pipeline(&mut self, pipeline: wgpu::RenderPipeline) -> RenderPipelineId {
        let id = RenderPipelineId(self.next_id());
        self.render_pipelines.insert(id, pipeline);
        id
    }

    /// Registers the load/store operations of a render pass.
    pub fn create_renderpass(&mut self, descriptor: RenderpassDescriptor) -> RenderpassId {
        let id = RenderpassId(self.next_id());
        self.renderpasses.insert(id, descriptor);
        id
    }

    /// Registers a framebuffer. `color_views[i]` is the target used for frame slot `i`.
    pub fn create_framebuffer(
        &mut self,
        color_views: Vec<wgpu::TextureView>,
        depth_view: Option<wgpu::TextureView>,
    ) -> FramebufferId {
        let id = FramebufferId(self.next_id());
        self.framebuffers.insert(
            id,
            WgpuFramebuffer {
                color_views,
                depth_view,
            },
        );
        id
    }

    // --- Submission ---

    /// Submits the finished native buffers to the queue, in order.
    ///
    /// A finished wgpu command buffer can only be submitted once; buffers must be
    /// recorded again before their next submission. Returns how many were submitted.
    pub fn submit(&mut self, buffers: &[NativeCommandBufferId]) -> usize {
        let mut finished = Vec::with_capacity(buffers.len());
        for &id in buffers {
            match Self::slot_mut(&mut self.slots, id).and_then(|slot| slot.finished.take()) {
                Some(command_buffer) => finished.push(command_buffer),
                None => log::warn!("Native command buffer {id:?} has nothing to submit"),
            }
        }
        let count = finished.len();
        if count > 0 {
            self.queue.submit(finished);
        }
        count
    }

    /// The number of native command buffers currently allocated.
    pub fn live_command_buffers(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn slot_mut(
        slots: &mut [Option<NativeSlot>],
        id: NativeCommandBufferId,
    ) -> Option<&mut NativeSlot> {
        slots.get_mut(id.0)?.as_mut()
    }

    fn active_pass(
        slots: &mut [Option<NativeSlot>],
        id: NativeCommandBufferId,
    ) -> Option<&mut wgpu::RenderPass<'static>> {
        let pass = Self::slot_mut(slots, id)?.pass.as_mut();
        if pass.is_none() {
            log::warn!("Native command buffer {id:?} has no open render pass, skipping command");
        }
        pass
    }
}

impl CommandBackend for WgpuCommandBackend {
    fn allocate_command_buffers(
        &mut self,
        pool: CommandPoolKind,
        count: u32,
    ) -> Result<Vec<NativeCommandBufferId>, CommandError> {
        let mut allocated = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let slot = NativeSlot {
                pool,
                pass: None,
                encoder: None,
                finished: None,
            };
            let index = match self.free_slots.pop() {
                Some(index) => {
                    self.slots[index] = Some(slot);
                    index
                }
                None => {
                    self.slots.push(Some(slot));
                    self.slots.len() - 1
                }
            };
            allocated.push(NativeCommandBufferId(index));
        }
        log::debug!("Allocated {count} native command buffer(s) from the {pool:?} pool");
        Ok(allocated)
    }

    fn free_command_buffers(&mut self, pool: CommandPoolKind, buffers: &[NativeCommandBufferId]) {
        for &id in buffers {
            let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) else {
                log::warn!("Ignoring free of unknown native command buffer {id:?}");
                continue;
            };
            if slot.pool != pool {
                log::warn!(
                    "Native command buffer {id:?} freed to {pool:?}, allocated from {:?}",
                    slot.pool
                );
            }
            self.free_slots.push(id.0);
        }
    }

    fn begin_recording(&mut self, buffer: NativeCommandBufferId) -> Result<(), CommandError> {
        let slot = Self::slot_mut(&mut self.slots, buffer).ok_or_else(|| {
            CommandError::RecordingFailed(format!("unknown native command buffer {buffer:?}"))
        })?;

        slot.pass = None;
        slot.finished = None;
        slot.encoder = Some(
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Quartz Command Encoder"),
                }),
        );
        Ok(())
    }

    fn end_recording(&mut self, buffer: NativeCommandBufferId) -> Result<(), CommandError> {
        let slot = Self::slot_mut(&mut self.slots, buffer).ok_or_else(|| {
            CommandError::RecordingFailed(format!("unknown native command buffer {buffer:?}"))
        })?;

        if slot.pass.take().is_some() {
            log::warn!("Native command buffer {buffer:?} ended with an open render pass");
        }
        let encoder = slot.encoder.take().ok_or_else(|| {
            CommandError::RecordingFailed(format!("{buffer:?} is not recording"))
        })?;
        slot.finished = Some(encoder.finish());
        Ok(())
    }

    fn cmd_begin_renderpass(
        &mut self,
        buffer: NativeCommandBufferId,
        renderpass: RenderpassId,
        framebuffer: FramebufferId,
        frame_index: u32,
    ) {
        let Some(descriptor) = self.renderpasses.get(&renderpass) else {
            log::warn!("RenderpassId {renderpass:?} not found.");
            return;
        };
        let Some(target) = self.framebuffers.get(&framebuffer) else {
            log::warn!("FramebufferId {framebuffer:?} not found.");
            return;
        };
        let Some(color_view) = target.color_views.get(frame_index as usize) else {
            log::warn!("FramebufferId {framebuffer:?} has no target for frame {frame_index}");
            return;
        };
        let Some(slot) = Self::slot_mut(&mut self.slots, buffer) else {
            log::warn!("Native command buffer {buffer:?} not found.");
            return;
        };
        if slot.pass.take().is_some() {
            log::warn!("Beginning a render pass on {buffer:?} while another is open");
        }
        let Some(encoder) = slot.encoder.as_mut() else {
            log::warn!("Native command buffer {buffer:?} is not recording");
            return;
        };

        let color_attachment = wgpu::RenderPassColorAttachment {
            view: color_view,
            depth_slice: None,
            resolve_target: None,
            ops: descriptor.color_ops.into_wgpu(),
        };
        let depth_stencil_attachment = match (target.depth_view.as_ref(), descriptor.depth_ops) {
            (Some(view), Some(ops)) => Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(ops.into_wgpu()),
                stencil_ops: None,
            }),
            _ => None,
        };

        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: descriptor.label.as_deref(),
                color_attachments: &[Some(color_attachment)],
                depth_stencil_attachment,
                ..Default::default()
            })
            .forget_lifetime();
        slot.pass = Some(pass);
    }

    fn cmd_end_renderpass(&mut self, buffer: NativeCommandBufferId) {
        if let Some(slot) = Self::slot_mut(&mut self.slots, buffer) {
            if slot.pass.take().is_none() {
                log::warn!("Ending a render pass on {buffer:?} but none is open");
            }
        }
    }

    fn cmd_bind_graphics_pipeline(
        &mut self,
        buffer: NativeCommandBufferId,
        pipeline: RenderPipelineId,
    ) {
        let Some(native) = self.render_pipelines.get(&pipeline) else {
            log::warn!("RenderPipelineId {pipeline:?} not found.");
            return;
        };
        if let Some(pass) = Self::active_pass(&mut self.slots, buffer) {
            pass.set_pipeline(native);
        }
    }

    fn cmd_bind_vertex_buffers(&mut self, buffer: NativeCommandBufferId, buffers: &[BufferId]) {
        let Some(pass) = Self::active_pass(&mut self.slots, buffer) else {
            return;
        };
        for (slot, id) in buffers.iter().enumerate() {
            match self.buffers.get(id) {
                Some(vertex_buffer) => pass.set_vertex_buffer(slot as u32, vertex_buffer.slice(..)),
                None => log::warn!("Vertex BufferId {id:?} not found."),
            }
        }
    }

    fn cmd_bind_index_buffer(&mut self, buffer: NativeCommandBufferId, index_buffer: BufferId) {
        let Some(native) = self.buffers.get(&index_buffer) else {
            log::warn!("Index BufferId {index_buffer:?} not found.");
            return;
        };
        if let Some(pass) = Self::active_pass(&mut self.slots, buffer) {
            pass.set_index_buffer(native.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    fn write_uniform_descriptor(
        &mut self,
        write: &UniformDescriptorWrite,
    ) -> Result<DescriptorSetId, CommandError> {
        let pipeline = self.render_pipelines.get(&write.pipeline).ok_or_else(|| {
            CommandError::DescriptorUpdateFailed(format!("{:?} not found", write.pipeline))
        })?;
        let uniform_buffer = self.buffers.get(&write.buffer).ok_or_else(|| {
            CommandError::DescriptorUpdateFailed(format!("{:?} not found", write.buffer))
        })?;
        let size = NonZeroU64::new(write.range).ok_or_else(|| {
            CommandError::DescriptorUpdateFailed("uniform range must not be empty".to_owned())
        })?;

        let layout = pipeline.get_bind_group_layout(write.set);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Quartz Uniform Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: write.binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: uniform_buffer,
                    offset: write.offset,
                    size: Some(size),
                }),
            }],
        });

        // Bind groups are immutable: a rewrite replaces the group under the same id.
        let id = match write.target {
            Some(id) => id,
            None => DescriptorSetId(self.next_id()),
        };
        self.descriptor_sets.insert(id, bind_group);
        Ok(id)
    }

    fn cmd_bind_descriptor_set(
        &mut self,
        buffer: NativeCommandBufferId,
        _pipeline: RenderPipelineId,
        set: u32,
        descriptor: DescriptorSetId,
        dynamic_offset: u32,
    ) {
        let Some(bind_group) = self.descriptor_sets.get(&descriptor) else {
            log::warn!("DescriptorSetId {descriptor:?} not found.");
            return;
        };
        if let Some(pass) = Self::active_pass(&mut self.slots, buffer) {
            pass.set_bind_group(set, bind_group, &[dynamic_offset]);
        }
    }

    fn cmd_draw_indexed(&mut self, buffer: NativeCommandBufferId, index_count: u32, first_index: u32) {
        let Some(indices) = index_range(first_index, index_count) else {
            log::warn!(
                "Indexed draw of {index_count} indices from {first_index} overflows u32, skipping"
            );
            return;
        };
        if let Some(pass) = Self::active_pass(&mut self.slots, buffer) {
            pass.draw_indexed(indices, 0, 0..1);
        }
    }
}

/// The index range of an indexed draw, or `None` if it does not fit in `u32`.
fn index_range(first_index: u32, index_count: u32) -> Option<Range<u32>> {
    let end = first_index.checked_add(index_count)?;
    Some(first_index..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_range_covers_count_indices() {
        assert_eq!(index_range(6, 3), Some(6..9));
        assert_eq!(index_range(0, 0), Some(0..0));
    }

    #[test]
    fn test_index_range_rejects_overflow() {
        assert_eq!(index_range(u32::MAX - 1, 1), Some(u32::MAX - 1..u32::MAX));
        assert_eq!(index_range(u32::MAX, 1), None);
        assert_eq!(index_range(10, u32::MAX), None);
    }
}
