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

//! Replays recorded command logs against a native [`CommandBackend`].

use crate::renderer::api::{
    CommandBuffer, CommandPoolKind, GraphicsCommand, GraphicsPipeline, NativeCommandBufferId,
    ReplayStats, Uniform, UniformSlot, UniformState,
};
use crate::renderer::error::CommandError;
use crate::renderer::traits::{CommandBackend, UniformDescriptorWrite};

/// Owns the native command buffers of one [`CommandBuffer`] and translates its log
/// into them, one native buffer per in-flight frame slot.
///
/// The translator does not hold the backend. Every call borrows it, so the same
/// translator can be driven through a concrete backend or a `dyn CommandBackend`.
/// Native buffers are only returned to their pool by [`release`](Self::release)
/// or the next [`build_buffers`](Self::build_buffers).
#[derive(Debug, Default)]
pub struct CommandTranslator {
    pool: Option<CommandPoolKind>,
    native_buffers: Vec<NativeCommandBufferId>,
}

impl CommandTranslator {
    /// Creates a translator with no native buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool the current native buffers were allocated from.
    pub fn pool(&self) -> Option<CommandPoolKind> {
        self.pool
    }

    /// Whether native buffers are currently allocated.
    pub fn is_built(&self) -> bool {
        self.pool.is_some()
    }

    /// All native buffers, indexed by frame slot.
    pub fn native_buffers(&self) -> &[NativeCommandBufferId] {
        &self.native_buffers
    }

    /// The native buffer for one frame slot.
    pub fn native_buffer(&self, frame_index: u32) -> Option<NativeCommandBufferId> {
        self.native_buffers.get(frame_index as usize).copied()
    }

    /// (Re)allocates `buffer_count` native buffers from the pool matching the
    /// usage `commands` accumulated. Previously allocated buffers are freed first.
    pub fn build_buffers<B: CommandBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        commands: &CommandBuffer,
        buffer_count: u32,
    ) -> Result<(), CommandError> {
        self.release(backend);

        let pool = CommandPoolKind::select(commands.usage());
        let buffers = backend
            .allocate_command_buffers(pool, buffer_count)
            .inspect_err(|e| log::error!("Failed to build command buffers: {e}"))?;

        log::debug!(
            "Built {} native command buffers from the {:?} pool (usage {:?})",
            buffers.len(),
            pool,
            commands.usage()
        );
        self.pool = Some(pool);
        self.native_buffers = buffers;
        Ok(())
    }

    /// Frees every native buffer back to its pool.
    pub fn release<B: CommandBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(pool) = self.pool.take() {
            backend.free_command_buffers(pool, &self.native_buffers);
            self.native_buffers.clear();
        }
    }

    /// Records the log into every native buffer, for buffers created as static.
    ///
    /// Calling this on a dynamic buffer is a contract violation: it is logged and
    /// reported as [`CommandError::NotStatic`] without touching the backend.
    /// Every slot is attempted even if an earlier one fails; the first failure is
    /// returned.
    pub fn record_static<B: CommandBackend + ?Sized>(
        &self,
        backend: &mut B,
        commands: &CommandBuffer,
    ) -> Result<ReplayStats, CommandError> {
        if !commands.is_static() {
            log::error!(
                "record_static called on dynamic command buffer {:?}",
                commands.label().unwrap_or("<unnamed>")
            );
            return Err(CommandError::NotStatic);
        }
        if !self.is_built() {
            return Err(CommandError::NotBuilt);
        }

        let mut total = ReplayStats::default();
        let mut first_error = None;
        for frame_index in 0..self.native_buffers.len() as u32 {
            match self.record_dynamic(backend, commands, frame_index) {
                Ok(stats) => {
                    total.commands += stats.commands;
                    total.draw_calls += stats.draw_calls;
                    total.descriptor_writes += stats.descriptor_writes;
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(total),
        }
    }

    /// Replays the log into the native buffer of `frame_index`.
    ///
    /// Native failures are logged and returned; the native buffer is then left in
    /// whatever state the backend produced.
    pub fn record_dynamic<B: CommandBackend + ?Sized>(
        &self,
        backend: &mut B,
        commands: &CommandBuffer,
        frame_index: u32,
    ) -> Result<ReplayStats, CommandError> {
        if !self.is_built() {
            return Err(CommandError::NotBuilt);
        }
        let native = self
            .native_buffer(frame_index)
            .ok_or(CommandError::InvalidFrameIndex {
                frame_index,
                buffer_count: self.native_buffers.len() as u32,
            })?;

        backend
            .begin_recording(native)
            .inspect_err(|e| log::error!("Failed to begin command buffer {native:?}: {e}"))?;

        let mut stats = ReplayStats::default();
        let mut graphics_pipeline: Option<&GraphicsPipeline> = None;

        for command in commands.commands() {
            stats.commands += 1;
            match command {
                GraphicsCommand::BeginRenderpass {
                    renderpass,
                    framebuffer,
                } => backend.cmd_begin_renderpass(native, *renderpass, *framebuffer, frame_index),
                GraphicsCommand::EndRenderpass => backend.cmd_end_renderpass(native),
                GraphicsCommand::SetGraphicsPipeline(pipeline) => {
                    backend.cmd_bind_graphics_pipeline(native, pipeline.id());
                    graphics_pipeline = Some(pipeline);
                }
                GraphicsCommand::SetComputePipeline(pipeline) => {
                    // No dispatch command exists to consume it.
                    log::trace!("Skipping compute pipeline {:?} during replay", pipeline.id());
                }
                GraphicsCommand::SetVertexBuffers(buffers) => {
                    backend.cmd_bind_vertex_buffers(native, buffers)
                }
                GraphicsCommand::SetIndexBuffer(buffer) => {
                    backend.cmd_bind_index_buffer(native, *buffer)
                }
                GraphicsCommand::BindUniform {
                    set,
                    binding,
                    uniform,
                    element,
                } => {
                    let Some(pipeline) = graphics_pipeline else {
                        log::warn!(
                            "BindUniform (set {set}, binding {binding}) recorded before any graphics pipeline; skipped"
                        );
                        continue;
                    };
                    let target = UniformTarget {
                        native,
                        pipeline,
                        set: *set,
                        binding: *binding,
                        frame_index,
                    };
                    if bind_uniform(backend, &target, uniform, *element)
                        .inspect_err(|e| log::error!("Failed to bind uniform: {e}"))?
                    {
                        stats.descriptor_writes += 1;
                    }
                }
                GraphicsCommand::DrawIndexed {
                    index_count,
                    first_index,
                } => {
                    backend.cmd_draw_indexed(native, *index_count, *first_index);
                    stats.draw_calls += 1;
                }
            }
        }

        backend
            .end_recording(native)
            .inspect_err(|e| log::error!("Failed to end command buffer {native:?}: {e}"))?;

        Ok(stats)
    }
}

struct UniformTarget<'a> {
    native: NativeCommandBufferId,
    pipeline: &'a GraphicsPipeline,
    set: u32,
    binding: u32,
    frame_index: u32,
}

/// Binds one element of `uniform`, rewriting the descriptor only when the cached
/// buffer for this frame slot differs. Returns whether a descriptor was written.
fn bind_uniform<B: CommandBackend + ?Sized>(
    backend: &mut B,
    target: &UniformTarget<'_>,
    uniform: &Uniform,
    element: u32,
) -> Result<bool, CommandError> {
    let Some(buffer) = uniform.buffer(target.frame_index) else {
        log::warn!(
            "Uniform has no buffer for frame slot {}; bind skipped",
            target.frame_index
        );
        return Ok(false);
    };
    if element >= uniform.element_count() {
        log::warn!(
            "Uniform element {element} is out of range ({} elements); bind skipped",
            uniform.element_count()
        );
        return Ok(false);
    }

    let slot = UniformSlot {
        set: target.set,
        binding: target.binding,
        frame_index: target.frame_index,
    };

    let mut states = target.pipeline.uniform_states();
    let mut state = states.get(slot);
    let mut written = false;
    if state.needs_update(buffer) {
        let descriptor = backend.write_uniform_descriptor(&UniformDescriptorWrite {
            pipeline: target.pipeline.id(),
            set: target.set,
            binding: target.binding,
            buffer,
            offset: 0,
            range: uniform.aligned_element_size() as u64,
            target: state.descriptor_set,
        })?;
        state = UniformState {
            buffer: Some(buffer),
            descriptor_set: Some(descriptor),
        };
        states.set(slot, state);
        written = true;
    }
    drop(states);

    if let Some(descriptor) = state.descriptor_set {
        backend.cmd_bind_descriptor_set(
            target.native,
            target.pipeline.id(),
            target.set,
            descriptor,
            uniform.element_offset(element),
        );
    }
    Ok(written)
}
