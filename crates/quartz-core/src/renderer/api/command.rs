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

//! The backend-independent command recorder.
//!
//! A [`CommandBuffer`] is pure data capture: every recording call appends one
//! [`GraphicsCommand`] to a growable log and updates the accumulated
//! [`CommandBufferUsage`]. Translating the log into native calls is the job of
//! [`CommandTranslator`](crate::renderer::CommandTranslator).

use super::flags::CommandBufferUsage;
use super::pipeline::{ComputePipeline, GraphicsPipeline, Pipeline};
use super::resource::{BufferId, FramebufferId, RenderpassId};
use super::uniform::Uniform;
use std::sync::Arc;

/// One recorded operation. Each variant carries only what its replay needs.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    /// Begins a render pass on the frame slot's target of `framebuffer`.
    BeginRenderpass {
        /// The pass description (load/store operations and clear values).
        renderpass: RenderpassId,
        /// The render targets, resolved per frame slot at replay.
        framebuffer: FramebufferId,
    },
    /// Ends the current render pass.
    EndRenderpass,
    /// Binds a graphics pipeline. Later uniform binds resolve against it.
    SetGraphicsPipeline(GraphicsPipeline),
    /// Binds a compute pipeline.
    SetComputePipeline(ComputePipeline),
    /// Binds vertex buffers to consecutive slots starting at zero, all at offset zero.
    SetVertexBuffers(Vec<BufferId>),
    /// Binds a 32-bit index buffer at offset zero.
    SetIndexBuffer(BufferId),
    /// Binds one element of a per-frame uniform to `set`/`binding` of the bound pipeline.
    BindUniform {
        /// The descriptor set index.
        set: u32,
        /// The binding inside the set.
        binding: u32,
        /// The uniform whose frame-slot buffer is bound.
        uniform: Arc<Uniform>,
        /// Which element is selected through the dynamic offset.
        element: u32,
    },
    /// Draws `index_count` indices starting at `first_index`.
    DrawIndexed {
        /// The number of indices to draw.
        index_count: u32,
        /// The first index to read from the bound index buffer.
        first_index: u32,
    },
}

impl GraphicsCommand {
    /// The kind of queue work this command implies.
    pub fn usage(&self) -> CommandBufferUsage {
        match self {
            GraphicsCommand::BeginRenderpass { .. }
            | GraphicsCommand::EndRenderpass
            | GraphicsCommand::SetGraphicsPipeline(_)
            | GraphicsCommand::DrawIndexed { .. } => CommandBufferUsage::GRAPHICS,
            GraphicsCommand::SetComputePipeline(_) => CommandBufferUsage::COMPUTE,
            GraphicsCommand::SetVertexBuffers(_)
            | GraphicsCommand::SetIndexBuffer(_)
            | GraphicsCommand::BindUniform { .. } => CommandBufferUsage::EMPTY,
        }
    }
}

/// Whether a command buffer is recorded once or every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferKind {
    /// Recorded once into every frame slot with `record_static`, then reused.
    Static,
    /// Re-recorded for one frame slot at a time with `record_dynamic`.
    Dynamic,
}

/// Lifecycle of a [`CommandBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferState {
    /// Nothing has been recorded yet.
    Empty,
    /// Between `begin_recording` and `end_recording`.
    Recording,
    /// Recording has ended; the log is ready to be translated.
    Built,
}

/// The command pool (queue family) native buffers are allocated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandPoolKind {
    /// Graphics-capable queue family.
    Graphics,
    /// Compute-capable queue family.
    Compute,
    /// Transfer-only queue family.
    Transfer,
}

impl CommandPoolKind {
    /// Picks the pool matching a combination of usage bits.
    ///
    /// Any graphics usage needs the graphics pool. Compute without graphics uses the
    /// compute pool, and whatever remains (transfer only, or nothing) uses the
    /// transfer pool.
    pub fn select(usage: CommandBufferUsage) -> Self {
        if usage.contains(CommandBufferUsage::GRAPHICS) {
            CommandPoolKind::Graphics
        } else if usage.contains(CommandBufferUsage::COMPUTE) {
            CommandPoolKind::Compute
        } else {
            CommandPoolKind::Transfer
        }
    }
}

/// A backend-independent recording of GPU commands.
///
/// ```text
/// Empty --begin_recording--> Recording --end_recording--> Built
///   ^                            |                          |
///   +------- (log cleared) <-----+------ begin_recording <--+
/// ```
///
/// Recording calls only append to the log; they never touch a native API.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    label: Option<String>,
    kind: CommandBufferKind,
    state: CommandBufferState,
    initial_usage: CommandBufferUsage,
    usage: CommandBufferUsage,
    commands: Vec<GraphicsCommand>,
}

impl CommandBuffer {
    /// Creates an empty command buffer of the given kind.
    pub fn new(kind: CommandBufferKind) -> Self {
        Self::with_usage(kind, CommandBufferUsage::EMPTY)
    }

    /// Creates an empty command buffer whose usage always includes `usage`.
    ///
    /// The hint survives `begin_recording`, which is how transfer-only buffers
    /// select the transfer pool.
    pub fn with_usage(kind: CommandBufferKind, usage: CommandBufferUsage) -> Self {
        Self {
            label: None,
            kind,
            state: CommandBufferState::Empty,
            initial_usage: usage,
            usage,
            commands: Vec::new(),
        }
    }

    /// Sets a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the buffer is static or dynamic.
    pub fn kind(&self) -> CommandBufferKind {
        self.kind
    }

    /// Shorthand for `kind() == CommandBufferKind::Static`.
    pub fn is_static(&self) -> bool {
        self.kind == CommandBufferKind::Static
    }

    /// The current lifecycle state.
    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    /// The usage accumulated since the last `begin_recording`.
    pub fn usage(&self) -> CommandBufferUsage {
        self.usage
    }

    /// The recorded log, in recording order.
    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    /// The number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discards the previous log and usage, and starts a new recording.
    pub fn begin_recording(&mut self) {
        self.commands.clear();
        self.usage = self.initial_usage;
        self.state = CommandBufferState::Recording;
    }

    /// Marks the log as complete.
    pub fn end_recording(&mut self) {
        self.state = CommandBufferState::Built;
    }

    /// Appends a command and folds its usage into the accumulated set.
    pub fn push(&mut self, command: GraphicsCommand) {
        self.usage |= command.usage();
        self.commands.push(command);
    }

    /// Records the start of a render pass.
    pub fn begin_renderpass(&mut self, renderpass: RenderpassId, framebuffer: FramebufferId) {
        self.push(GraphicsCommand::BeginRenderpass {
            renderpass,
            framebuffer,
        });
    }

    /// Records the end of the current render pass.
    pub fn end_renderpass(&mut self) {
        self.push(GraphicsCommand::EndRenderpass);
    }

    /// Records a pipeline bind, dispatching on its type.
    pub fn set_pipeline(&mut self, pipeline: &Pipeline) {
        match pipeline {
            Pipeline::Graphics(graphics) => self.set_graphics_pipeline(graphics),
            Pipeline::Compute(compute) => self.set_compute_pipeline(compute),
        }
    }

    /// Records a graphics pipeline bind.
    pub fn set_graphics_pipeline(&mut self, pipeline: &GraphicsPipeline) {
        self.push(GraphicsCommand::SetGraphicsPipeline(pipeline.clone()));
    }

    /// Records a compute pipeline bind.
    pub fn set_compute_pipeline(&mut self, pipeline: &ComputePipeline) {
        self.push(GraphicsCommand::SetComputePipeline(*pipeline));
    }

    /// Records a vertex buffer bind.
    pub fn set_vertex_buffers(&mut self, buffers: &[BufferId]) {
        self.push(GraphicsCommand::SetVertexBuffers(buffers.to_vec()));
    }

    /// Records an index buffer bind.
    pub fn set_index_buffer(&mut self, buffer: BufferId) {
        self.push(GraphicsCommand::SetIndexBuffer(buffer));
    }

    /// Records a uniform bind.
    pub fn bind_uniform(&mut self, set: u32, binding: u32, uniform: &Arc<Uniform>, element: u32) {
        self.push(GraphicsCommand::BindUniform {
            set,
            binding,
            uniform: Arc::clone(uniform),
            element,
        });
    }

    /// Records an indexed draw.
    pub fn draw_indexed(&mut self, index_count: u32, first_index: u32) {
        self.push(GraphicsCommand::DrawIndexed {
            index_count,
            first_index,
        });
    }
}
