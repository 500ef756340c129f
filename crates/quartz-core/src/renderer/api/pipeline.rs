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

//! Pipeline handles and the uniform descriptor cache they own.

use super::resource::{BufferId, ComputePipelineId, DescriptorSetId, RenderPipelineId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies one uniform binding point of a pipeline for one in-flight frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformSlot {
    /// The descriptor set (bind group) index.
    pub set: u32,
    /// The binding inside the set.
    pub binding: u32,
    /// The in-flight frame slot.
    pub frame_index: u32,
}

/// What is currently written into one uniform binding point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformState {
    /// The buffer the descriptor currently points at.
    pub buffer: Option<BufferId>,
    /// The written descriptor set, once one exists.
    pub descriptor_set: Option<DescriptorSetId>,
}

impl UniformState {
    /// Whether binding `buffer` requires the descriptor to be (re)written first.
    ///
    /// Only the buffer identity for this slot is compared. A uniform whose backing
    /// buffers are swapped for other frame slots is not detected here.
    pub fn needs_update(&self, buffer: BufferId) -> bool {
        self.buffer != Some(buffer) || self.descriptor_set.is_none()
    }
}

/// Per-pipeline cache of [`UniformState`]s, keyed by [`UniformSlot`].
#[derive(Debug, Default)]
pub struct UniformStateCache {
    states: HashMap<UniformSlot, UniformState>,
}

impl UniformStateCache {
    /// The state of a slot; never-written slots report the default (empty) state.
    pub fn get(&self, slot: UniformSlot) -> UniformState {
        self.states.get(&slot).copied().unwrap_or_default()
    }

    /// Records the state of a slot after a descriptor write.
    pub fn set(&mut self, slot: UniformSlot, state: UniformState) {
        self.states.insert(slot, state);
    }

    /// The number of slots that have been written at least once.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no slot has been written yet.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// A graphics pipeline as seen by the recorder.
///
/// Cloning the handle is cheap and every clone shares the same uniform cache, so
/// all command buffers that bind this pipeline reuse each other's descriptor writes.
/// The cache assumes a single recording thread.
#[derive(Debug, Clone)]
pub struct GraphicsPipeline {
    id: RenderPipelineId,
    uniform_states: Arc<Mutex<UniformStateCache>>,
}

impl GraphicsPipeline {
    /// Wraps a backend pipeline with an empty uniform cache.
    pub fn new(id: RenderPipelineId) -> Self {
        Self {
            id,
            uniform_states: Arc::new(Mutex::new(UniformStateCache::default())),
        }
    }

    /// The backend pipeline handle.
    pub fn id(&self) -> RenderPipelineId {
        self.id
    }

    /// Locks the uniform cache shared by every clone of this handle.
    pub fn uniform_states(&self) -> MutexGuard<'_, UniformStateCache> {
        self.uniform_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for GraphicsPipeline {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.uniform_states, &other.uniform_states)
    }
}

/// A compute pipeline as seen by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputePipeline {
    id: ComputePipelineId,
}

impl ComputePipeline {
    /// Wraps a backend compute pipeline.
    pub fn new(id: ComputePipelineId) -> Self {
        Self { id }
    }

    /// The backend pipeline handle.
    pub fn id(&self) -> ComputePipelineId {
        self.id
    }
}

/// Which bind point a pipeline targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineType {
    /// Rasterization pipelines.
    Graphics,
    /// Compute pipelines.
    Compute,
}

/// Either kind of pipeline, for callers that hold pipelines generically.
#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
    /// A graphics pipeline.
    Graphics(GraphicsPipeline),
    /// A compute pipeline.
    Compute(ComputePipeline),
}

impl Pipeline {
    /// The bind point this pipeline targets.
    pub fn pipeline_type(&self) -> PipelineType {
        match self {
            Pipeline::Graphics(_) => PipelineType::Graphics,
            Pipeline::Compute(_) => PipelineType::Compute,
        }
    }
}

impl From<GraphicsPipeline> for Pipeline {
    fn from(pipeline: GraphicsPipeline) -> Self {
        Pipeline::Graphics(pipeline)
    }
}

impl From<ComputePipeline> for Pipeline {
    fn from(pipeline: ComputePipeline) -> Self {
        Pipeline::Compute(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_uniform_cache() {
        let pipeline = GraphicsPipeline::new(RenderPipelineId(7));
        let clone = pipeline.clone();
        let slot = UniformSlot {
            set: 0,
            binding: 1,
            frame_index: 2,
        };

        clone.uniform_states().set(
            slot,
            UniformState {
                buffer: Some(BufferId(3)),
                descriptor_set: Some(DescriptorSetId(9)),
            },
        );

        let state = pipeline.uniform_states().get(slot);
        assert_eq!(state.buffer, Some(BufferId(3)));
        assert_eq!(pipeline, clone);
        assert_ne!(
            pipeline,
            GraphicsPipeline::new(RenderPipelineId(7)),
            "A fresh handle owns a different cache"
        );
    }

    #[test]
    fn test_needs_update_only_when_buffer_or_descriptor_missing() {
        let empty = UniformState::default();
        assert!(empty.needs_update(BufferId(0)));

        let written = UniformState {
            buffer: Some(BufferId(0)),
            descriptor_set: Some(DescriptorSetId(0)),
        };
        assert!(!written.needs_update(BufferId(0)));
        assert!(written.needs_update(BufferId(1)));
    }
}
