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

//! Render-pass descriptions registered with a backend.

use crate::config::DEFAULT_CLEAR_COLOR;

/// Describes the operation to perform on an attachment at the start of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOp<V> {
    /// The existing contents of the attachment will be loaded into the pass.
    Load,
    /// The attachment will be cleared to the specified value before the pass begins.
    Clear(V),
}

/// Describes the operation to perform on an attachment at the end of a render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// The results of the render pass will be stored to the attachment's memory.
    Store,
    /// The results of the render pass will be discarded.
    Discard,
}

/// Defines the load and store operations for a single render pass attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operations<V> {
    /// The operation to perform at the beginning of the pass.
    pub load: LoadOp<V>,
    /// The operation to perform at the end of the pass.
    pub store: StoreOp,
}

/// A render pass: what happens to the colour and depth targets of a framebuffer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderpassDescriptor {
    /// An optional debug label.
    pub label: Option<String>,
    /// Operations applied to the colour target.
    pub color_ops: Operations<[f32; 4]>,
    /// Operations applied to the depth target, if the framebuffer has one.
    pub depth_ops: Option<Operations<f32>>,
}

impl RenderpassDescriptor {
    /// A pass that clears colour and depth to the given values and stores the results.
    pub fn clearing(clear_color: [f32; 4], clear_depth: f32) -> Self {
        Self {
            label: None,
            color_ops: Operations {
                load: LoadOp::Clear(clear_color),
                store: StoreOp::Store,
            },
            depth_ops: Some(Operations {
                load: LoadOp::Clear(clear_depth),
                store: StoreOp::Store,
            }),
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl Default for RenderpassDescriptor {
    fn default() -> Self {
        Self::clearing(DEFAULT_CLEAR_COLOR, 1.0)
    }
}
