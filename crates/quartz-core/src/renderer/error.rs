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

//! Error type for command-buffer building and replay.

use std::fmt;

/// An error raised while building, recording or replaying a command buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `record_static` was called on a buffer created as dynamic.
    NotStatic,
    /// A replay was requested before any native buffer was built.
    NotBuilt,
    /// The frame index does not address one of the built native buffers.
    InvalidFrameIndex {
        /// The requested frame slot.
        frame_index: u32,
        /// How many native buffers are currently built.
        buffer_count: u32,
    },
    /// The backend failed to allocate native command buffers.
    AllocationFailed(String),
    /// The backend failed to begin or end native recording.
    RecordingFailed(String),
    /// The backend failed to write a uniform descriptor.
    DescriptorUpdateFailed(String),
    /// Any other backend-specific failure.
    BackendError(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotStatic => {
                write!(f, "Static recording requested on a dynamic command buffer")
            }
            CommandError::NotBuilt => {
                write!(f, "Command buffer has no native buffers; call build_buffers first")
            }
            CommandError::InvalidFrameIndex {
                frame_index,
                buffer_count,
            } => write!(
                f,
                "Frame index {frame_index} is out of range for {buffer_count} native buffers"
            ),
            CommandError::AllocationFailed(msg) => {
                write!(f, "Native command buffer allocation failed: {msg}")
            }
            CommandError::RecordingFailed(msg) => write!(f, "Native recording failed: {msg}"),
            CommandError::DescriptorUpdateFailed(msg) => {
                write!(f, "Uniform descriptor update failed: {msg}")
            }
            CommandError::BackendError(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for CommandError {}
