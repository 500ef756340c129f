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

use crate::quartz_bitflags;

quartz_bitflags! {
    /// The kinds of GPU work a command buffer has recorded since it was last reset.
    ///
    /// The accumulated set decides which command pool its native buffers are
    /// allocated from (see [`CommandPoolKind::select`](super::CommandPoolKind::select)).
    pub struct CommandBufferUsage: u32 {
        /// Draws, render passes or graphics pipeline binds.
        const GRAPHICS = 1 << 0;
        /// Compute pipeline binds or dispatches.
        const COMPUTE = 1 << 1;
        /// Copies between buffers and images.
        const TRANSFER = 1 << 2;
    }
}
