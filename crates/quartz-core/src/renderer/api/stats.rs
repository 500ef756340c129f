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

/// Counters gathered while replaying a command log into one native buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// The number of recorded commands that were visited.
    pub commands: u32,
    /// The number of indexed draws issued to the backend.
    pub draw_calls: u32,
    /// The number of uniform descriptors rewritten because the cached buffer changed.
    pub descriptor_writes: u32,
}
