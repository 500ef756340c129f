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

//! Provides the backend-agnostic command recording and translation contracts.
//!
//! Render systems describe their work by appending [`GraphicsCommand`]s to a
//! [`CommandBuffer`]. Nothing reaches the GPU at that point: the
//! [`CommandTranslator`] later replays the captured log against a concrete
//! [`CommandBackend`] (implemented in `quartz-infra`), once per in-flight frame slot.

pub mod api;
pub mod error;
pub mod traits;
pub mod translator;

pub use self::api::*;
pub use self::error::CommandError;
pub use self::traits::CommandBackend;
pub use self::translator::CommandTranslator;
