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

//! Backend-agnostic data types used to describe GPU work.

mod command;
mod flags;
mod pass;
mod pipeline;
mod resource;
mod stats;
mod uniform;

pub use self::command::*;
pub use self::flags::CommandBufferUsage;
pub use self::pass::*;
pub use self::pipeline::*;
pub use self::resource::*;
pub use self::stats::ReplayStats;
pub use self::uniform::*;
