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

//! # Quartz Data
//!
//! The data layer of the engine: a sparse-set Entity-Component-System with typed,
//! lazily iterated multi-component views and an ordered system scheduler.

#![warn(missing_docs)]

// Lets `#[derive(Component)]` expand to `::quartz_data::...` inside this crate too.
extern crate self as quartz_data;

pub mod ecs;
