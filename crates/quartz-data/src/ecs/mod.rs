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

//! Implements Quartz's sparse-set **Entity-Component-System**.
//!
//! Every component type gets its own [`SparseSet`] keyed by entity index, so adding
//! or removing a component is O(1) and never moves other component types. The
//! [`EntityWorld`] owns those storages together with the registered [`System`]s,
//! and hands out [`EntityView`]s that walk the intersection of several storages.
//!
//! The primary entry point is the [`EntityWorld`] struct.

mod bundle;
mod component;
mod entity_store;
mod registry;
mod sparse_set;
mod storage;
mod system;
mod view;
mod world;

pub use bundle::ComponentBundle;
pub use component::Component;
pub use quartz_core::ecs::Entity;
pub use registry::{ComponentTypeId, DenseTypeId, SystemTypeId, TypeRegistry};
pub use sparse_set::{ComponentStorage, SparseSet};
pub use storage::{ComponentStorages, ErasedStorage};
pub use system::System;
pub use view::{EntityView, ViewElement, ViewIter, ViewQuery};
pub use world::EntityWorld;

#[cfg(test)]
mod tests;
