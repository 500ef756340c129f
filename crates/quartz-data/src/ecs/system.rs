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

use crate::ecs::world::EntityWorld;
use std::any::{type_name, Any};

/// A unit of per-frame logic owned by an [`EntityWorld`].
///
/// Systems run one at a time, in registration order. While one of its hooks runs
/// the system is taken out of the world, so it may freely use the `&mut EntityWorld`
/// it receives (including registering or deregistering other systems). If a
/// system deregisters itself from inside a hook, its `on_destroy` runs as soon as
/// that hook returns.
pub trait System: 'static {
    /// Called once, right after the system is registered.
    fn on_init(&mut self, _world: &mut EntityWorld) {}

    /// Called once per rendered frame by [`EntityWorld::update`].
    fn update(&mut self, _world: &mut EntityWorld, _delta_time: f32) {}

    /// Called once per fixed simulation step by [`EntityWorld::tick`].
    fn tick(&mut self, _world: &mut EntityWorld, _delta_time: f32) {}

    /// Called once, right before the system is dropped by the world.
    fn on_destroy(&mut self, _world: &mut EntityWorld) {}

    /// A name for diagnostics.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Object-safe access to a boxed system and its concrete type.
pub(crate) trait SystemObject {
    fn as_system_mut(&mut self) -> &mut dyn System;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> SystemObject for S {
    fn as_system_mut(&mut self) -> &mut dyn System {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
