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

use crate::ecs::bundle::ComponentBundle;
use crate::ecs::entity_store::EntityStore;
use crate::ecs::registry::{ComponentTypeId, DenseTypeId, SystemTypeId, TypeRegistry};
use crate::ecs::sparse_set::SparseSet;
use crate::ecs::storage::ComponentStorages;
use crate::ecs::system::{System, SystemObject};
use crate::ecs::view::{EntityView, ViewQuery};
use crate::ecs::Component;
use quartz_core::ecs::Entity;
use std::any::type_name;

enum SystemSlot {
    Vacant,
    Idle(Box<dyn SystemObject>),
    /// Taken out of the world while one of its hooks runs.
    Running,
}

/// The central container for all entities, component storages and systems.
///
/// All operations are synchronous and take effect immediately. A world is meant
/// to be driven from one thread and has no internal locking.
///
/// Dropping the world deregisters every system in reverse registration order
/// (running their `on_destroy` hooks) before any storage is released.
pub struct EntityWorld {
    // Field order matters: systems must be dropped before the storages.
    systems: Vec<SystemSlot>,
    // Bumped on every registration into the slot of the same index.
    generations: Vec<u32>,
    schedule: Vec<SystemTypeId>,
    system_types: TypeRegistry<SystemTypeId>,
    entities: EntityStore,
    storages: ComponentStorages,
}

impl Default for EntityWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityWorld {
    /// Creates an empty world with fresh type registries.
    pub fn new() -> Self {
        Self::with_registries(TypeRegistry::new(), TypeRegistry::new())
    }

    /// Creates an empty world around existing (possibly pre-populated) registries.
    pub fn with_registries(
        component_types: TypeRegistry<ComponentTypeId>,
        system_types: TypeRegistry<SystemTypeId>,
    ) -> Self {
        Self {
            systems: Vec::new(),
            generations: Vec::new(),
            schedule: Vec::new(),
            system_types,
            entities: EntityStore::default(),
            storages: ComponentStorages::new(component_types),
        }
    }

    // --- Entities ---

    /// Creates an entity and attaches every component of `bundle` to it.
    ///
    /// Freed indices are reused, with their generation bumped.
    pub fn create_entity<B: ComponentBundle>(&mut self, bundle: B) -> Entity {
        let entity = self.entities.create();
        bundle.insert_into(&mut self.storages, entity.index);
        entity
    }

    /// Removes all of the entity's components and frees its slot.
    ///
    /// Returns `false` if the handle is stale or was already destroyed.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            log::debug!("Ignoring destroy of stale entity {entity}");
            return false;
        }
        self.storages.remove_all(entity.index);
        true
    }

    /// Whether `entity` is alive (not destroyed, and not a stale handle).
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// The number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Iterates over every live entity in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    // --- Components ---

    /// Registers `T` without creating its storage.
    pub fn register_component<T: Component>(&mut self) -> ComponentTypeId {
        self.storages.register::<T>()
    }

    /// Attaches every component of `bundle` to `entity`, overwriting existing
    /// values. The storage of a component type is created on first use.
    ///
    /// Returns `false` (and attaches nothing) if `entity` is not alive.
    pub fn add_component<B: ComponentBundle>(&mut self, entity: Entity, bundle: B) -> bool {
        if !self.entities.is_alive(entity) {
            log::warn!(
                "Cannot add '{}' to dead entity {entity}",
                type_name::<B>()
            );
            return false;
        }
        bundle.insert_into(&mut self.storages, entity.index);
        true
    }

    /// Detaches the component types named by `B` from `entity`. Components the
    /// entity does not have are ignored.
    ///
    /// Returns `false` if `entity` is not alive.
    pub fn remove_component<B: ComponentBundle>(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        B::remove_from(&mut self.storages, entity.index);
        true
    }

    /// Whether `entity` is alive and has every component type named by `B`.
    pub fn has_component<B: ComponentBundle>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity) && B::contained_in(&self.storages, entity.index)
    }

    /// The entity's `T`, if it is alive and has one.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storages.storage::<T>()?.get(entity.index)
    }

    /// The entity's `T`, mutably, if it is alive and has one.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storages.storage_mut::<T>()?.get_mut(entity.index)
    }

    /// The entity's `T`.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or has no `T`. This is the fast path for
    /// callers that already checked with [`has_component`](Self::has_component);
    /// use [`get_component`](Self::get_component) otherwise.
    pub fn component<T: Component>(&self, entity: Entity) -> &T {
        match self.get_component::<T>(entity) {
            Some(component) => component,
            None => panic!(
                "entity {entity} has no component '{}'",
                type_name::<T>()
            ),
        }
    }

    /// The entity's `T`, mutably.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or has no `T`.
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        match self.get_component_mut::<T>(entity) {
            Some(component) => component,
            None => panic!(
                "entity {entity} has no component '{}'",
                type_name::<T>()
            ),
        }
    }

    /// Whether a storage for `T` exists.
    pub fn component_exists<T: Component>(&self) -> bool {
        self.storages.storage::<T>().is_some()
    }

    /// Read access to the storage of `T`, if it exists.
    pub fn storage<T: Component>(&self) -> Option<&SparseSet<T>> {
        self.storages.storage::<T>()
    }

    /// The component type registry.
    pub fn component_types(&self) -> &TypeRegistry<ComponentTypeId> {
        self.storages.registry()
    }

    /// A lazy view over every entity that has all the components named by `Q`.
    ///
    /// If any named component type has no storage the view is empty. If `Q` names
    /// the same component twice with a mutable access, the conflict is logged and
    /// the view is empty.
    pub fn view<Q: ViewQuery>(&mut self) -> EntityView<'_, Q> {
        EntityView::new(&mut self.storages, &self.entities)
    }

    // --- Systems ---

    /// Constructs `S` with its `Default` impl and registers it.
    ///
    /// See [`register_system_with`](Self::register_system_with).
    pub fn register_system<S: System + Default>(&mut self) -> bool {
        if self.has_system::<S>() {
            log::debug!("System '{}' is already registered", type_name::<S>());
            return false;
        }
        self.register_system_with(S::default())
    }

    /// Registers `system` and runs its `on_init` hook.
    ///
    /// Registration is idempotent per type: if a system of type `S` is already
    /// registered, `system` is dropped without its hooks running and `false` is
    /// returned. `false` is also returned when the system deregisters itself from
    /// its own `on_init`.
    pub fn register_system_with<S: System>(&mut self, system: S) -> bool {
        let id = self.system_types.register::<S>();
        let position = id.index();
        if position >= self.systems.len() {
            self.systems.resize_with(position + 1, || SystemSlot::Vacant);
            self.generations.resize(position + 1, 0);
        }
        if !matches!(self.systems[position], SystemSlot::Vacant) {
            log::debug!("System '{}' is already registered", type_name::<S>());
            return false;
        }

        log::debug!("Registering system '{}' as {id:?}", type_name::<S>());
        self.systems[position] = SystemSlot::Running;
        self.generations[position] = self.generations[position].wrapping_add(1);
        let generation = self.generations[position];
        self.schedule.push(id);

        let mut system: Box<dyn SystemObject> = Box::new(system);
        system.as_system_mut().on_init(self);
        self.restore_system(id, generation, system)
    }

    /// Runs the `on_destroy` hook of `S` and drops it.
    ///
    /// Returns `false` if `S` is not registered.
    pub fn deregister_system<S: System>(&mut self) -> bool {
        let Some(id) = self.system_types.id_of::<S>() else {
            return false;
        };
        let Some(slot) = self.systems.get_mut(id.index()) else {
            return false;
        };

        match std::mem::replace(slot, SystemSlot::Vacant) {
            SystemSlot::Vacant => false,
            SystemSlot::Idle(mut system) => {
                log::debug!("Deregistering system '{}'", type_name::<S>());
                self.schedule.retain(|scheduled| *scheduled != id);
                system.as_system_mut().on_destroy(self);
                true
            }
            SystemSlot::Running => {
                // The hook that is running right now finishes first; `restore_system`
                // then sees the vacant slot and tears the system down.
                self.schedule.retain(|scheduled| *scheduled != id);
                true
            }
        }
    }

    /// Whether a system of type `S` is registered.
    pub fn has_system<S: System>(&self) -> bool {
        self.system_types
            .id_of::<S>()
            .and_then(|id| self.systems.get(id.index()))
            .is_some_and(|slot| !matches!(slot, SystemSlot::Vacant))
    }

    /// The registered system of type `S`.
    ///
    /// Returns `None` if it is not registered, or while one of its own hooks runs.
    pub fn system<S: System>(&self) -> Option<&S> {
        let id = self.system_types.id_of::<S>()?;
        match self.systems.get(id.index())? {
            SystemSlot::Idle(system) => system.as_any().downcast_ref::<S>(),
            _ => None,
        }
    }

    /// The registered system of type `S`, mutably.
    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        let id = self.system_types.id_of::<S>()?;
        match self.systems.get_mut(id.index())? {
            SystemSlot::Idle(system) => system.as_any_mut().downcast_mut::<S>(),
            _ => None,
        }
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.schedule.len()
    }

    /// The system type registry.
    pub fn system_types(&self) -> &TypeRegistry<SystemTypeId> {
        &self.system_types
    }

    /// Runs every system's `update` hook, in registration order.
    ///
    /// Systems registered during the pass first run on the next pass, including a
    /// fresh instance of a type that was deregistered earlier in the same pass.
    pub fn update(&mut self, delta_time: f32) {
        self.run_systems(|system, world| system.update(world, delta_time));
    }

    /// Runs every system's `tick` hook, in registration order.
    pub fn tick(&mut self, delta_time: f32) {
        self.run_systems(|system, world| system.tick(world, delta_time));
    }

    fn run_systems(&mut self, mut hook: impl FnMut(&mut dyn System, &mut EntityWorld)) {
        let schedule: Vec<(SystemTypeId, u32)> = self
            .schedule
            .iter()
            .map(|&id| (id, self.generations[id.index()]))
            .collect();
        for (id, generation) in schedule {
            if self.generations[id.index()] != generation {
                log::trace!("Skipping {id:?}: re-registered during this pass");
                continue;
            }
            let Some(slot) = self.systems.get_mut(id.index()) else {
                continue;
            };
            // Vacant: deregistered earlier in this pass. Running: re-entrant call.
            let mut system = match std::mem::replace(slot, SystemSlot::Running) {
                SystemSlot::Idle(system) => system,
                other => {
                    *slot = other;
                    log::trace!("Skipping {id:?} for this pass");
                    continue;
                }
            };
            hook(system.as_system_mut(), self);
            self.restore_system(id, generation, system);
        }
    }

    /// Puts a system back after one of its hooks. Returns `false` (after running
    /// `on_destroy`) if the system was deregistered while it was out.
    fn restore_system(
        &mut self,
        id: SystemTypeId,
        generation: u32,
        mut system: Box<dyn SystemObject>,
    ) -> bool {
        let position = id.index();
        if self.generations.get(position) == Some(&generation) {
            if let Some(slot) = self.systems.get_mut(position) {
                if matches!(slot, SystemSlot::Running) {
                    *slot = SystemSlot::Idle(system);
                    return true;
                }
            }
        }
        log::debug!(
            "System '{}' was deregistered during its own hook",
            system.as_system_mut().name()
        );
        system.as_system_mut().on_destroy(self);
        false
    }
}

impl Drop for EntityWorld {
    fn drop(&mut self) {
        while let Some(id) = self.schedule.pop() {
            let Some(slot) = self.systems.get_mut(id.index()) else {
                continue;
            };
            if let SystemSlot::Idle(mut system) = std::mem::replace(slot, SystemSlot::Vacant) {
                system.as_system_mut().on_destroy(self);
            }
        }
    }
}
