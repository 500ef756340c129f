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

//! Internal entity slot management.

use quartz_core::ecs::Entity;

#[derive(Debug, Clone, Copy)]
struct EntitySlot {
    generation: u32,
    alive: bool,
}

/// Internal manager for entity slots.
///
/// Each slot remembers its current generation. Destroying an entity bumps the
/// generation and pushes the index onto a free list; the next creation pops it,
/// so indices stay dense and stale handles no longer match.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityStore {
    slots: Vec<EntitySlot>,
    freed: Vec<u32>,
    alive: usize,
}

impl EntityStore {
    /// Allocates a new or recycled entity.
    pub fn create(&mut self) -> Entity {
        self.alive += 1;
        if let Some(index) = self.freed.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return Entity::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(EntitySlot {
            generation: 0,
            alive: true,
        });
        Entity::new(index, 0)
    }

    /// Frees the slot of `entity`. Returns `false` for stale or dead handles.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.slots[entity.index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.freed.push(entity.index);
        self.alive -= 1;
        true
    }

    /// Whether `entity` refers to a live slot with a matching generation.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation)
    }

    /// The live entity currently occupying `index`, if any.
    pub fn entity_at(&self, index: u32) -> Option<Entity> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.alive)
            .map(|slot| Entity::new(index, slot.generation))
    }

    /// The number of live entities.
    pub fn alive_count(&self) -> usize {
        self.alive
    }

    /// Iterates over every live entity in index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(index, slot)| Entity::new(index as u32, slot.generation))
    }
}
