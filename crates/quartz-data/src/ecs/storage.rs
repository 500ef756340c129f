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

//! Type-erased ownership of every component storage.

use crate::ecs::registry::{ComponentTypeId, DenseTypeId, TypeRegistry};
use crate::ecs::sparse_set::{RawSparseSet, SparseSet};
use crate::ecs::Component;
use std::any::{type_name, Any};

/// An internal helper trait to manage a `SparseSet<T>` without knowing `T`.
///
/// This lets the world remove a destroyed entity from every storage, and downcast
/// back to the concrete set when the component type is known again.
pub trait ErasedStorage: Any + Send + Sync {
    /// Casts the trait object to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts the trait object to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Removes the value stored under `index`, returning whether one existed.
    fn remove_index(&mut self, index: u32) -> bool;

    /// Whether `index` has a value.
    fn contains_index(&self, index: u32) -> bool;

    /// The number of stored values.
    fn len(&self) -> usize;

    /// Whether the storage holds no value.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Component> ErasedStorage for SparseSet<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_index(&mut self, index: u32) -> bool {
        self.remove(index).is_some()
    }

    fn contains_index(&self, index: u32) -> bool {
        self.contains(index)
    }

    fn len(&self) -> usize {
        SparseSet::len(self)
    }
}

/// Owns one [`SparseSet`] per component type, addressed by [`ComponentTypeId`].
///
/// Storages live in a flat array indexed by the dense type id. A type can be
/// registered without a storage existing yet; the storage is created on the
/// first insert.
#[derive(Default)]
pub struct ComponentStorages {
    registry: TypeRegistry<ComponentTypeId>,
    storages: Vec<Option<Box<dyn ErasedStorage>>>,
}

impl ComponentStorages {
    /// Creates an empty set of storages around an existing registry.
    pub fn new(registry: TypeRegistry<ComponentTypeId>) -> Self {
        Self {
            registry,
            storages: Vec::new(),
        }
    }

    /// The component type registry.
    pub fn registry(&self) -> &TypeRegistry<ComponentTypeId> {
        &self.registry
    }

    /// Registers `T` without creating its storage.
    pub fn register<T: Component>(&mut self) -> ComponentTypeId {
        self.registry.register::<T>()
    }

    /// The storage for `T`, if it exists.
    pub fn storage<T: Component>(&self) -> Option<&SparseSet<T>> {
        let id = self.registry.id_of::<T>()?;
        self.storages
            .get(id.index())?
            .as_ref()?
            .as_any()
            .downcast_ref::<SparseSet<T>>()
    }

    /// The storage for `T`, mutably, if it exists.
    pub fn storage_mut<T: Component>(&mut self) -> Option<&mut SparseSet<T>> {
        let id = self.registry.id_of::<T>()?;
        self.storages
            .get_mut(id.index())?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
    }

    /// The storage for `T`, registering the type and creating the storage if needed.
    pub fn storage_or_insert<T: Component>(&mut self) -> &mut SparseSet<T> {
        let id = self.registry.register::<T>();
        let position = id.index();
        if position >= self.storages.len() {
            self.storages.resize_with(position + 1, || None);
        }

        self.storages[position]
            .get_or_insert_with(|| {
                log::debug!(
                    "Created storage for component '{}' ({id:?})",
                    type_name::<T>()
                );
                Box::new(SparseSet::<T>::new())
            })
            .as_any_mut()
            .downcast_mut::<SparseSet<T>>()
            .unwrap_or_else(|| {
                unreachable!("storage slot {id:?} holds a different component type")
            })
    }

    /// Removes `index` from every storage. Returns how many values were removed.
    pub fn remove_all(&mut self, index: u32) -> usize {
        self.storages
            .iter_mut()
            .flatten()
            .filter_map(|storage| storage.remove_index(index).then_some(()))
            .count()
    }

    /// The number of storages that have been created.
    pub fn storage_count(&self) -> usize {
        self.storages.iter().flatten().count()
    }

    /// Pointer snapshot of the storage for `T`, if it exists.
    pub(crate) fn raw_parts<T: Component>(&mut self) -> Option<RawSparseSet<T>> {
        self.storage_mut::<T>().map(SparseSet::raw_parts)
    }
}
