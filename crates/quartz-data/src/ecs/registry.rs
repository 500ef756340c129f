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

//! Runtime type identity: maps Rust types to small dense integers.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A dense, registry-assigned identifier usable as a flat array index.
pub trait DenseTypeId: Copy + Eq + fmt::Debug {
    /// Wraps a raw dense index.
    fn from_index(index: usize) -> Self;
    /// The raw dense index.
    fn index(self) -> usize;
}

/// The dense identifier of a component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub usize);

/// The dense identifier of a system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemTypeId(pub usize);

impl DenseTypeId for ComponentTypeId {
    fn from_index(index: usize) -> Self {
        Self(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

impl DenseTypeId for SystemTypeId {
    fn from_index(index: usize) -> Self {
        Self(index)
    }

    fn index(self) -> usize {
        self.0
    }
}

/// Assigns each distinct Rust type a dense identifier on first registration.
///
/// Identifiers start at zero, are handed out in registration order and never
/// change for the lifetime of the registry. The registry is a plain value: a world
/// owns one per identifier kind, and callers may build and pre-populate one up
/// front and inject it with [`EntityWorld::with_registries`](super::EntityWorld::with_registries).
pub struct TypeRegistry<I: DenseTypeId> {
    ids: HashMap<TypeId, I>,
    names: Vec<&'static str>,
    _marker: PhantomData<I>,
}

impl<I: DenseTypeId> Default for TypeRegistry<I> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            names: Vec::new(),
            _marker: PhantomData,
        }
    }
}

impl<I: DenseTypeId> fmt::Debug for TypeRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names.iter()).finish()
    }
}

impl<I: DenseTypeId> TypeRegistry<I> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identifier of `T`, assigning the next one if `T` is new.
    pub fn register<T: 'static>(&mut self) -> I {
        if let Some(&id) = self.ids.get(&TypeId::of::<T>()) {
            return id;
        }
        let id = I::from_index(self.names.len());
        self.ids.insert(TypeId::of::<T>(), id);
        self.names.push(type_name::<T>());
        log::trace!("Registered type '{}' as {:?}", type_name::<T>(), id);
        id
    }

    /// The identifier of `T`, if it was registered.
    pub fn id_of<T: 'static>(&self) -> Option<I> {
        self.ids.get(&TypeId::of::<T>()).copied()
    }

    /// Whether `T` was registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.ids.contains_key(&TypeId::of::<T>())
    }

    /// The Rust type name behind an identifier.
    pub fn name_of(&self, id: I) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// The number of registered types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no type was registered yet.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn test_ids_are_dense_and_stable() {
        let mut registry = TypeRegistry::<ComponentTypeId>::new();

        let a = registry.register::<A>();
        let b = registry.register::<B>();
        let a_again = registry.register::<A>();

        assert_eq!(a, ComponentTypeId(0));
        assert_eq!(b, ComponentTypeId(1));
        assert_eq!(a_again, a, "Re-registering must return the same id");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_without_registration() {
        let mut registry = TypeRegistry::<SystemTypeId>::new();
        assert_eq!(registry.id_of::<A>(), None);

        registry.register::<A>();

        assert!(registry.contains::<A>());
        assert!(!registry.contains::<B>());
        assert!(registry
            .name_of(SystemTypeId(0))
            .is_some_and(|name| name.ends_with("A")));
    }
}
