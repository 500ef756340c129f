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

//! Lazy iteration over the intersection of several component storages.
//!
//! A view is created by [`EntityWorld::view`](super::EntityWorld::view) and keeps
//! the world mutably borrowed for as long as it lives. Structural changes (adding,
//! removing or destroying) are therefore rejected at compile time while a view is
//! being iterated. To mutate the world based on a view, collect the matching
//! entities first and apply the changes afterwards; the collected list is a
//! snapshot and does not observe the changes made while walking it.

use crate::ecs::entity_store::EntityStore;
use crate::ecs::registry::{ComponentTypeId, TypeRegistry};
use crate::ecs::sparse_set::RawSparseSet;
use crate::ecs::storage::ComponentStorages;
use crate::ecs::Component;
use quartz_core::ecs::Entity;
use std::any::type_name;
use std::marker::PhantomData;

/// One element of a view: `&T` or `&mut T` for some component `T`.
pub trait ViewElement {
    /// The component type accessed.
    type Component: Component;

    /// The reference handed out for each entity.
    type Item<'a>;

    /// Whether the element hands out mutable references.
    const MUTABLE: bool;

    /// Records this element's component id and mutability in `access`.
    /// Returns `false` if the component type was never registered.
    #[doc(hidden)]
    fn collect_access(
        registry: &TypeRegistry<ComponentTypeId>,
        access: &mut Vec<(ComponentTypeId, bool)>,
    ) -> bool {
        match registry.id_of::<Self::Component>() {
            Some(id) => {
                access.push((id, Self::MUTABLE));
                true
            }
            None => false,
        }
    }

    /// Fetches the element for the entity at `index`.
    ///
    /// # Safety
    ///
    /// The caller (the view iterator) must guarantee that:
    /// 1. The storage behind `raw` outlives `'a` and is not structurally modified.
    /// 2. Aliasing rules hold: no other reference to the same value is alive when a
    ///    mutable one is handed out.
    #[doc(hidden)]
    unsafe fn fetch<'a>(
        raw: &RawSparseSet<Self::Component>,
        index: u32,
    ) -> Option<Self::Item<'a>>;
}

impl<T: Component> ViewElement for &T {
    type Component = T;
    type Item<'a> = &'a T;
    const MUTABLE: bool = false;

    unsafe fn fetch<'a>(raw: &RawSparseSet<T>, index: u32) -> Option<&'a T> {
        raw.get(index)
    }
}

impl<T: Component> ViewElement for &mut T {
    type Component = T;
    type Item<'a> = &'a mut T;
    const MUTABLE: bool = true;

    unsafe fn fetch<'a>(raw: &RawSparseSet<T>, index: u32) -> Option<&'a mut T> {
        raw.get_mut(index)
    }
}

/// A set of components that can be viewed together.
///
/// Implemented for every [`ViewElement`] (`&T`, `&mut T`) and for tuples of up to
/// eight elements, e.g. `(&mut Position, &Velocity)`.
pub trait ViewQuery {
    /// The item yielded for each matching entity, next to the entity itself.
    type Item<'a>;

    /// Pointer snapshots of the storages involved.
    #[doc(hidden)]
    type Raw: Copy;

    /// Records every element's component id and mutability. Returns `false` if any
    /// component type was never registered.
    #[doc(hidden)]
    fn collect_access(
        registry: &TypeRegistry<ComponentTypeId>,
        access: &mut Vec<(ComponentTypeId, bool)>,
    ) -> bool;

    /// Snapshots every involved storage. `None` if any storage does not exist.
    #[doc(hidden)]
    fn raw(storages: &mut ComponentStorages) -> Option<Self::Raw>;

    /// The entity indices of the smallest involved storage.
    ///
    /// # Safety
    /// The storages behind `raw` must outlive `'a` and stay structurally unchanged.
    #[doc(hidden)]
    unsafe fn candidates<'a>(raw: &Self::Raw) -> &'a [u32];

    /// Fetches every element for `index`, or `None` if one of them is missing.
    ///
    /// # Safety
    /// Same contract as [`ViewElement::fetch`].
    #[doc(hidden)]
    unsafe fn fetch<'a>(raw: &Self::Raw, index: u32) -> Option<Self::Item<'a>>;
}

impl<E: ViewElement> ViewQuery for E {
    type Item<'a> = <E as ViewElement>::Item<'a>;
    type Raw = RawSparseSet<<E as ViewElement>::Component>;

    fn collect_access(
        registry: &TypeRegistry<ComponentTypeId>,
        access: &mut Vec<(ComponentTypeId, bool)>,
    ) -> bool {
        <E as ViewElement>::collect_access(registry, access)
    }

    fn raw(storages: &mut ComponentStorages) -> Option<Self::Raw> {
        storages.raw_parts::<<E as ViewElement>::Component>()
    }

    unsafe fn candidates<'a>(raw: &Self::Raw) -> &'a [u32] {
        raw.indices()
    }

    unsafe fn fetch<'a>(raw: &Self::Raw, index: u32) -> Option<Self::Item<'a>> {
        <E as ViewElement>::fetch(raw, index)
    }
}

// Tuples drive iteration from their smallest storage and probe the others.
macro_rules! impl_view_query_tuple {
    ($($E:ident),+) => {
        impl<$($E: ViewElement),+> ViewQuery for ($($E,)+) {
            type Item<'a> = ($(<$E as ViewElement>::Item<'a>,)+);
            type Raw = ($(RawSparseSet<<$E as ViewElement>::Component>,)+);

            fn collect_access(
                registry: &TypeRegistry<ComponentTypeId>,
                access: &mut Vec<(ComponentTypeId, bool)>,
            ) -> bool {
                $( <$E as ViewElement>::collect_access(registry, access) )&&+
            }

            fn raw(storages: &mut ComponentStorages) -> Option<Self::Raw> {
                Some(($(storages.raw_parts::<<$E as ViewElement>::Component>()?,)+))
            }

            #[allow(non_snake_case)]
            unsafe fn candidates<'a>(raw: &Self::Raw) -> &'a [u32] {
                let ($($E,)+) = raw;
                let mut smallest: Option<&'a [u32]> = None;
                $(
                    let indices = $E.indices();
                    if smallest.map_or(true, |current| indices.len() < current.len()) {
                        smallest = Some(indices);
                    }
                )+
                smallest.unwrap_or(&[])
            }

            #[allow(non_snake_case)]
            unsafe fn fetch<'a>(raw: &Self::Raw, index: u32) -> Option<Self::Item<'a>> {
                let ($($E,)+) = raw;
                Some(($(<$E as ViewElement>::fetch($E, index)?,)+))
            }
        }
    };
}

impl_view_query_tuple!(E1);
impl_view_query_tuple!(E1, E2);
impl_view_query_tuple!(E1, E2, E3);
impl_view_query_tuple!(E1, E2, E3, E4);
impl_view_query_tuple!(E1, E2, E3, E4, E5);
impl_view_query_tuple!(E1, E2, E3, E4, E5, E6);
impl_view_query_tuple!(E1, E2, E3, E4, E5, E6, E7);
impl_view_query_tuple!(E1, E2, E3, E4, E5, E6, E7, E8);

/// Whether the same component appears twice with at least one mutable access.
fn has_aliasing_access(access: &[(ComponentTypeId, bool)]) -> bool {
    access.iter().enumerate().any(|(i, (id, mutable))| {
        access[i + 1..]
            .iter()
            .any(|(other, other_mutable)| other == id && (*mutable || *other_mutable))
    })
}

/// A lazily evaluated, restartable view over every entity that has all the
/// components named by `Q`.
///
/// A view over a component type that was never registered (or whose storage was
/// never created) is empty rather than an error.
pub struct EntityView<'w, Q: ViewQuery> {
    raw: Option<Q::Raw>,
    entities: &'w EntityStore,
    _marker: PhantomData<&'w mut ComponentStorages>,
}

impl<'w, Q: ViewQuery> EntityView<'w, Q> {
    pub(crate) fn new(storages: &'w mut ComponentStorages, entities: &'w EntityStore) -> Self {
        let mut access = Vec::new();
        let raw = if !Q::collect_access(storages.registry(), &mut access) {
            None
        } else if has_aliasing_access(&access) {
            log::error!(
                "View '{}' requests a component mutably more than once; returning an empty view",
                type_name::<Q>()
            );
            None
        } else {
            Q::raw(storages)
        };

        Self {
            raw,
            entities,
            _marker: PhantomData,
        }
    }

    /// Iterates over `(entity, components)` pairs. Can be called repeatedly.
    pub fn iter(&mut self) -> ViewIter<'_, Q> {
        ViewIter::new(self.raw, self.entities)
    }

    /// Collects the matching entities into a snapshot.
    pub fn entities(&mut self) -> Vec<Entity> {
        self.iter().map(|(entity, _)| entity).collect()
    }
}

impl<'w, Q: ViewQuery> IntoIterator for EntityView<'w, Q> {
    type Item = (Entity, Q::Item<'w>);
    type IntoIter = ViewIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        ViewIter::new(self.raw, self.entities)
    }
}

impl<'a, 'w, Q: ViewQuery> IntoIterator for &'a mut EntityView<'w, Q> {
    type Item = (Entity, Q::Item<'a>);
    type IntoIter = ViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The iterator behind an [`EntityView`].
pub struct ViewIter<'a, Q: ViewQuery> {
    raw: Option<Q::Raw>,
    candidates: &'a [u32],
    position: usize,
    entities: &'a EntityStore,
    _marker: PhantomData<&'a mut ComponentStorages>,
}

impl<'a, Q: ViewQuery> ViewIter<'a, Q> {
    fn new(raw: Option<Q::Raw>, entities: &'a EntityStore) -> Self {
        // SAFETY: the storages are exclusively borrowed for at least `'a` by the
        // view this iterator comes from, so they can neither move nor change shape.
        let candidates = match raw.as_ref() {
            Some(raw) => unsafe { Q::candidates(raw) },
            None => &[],
        };
        Self {
            raw,
            candidates,
            position: 0,
            entities,
            _marker: PhantomData,
        }
    }
}

impl<'a, Q: ViewQuery> Iterator for ViewIter<'a, Q> {
    type Item = (Entity, Q::Item<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.raw?;
        while let Some(&index) = self.candidates.get(self.position) {
            self.position += 1;
            // SAFETY: candidates are distinct entity indices, so each value is
            // handed out at most once per pass, and mutable elements never alias
            // because duplicate component access was rejected when the view was built.
            let Some(item) = (unsafe { Q::fetch(&raw, index) }) else {
                continue;
            };
            if let Some(entity) = self.entities.entity_at(index) {
                return Some((entity, item));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len() - self.position))
    }
}
