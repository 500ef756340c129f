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

use crate::ecs::storage::ComponentStorages;
use crate::ecs::Component;

/// A trait for any collection of components handled together as a single unit.
///
/// It is implemented for `()`, for every single [`Component`], and for tuples of
/// up to eight components such as `(Position, Velocity)`. Bundles are what
/// [`EntityWorld::create_entity`](super::EntityWorld::create_entity) and
/// [`EntityWorld::add_component`](super::EntityWorld::add_component) accept, and
/// their types name the components for
/// [`remove_component`](super::EntityWorld::remove_component) and
/// [`has_component`](super::EntityWorld::has_component).
pub trait ComponentBundle: Send + Sync + 'static {
    /// Writes every component into its storage under `index`, creating storages
    /// as needed. Existing values are overwritten.
    fn insert_into(self, storages: &mut ComponentStorages, index: u32);

    /// Removes every component type of the bundle from `index`. Missing
    /// components and missing storages are ignored.
    fn remove_from(storages: &mut ComponentStorages, index: u32);

    /// Whether `index` has every component type of the bundle.
    fn contained_in(storages: &ComponentStorages, index: u32) -> bool;
}

impl ComponentBundle for () {
    fn insert_into(self, _storages: &mut ComponentStorages, _index: u32) {}

    fn remove_from(_storages: &mut ComponentStorages, _index: u32) {}

    fn contained_in(_storages: &ComponentStorages, _index: u32) -> bool {
        true
    }
}

impl<C: Component> ComponentBundle for C {
    fn insert_into(self, storages: &mut ComponentStorages, index: u32) {
        storages.storage_or_insert::<C>().insert(index, self);
    }

    fn remove_from(storages: &mut ComponentStorages, index: u32) {
        if let Some(storage) = storages.storage_mut::<C>() {
            storage.remove(index);
        }
    }

    fn contained_in(storages: &ComponentStorages, index: u32) -> bool {
        storages
            .storage::<C>()
            .is_some_and(|storage| storage.contains(index))
    }
}

macro_rules! impl_component_bundle_tuple {
    ($($C:ident),+) => {
        impl<$($C: Component),+> ComponentBundle for ($($C,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, storages: &mut ComponentStorages, index: u32) {
                let ($($C,)+) = self;
                $( storages.storage_or_insert::<$C>().insert(index, $C); )+
            }

            fn remove_from(storages: &mut ComponentStorages, index: u32) {
                $( <$C as ComponentBundle>::remove_from(storages, index); )+
            }

            fn contained_in(storages: &ComponentStorages, index: u32) -> bool {
                $( <$C as ComponentBundle>::contained_in(storages, index) )&&+
            }
        }
    };
}

impl_component_bundle_tuple!(C1);
impl_component_bundle_tuple!(C1, C2);
impl_component_bundle_tuple!(C1, C2, C3);
impl_component_bundle_tuple!(C1, C2, C3, C4);
impl_component_bundle_tuple!(C1, C2, C3, C4, C5);
impl_component_bundle_tuple!(C1, C2, C3, C4, C5, C6);
impl_component_bundle_tuple!(C1, C2, C3, C4, C5, C6, C7);
impl_component_bundle_tuple!(C1, C2, C3, C4, C5, C6, C7, C8);
