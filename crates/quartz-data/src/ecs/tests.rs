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

use super::*;
use std::sync::{Arc, Mutex};

// --- DUMMY COMPONENTS FOR TESTING ---

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}
impl Component for Velocity {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
struct Health(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component)]
struct Tag;

// --- DUMMY SYSTEMS FOR TESTING ---

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Records every hook it receives into a shared journal.
struct Recorder {
    label: &'static str,
    journal: Journal,
}

impl System for Recorder {
    fn on_init(&mut self, _world: &mut EntityWorld) {
        self.journal.lock().unwrap().push(format!("{}:init", self.label));
    }

    fn update(&mut self, _world: &mut EntityWorld, _delta_time: f32) {
        self.journal.lock().unwrap().push(format!("{}:update", self.label));
    }

    fn tick(&mut self, _world: &mut EntityWorld, _delta_time: f32) {
        self.journal.lock().unwrap().push(format!("{}:tick", self.label));
    }

    fn on_destroy(&mut self, _world: &mut EntityWorld) {
        self.journal.lock().unwrap().push(format!("{}:destroy", self.label));
    }
}

/// A second recorder type, since registration is keyed by type.
struct OtherRecorder(Recorder);

impl System for OtherRecorder {
    fn on_init(&mut self, world: &mut EntityWorld) {
        self.0.on_init(world);
    }

    fn update(&mut self, world: &mut EntityWorld, delta_time: f32) {
        self.0.update(world, delta_time);
    }

    fn on_destroy(&mut self, world: &mut EntityWorld) {
        self.0.on_destroy(world);
    }
}

#[derive(Default)]
struct Counter {
    inits: u32,
    updates: u32,
}

impl System for Counter {
    fn on_init(&mut self, _world: &mut EntityWorld) {
        self.inits += 1;
    }

    fn update(&mut self, _world: &mut EntityWorld, _delta_time: f32) {
        self.updates += 1;
    }
}

/// Deregisters itself on its first update.
#[derive(Default)]
struct OneShot;

impl System for OneShot {
    fn update(&mut self, world: &mut EntityWorld, _delta_time: f32) {
        world.deregister_system::<OneShot>();
    }

    fn on_destroy(&mut self, world: &mut EntityWorld) {
        world.create_entity(Tag);
    }
}

/// Deregisters itself before it ever runs.
#[derive(Default)]
struct Quitter;

impl System for Quitter {
    fn on_init(&mut self, world: &mut EntityWorld) {
        world.deregister_system::<Quitter>();
    }

    fn on_destroy(&mut self, world: &mut EntityWorld) {
        world.create_entity(Tag);
    }
}

struct Late {
    label: &'static str,
    journal: Journal,
}

impl System for Late {
    fn update(&mut self, _world: &mut EntityWorld, _delta_time: f32) {
        self.journal.lock().unwrap().push(format!("{}:update", self.label));
    }

    fn on_destroy(&mut self, _world: &mut EntityWorld) {
        self.journal.lock().unwrap().push(format!("{}:destroy", self.label));
    }
}

/// Replaces the registered `Late` with a fresh instance, once.
struct Swapper {
    journal: Journal,
    swapped: bool,
}

impl System for Swapper {
    fn update(&mut self, world: &mut EntityWorld, _delta_time: f32) {
        if self.swapped {
            return;
        }
        self.swapped = true;
        world.deregister_system::<Late>();
        world.register_system_with(Late {
            label: "new",
            journal: self.journal.clone(),
        });
    }
}

// --- TESTS ---

#[test]
fn test_view_yields_only_entities_with_every_component() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    let _e1 = world.create_entity(Position { x: 1.0, y: 0.0 });
    let e2 = world.create_entity((Position { x: 2.0, y: 0.0 }, Velocity { x: 0.5, y: 0.0 }));
    let _e3 = world.create_entity(Velocity { x: 3.0, y: 0.0 });

    // --- 2. ACTION ---
    let matched: Vec<(Entity, Position, Velocity)> = world
        .view::<(&Position, &Velocity)>()
        .into_iter()
        .map(|(entity, (position, velocity))| (entity, *position, *velocity))
        .collect();

    // --- 3. ASSERTIONS ---
    assert_eq!(matched.len(), 1, "Only one entity has both components");
    assert_eq!(matched[0].0, e2);
    assert_eq!(matched[0].1, Position { x: 2.0, y: 0.0 });
    assert_eq!(matched[0].2, Velocity { x: 0.5, y: 0.0 });
}

#[test]
fn test_view_over_unknown_component_is_empty() {
    let mut world = EntityWorld::new();
    world.create_entity(Position { x: 0.0, y: 0.0 });

    assert_eq!(world.view::<&Health>().into_iter().count(), 0);
    assert_eq!(world.view::<(&Position, &Health)>().into_iter().count(), 0);
}

#[test]
fn test_view_can_be_iterated_repeatedly() {
    let mut world = EntityWorld::new();
    for i in 0..4 {
        world.create_entity(Health(i));
    }

    let mut view = world.view::<&Health>();
    let first: u32 = view.iter().map(|(_, health)| health.0).sum();
    let second: u32 = (&mut view).into_iter().map(|(_, health)| health.0).sum();

    assert_eq!(first, 6);
    assert_eq!(first, second, "A view restarts from the beginning on every pass");
}

#[test]
fn test_mutable_view_writes_through() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    let moving = world.create_entity((Position { x: 0.0, y: 0.0 }, Velocity { x: 1.0, y: 2.0 }));
    let still = world.create_entity(Position { x: 5.0, y: 5.0 });

    // --- 2. ACTION ---
    for (_, (position, velocity)) in world.view::<(&mut Position, &Velocity)>() {
        position.x += velocity.x;
        position.y += velocity.y;
    }

    // --- 3. ASSERTIONS ---
    assert_eq!(
        *world.component::<Position>(moving),
        Position { x: 1.0, y: 2.0 }
    );
    assert_eq!(
        *world.component::<Position>(still),
        Position { x: 5.0, y: 5.0 },
        "Entities outside the view are untouched"
    );
}

#[test]
fn test_view_with_duplicate_mutable_access_is_empty() {
    let mut world = EntityWorld::new();
    world.create_entity(Health(1));

    assert_eq!(world.view::<(&mut Health, &Health)>().into_iter().count(), 0);
    assert_eq!(world.view::<(&mut Health, &mut Health)>().into_iter().count(), 0);
    assert_eq!(
        world.view::<(&Health, &Health)>().into_iter().count(),
        1,
        "Shared access to the same component is allowed"
    );
}

#[test]
fn test_structural_changes_through_entity_snapshot() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    let entities: Vec<Entity> = (0..5).map(|i| world.create_entity(Health(i))).collect();

    // --- 2. ACTION ---
    // Collect the matching entities first, then mutate the world freely.
    let low = world
        .view::<&Health>()
        .into_iter()
        .filter(|(_, health)| health.0 < 2)
        .map(|(entity, _)| entity)
        .collect::<Vec<_>>();
    for entity in low {
        world.remove_component::<Health>(entity);
        world.add_component(entity, Tag);
    }

    // --- 3. ASSERTIONS ---
    assert_eq!(world.view::<&Health>().entities().len(), 3);
    assert_eq!(world.view::<&Tag>().entities(), vec![entities[0], entities[1]]);
}

#[test]
fn test_destroyed_entity_index_is_recycled_with_new_generation() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    let first = world.create_entity((Health(10), Tag));
    let _second = world.create_entity(Health(20));

    // --- 2. ACTION ---
    assert!(world.destroy_entity(first));
    let recycled = world.create_entity(Health(30));

    // --- 3. ASSERTIONS ---
    assert_eq!(recycled.index, first.index, "The freed index is reused");
    assert_eq!(recycled.generation, first.generation + 1);
    assert!(!world.is_alive(first), "The old handle is stale");
    assert!(world.is_alive(recycled));
    assert_eq!(world.get_component::<Health>(first), None);
    assert!(
        !world.has_component::<Tag>(recycled),
        "Components of the destroyed entity do not leak into the recycled one"
    );
    assert_eq!(world.component::<Health>(recycled).0, 30);
    assert_eq!(world.entity_count(), 2);
    assert!(!world.destroy_entity(first), "Destroying twice is a no-op");
}

#[test]
fn test_components_on_stale_handles_are_rejected() {
    let mut world = EntityWorld::new();
    let entity = world.create_entity(());
    world.destroy_entity(entity);

    assert!(!world.add_component(entity, Health(1)));
    assert!(!world.remove_component::<Health>(entity));
    assert!(!world.component_exists::<Health>());
}

#[test]
fn test_add_overwrites_and_remove_is_idempotent() {
    let mut world = EntityWorld::new();
    let entity = world.create_entity(Health(1));

    assert!(world.add_component(entity, (Health(2), Tag)));
    assert_eq!(world.component::<Health>(entity).0, 2);
    assert!(world.has_component::<(Health, Tag)>(entity));

    assert!(world.remove_component::<Tag>(entity));
    assert!(world.remove_component::<Tag>(entity), "Removing an absent component is fine");
    assert!(world.has_component::<Health>(entity));
    assert!(!world.has_component::<(Health, Tag)>(entity));
    assert!(world.component_exists::<Tag>(), "The emptied storage still exists");
}

#[test]
fn test_component_mut_and_get_component_mut() {
    let mut world = EntityWorld::new();
    let entity = world.create_entity(Health(1));

    world.component_mut::<Health>(entity).0 += 4;
    if let Some(health) = world.get_component_mut::<Health>(entity) {
        health.0 *= 2;
    }

    assert_eq!(world.component::<Health>(entity).0, 10);
    assert!(world.get_component_mut::<Tag>(entity).is_none());
}

#[test]
#[should_panic(expected = "has no component")]
fn test_component_panics_when_missing() {
    let mut world = EntityWorld::new();
    let entity = world.create_entity(Health(1));
    let _ = world.component::<Tag>(entity);
}

#[test]
fn test_storage_exposes_the_sparse_set() {
    let mut world = EntityWorld::new();
    let a = world.create_entity(Health(1));
    let b = world.create_entity(Health(2));
    world.destroy_entity(a);

    let storage = world.storage::<Health>().unwrap();
    assert_eq!(storage.len(), 1);
    assert_eq!(storage.indices(), &[b.index]);
    assert!(world.storage::<Tag>().is_none());
}

#[test]
fn test_injected_registries_keep_their_ids() {
    // --- 1. SETUP ---
    let mut components = TypeRegistry::<ComponentTypeId>::new();
    let tag_id = components.register::<Tag>();
    let health_id = components.register::<Health>();
    let mut systems = TypeRegistry::<SystemTypeId>::new();
    let counter_id = systems.register::<Counter>();

    // --- 2. ACTION ---
    let mut world = EntityWorld::with_registries(components, systems);
    world.create_entity(Health(3));
    world.register_system::<Counter>();

    // --- 3. ASSERTIONS ---
    assert_eq!(world.component_types().id_of::<Tag>(), Some(tag_id));
    assert_eq!(world.component_types().id_of::<Health>(), Some(health_id));
    assert_eq!(world.register_component::<Health>(), health_id);
    assert_eq!(world.system_types().id_of::<Counter>(), Some(counter_id));
    assert!(
        !world.component_exists::<Tag>(),
        "Registering a type does not create its storage"
    );
}

#[test]
fn test_register_system_twice_initializes_once() {
    let mut world = EntityWorld::new();

    assert!(world.register_system::<Counter>());
    assert!(!world.register_system::<Counter>());
    assert!(!world.register_system_with(Counter::default()));

    assert_eq!(world.system_count(), 1);
    assert_eq!(world.system::<Counter>().unwrap().inits, 1);
}

#[test]
fn test_systems_run_in_registration_order() {
    // --- 1. SETUP ---
    let journal = journal();
    let mut world = EntityWorld::new();
    world.register_system_with(OtherRecorder(Recorder {
        label: "b",
        journal: journal.clone(),
    }));
    world.register_system_with(Recorder {
        label: "a",
        journal: journal.clone(),
    });

    // --- 2. ACTION ---
    world.update(0.016);
    world.tick(0.016);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        entries(&journal),
        vec!["b:init", "a:init", "b:update", "a:update", "a:tick"],
        "OtherRecorder keeps the default tick, which does nothing"
    );
}

#[test]
fn test_deregister_runs_on_destroy_once() {
    let journal = journal();
    let mut world = EntityWorld::new();
    world.register_system_with(Recorder {
        label: "a",
        journal: journal.clone(),
    });

    assert!(world.deregister_system::<Recorder>());
    assert!(!world.deregister_system::<Recorder>());
    assert!(!world.deregister_system::<Counter>(), "Never registered");
    world.update(1.0);

    assert!(!world.has_system::<Recorder>());
    assert_eq!(entries(&journal), vec!["a:init", "a:destroy"]);
}

#[test]
fn test_system_can_deregister_itself() {
    let mut world = EntityWorld::new();
    world.register_system::<OneShot>();
    world.register_system::<Counter>();

    world.update(1.0);
    world.update(1.0);

    assert!(!world.has_system::<OneShot>());
    assert_eq!(world.system::<Counter>().unwrap().updates, 2);
    assert_eq!(
        world.view::<&Tag>().entities().len(),
        1,
        "on_destroy ran exactly once, with access to the world"
    );
}

#[test]
fn test_system_mut_gives_access_to_state() {
    let mut world = EntityWorld::new();
    world.register_system::<Counter>();

    world.system_mut::<Counter>().unwrap().updates = 41;
    world.update(0.5);

    assert_eq!(world.system::<Counter>().unwrap().updates, 42);
    assert!(world.system::<OneShot>().is_none());
}

#[test]
fn test_dropping_world_destroys_systems_in_reverse_order() {
    let journal = journal();
    {
        let mut world = EntityWorld::new();
        world.register_system_with(Recorder {
            label: "a",
            journal: journal.clone(),
        });
        world.register_system_with(OtherRecorder(Recorder {
            label: "b",
            journal: journal.clone(),
        }));
    }

    assert_eq!(
        entries(&journal),
        vec!["a:init", "b:init", "b:destroy", "a:destroy"]
    );
}

#[test]
fn test_system_replaced_mid_pass_waits_for_next_pass() {
    // --- 1. SETUP ---
    let journal = journal();
    let mut world = EntityWorld::new();
    world.register_system_with(Swapper {
        journal: journal.clone(),
        swapped: false,
    });
    world.register_system_with(Late {
        label: "old",
        journal: journal.clone(),
    });

    // --- 2. ACTION ---
    world.update(1.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        entries(&journal),
        vec!["old:destroy"],
        "The fresh instance must not run in the pass that registered it"
    );
    assert!(world.has_system::<Late>());

    world.update(1.0);
    assert_eq!(entries(&journal), vec!["old:destroy", "new:update"]);
}

#[test]
fn test_register_reports_failure_when_system_quits_in_on_init() {
    let mut world = EntityWorld::new();

    assert!(!world.register_system::<Quitter>());

    assert!(!world.has_system::<Quitter>());
    assert_eq!(world.system_count(), 0);
    assert_eq!(
        world.view::<&Tag>().entities().len(),
        1,
        "on_destroy ran once the init hook returned"
    );
}
