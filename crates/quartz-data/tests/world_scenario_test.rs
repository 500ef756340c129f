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

use quartz_data::ecs::{Component, EntityWorld, System};

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
struct Velocity {
    x: f32,
    y: f32,
}

/// Integrates velocities into positions.
#[derive(Default)]
struct MoveSystem {
    frames: u32,
}

impl System for MoveSystem {
    fn update(&mut self, world: &mut EntityWorld, delta_time: f32) {
        for (_, (position, velocity)) in world.view::<(&mut Position, &Velocity)>() {
            position.x += velocity.x * delta_time;
            position.y += velocity.y * delta_time;
        }
        self.frames += 1;
    }
}

/// Spawns an entity on init and despawns it when torn down.
#[derive(Default)]
struct SpawnerSystem {
    spawned: Option<quartz_data::ecs::Entity>,
}

impl System for SpawnerSystem {
    fn on_init(&mut self, world: &mut EntityWorld) {
        self.spawned = Some(world.create_entity((
            Position { x: 10.0, y: 10.0 },
            Velocity { x: 0.0, y: -1.0 },
        )));
    }

    fn on_destroy(&mut self, world: &mut EntityWorld) {
        if let Some(entity) = self.spawned.take() {
            world.destroy_entity(entity);
        }
    }
}

#[test]
fn test_move_system_integrates_velocity() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    let entity = world.create_entity((Position { x: 0.0, y: 0.0 }, Velocity { x: 1.0, y: 0.0 }));
    world.register_system::<MoveSystem>();

    // --- 2. ACTION ---
    world.update(1.0);

    // --- 3. ASSERTIONS ---
    assert_eq!(
        *world.component::<Position>(entity),
        Position { x: 1.0, y: 0.0 }
    );
    assert_eq!(world.system::<MoveSystem>().map(|s| s.frames), Some(1));
}

#[test]
fn test_systems_see_each_others_entities() {
    // --- 1. SETUP ---
    let mut world = EntityWorld::new();
    world.register_system::<SpawnerSystem>();
    world.register_system::<MoveSystem>();
    let spawned = world
        .system::<SpawnerSystem>()
        .and_then(|spawner| spawner.spawned)
        .expect("the spawner creates its entity on init");

    // --- 2. ACTION ---
    for _ in 0..4 {
        world.update(0.5);
    }

    // --- 3. ASSERTIONS ---
    assert_eq!(
        *world.component::<Position>(spawned),
        Position { x: 10.0, y: 8.0 }
    );

    assert!(world.deregister_system::<SpawnerSystem>());
    assert!(!world.is_alive(spawned), "on_destroy despawned the entity");
    assert_eq!(world.entity_count(), 0);
}
