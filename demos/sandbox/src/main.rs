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

// Quartz Sandbox
// Runs a short headless simulation and renders a clear pass per frame.

use anyhow::{Context, Result};
use quartz_core::renderer::{
    CommandBuffer, CommandBufferKind, CommandTranslator, FramebufferId, RenderpassDescriptor,
    RenderpassId,
};
use quartz_core::EngineConfig;
use quartz_data::ecs::{Component, EntityWorld, System};
use quartz_infra::{WgpuCommandBackend, WgpuContext};

const FRAME_COUNT: u32 = 120;
const ENTITY_COUNT: u32 = 64;

#[derive(Debug, Clone, Copy, Component)]
struct Transform {
    position: [f32; 2],
}

#[derive(Debug, Clone, Copy, Component)]
struct Velocity {
    linear: [f32; 2],
}

/// Integrates velocities on every fixed simulation step.
#[derive(Default)]
struct MovementSystem;

impl System for MovementSystem {
    fn tick(&mut self, world: &mut EntityWorld, delta_time: f32) {
        for (_, (transform, velocity)) in world.view::<(&mut Transform, &Velocity)>() {
            transform.position[0] += velocity.linear[0] * delta_time;
            transform.position[1] += velocity.linear[1] * delta_time;
        }
    }
}

/// The GPU objects the render system records against.
struct Renderer {
    backend: WgpuCommandBackend,
    translator: CommandTranslator,
    commands: CommandBuffer,
    renderpass: RenderpassId,
    framebuffer: FramebufferId,
    frames_in_flight: u32,
}

impl Renderer {
    fn new(context: &WgpuContext, config: &EngineConfig) -> Self {
        let mut backend = WgpuCommandBackend::from_context(context);
        let targets = (0..config.frames_in_flight)
            .map(|_| create_target(backend.device()))
            .collect();
        let framebuffer = backend.create_framebuffer(targets, None);
        let renderpass = backend.create_renderpass(
            RenderpassDescriptor::clearing(config.renderer.clear_color, config.renderer.clear_depth)
                .with_label("Sandbox Clear Pass"),
        );

        Self {
            backend,
            translator: CommandTranslator::new(),
            commands: CommandBuffer::new(CommandBufferKind::Dynamic).with_label("sandbox frame"),
            renderpass,
            framebuffer,
            frames_in_flight: config.frames_in_flight,
        }
    }
}

fn create_target(device: &wgpu::Device) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Sandbox Target"),
        size: wgpu::Extent3d {
            width: 320,
            height: 240,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Records and submits one frame per update, cycling through the frame slots.
struct RenderSystem {
    renderer: Option<Renderer>,
    frame: u32,
    draws: u64,
}

impl System for RenderSystem {
    fn on_init(&mut self, _world: &mut EntityWorld) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        // Usage is only known once something was recorded.
        renderer.commands.begin_recording();
        renderer.commands.begin_renderpass(renderer.renderpass, renderer.framebuffer);
        renderer.commands.end_renderpass();
        renderer.commands.end_recording();
        if let Err(e) = renderer.translator.build_buffers(
            &mut renderer.backend,
            &renderer.commands,
            renderer.frames_in_flight,
        ) {
            log::error!("Disabling rendering: {e}");
            self.renderer = None;
        }
    }

    fn update(&mut self, world: &mut EntityWorld, _delta_time: f32) {
        let visible = world.view::<&Transform>().into_iter().count();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };

        let frame_index = self.frame % renderer.frames_in_flight;
        renderer.commands.begin_recording();
        renderer.commands.begin_renderpass(renderer.renderpass, renderer.framebuffer);
        renderer.commands.end_renderpass();
        renderer.commands.end_recording();

        match renderer
            .translator
            .record_dynamic(&mut renderer.backend, &renderer.commands, frame_index)
        {
            Ok(stats) => {
                self.draws += stats.draw_calls as u64;
                if let Some(native) = renderer.translator.native_buffer(frame_index) {
                    renderer.backend.submit(&[native]);
                }
                log::trace!("Frame {}: {visible} visible entities, {stats:?}", self.frame);
            }
            Err(e) => log::error!("Frame {} failed to record: {e}", self.frame),
        }
        self.frame += 1;
    }

    fn on_destroy(&mut self, _world: &mut EntityWorld) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.translator.release(&mut renderer.backend);
        }
        log::info!("Rendered {} frames ({} draw calls)", self.frame, self.draws);
    }
}

fn load_config() -> Result<EngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(&path)
            .with_context(|| format!("Failed to load engine configuration from '{path}'")),
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let config = load_config()?;
    log::info!("Starting sandbox with {config:?}");

    let renderer = match WgpuContext::new_headless_blocking(config.renderer.power_preference) {
        Ok(context) => Some(Renderer::new(&context, &config)),
        Err(e) => {
            log::warn!("No GPU available, running the simulation only: {e:#}");
            None
        }
    };

    let mut world = EntityWorld::new();
    for i in 0..ENTITY_COUNT {
        let position = [i as f32, 0.0];
        if i % 2 == 0 {
            world.create_entity((
                Transform { position },
                Velocity {
                    linear: [0.0, 1.0],
                },
            ));
        } else {
            world.create_entity(Transform { position });
        }
    }
    world.register_system::<MovementSystem>();
    world.register_system_with(RenderSystem {
        renderer,
        frame: 0,
        draws: 0,
    });

    let step = config.simulation.fixed_timestep;
    for _ in 0..FRAME_COUNT {
        world.tick(step);
        world.update(step);
    }

    let travelled = world
        .view::<(&Transform, &Velocity)>()
        .into_iter()
        .map(|(_, (transform, _))| transform.position[1])
        .fold(0.0f32, f32::max);
    log::info!(
        "Simulated {FRAME_COUNT} steps over {} entities; moving entities travelled {travelled:.2} units",
        world.entity_count()
    );
    Ok(())
}
