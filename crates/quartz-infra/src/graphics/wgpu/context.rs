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

use anyhow::{anyhow, Result};
use quartz_core::config::PowerPreference;

use super::conversions::IntoWgpu;

/// A headless `wgpu` device and queue.
///
/// The command backend only records into off-screen framebuffers, so no surface is
/// created here; a windowed renderer would configure one on top of the same device.
#[derive(Debug)]
pub struct WgpuContext {
    /// The instance the adapter was selected from.
    pub instance: wgpu::Instance,
    /// The selected adapter.
    pub adapter: wgpu::Adapter,
    /// The logical device.
    pub device: wgpu::Device,
    /// The device's command queue.
    pub queue: wgpu::Queue,

    // Store info for easy access
    /// The adapter's human-readable name.
    pub adapter_name: String,
    /// The native API behind the adapter.
    pub adapter_backend: wgpu::Backend,
    /// Discrete, integrated, software...
    pub adapter_device_type: wgpu::DeviceType,
}

impl WgpuContext {
    /// Asynchronously selects an adapter and creates a logical device on it.
    ///
    /// ## Returns
    /// * `Result<Self>` - The context, or an error if no adapter or device is available.
    pub async fn new_headless(power_preference: PowerPreference) -> Result<Self> {
        log::info!("Initializing headless WGPU context ({power_preference:?})...");

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power_preference.into_wgpu(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| anyhow!("Failed to find a suitable adapter: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Quartz Logical Device"),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(std::sync::Arc::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            adapter_device_type: adapter_info.device_type,
        })
    }

    /// Blocking variant of [`new_headless`](Self::new_headless).
    pub fn new_headless_blocking(power_preference: PowerPreference) -> Result<Self> {
        pollster::block_on(Self::new_headless(power_preference))
    }

    /// The alignment dynamic uniform offsets must respect on this device.
    pub fn min_uniform_buffer_offset_alignment(&self) -> u64 {
        self.device.limits().min_uniform_buffer_offset_alignment as u64
    }
}
