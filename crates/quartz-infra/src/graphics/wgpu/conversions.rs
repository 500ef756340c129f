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

use quartz_core::config::PowerPreference;
use quartz_core::renderer::api::{LoadOp, Operations, StoreOp};

/// A local extension trait to convert engine types into WGPU-compatible types.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_wgpu()` syntax.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::PowerPreference> for PowerPreference {
    fn into_wgpu(self) -> wgpu::PowerPreference {
        match self {
            PowerPreference::None => wgpu::PowerPreference::None,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl IntoWgpu<wgpu::StoreOp> for StoreOp {
    fn into_wgpu(self) -> wgpu::StoreOp {
        match self {
            StoreOp::Store => wgpu::StoreOp::Store,
            StoreOp::Discard => wgpu::StoreOp::Discard,
        }
    }
}

impl IntoWgpu<wgpu::LoadOp<wgpu::Color>> for LoadOp<[f32; 4]> {
    fn into_wgpu(self) -> wgpu::LoadOp<wgpu::Color> {
        match self {
            LoadOp::Load => wgpu::LoadOp::Load,
            LoadOp::Clear([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            }),
        }
    }
}

impl IntoWgpu<wgpu::LoadOp<f32>> for LoadOp<f32> {
    fn into_wgpu(self) -> wgpu::LoadOp<f32> {
        match self {
            LoadOp::Load => wgpu::LoadOp::Load,
            LoadOp::Clear(depth) => wgpu::LoadOp::Clear(depth),
        }
    }
}

impl<V, W> IntoWgpu<wgpu::Operations<W>> for Operations<V>
where
    LoadOp<V>: IntoWgpu<wgpu::LoadOp<W>>,
{
    fn into_wgpu(self) -> wgpu::Operations<W> {
        wgpu::Operations {
            load: self.load.into_wgpu(),
            store: self.store.into_wgpu(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_color_is_widened() {
        let load: wgpu::LoadOp<wgpu::Color> = LoadOp::Clear([0.5, 0.25, 0.0, 1.0]).into_wgpu();
        match load {
            wgpu::LoadOp::Clear(color) => {
                assert_eq!(color.r, 0.5);
                assert_eq!(color.g, 0.25);
                assert_eq!(color.a, 1.0);
            }
            other => panic!("expected a clear, got {other:?}"),
        }
    }

    #[test]
    fn test_operations_convert_both_halves() {
        let ops: wgpu::Operations<f32> = Operations {
            load: LoadOp::Clear(1.0f32),
            store: StoreOp::Discard,
        }
        .into_wgpu();
        assert_eq!(ops.store, wgpu::StoreOp::Discard);
        assert!(matches!(ops.load, wgpu::LoadOp::Clear(depth) if depth == 1.0));
    }

    #[test]
    fn test_power_preference_mapping() {
        assert_eq!(
            PowerPreference::LowPower.into_wgpu(),
            wgpu::PowerPreference::LowPower
        );
        assert_eq!(
            PowerPreference::default().into_wgpu(),
            wgpu::PowerPreference::HighPerformance
        );
    }
}
