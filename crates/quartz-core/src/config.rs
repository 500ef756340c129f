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

//! Engine-wide configuration, loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Clear colour used when a render pass does not specify its own.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.02, 0.05, 0.05, 1.0];

/// Analog values whose magnitude is below this threshold are reported as zero.
pub const DEFAULT_INPUT_DEADZONE: f32 = 0.26;

/// An error raised while loading or validating an [`EngineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(String),
    /// The configuration text is not valid JSON for this schema.
    Parse(String),
    /// A value is outside its accepted range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read configuration: {msg}"),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which kind of adapter the renderer should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    /// Let the backend decide.
    None,
    /// Prefer an integrated or otherwise power-efficient adapter.
    LowPower,
    /// Prefer a discrete, high-performance adapter.
    #[default]
    HighPerformance,
}

/// Settings consumed by the renderer and its native backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Colour written by render passes that clear their colour target.
    pub clear_color: [f32; 4],
    /// Depth value written by render passes that clear their depth target.
    pub clear_depth: f32,
    /// Adapter selection hint.
    pub power_preference: PowerPreference,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            clear_depth: 1.0,
            power_preference: PowerPreference::HighPerformance,
        }
    }
}

/// Settings for raw input polling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Magnitude below which analog axis values are reported as zero.
    pub deadzone: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: DEFAULT_INPUT_DEADZONE,
        }
    }
}

/// Settings for the fixed-step simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Duration of one fixed step, in seconds.
    pub fixed_timestep: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
        }
    }
}

/// Top-level engine configuration.
///
/// Every field has a default, so a partial (or empty) JSON object is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of native command-buffer slots built for each dynamic command buffer.
    pub frames_in_flight: u32,
    /// Renderer settings.
    pub renderer: RendererConfig,
    /// Input settings.
    pub input: InputConfig,
    /// Simulation settings.
    pub simulation: SimulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 3,
            renderer: RendererConfig::default(),
            input: InputConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads and validates a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    /// Serializes the configuration to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks that every value is within its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.input.deadzone) {
            return Err(ConfigError::Invalid(format!(
                "input deadzone {} must lie in [0, 1)",
                self.input.deadzone
            )));
        }
        let timestep = self.simulation.fixed_timestep;
        if !(timestep > 0.0 && timestep.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "fixed timestep {} must be positive",
                self.simulation.fixed_timestep
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.frames_in_flight, 3);
        assert_eq!(config.renderer.clear_color, DEFAULT_CLEAR_COLOR);
        assert_eq!(config.input.deadzone, DEFAULT_INPUT_DEADZONE);
    }

    #[test]
    fn test_partial_sections_are_merged_with_defaults() {
        let json = r#"{
            "frames_in_flight": 2,
            "renderer": { "power_preference": "low_power" }
        }"#;
        let config = EngineConfig::from_json(json).unwrap();

        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.renderer.power_preference, PowerPreference::LowPower);
        assert_eq!(
            config.renderer.clear_depth, 1.0,
            "Unspecified fields should keep their default"
        );
    }

    #[test]
    fn test_zero_frames_in_flight_is_rejected() {
        let result = EngineConfig::from_json(r#"{ "frames_in_flight": 0 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_deadzone_is_rejected() {
        let result = EngineConfig::from_json(r#"{ "input": { "deadzone": 1.5 } }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_finite_timestep_is_rejected() {
        for timestep in [0.0, -1.0 / 60.0, f32::NAN, f32::INFINITY] {
            let mut config = EngineConfig::default();
            config.simulation.fixed_timestep = timestep;
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "Timestep {timestep} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let result = EngineConfig::from_json("{ frames_in_flight: ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = EngineConfig::from_file("does/not/exist/quartz.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_values() {
        let mut config = EngineConfig::default();
        config.frames_in_flight = 2;
        config.input.deadzone = 0.1;

        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
