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

//! Raw device input: device discovery, event types and callback dispatch.

use crate::config::InputConfig;
use std::collections::HashMap;

/// A stable identifier for a physical input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputDeviceId(pub u64);

/// The broad class of an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputDeviceType {
    /// A pointing device reporting relative motion.
    Mouse,
    /// A keyboard.
    Keyboard,
    /// Any other human interface device (gamepads, joysticks, pedals, ...).
    Hid,
}

/// What the platform reports about a connected device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceDescription {
    /// The device's identifier.
    pub id: InputDeviceId,
    /// A human readable product name.
    pub name: String,
    /// The OS path of the device, when one exists.
    pub path: String,
    /// The serial number, when the device reports one.
    pub serial_number: String,
    /// The device class.
    pub device_type: InputDeviceType,
    /// Number of digital buttons.
    pub button_count: u32,
    /// Number of analog axes.
    pub analog_count: u32,
    /// HID usage page.
    pub usage_page: u16,
    /// HID usage within the page.
    pub usage: u16,
}

impl InputDeviceDescription {
    /// A description carrying only an id, a name and a class.
    pub fn new(id: InputDeviceId, name: impl Into<String>, device_type: InputDeviceType) -> Self {
        Self {
            id,
            name: name.into(),
            path: String::new(),
            serial_number: String::new(),
            device_type,
            button_count: 0,
            analog_count: 0,
            usage_page: 0,
            usage: 0,
        }
    }
}

/// Whether a button or key was pressed or released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// The button went down.
    Down,
    /// The button went up.
    Up,
}

/// A single raw event reported by a device.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    /// Relative pointer motion.
    MouseMove {
        /// The reporting device.
        device: InputDeviceId,
        /// Horizontal motion.
        dx: f32,
        /// Vertical motion.
        dy: f32,
    },
    /// A mouse button changed state.
    MouseButton {
        /// The reporting device.
        device: InputDeviceId,
        /// Platform button index.
        button: u32,
        /// The new state.
        state: ButtonState,
    },
    /// Wheel motion, in lines.
    MouseWheel {
        /// The reporting device.
        device: InputDeviceId,
        /// Horizontal scroll.
        dx: f32,
        /// Vertical scroll.
        dy: f32,
    },
    /// A keyboard key changed state.
    Key {
        /// The reporting device.
        device: InputDeviceId,
        /// The physical key name.
        key: String,
        /// The new state.
        state: ButtonState,
    },
    /// A generic HID button changed state.
    Button {
        /// The reporting device.
        device: InputDeviceId,
        /// Platform button index.
        button: u32,
        /// The new state.
        state: ButtonState,
    },
    /// A generic HID analog axis moved.
    Axis {
        /// The reporting device.
        device: InputDeviceId,
        /// Platform axis index.
        axis: u32,
        /// Normalized value in `[-1, 1]` before the deadzone is applied.
        value: f32,
    },
}

impl RawInputEvent {
    /// The device that produced the event.
    pub fn device(&self) -> InputDeviceId {
        match self {
            RawInputEvent::MouseMove { device, .. }
            | RawInputEvent::MouseButton { device, .. }
            | RawInputEvent::MouseWheel { device, .. }
            | RawInputEvent::Key { device, .. }
            | RawInputEvent::Button { device, .. }
            | RawInputEvent::Axis { device, .. } => *device,
        }
    }
}

/// A platform-specific provider of input devices and their events.
pub trait InputDeviceSource {
    /// Lists the devices currently attached.
    fn enumerate_devices(&mut self) -> Vec<InputDeviceDescription>;

    /// Moves every event gathered since the last call into `events`.
    fn poll_events(&mut self, events: &mut Vec<RawInputEvent>);
}

/// Clamps an analog value to `[-1, 1]` and zeroes it when its magnitude is
/// below `deadzone`.
pub fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    let value = value.clamp(-1.0, 1.0);
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Devices that appeared and disappeared during one connection poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionChanges {
    /// Newly connected devices.
    pub connected: Vec<InputDeviceId>,
    /// Devices that are no longer attached.
    pub disconnected: Vec<InputDeviceId>,
}

type ConnectCallback = Box<dyn FnMut(InputDeviceId, &InputDeviceDescription)>;
type DisconnectCallback = Box<dyn FnMut(InputDeviceId)>;
type MotionCallback = Box<dyn FnMut(InputDeviceId, f32, f32)>;
type ButtonCallback = Box<dyn FnMut(InputDeviceId, u32, ButtonState)>;
type KeyCallback = Box<dyn FnMut(InputDeviceId, &str, ButtonState)>;
type AxisCallback = Box<dyn FnMut(InputDeviceId, u32, f32)>;

#[derive(Default)]
struct InputCallbacks {
    connect: Option<ConnectCallback>,
    disconnect: Option<DisconnectCallback>,
    mouse_move: Option<MotionCallback>,
    mouse_button: Option<ButtonCallback>,
    mouse_wheel: Option<MotionCallback>,
    key: Option<KeyCallback>,
    button: Option<ButtonCallback>,
    axis: Option<AxisCallback>,
}

/// Tracks connected devices and routes their events to registered callbacks.
///
/// Events from devices that are not connected are dropped, so
/// [`poll_device_connections`](Self::poll_device_connections) has to run before
/// [`poll_device_input`](Self::poll_device_input) can deliver anything.
pub struct PlatformInput {
    config: InputConfig,
    connected: HashMap<InputDeviceId, InputDeviceDescription>,
    callbacks: InputCallbacks,
    pending: Vec<RawInputEvent>,
}

impl Default for PlatformInput {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl PlatformInput {
    /// Creates a dispatcher with no connected devices and no callbacks.
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            connected: HashMap::new(),
            callbacks: InputCallbacks::default(),
            pending: Vec::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Called once for every device that appears.
    pub fn set_device_connect_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, &InputDeviceDescription) + 'static,
    ) {
        self.callbacks.connect = Some(Box::new(callback));
    }

    /// Called once for every device that disappears.
    pub fn set_device_disconnect_callback(&mut self, callback: impl FnMut(InputDeviceId) + 'static) {
        self.callbacks.disconnect = Some(Box::new(callback));
    }

    /// Receives relative pointer motion.
    pub fn set_mouse_move_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, f32, f32) + 'static,
    ) {
        self.callbacks.mouse_move = Some(Box::new(callback));
    }

    /// Receives mouse button transitions.
    pub fn set_mouse_button_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, u32, ButtonState) + 'static,
    ) {
        self.callbacks.mouse_button = Some(Box::new(callback));
    }

    /// Receives wheel motion.
    pub fn set_mouse_wheel_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, f32, f32) + 'static,
    ) {
        self.callbacks.mouse_wheel = Some(Box::new(callback));
    }

    /// Receives keyboard transitions.
    pub fn set_keyboard_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, &str, ButtonState) + 'static,
    ) {
        self.callbacks.key = Some(Box::new(callback));
    }

    /// Receives generic HID button transitions.
    pub fn set_button_callback(
        &mut self,
        callback: impl FnMut(InputDeviceId, u32, ButtonState) + 'static,
    ) {
        self.callbacks.button = Some(Box::new(callback));
    }

    /// Receives generic HID axis values, after the deadzone.
    pub fn set_axis_callback(&mut self, callback: impl FnMut(InputDeviceId, u32, f32) + 'static) {
        self.callbacks.axis = Some(Box::new(callback));
    }

    /// Whether `device` is currently connected.
    pub fn is_device_connected(&self, device: InputDeviceId) -> bool {
        self.connected.contains_key(&device)
    }

    /// The description of a connected device.
    pub fn device(&self, device: InputDeviceId) -> Option<&InputDeviceDescription> {
        self.connected.get(&device)
    }

    /// Iterates over every connected device.
    pub fn connected_devices(&self) -> impl Iterator<Item = &InputDeviceDescription> {
        self.connected.values()
    }

    /// Diffs the devices `source` reports against the connected set, firing the
    /// connect callback for new devices and the disconnect callback for vanished ones.
    pub fn poll_device_connections(
        &mut self,
        source: &mut dyn InputDeviceSource,
    ) -> ConnectionChanges {
        let current = source.enumerate_devices();
        let mut changes = ConnectionChanges::default();

        let disconnected: Vec<InputDeviceId> = self
            .connected
            .keys()
            .filter(|id| !current.iter().any(|desc| desc.id == **id))
            .copied()
            .collect();
        for id in disconnected {
            self.connected.remove(&id);
            log::info!("Input device {id:?} disconnected");
            if let Some(callback) = self.callbacks.disconnect.as_mut() {
                callback(id);
            }
            changes.disconnected.push(id);
        }

        for desc in current {
            if self.connected.contains_key(&desc.id) {
                continue;
            }
            log::info!(
                "Input device {:?} connected: '{}' ({:?})",
                desc.id,
                desc.name,
                desc.device_type
            );
            if let Some(callback) = self.callbacks.connect.as_mut() {
                callback(desc.id, &desc);
            }
            changes.connected.push(desc.id);
            self.connected.insert(desc.id, desc);
        }

        changes
    }

    /// Drains pending events from `source` and dispatches them.
    ///
    /// Returns how many events reached a connected device.
    pub fn poll_device_input(&mut self, source: &mut dyn InputDeviceSource) -> usize {
        let mut events = std::mem::take(&mut self.pending);
        source.poll_events(&mut events);

        let mut delivered = 0;
        for event in events.drain(..) {
            if self.dispatch(event) {
                delivered += 1;
            }
        }
        self.pending = events;
        delivered
    }

    /// Routes one event to its callback.
    ///
    /// Returns `false` without invoking anything when the device is not connected.
    pub fn dispatch(&mut self, event: RawInputEvent) -> bool {
        let device = event.device();
        if !self.connected.contains_key(&device) {
            log::trace!("Dropping event from unknown input device {device:?}");
            return false;
        }

        let callbacks = &mut self.callbacks;
        match event {
            RawInputEvent::MouseMove { dx, dy, .. } => {
                if let Some(callback) = callbacks.mouse_move.as_mut() {
                    callback(device, dx, dy);
                }
            }
            RawInputEvent::MouseButton { button, state, .. } => {
                if let Some(callback) = callbacks.mouse_button.as_mut() {
                    callback(device, button, state);
                }
            }
            RawInputEvent::MouseWheel { dx, dy, .. } => {
                if let Some(callback) = callbacks.mouse_wheel.as_mut() {
                    callback(device, dx, dy);
                }
            }
            RawInputEvent::Key { key, state, .. } => {
                if let Some(callback) = callbacks.key.as_mut() {
                    callback(device, &key, state);
                }
            }
            RawInputEvent::Button { button, state, .. } => {
                if let Some(callback) = callbacks.button.as_mut() {
                    callback(device, button, state);
                }
            }
            RawInputEvent::Axis { axis, value, .. } => {
                let value = apply_deadzone(value, self.config.deadzone);
                if let Some(callback) = callbacks.axis.as_mut() {
                    callback(device, axis, value);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeSource {
        devices: Vec<InputDeviceDescription>,
        events: Vec<RawInputEvent>,
    }

    impl InputDeviceSource for FakeSource {
        fn enumerate_devices(&mut self) -> Vec<InputDeviceDescription> {
            self.devices.clone()
        }

        fn poll_events(&mut self, events: &mut Vec<RawInputEvent>) {
            events.append(&mut self.events);
        }
    }

    fn pad(id: u64) -> InputDeviceDescription {
        InputDeviceDescription::new(InputDeviceId(id), "pad", InputDeviceType::Hid)
    }

    #[test]
    fn test_deadzone_zeroes_small_values_and_clamps() {
        assert_eq!(apply_deadzone(0.1, 0.26), 0.0);
        assert_eq!(apply_deadzone(-0.25, 0.26), 0.0);
        assert_eq!(apply_deadzone(0.5, 0.26), 0.5);
        assert_eq!(apply_deadzone(3.0, 0.26), 1.0);
        assert_eq!(apply_deadzone(-7.0, 0.26), -1.0);
    }

    #[test]
    fn test_connection_poll_fires_connect_then_disconnect() {
        // --- 1. SETUP ---
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut input = PlatformInput::default();
        let connect_log = Rc::clone(&log);
        input.set_device_connect_callback(move |id, _| connect_log.borrow_mut().push(("+", id)));
        let disconnect_log = Rc::clone(&log);
        input.set_device_disconnect_callback(move |id| disconnect_log.borrow_mut().push(("-", id)));
        let mut source = FakeSource {
            devices: vec![pad(1), pad(2)],
            ..Default::default()
        };

        // --- 2. ACTION ---
        let first = input.poll_device_connections(&mut source);
        let unchanged = input.poll_device_connections(&mut source);
        source.devices.remove(0);
        let second = input.poll_device_connections(&mut source);

        // --- 3. ASSERTIONS ---
        assert_eq!(first.connected.len(), 2);
        assert_eq!(unchanged, ConnectionChanges::default(), "Known devices fire nothing");
        assert_eq!(second.disconnected, vec![InputDeviceId(1)]);
        assert!(!input.is_device_connected(InputDeviceId(1)));
        assert!(input.is_device_connected(InputDeviceId(2)));
        assert_eq!(log.borrow().iter().filter(|(kind, _)| *kind == "+").count(), 2);
        assert_eq!(*log.borrow().last().unwrap(), ("-", InputDeviceId(1)));
    }

    #[test]
    fn test_input_is_dispatched_only_for_connected_devices() {
        let axes = Rc::new(RefCell::new(Vec::new()));
        let mut input = PlatformInput::default();
        let sink = Rc::clone(&axes);
        input.set_axis_callback(move |_, axis, value| sink.borrow_mut().push((axis, value)));

        let mut source = FakeSource {
            devices: vec![pad(1)],
            events: vec![
                RawInputEvent::Axis {
                    device: InputDeviceId(1),
                    axis: 0,
                    value: 0.1,
                },
                RawInputEvent::Axis {
                    device: InputDeviceId(1),
                    axis: 1,
                    value: 0.8,
                },
                RawInputEvent::Axis {
                    device: InputDeviceId(9),
                    axis: 0,
                    value: 0.8,
                },
            ],
        };
        input.poll_device_connections(&mut source);

        let delivered = input.poll_device_input(&mut source);

        assert_eq!(delivered, 2, "The unknown device's event should be dropped");
        assert_eq!(*axes.borrow(), vec![(0, 0.0), (1, 0.8)]);
    }

    #[test]
    fn test_keyboard_and_mouse_callbacks() {
        let seen = Rc::new(RefCell::new(Vec::<String>::new()));
        let mut input = PlatformInput::default();
        let keys = Rc::clone(&seen);
        input.set_keyboard_callback(move |_, key, state| {
            keys.borrow_mut().push(format!("{key}:{state:?}"))
        });
        let moves = Rc::clone(&seen);
        input.set_mouse_move_callback(move |_, dx, dy| moves.borrow_mut().push(format!("{dx},{dy}")));

        let mut source = FakeSource {
            devices: vec![InputDeviceDescription::new(
                InputDeviceId(4),
                "kbm",
                InputDeviceType::Keyboard,
            )],
            events: vec![
                RawInputEvent::Key {
                    device: InputDeviceId(4),
                    key: "KeyW".to_string(),
                    state: ButtonState::Down,
                },
                RawInputEvent::MouseMove {
                    device: InputDeviceId(4),
                    dx: 2.0,
                    dy: -1.0,
                },
            ],
        };
        input.poll_device_connections(&mut source);
        input.poll_device_input(&mut source);

        assert_eq!(*seen.borrow(), vec!["KeyW:Down".to_string(), "2,-1".to_string()]);
    }
}
