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

//! Translates `winit` raw device events into the engine's [`RawInputEvent`]s.
//!
//! Window events are tied to a focused window and lose the identity of the device
//! that produced them, so this adapter listens to `winit::event::DeviceEvent`s
//! instead. winit cannot enumerate devices either: a device becomes known the first
//! time it is announced or produces an event.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use quartz_core::platform::{
    ButtonState, InputDeviceDescription, InputDeviceId, InputDeviceSource, InputDeviceType,
    RawInputEvent,
};
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseScrollDelta};
use winit::keyboard::PhysicalKey;

/// Pixels per wheel line, used to normalise pixel-precise scrolling.
const PIXELS_PER_LINE: f32 = 120.0;

/// An [`InputDeviceSource`] fed from a `winit` event loop.
///
/// Forward every `DeviceEvent` from `ApplicationHandler::device_event` to
/// [`handle_device_event`](Self::handle_device_event), then let
/// [`PlatformInput`](quartz_core::platform::PlatformInput) poll this source once per frame.
#[derive(Debug, Default)]
pub struct WinitInputSource {
    devices: Vec<InputDeviceDescription>,
    positions: HashMap<InputDeviceId, usize>,
    pending: Vec<RawInputEvent>,
}

impl WinitInputSource {
    /// Creates a source that knows no device yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine id of a winit device. Stable for the lifetime of the process.
    pub fn device_id(device_id: DeviceId) -> InputDeviceId {
        let mut hasher = DefaultHasher::new();
        device_id.hash(&mut hasher);
        InputDeviceId(hasher.finish())
    }

    /// Records a device event, discovering the device if needed.
    pub fn handle_device_event(&mut self, device_id: DeviceId, event: &DeviceEvent) {
        let id = Self::device_id(device_id);
        match event {
            DeviceEvent::Added => {
                self.discover(id, InputDeviceType::Hid);
                return;
            }
            DeviceEvent::Removed => {
                self.forget(id);
                return;
            }
            _ => {}
        }

        let Some(device_type) = device_type_of(event) else {
            return;
        };
        let position = self.discover(id, device_type);
        let description = &mut self.devices[position];
        match event {
            DeviceEvent::Button { button, .. } => {
                description.button_count = description.button_count.max(button + 1);
            }
            DeviceEvent::Motion { axis, .. } => {
                description.analog_count = description.analog_count.max(axis + 1);
            }
            _ => {}
        }

        if let Some(raw) = translate_device_event(description, event) {
            self.pending.push(raw);
        }
    }

    /// Returns the position of `id` in `devices`, adding it if it is new.
    ///
    /// A device first seen through a generic event is reclassified once a more
    /// specific one (mouse motion, key) arrives.
    fn discover(&mut self, id: InputDeviceId, device_type: InputDeviceType) -> usize {
        if let Some(&position) = self.positions.get(&id) {
            let description = &mut self.devices[position];
            if description.device_type == InputDeviceType::Hid && device_type != InputDeviceType::Hid
            {
                description.device_type = device_type;
            }
            return position;
        }

        log::debug!("Discovered {device_type:?} input device {id:?}");
        let name = format!("winit {device_type:?} {:016x}", id.0);
        self.devices
            .push(InputDeviceDescription::new(id, name, device_type));
        let position = self.devices.len() - 1;
        self.positions.insert(id, position);
        position
    }

    fn forget(&mut self, id: InputDeviceId) {
        let Some(position) = self.positions.remove(&id) else {
            return;
        };
        log::debug!("Input device {id:?} removed");
        self.devices.swap_remove(position);
        if let Some(moved) = self.devices.get(position) {
            self.positions.insert(moved.id, position);
        }
        self.pending.retain(|event| event.device() != id);
    }
}

impl InputDeviceSource for WinitInputSource {
    fn enumerate_devices(&mut self) -> Vec<InputDeviceDescription> {
        self.devices.clone()
    }

    fn poll_events(&mut self, events: &mut Vec<RawInputEvent>) {
        events.append(&mut self.pending);
    }
}

// --- Private Helper Functions ---

/// (Internal) The kind of device an event reveals, or `None` for events that are
/// not forwarded.
fn device_type_of(event: &DeviceEvent) -> Option<InputDeviceType> {
    match event {
        DeviceEvent::MouseMotion { .. } | DeviceEvent::MouseWheel { .. } => {
            Some(InputDeviceType::Mouse)
        }
        DeviceEvent::Key(_) => Some(InputDeviceType::Keyboard),
        DeviceEvent::Motion { .. } | DeviceEvent::Button { .. } => Some(InputDeviceType::Hid),
        _ => None,
    }
}

/// (Internal) Translates one `DeviceEvent` reported by `device`.
fn translate_device_event(
    device: &InputDeviceDescription,
    event: &DeviceEvent,
) -> Option<RawInputEvent> {
    let id = device.id;
    match event {
        DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(RawInputEvent::MouseMove {
            device: id,
            dx: *dx as f32,
            dy: *dy as f32,
        }),
        DeviceEvent::MouseWheel { delta } => {
            let (dx, dy) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                MouseScrollDelta::PixelDelta(pos) => (
                    pos.x as f32 / PIXELS_PER_LINE,
                    pos.y as f32 / PIXELS_PER_LINE,
                ),
            };
            if dx != 0.0 || dy != 0.0 {
                Some(RawInputEvent::MouseWheel { device: id, dx, dy })
            } else {
                None
            }
        }
        DeviceEvent::Motion { axis, value } => Some(RawInputEvent::Axis {
            device: id,
            axis: *axis,
            value: *value as f32,
        }),
        DeviceEvent::Button { button, state } => {
            let state = map_element_state(*state);
            if device.device_type == InputDeviceType::Mouse {
                Some(RawInputEvent::MouseButton {
                    device: id,
                    button: *button,
                    state,
                })
            } else {
                Some(RawInputEvent::Button {
                    device: id,
                    button: *button,
                    state,
                })
            }
        }
        DeviceEvent::Key(raw) => Some(RawInputEvent::Key {
            device: id,
            key: map_physical_key(raw.physical_key),
            state: map_element_state(raw.state),
        }),
        _ => None,
    }
}

/// (Internal) Maps a physical key to its name, e.g. `"KeyA"`.
fn map_physical_key(key: PhysicalKey) -> String {
    match key {
        PhysicalKey::Code(code) => format!("{code:?}"),
        PhysicalKey::Unidentified(native) => format!("{native:?}"),
    }
}

fn map_element_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Down,
        ElementState::Released => ButtonState::Up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartz_core::config::InputConfig;
    use quartz_core::platform::PlatformInput;
    use std::cell::RefCell;
    use std::rc::Rc;
    use winit::dpi::PhysicalPosition;
    use winit::event::RawKeyEvent;
    use winit::keyboard::KeyCode;

    fn dummy_device() -> DeviceId {
        // SAFETY: only used as an opaque key, never passed back to winit.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn test_map_physical_key() {
        assert_eq!(map_physical_key(PhysicalKey::Code(KeyCode::KeyA)), "KeyA");
        assert_eq!(map_physical_key(PhysicalKey::Code(KeyCode::Space)), "Space");
    }

    #[test]
    fn test_devices_are_discovered_from_events() {
        let mut source = WinitInputSource::new();
        let device = dummy_device();

        source.handle_device_event(device, &DeviceEvent::MouseMotion { delta: (3.0, -2.0) });
        source.handle_device_event(
            device,
            &DeviceEvent::Button {
                button: 2,
                state: ElementState::Pressed,
            },
        );

        let devices = source.enumerate_devices();
        assert_eq!(devices.len(), 1, "Both events come from the same device");
        assert_eq!(devices[0].device_type, InputDeviceType::Mouse);
        assert_eq!(devices[0].button_count, 3);

        let mut events = Vec::new();
        source.poll_events(&mut events);
        let id = WinitInputSource::device_id(device);
        assert_eq!(
            events,
            vec![
                RawInputEvent::MouseMove {
                    device: id,
                    dx: 3.0,
                    dy: -2.0
                },
                RawInputEvent::MouseButton {
                    device: id,
                    button: 2,
                    state: ButtonState::Down
                },
            ]
        );

        events.clear();
        source.poll_events(&mut events);
        assert!(events.is_empty(), "Polling drains the queue");
    }

    #[test]
    fn test_pixel_scroll_is_converted_to_lines() {
        let mut source = WinitInputSource::new();
        source.handle_device_event(
            dummy_device(),
            &DeviceEvent::MouseWheel {
                delta: MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 240.0)),
            },
        );
        source.handle_device_event(
            dummy_device(),
            &DeviceEvent::MouseWheel {
                delta: MouseScrollDelta::LineDelta(0.0, 0.0),
            },
        );

        let mut events = Vec::new();
        source.poll_events(&mut events);
        assert_eq!(events.len(), 1, "Zero scroll is dropped");
        assert!(matches!(
            events[0],
            RawInputEvent::MouseWheel { dx, dy, .. } if dx == 0.0 && dy == 2.0
        ));
    }

    #[test]
    fn test_removed_device_is_forgotten() {
        let mut source = WinitInputSource::new();
        let device = dummy_device();
        source.handle_device_event(device, &DeviceEvent::Added);
        source.handle_device_event(
            device,
            &DeviceEvent::Motion {
                axis: 1,
                value: 0.5,
            },
        );
        assert_eq!(source.enumerate_devices()[0].analog_count, 2);

        source.handle_device_event(device, &DeviceEvent::Removed);

        let mut events = Vec::new();
        source.poll_events(&mut events);
        assert!(source.enumerate_devices().is_empty());
        assert!(events.is_empty(), "Pending events of a removed device are dropped");
    }

    #[test]
    fn test_platform_input_receives_winit_events() {
        // --- 1. SETUP ---
        let mut source = WinitInputSource::new();
        let mut input = PlatformInput::new(InputConfig::default());
        let keys = Rc::new(RefCell::new(Vec::new()));
        let sink = keys.clone();
        input.set_keyboard_callback(move |_, key: &str, state| {
            sink.borrow_mut().push((key.to_owned(), state));
        });

        // --- 2. ACTION ---
        source.handle_device_event(
            dummy_device(),
            &DeviceEvent::Key(RawKeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyW),
                state: ElementState::Pressed,
            }),
        );
        let changes = input.poll_device_connections(&mut source);
        let delivered = input.poll_device_input(&mut source);

        // --- 3. ASSERTIONS ---
        assert_eq!(changes.connected.len(), 1);
        assert_eq!(delivered, 1);
        assert_eq!(
            *keys.borrow(),
            vec![("KeyW".to_owned(), ButtonState::Down)]
        );
    }
}
