use egui::{Context, Event, Key, Modifiers, Pos2, RawInput, Rect, Vec2};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, Window};

/// Translates winit window events into egui input. The viewport itself is
/// an egui area, so every pointer event is forwarded and egui decides who
/// owns it.
pub struct EguiBridge {
    ctx: Context,
    events: Vec<Event>,
    pointer_pos: Pos2,
    modifiers: Modifiers,
    pixels_per_point: f32,
    screen_size: (u32, u32),
}

impl EguiBridge {
    pub fn new(pixels_per_point: f32, width: u32, height: u32) -> Self {
        Self {
            ctx: Context::default(),
            events: Vec::new(),
            pointer_pos: Pos2::ZERO,
            modifiers: Modifiers::NONE,
            pixels_per_point,
            screen_size: (width, height),
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_size = (width, height);
    }

    /// Queues `event`. Returns true when a text field has keyboard focus.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Pos2::new(
                    position.x as f32 / self.pixels_per_point,
                    position.y as f32 / self.pixels_per_point,
                );
                self.pointer_pos = pos;
                self.events.push(Event::PointerMoved(pos));
                false
            }

            WindowEvent::CursorLeft { .. } => {
                self.events.push(Event::PointerGone);
                false
            }

            WindowEvent::Focused(focused) => {
                self.events.push(Event::WindowFocused(*focused));
                if !focused {
                    self.modifiers = Modifiers::NONE;
                }
                false
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(egui_button) = winit_button_to_egui(*button) {
                    self.events.push(Event::PointerButton {
                        pos: self.pointer_pos,
                        button: egui_button,
                        pressed: *state == ElementState::Pressed,
                        modifiers: self.modifiers,
                    });
                }
                false
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y) * 24.0,
                    MouseScrollDelta::PixelDelta(d) => {
                        Vec2::new(d.x as f32, d.y as f32) / self.pixels_per_point
                    }
                };
                self.events.push(Event::MouseWheel {
                    unit: egui::MouseWheelUnit::Point,
                    delta: scroll,
                    modifiers: self.modifiers,
                });
                false
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;

                if let PhysicalKey::Code(code) = event.physical_key {
                    match code {
                        KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                            self.modifiers.shift = pressed;
                        }
                        KeyCode::ControlLeft | KeyCode::ControlRight => {
                            self.modifiers.ctrl = pressed;
                            #[cfg(not(target_os = "macos"))]
                            {
                                self.modifiers.command = pressed;
                            }
                        }
                        KeyCode::AltLeft | KeyCode::AltRight => {
                            self.modifiers.alt = pressed;
                        }
                        KeyCode::SuperLeft | KeyCode::SuperRight => {
                            self.modifiers.mac_cmd = pressed;
                            #[cfg(target_os = "macos")]
                            {
                                self.modifiers.command = pressed;
                            }
                        }
                        _ => {}
                    }
                }

                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = winit_key_to_egui(code) {
                        self.events.push(Event::Key {
                            key,
                            physical_key: None,
                            pressed,
                            repeat: false,
                            modifiers: self.modifiers,
                        });
                    }
                }

                if pressed {
                    if let Some(ref text) = event.text {
                        let text_str: &str = text;
                        for ch in text_str.chars() {
                            if !ch.is_control() {
                                self.events.push(Event::Text(ch.to_string()));
                            }
                        }
                    }
                }

                self.ctx.wants_keyboard_input()
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.pixels_per_point = *scale_factor as f32;
                false
            }

            _ => false,
        }
    }

    pub fn take_raw_input(&mut self, time_seconds: f64) -> RawInput {
        let (w, h) = self.screen_size;
        let screen_rect = Rect::from_min_size(
            Pos2::ZERO,
            Vec2::new(
                w as f32 / self.pixels_per_point,
                h as f32 / self.pixels_per_point,
            ),
        );

        let mut raw = RawInput {
            screen_rect: Some(screen_rect),
            events: std::mem::take(&mut self.events),
            modifiers: self.modifiers,
            time: Some(time_seconds),
            ..Default::default()
        };
        raw.viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(self.pixels_per_point);
        raw
    }

    pub fn handle_platform_output(&self, window: &Window, output: &egui::PlatformOutput) {
        let cursor = match output.cursor_icon {
            egui::CursorIcon::Default => CursorIcon::Default,
            egui::CursorIcon::PointingHand => CursorIcon::Pointer,
            egui::CursorIcon::Text => CursorIcon::Text,
            egui::CursorIcon::Crosshair => CursorIcon::Crosshair,
            egui::CursorIcon::Grab => CursorIcon::Grab,
            egui::CursorIcon::Grabbing => CursorIcon::Grabbing,
            egui::CursorIcon::Move => CursorIcon::Move,
            egui::CursorIcon::NotAllowed => CursorIcon::NotAllowed,
            egui::CursorIcon::ResizeHorizontal => CursorIcon::EwResize,
            egui::CursorIcon::ResizeVertical => CursorIcon::NsResize,
            _ => CursorIcon::Default,
        };
        window.set_cursor_icon(cursor);
    }
}

fn winit_button_to_egui(button: MouseButton) -> Option<egui::PointerButton> {
    match button {
        MouseButton::Left => Some(egui::PointerButton::Primary),
        MouseButton::Right => Some(egui::PointerButton::Secondary),
        MouseButton::Middle => Some(egui::PointerButton::Middle),
        _ => None,
    }
}

macro_rules! key_table {
    ($code:expr; $($winit:ident => $egui:ident),* $(,)?) => {
        match $code {
            $(KeyCode::$winit => Some(Key::$egui),)*
            _ => None,
        }
    };
}

fn winit_key_to_egui(code: KeyCode) -> Option<Key> {
    if code == KeyCode::NumpadEnter {
        return Some(Key::Enter);
    }
    key_table!(code;
        ArrowDown => ArrowDown, ArrowUp => ArrowUp, ArrowLeft => ArrowLeft, ArrowRight => ArrowRight,
        Escape => Escape, Tab => Tab, Backspace => Backspace, Enter => Enter, Space => Space,
        Delete => Delete, Home => Home, End => End,
        KeyA => A, KeyC => C, KeyE => E, KeyQ => Q, KeyS => S, KeyV => V, KeyX => X, KeyZ => Z,
        Digit0 => Num0, Digit1 => Num1, Digit2 => Num2, Digit3 => Num3, Digit4 => Num4,
        Digit5 => Num5, Digit6 => Num6, Digit7 => Num7, Digit8 => Num8, Digit9 => Num9,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_shortcuts_and_terrain_keys_are_mapped() {
        assert_eq!(winit_key_to_egui(KeyCode::Digit1), Some(Key::Num1));
        assert_eq!(winit_key_to_egui(KeyCode::Digit6), Some(Key::Num6));
        assert_eq!(winit_key_to_egui(KeyCode::KeyQ), Some(Key::Q));
        assert_eq!(winit_key_to_egui(KeyCode::KeyE), Some(Key::E));
        assert_eq!(winit_key_to_egui(KeyCode::NumpadEnter), Some(Key::Enter));
        assert_eq!(winit_key_to_egui(KeyCode::F12), None);
    }

    #[test]
    fn raw_input_covers_the_window_in_points() {
        let mut bridge = EguiBridge::new(2.0, 800, 600);
        let raw = bridge.take_raw_input(1.5);
        let rect = raw.screen_rect.unwrap();
        assert_eq!(rect.size(), Vec2::new(400.0, 300.0));
        assert_eq!(raw.time, Some(1.5));
        assert!(raw.events.is_empty());
    }
}
