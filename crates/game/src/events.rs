//! Window and device event handling, plus pointer-lock control.

use input::{ElementState, KeyCode, MouseButton};
use winit::event::{DeviceEvent, KeyEvent, WindowEvent};
use winit::keyboard::PhysicalKey;
use winit::window::CursorGrabMode;

use crate::state::GameState;

impl GameState {
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.config.save();
                self.running = false;
            }
            WindowEvent::Resized(size) => {
                self.renderer.resize(*size);
                self.camera.set_aspect(size.width, size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                self.input.process_keyboard(*code, *state);
                if *code == KeyCode::Escape && *state == ElementState::Pressed {
                    self.release_pointer();
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                // The click that captures the pointer is not an interact
                if !self.input.is_pointer_locked()
                    && *button == MouseButton::Left
                    && *state == ElementState::Pressed
                {
                    self.grab_pointer();
                    return;
                }
                self.input.process_mouse_button(*button, *state);
            }
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(e) = self.render() {
                    log::error!("Render failed: {e}");
                    self.running = false;
                }
                self.renderer.window.request_redraw();
            }
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.input.process_mouse_motion(*delta);
        }
    }

    pub fn toggle_pointer_lock(&mut self) {
        if self.input.is_pointer_locked() {
            self.release_pointer();
        } else {
            self.grab_pointer();
        }
    }

    fn grab_pointer(&mut self) {
        let window = &self.renderer.window;
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                self.input.set_pointer_locked(true);
            }
            Err(e) => log::warn!("Could not grab the cursor: {e}"),
        }
    }

    fn release_pointer(&mut self) {
        let window = &self.renderer.window;
        if let Err(e) = window.set_cursor_grab(CursorGrabMode::None) {
            log::warn!("Could not release the cursor: {e}");
        }
        window.set_cursor_visible(true);
        self.input.set_pointer_locked(false);
    }
}
