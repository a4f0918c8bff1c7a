//! Gachapon walking simulator entry point.

mod config;
mod events;
mod gachapon;
mod interact;
mod items;
mod labels;
mod player;
mod render;
mod scenes;
mod state;
mod transition;
mod update;

use std::sync::Arc;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use config::GameConfig;
use state::GameState;

#[derive(Default)]
struct App {
    state: Option<GameState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let config = GameConfig::load();
        let attributes = Window::default_attributes()
            .with_title("Gachapon Walk")
            .with_inner_size(winit::dpi::LogicalSize::new(
                config.window_width,
                config.window_height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GameState::new(window, config)) {
            Ok(state) => {
                state.renderer.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Failed to initialize: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(state) = &mut self.state {
            state.handle_window_event(&event);
            if !state.running {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            state.handle_device_event(&event);
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════╗");
    println!("║            Gachapon Walk             ║");
    println!("╠══════════════════════════════════════╣");
    println!("║  WASD        walk                    ║");
    println!("║  Mouse       look around             ║");
    println!("║  Shift       sprint                  ║");
    println!("║  Click       interact                ║");
    println!("║  Q           toggle mouse capture    ║");
    println!("║  Escape      release mouse           ║");
    println!("╚══════════════════════════════════════╝");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::default();
    event_loop.run_app(&mut app)?;
    Ok(())
}
