//! winit front end.
//!
//! [`App`] owns the window, the [`QuadSurface`] and the [`Starfield`]. Cursor
//! positions arrive in physical pixels and are converted to the logical
//! units the simulation works in before they reach the pointer mailbox.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::SimulationError;
use crate::gpu::QuadSurface;
use crate::render::Surface;
use crate::starfield::Starfield;
use crate::time::Clock;
use crate::viewport::Viewport;

/// How often frame statistics are logged, in milliseconds.
const STATS_INTERVAL_MS: f64 = 5_000.0;

pub(crate) fn run(starfield: Starfield) -> Result<(), SimulationError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(starfield);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    starfield: Starfield,
    window: Option<Arc<Window>>,
    surface: Option<QuadSurface>,
    clock: Clock,
    scale_factor: f64,
    last_stats: f64,
    error: Option<SimulationError>,
}

impl App {
    fn new(starfield: Starfield) -> Self {
        Self {
            starfield,
            window: None,
            surface: None,
            clock: Clock::new(),
            scale_factor: 1.0,
            last_stats: 0.0,
            error: None,
        }
    }

    /// Record a fatal error for `run` to return and stop the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SimulationError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let (width, height) = self.starfield.config().window_size;
        let attrs = Window::default_attributes()
            .with_title(self.starfield.config().title.clone())
            .with_inner_size(LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(attrs)?);
        let background = self.starfield.config().background;
        let surface = pollster::block_on(QuadSurface::new(window.clone(), background))?;

        self.scale_factor = window.scale_factor();
        self.window = Some(window.clone());
        self.surface = Some(surface);
        self.apply_size(window.inner_size());
        self.starfield.restart_clock(self.clock.now());

        window.request_redraw();
        Ok(())
    }

    fn apply_size(&mut self, size: PhysicalSize<u32>) {
        let viewport = Viewport::from_physical(size.width, size.height, self.scale_factor);
        if let Some(surface) = &mut self.surface {
            surface.resize(viewport, self.scale_factor);
        }
        self.starfield.resize(viewport);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = &mut self.surface else {
            return;
        };

        let now = self.clock.tick();
        self.starfield.frame(now, surface);

        match surface.present() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                surface.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of GPU memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if now - self.last_stats >= STATS_INTERVAL_MS {
            self.last_stats = now;
            let stats = self.starfield.draw_stats();
            log::debug!(
                "{:.1} fps, {} stars in {} batches, {} steps total",
                self.clock.fps(),
                stats.rects,
                stats.batches,
                self.starfield.scheduler().total_steps()
            );
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                self.apply_size(physical_size);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.apply_size(size);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(self.scale_factor);
                let now = self.clock.now();
                self.starfield.pointer_moved(logical.x, logical.y, now);
            }
            WindowEvent::CursorLeft { .. } => {
                self.starfield.pointer_left();
            }
            WindowEvent::MouseInput { state, .. } if arms_pulse(state) => {
                let now = self.clock.now();
                self.starfield.pointer_pressed(now);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Any mouse button arms the pulse on press; releases are ignored.
fn arms_pulse(state: ElementState) -> bool {
    state == ElementState::Pressed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_of_any_button_arms_pulse() {
        assert!(arms_pulse(ElementState::Pressed));
        assert!(!arms_pulse(ElementState::Released));
    }
}
