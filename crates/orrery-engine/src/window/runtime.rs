use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::translate_window_event;
use crate::input::InputFrame;
use crate::render::RenderCtx;
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Orrery".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, initializes the app and drives frames until a
    /// quit request or an `AppControl::Exit`.
    ///
    /// Window, GPU and `App::on_init` failures are returned here.
    ///
    /// The frame clock starts before anything else, so the first frame's
    /// `dt` covers window, GPU and asset setup.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let clock = FrameClock::new();
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app, clock);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_frame: InputFrame,
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    /// Moved into the window entry once it exists.
    clock: Option<FrameClock>,
    window: Option<WindowEntry>,
    initialized: bool,
    exit_requested: bool,
    startup_error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A, clock: FrameClock) -> Self {
        Self {
            config,
            gpu_init,
            app,
            clock: Some(clock),
            window: None,
            initialized: false,
            exit_requested: false,
            startup_error: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let clock = self.clock.take().unwrap_or_default();

        WindowEntryTryBuilder {
            input_frame: InputFrame::default(),
            clock,
            window,
            gpu_builder: |w| {
                pollster::block_on(Gpu::new(w, gpu_init))
                    .context("GPU initialization failed for window")
            },
        }
        .try_build()
    }

    /// Creates the window and GPU context, then hands the app a
    /// [`RenderCtx`] to load its resources with.
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let entry = self.create_window_entry(event_loop)?;

        let app = &mut self.app;
        entry
            .with_gpu(|gpu| {
                let rctx = RenderCtx::new(gpu.device(), gpu.queue(), gpu.surface_format());
                app.on_init(&rctx)
            })
            .context("application init failed")?;

        entry.with_window(|w| w.request_redraw());

        self.window = Some(entry);
        self.initialized = true;
        log::info!("runtime started: \"{}\"", self.config.title);
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        self.window
            .as_ref()
            .is_some_and(|entry| entry.borrow_input_frame().quit_requested())
    }

    /// One loop iteration: quit check, then update/draw via the app.
    fn drive_frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.quit_requested() {
            log::info!("quit requested; stopping");
            self.request_exit(event_loop);
            return;
        }

        let app = &mut self.app;
        let Some(entry) = self.window.as_mut() else {
            return;
        };

        let mut app_control = AppControl::Continue;
        entry.with_mut(|fields| {
            let ft: FrameTime = fields.clock.tick();

            // Scope to ensure `ctx` is dropped before mutating frame state.
            {
                let mut ctx = FrameCtx {
                    window: fields.window,
                    gpu: fields.gpu,
                    input_frame: fields.input_frame,
                    time: ft,
                };

                app_control = app.on_frame(&mut ctx);
            }

            fields.input_frame.clear();
        });

        if app_control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("startup failed: {e:#}");
            self.startup_error = Some(e);
            self.request_exit(event_loop);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.quit_requested() {
            self.request_exit(event_loop);
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.window {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);

        let Some(entry) = window.as_mut() else {
            return;
        };
        if entry.with_window(|w| w.id()) != window_id {
            return;
        }

        let mut exit_from_app_event = false;
        if let Some(ev) = translate_window_event(&event) {
            if app.on_input(&ev) == AppControl::Exit {
                exit_from_app_event = true;
            }
            entry.with_input_frame_mut(|frame| frame.push_event(ev));
        }

        if exit_from_app_event {
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => self.drive_frame(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.initialized {
            self.app.on_exit();
            self.initialized = false;
        }
        // Drops the GPU context before the window it borrows.
        self.window = None;
        log::info!("runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct Idle;

    impl CoreApp for Idle {
        fn on_init(&mut self, _ctx: &RenderCtx<'_>) -> Result<()> {
            Ok(())
        }

        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_, '_>) -> AppControl {
            AppControl::Continue
        }
    }

    #[test]
    fn startup_time_counts_toward_first_frame() {
        let clock = FrameClock::new();
        let mut state = AppState::new(RuntimeConfig::default(), GpuInit::default(), Idle, clock);

        // Stands in for window, GPU and asset setup.
        std::thread::sleep(Duration::from_millis(20));

        let mut clock = state.clock.take().unwrap();
        let first = clock.tick();
        assert_eq!(first.frame_index, 0);
        assert!(first.dt >= 0.02, "first dt {} excludes startup", first.dt);
    }

    #[test]
    fn default_window_is_orrery_640x480() {
        let config = RuntimeConfig::default();
        assert_eq!(config.title, "Orrery");
        assert_eq!(config.initial_size, LogicalSize::new(640.0, 480.0));
    }
}
