//! Window, GL context and event loop.

use std::{num::NonZeroU32, time::Instant};

use glutin::{
    config::{Config, ConfigTemplate, ConfigTemplateBuilder, GlConfig},
    context::{
        ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext,
        PossiblyCurrentContext, Version,
    },
    display::{Display, DisplayApiPreference, GetGlDisplay, GlDisplay},
    surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use glutin_winit::GlWindow;
use log::{debug, error, info, warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawWindowHandle};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key as WinitKey, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    core::{ViewerState, Viewport},
    error::{Result, ViewerError},
    geometry::Mesh,
    gpu::{check_entry_points, GlowGpu},
    input::{Action, InputEvent, InputRouter, Key, MouseButton},
    pipeline::{FrameRenderer, FrameUniforms, ShaderProgramManager, ShaderSources},
    util::format_frame,
    Metrics, ViewerConfig,
};

/// GL objects in teardown order: the renderer's resources must go while the
/// context is still alive, the window last.
struct GlTarget {
    renderer: FrameRenderer<GlowGpu>,
    gpu: GlowGpu,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

impl GlTarget {
    fn release(mut self) {
        self.renderer.destroy(&self.gpu);
    }
}

pub struct ViewerApp {
    config: ViewerConfig,
    mesh: Mesh,
    state: ViewerState,
    router: InputRouter,
    metrics: Metrics,
    target: Option<GlTarget>,
    title: String,
    startup_error: Option<ViewerError>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig, mesh: Mesh) -> Self {
        let viewport = Viewport::new(config.width, config.height);
        let state = ViewerState::for_mesh(&mesh, viewport, config.speed);
        Self {
            config,
            mesh,
            state,
            router: InputRouter::new(),
            metrics: Metrics::new(),
            target: None,
            title: String::new(),
            startup_error: None,
        }
    }

    fn create_target(&self, event_loop: &ActiveEventLoop) -> Result<GlTarget> {
        let window_attributes = Window::default_attributes()
            .with_title(self.state.status_title(0.0))
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let template = ConfigTemplateBuilder::new().with_depth_size(24);

        let (window, gl_config) = open_window(event_loop, window_attributes, template)?;
        debug!(
            "GL config: {} depth bits, {} samples",
            gl_config.depth_size(),
            gl_config.num_samples()
        );

        let raw_window_handle = window
            .window_handle()
            .map_err(|e| ViewerError::Window(e.to_string()))?
            .as_raw();
        let gl_display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window_handle));
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes)? };

        let surface_attributes = window
            .build_surface_attributes(SurfaceAttributesBuilder::default())
            .map_err(|e| ViewerError::Window(e.to_string()))?;
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes)? };
        let context = not_current.make_current(&surface)?;

        if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            warn!("vsync unavailable: {e}");
        }

        check_entry_points(|name| gl_display.get_proc_address(name))?;
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| gl_display.get_proc_address(name))
        };
        let gpu = GlowGpu::new(gl);

        let sources = ShaderSources::resolve(self.config.shader_dir.as_deref());
        let mut renderer = FrameRenderer::new(ShaderProgramManager::new(sources));
        renderer.reload_shaders(&gpu)?;
        renderer.upload(&gpu, &self.mesh)?;

        Ok(GlTarget {
            renderer,
            gpu,
            surface,
            context,
            window,
        })
    }

    fn redraw(&mut self) {
        let Some(target) = self.target.as_ref() else {
            return;
        };

        let dt = self.metrics.tick(Instant::now());
        self.state.advance(dt);
        target.renderer.render(&target.gpu, &self.state);
        if let Err(e) = target.surface.swap_buffers(&target.context) {
            error!("swap failed: {e}");
        }

        let title = self.state.status_title(self.metrics.current_fps);
        if title != self.title {
            target.window.set_title(&title);
            self.title = title;
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.state.resize(size.width, size.height);
        let Some(target) = self.target.as_ref() else {
            return;
        };
        let (width, height) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height));
        if let (Some(width), Some(height)) = (width, height) {
            target.surface.resize(&target.context, width, height);
        }
        target.window.request_redraw();
    }

    fn perform(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        match action {
            Action::Redraw => {}
            Action::ReloadShaders => {
                if let Some(target) = self.target.as_mut() {
                    // A failed reload has already been logged; the old program keeps drawing.
                    let _ = target.renderer.reload_shaders(&target.gpu);
                }
            }
            Action::DumpMatrices => {
                info!("\n{}", format_frame(&FrameUniforms::compute(&self.state)));
            }
            Action::Quit => {
                self.shutdown(event_loop);
                return;
            }
        }
        if let Some(target) = self.target.as_ref() {
            target.window.request_redraw();
        }
    }

    /// Frees GPU resources while the context is current, then stops the loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(target) = self.target.take() {
            target.release();
            info!("shutting down");
        }
        event_loop.exit();
    }

    fn auto_orbiting(&self) -> bool {
        !self.state.paused && self.state.speed != 0.0
    }
}

/// Creates the window and picks its GL config. Without WGL the config comes
/// first so X11 can build the window with the config's visual.
#[cfg(not(target_os = "windows"))]
fn open_window(
    event_loop: &ActiveEventLoop,
    attributes: WindowAttributes,
    template: ConfigTemplateBuilder,
) -> Result<(Window, Config)> {
    let display = create_display(event_loop, None)?;
    let config = choose_config(&display, template.build())?;
    let window = glutin_winit::finalize_window(event_loop, attributes, &config)
        .map_err(|e| ViewerError::Window(e.to_string()))?;
    Ok((window, config))
}

/// WGL only exposes modern contexts for configs tied to an existing window.
#[cfg(target_os = "windows")]
fn open_window(
    event_loop: &ActiveEventLoop,
    attributes: WindowAttributes,
    template: ConfigTemplateBuilder,
) -> Result<(Window, Config)> {
    let window = event_loop
        .create_window(attributes)
        .map_err(|e| ViewerError::Window(e.to_string()))?;
    let handle = window
        .window_handle()
        .map_err(|e| ViewerError::Window(e.to_string()))?
        .as_raw();
    let display = create_display(event_loop, Some(handle))?;
    let config = choose_config(&display, template.compatible_with_native_window(handle).build())?;
    Ok((window, config))
}

fn create_display(
    event_loop: &ActiveEventLoop,
    window: Option<RawWindowHandle>,
) -> Result<Display> {
    #[cfg(target_os = "windows")]
    let preference = DisplayApiPreference::WglThenEgl(window);
    #[cfg(target_os = "macos")]
    let preference = DisplayApiPreference::Cgl;
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let preference = DisplayApiPreference::Egl;
    #[cfg(not(target_os = "windows"))]
    let _ = window;

    let handle = event_loop
        .display_handle()
        .map_err(|e| ViewerError::Window(e.to_string()))?
        .as_raw();
    Ok(unsafe { Display::new(handle, preference)? })
}

fn choose_config(display: &Display, template: ConfigTemplate) -> Result<Config> {
    let configs = unsafe { display.find_configs(template)? };
    most_samples(configs, |config| config.num_samples())
        .ok_or_else(|| ViewerError::Context("no GL config with a 24-bit depth buffer".into()))
}

/// The candidate with the highest sample count, the first one on ties.
fn most_samples<C>(candidates: impl Iterator<Item = C>, samples: impl Fn(&C) -> u8) -> Option<C> {
    candidates.reduce(|best, next| {
        if samples(&next) > samples(&best) {
            next
        } else {
            best
        }
    })
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.target.is_some() {
            return;
        }
        match self.create_target(event_loop) {
            Ok(target) => {
                let size = target.window.inner_size();
                self.state.resize(size.width, size.height);
                target.window.request_redraw();
                self.target = Some(target);
            }
            Err(e) => {
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::RedrawRequested => self.redraw(),
            event => {
                if let Some(input) = translate(&event) {
                    if let Some(action) = self.router.handle(input, &mut self.state) {
                        self.perform(action, event_loop);
                    }
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if self.auto_orbiting() {
            if let Some(target) = self.target.as_ref() {
                target.window.request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(target) = self.target.take() {
            target.release();
        }
    }
}

/// Maps the winit events the router cares about.
fn translate(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::MouseInput { state, button, .. } => {
            let button = match button {
                winit::event::MouseButton::Left => MouseButton::Primary,
                winit::event::MouseButton::Right => MouseButton::Secondary,
                winit::event::MouseButton::Middle => MouseButton::Tertiary,
                _ => return None,
            };
            Some(InputEvent::Button {
                button,
                pressed: *state == ElementState::Pressed,
            })
        }
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x,
            y: position.y,
        }),
        WindowEvent::MouseWheel { delta, .. } => Some(match delta {
            MouseScrollDelta::LineDelta(_, lines) => InputEvent::Wheel { lines: *lines },
            MouseScrollDelta::PixelDelta(pos) => InputEvent::wheel_pixels(pos.y),
        }),
        WindowEvent::ModifiersChanged(modifiers) => Some(InputEvent::Modifiers {
            shift: modifiers.state().shift_key(),
        }),
        WindowEvent::KeyboardInput { event, .. }
            if event.state == ElementState::Pressed && !event.repeat =>
        {
            let key = match &event.logical_key {
                WinitKey::Named(NamedKey::F6) => Key::F6,
                WinitKey::Named(NamedKey::Escape) => Key::Escape,
                WinitKey::Named(NamedKey::Space) => Key::Char(' '),
                WinitKey::Character(text) => Key::Char(text.chars().next()?),
                _ => return None,
            };
            Some(InputEvent::Key(key))
        }
        _ => None,
    }
}

/// Opens the window and runs until it is closed. Fails if the window, the GL
/// context or the first shader build could not be set up.
pub fn run(config: ViewerConfig, mesh: Mesh) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    info!(
        "opening {}x{} window, auto-orbit {} deg/s",
        config.width, config.height, config.speed
    );
    let mut app = ViewerApp::new(config, mesh);
    event_loop.run_app(&mut app)?;

    match app.startup_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_most_samples_then_first() {
        let picked = most_samples([("a", 0), ("b", 4), ("c", 4), ("d", 2)].into_iter(), |c| c.1);
        assert_eq!(picked, Some(("b", 4)));
    }

    #[test]
    fn no_candidates_picks_nothing() {
        assert_eq!(most_samples(std::iter::empty::<(&str, u8)>(), |c| c.1), None);
    }
}
