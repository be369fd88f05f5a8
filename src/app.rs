use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::args::Args;
use crate::error::{Error, ErrorKind};
use crate::settings::Settings;
use crate::view::ViewSystem;

pub struct App {
    event_loop_proxy: EventLoopProxy<UserEvent>,
    args: Args,
    settings: Settings,
    view_system: Option<ViewSystem>,
    initialization_error: Option<anyhow::Error>,
    last_render_time: std::time::Instant,
}

impl App {
    pub fn new(event_loop: &EventLoop<UserEvent>, args: Args) -> Self {
        let settings = App::load_settings(&args).unwrap_or_else(|error| {
            log::error!("Using default settings: {error:#}");
            Settings::default()
        });

        App {
            event_loop_proxy: event_loop.create_proxy(),
            args,
            settings,
            view_system: None,
            initialization_error: None,
            last_render_time: Instant::now(),
        }
    }

    pub fn create_event_loop() -> Result<EventLoop<UserEvent>, EventLoopError> {
        EventLoop::<UserEvent>::with_user_event().build()
    }

    /// The error that stopped the window or GPU context from coming up.
    pub fn take_initialization_error(&mut self) -> Option<anyhow::Error> {
        self.initialization_error.take()
    }

    fn load_settings(args: &Args) -> anyhow::Result<Settings> {
        match &args.settings {
            Some(path) => Settings::from_path(path),
            None => Ok(Settings::default()),
        }
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Window> {
        let window_attributes = Window::default_attributes()
            .with_title(self.args.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.args.width,
                self.args.height,
            ))
            .with_resizable(self.args.resizable);

        event_loop.create_window(window_attributes).map_err(|error| {
            Error::new(
                ErrorKind::InitializationFailure,
                format!("Failed to create window: {error}"),
            )
            .into()
        })
    }

    async fn initialize_view_system(
        event_loop_proxy: EventLoopProxy<UserEvent>,
        window: Window,
        title: String,
        settings: Settings,
    ) {
        let result = ViewSystem::from_window(window, title, &settings).await;

        if event_loop_proxy
            .send_event(UserEvent::ViewSystemReady(result))
            .is_err()
        {
            log::error!("The event loop closed before the view system was ready");
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.initialization_error = Some(error);
        event_loop.exit();
    }

    fn reload_settings(&mut self) {
        let Some(path) = &self.args.settings else {
            log::info!("No settings file to reload");
            return;
        };

        match Settings::from_path(path) {
            Ok(settings) => {
                log::info!("Reloaded settings from {}", path.display());
                if settings.ibl != self.settings.ibl {
                    log::warn!("IBL settings changes apply on the next start");
                }
                self.settings = settings;
                if let Some(view_system) = &mut self.view_system {
                    view_system.apply_settings(&self.settings);
                }
            }
            Err(error) => log::error!("Keeping the current settings: {error:#}"),
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Application resumed");

        if self.view_system.is_some() {
            return;
        }

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(error) => return self.fail(event_loop, error),
        };

        pollster::block_on(App::initialize_view_system(
            self.event_loop_proxy.clone(),
            window,
            self.args.title.clone(),
            self.settings.clone(),
        ));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let view_system = match &mut self.view_system {
            Some(view_system) => view_system,
            None => return,
        };

        if view_system.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::F5),
                        repeat: false,
                        ..
                    },
                ..
            } => self.reload_settings(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                view_system
                    .camera_controller
                    .handle_keyboard_input(key_code, state);
            }
            WindowEvent::Resized(new_size) => {
                view_system.render_system.set_view_dimensions(new_size)
            }
            WindowEvent::RedrawRequested => {
                let now = std::time::Instant::now();
                let delta_time = now - self.last_render_time;

                if let Err(error) = view_system.update_view(delta_time) {
                    match error.downcast_ref::<wgpu::SurfaceError>() {
                        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            view_system.render_system.sync_view_dimensions()
                        }
                        Some(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("OutOfMemory");
                            event_loop.exit();
                        }
                        Some(wgpu::SurfaceError::Timeout) => {
                            log::warn!("Surface timeout");
                        }
                        None => log::error!("Failed to render frame: {error:#}"),
                    }
                }

                self.last_render_time = now;
                view_system.window.request_redraw();
            }
            WindowEvent::MouseInput {
                device_id: _,
                state,
                button,
            } => {
                if button == MouseButton::Right && state == ElementState::Pressed {
                    view_system.move_light_to_camera();
                }

                view_system
                    .camera_controller
                    .handle_mouse_input(button, state);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let view_system = match &mut self.view_system {
            Some(view_system) => view_system,
            None => return,
        };

        if let DeviceEvent::MouseMotion { delta } = event {
            view_system
                .camera_controller
                .handle_mouse_movement(delta.0 as f32, delta.1 as f32);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        let UserEvent::ViewSystemReady(result) = event;

        let mut view_system = match result {
            Ok(view_system) => view_system,
            Err(error) => return self.fail(event_loop, error),
        };

        log::info!("View system created");

        view_system.load_assets(&self.args);
        view_system.apply_settings(&self.settings);

        view_system.window.request_redraw();
        self.view_system = Some(view_system);
        self.last_render_time = std::time::Instant::now();
    }
}

pub enum UserEvent {
    ViewSystemReady(anyhow::Result<ViewSystem>),
}
