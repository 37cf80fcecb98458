use winit::application::ApplicationHandler;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::args::Args;
use crate::resource::texture::file::FileSystemTextureLoader;
use crate::view::ViewSystem;

pub struct App {
    event_loop_proxy: EventLoopProxy<UserEvent>,
    args: Args,
    texture_loader: Option<FileSystemTextureLoader>,
    view_system: Option<ViewSystem>,
    fatal_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        event_loop: &EventLoop<UserEvent>,
        args: Args,
        texture_loader: FileSystemTextureLoader,
    ) -> Self {
        App {
            event_loop_proxy: event_loop.create_proxy(),
            args,
            texture_loader: Some(texture_loader),
            view_system: None,
            fatal_error: None,
        }
    }

    pub fn create_event_loop() -> Result<EventLoop<UserEvent>, EventLoopError> {
        EventLoop::<UserEvent>::with_user_event().build()
    }

    /// The error that stopped the event loop, if any.
    pub fn take_fatal_error(&mut self) -> Option<anyhow::Error> {
        self.fatal_error.take()
    }

    fn create_window(event_loop: &ActiveEventLoop, args: &Args) -> Result<Window, OsError> {
        let title = match args.texture.file_name() {
            Some(file_name) => format!("KTX Viewer - {}", file_name.to_string_lossy()),
            None => String::from("KTX Viewer"),
        };

        event_loop.create_window(Window::default_attributes().with_title(title))
    }

    async fn initialize_view_system(
        event_loop_proxy: EventLoopProxy<UserEvent>,
        window: Window,
        texture_loader: FileSystemTextureLoader,
    ) {
        let event = match ViewSystem::from_window(window, &texture_loader).await {
            Ok(view_system) => UserEvent::ViewSystemReady(view_system),
            Err(error) => UserEvent::ViewSystemFailed(error),
        };

        if event_loop_proxy.send_event(event).is_err() {
            log::error!("Event loop closed before the view system was initialized");
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.fatal_error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        log::info!("Application resumed");

        if self.view_system.is_some() {
            return;
        }

        let texture_loader = match self.texture_loader.take() {
            Some(texture_loader) => texture_loader,
            None => return,
        };

        let window = match App::create_window(event_loop, &self.args) {
            Ok(window) => window,
            Err(error) => {
                return self.fail(event_loop, anyhow::anyhow!("Failed to create window: {error}"))
            }
        };

        pollster::block_on(App::initialize_view_system(
            self.event_loop_proxy.clone(),
            window,
            texture_loader,
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
                        state,
                        physical_key: PhysicalKey::Code(key_code),
                        repeat: false,
                        ..
                    },
                ..
            } => view_system.view_state.handle_keyboard_input(key_code, state),
            WindowEvent::Resized(new_size) => {
                view_system.render_system.set_view_dimensions(new_size)
            }
            WindowEvent::RedrawRequested => {
                let fatal_error = match view_system.update_view() {
                    Ok(_) => None,
                    Err(error) => match error.downcast_ref::<wgpu::SurfaceError>().cloned() {
                        Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            view_system.render_system.sync_view_dimensions();
                            None
                        }
                        Some(wgpu::SurfaceError::Timeout) => {
                            log::warn!("Surface timeout");
                            None
                        }
                        _ => Some(error),
                    },
                };

                match fatal_error {
                    Some(error) => self.fail(event_loop, error),
                    None => view_system.window.request_redraw(),
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ViewSystemReady(view_system) => {
                log::info!("View system created");

                view_system.window.request_redraw();
                self.view_system = Some(view_system);
            }
            UserEvent::ViewSystemFailed(error) => self.fail(event_loop, error),
        }
    }
}

pub enum UserEvent {
    ViewSystemReady(ViewSystem),
    ViewSystemFailed(anyhow::Error),
}
