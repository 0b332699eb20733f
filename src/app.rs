//! winit driver for the capture session
//!
//! Creates the preview window, buffers keyboard input, and runs one session
//! iteration per redraw until the target count is reached.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{WindowAttributes, WindowId};

use crate::camera::FrameSource;
use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::input::{EventQueue, InputEvent, Key, KeyboardMapper};
use crate::preview::PreviewWindow;
use crate::session::Session;
use crate::store::{FrameStore, PngDirectory};

/// Translate a key transition into a session input event. Auto-repeat is
/// dropped so holding Enter captures once.
pub fn input_event(code: KeyCode, state: ElementState, repeat: bool) -> Option<InputEvent> {
    if repeat {
        return None;
    }
    let key = Key::from_key_code(code);
    Some(match state {
        ElementState::Pressed => InputEvent::KeyDown(key),
        ElementState::Released => InputEvent::KeyUp(key),
    })
}

/// Application handler owning the session and its devices.
pub struct CaptureApp {
    config: CaptureConfig,
    session: Session,
    camera: Box<dyn FrameSource>,
    store: PngDirectory,
    events: EventQueue,
    mapper: KeyboardMapper,
    /// Present while the window is open
    preview: Option<PreviewWindow>,
    /// First fatal error, reported after the event loop returns
    error: Option<CaptureError>,
}

impl CaptureApp {
    pub fn new(config: CaptureConfig, camera: Box<dyn FrameSource>, store: PngDirectory) -> Self {
        let session = Session::new(config.target_images, config.frame_width, config.frame_height);
        Self {
            config,
            session,
            camera,
            store,
            events: EventQueue::new(),
            mapper: KeyboardMapper,
            preview: None,
            error: None,
        }
    }

    /// Outcome of the run: number of images collected, or the fatal error.
    pub fn into_result(self) -> Result<u32> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.session.collected()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: CaptureError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.preview = None;
        event_loop.exit();
    }

    fn finish(&mut self, event_loop: &ActiveEventLoop) {
        self.session.log_completion(self.store.location());
        // Releases the window and GPU surface
        self.preview = None;
        event_loop.exit();
    }

    fn iterate(&mut self, event_loop: &ActiveEventLoop) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };

        let result = self.session.step(
            &mut self.events,
            &self.mapper,
            self.camera.as_mut(),
            &mut self.store,
            preview,
        );

        match result {
            Err(e) => self.fail(event_loop, e),
            Ok(()) if self.session.is_finished() => self.finish(event_loop),
            Ok(()) => {}
        }
    }
}

impl ApplicationHandler for CaptureApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.preview.is_some() || self.error.is_some() {
            return;
        }
        if self.session.is_finished() {
            self.finish(event_loop);
            return;
        }

        log::info!("Creating window...");

        let window_attributes = WindowAttributes::default()
            .with_title(self.config.window_title.as_str())
            .with_inner_size(LogicalSize::new(self.config.frame_width, self.config.frame_height))
            .with_resizable(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, CaptureError::Display(format!("Failed to create window: {}", e)));
                return;
            }
        };

        match pollster::block_on(PreviewWindow::new(window)) {
            Ok(preview) => {
                preview.window().request_redraw();
                self.preview = Some(preview);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(preview) = self.preview.as_mut() else {
            return;
        };
        preview.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::warn!(
                    "Window close ignored: {} of {} images collected, interrupt the process to abort",
                    self.session.collected(),
                    self.session.target()
                );
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if let Some(input) = input_event(code, state, repeat) {
                    self.events.push(input);
                }
            }

            WindowEvent::Resized(physical_size) => preview.resize(physical_size),

            WindowEvent::RedrawRequested => self.iterate(event_loop),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Camera reads block at the sensor frame rate, which paces the loop
        if let Some(preview) = &self.preview {
            preview.window().request_redraw();
            event_loop.set_control_flow(ControlFlow::Poll);
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        assert_eq!(
            input_event(KeyCode::Enter, ElementState::Pressed, false),
            Some(InputEvent::KeyDown(Key::Enter))
        );
        assert_eq!(
            input_event(KeyCode::ArrowUp, ElementState::Released, false),
            Some(InputEvent::KeyUp(Key::Up))
        );
    }

    #[test]
    fn test_repeat_is_dropped() {
        assert_eq!(input_event(KeyCode::Enter, ElementState::Pressed, true), None);
    }
}
