use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{CursorIcon, Window, WindowBuilder};

use crate::error::{FrameError, SketchError};
use crate::gpu::GpuState;
use crate::input::{PixelPosition, PointerEvent, SelectionHost};
use crate::scheduler::{AnimationLoop, FramePacer, FrameRequester};
use crate::session::{wall_clock_seconds, SessionState};
use crate::types::{SketchConfig, SurfaceDimensions};

/// Shown in place of the drawing when no graphics context can be created.
pub const CONTEXT_UNAVAILABLE_MESSAGE: &str = "Your device does not support GPU rendering";

/// Called once, on the window, when the graphics context cannot be created.
pub type ContextUnavailableHandler = Box<dyn FnOnce(&Window, &SketchError)>;

/// Default fallback. The window title is the only visible notice; nothing is
/// drawn into the window because there is no context to draw with.
pub(crate) fn show_context_unavailable(window: &Window, err: &SketchError) {
    tracing::error!(error = %err, "{CONTEXT_UNAVAILABLE_MESSAGE}");
    window.set_title(CONTEXT_UNAVAILABLE_MESSAGE);
}

/// Swaps the cursor for a crosshair while the pointer draws on the window.
struct CursorSelection<'a>(&'a Window);

impl SelectionHost for CursorSelection<'_> {
    fn set_selection_enabled(&mut self, enabled: bool) {
        let icon = if enabled {
            CursorIcon::Default
        } else {
            CursorIcon::Crosshair
        };
        self.0.set_cursor_icon(icon);
    }
}

/// Turns tick requests into paced `request_redraw` calls.
struct RedrawRequester {
    wanted: bool,
    pacer: FramePacer,
}

impl RedrawRequester {
    fn new(target_fps: Option<f32>) -> Self {
        Self {
            wanted: false,
            pacer: FramePacer::new(target_fps),
        }
    }

    /// Issues `request_redraw` once a wanted frame is due, otherwise sleeps
    /// until the pacer's deadline.
    fn control_flow<F>(&mut self, now: Instant, request_redraw: F) -> ControlFlow
    where
        F: FnOnce(),
    {
        if !self.wanted {
            return ControlFlow::Wait;
        }
        if self.pacer.ready_for_frame(now) {
            tracing::trace!("scheduler: issuing redraw now");
            self.wanted = false;
            request_redraw();
            ControlFlow::Wait
        } else if let Some(deadline) = self.pacer.next_deadline() {
            ControlFlow::WaitUntil(deadline)
        } else {
            ControlFlow::Wait
        }
    }
}

impl FrameRequester for RedrawRequester {
    fn request_frame(&mut self) {
        self.wanted = true;
    }
}

struct Mounted {
    gpu: GpuState,
    animation: AnimationLoop<RedrawRequester>,
}

fn pixel(position: PhysicalPosition<f64>) -> PixelPosition {
    PixelPosition::new(position.x as f32, position.y as f32)
}

/// Opens the window and runs the sketch until the window closes.
pub(crate) fn run(
    config: SketchConfig,
    on_context_unavailable: Option<ContextUnavailableHandler>,
) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;

    let initial_size = SurfaceDimensions::from(window.inner_size());
    let mut session = SessionState::new(initial_size, config.color_seed);
    let mut unavailable = None;
    let mut mounted = match GpuState::new(&window, initial_size, &config.context) {
        Ok(mut gpu) => {
            if let Err(err) = gpu.present() {
                tracing::warn!(error = %err, "failed to present the empty drawing buffer");
            }
            Some(Mounted {
                gpu,
                animation: AnimationLoop::start(RedrawRequester::new(config.target_fps)),
            })
        }
        Err(err @ SketchError::ContextUnavailable(_)) => {
            let handler = on_context_unavailable.unwrap_or_else(|| Box::new(show_context_unavailable));
            handler(&window, &err);
            unavailable = Some(err);
            None
        }
        Err(err) => return Err(err.into()),
    };

    let mut last_cursor: Option<PhysicalPosition<f64>> = None;
    let mut failure: Option<SketchError> = None;

    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                if let Some(mounted) = mounted.as_mut() {
                    mounted.animation.teardown();
                }
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(mounted) = mounted.as_mut() {
                    mounted.gpu.set_display_size(size.into());
                }
            }
            WindowEvent::CursorEntered { .. } => {
                session.dispatch(PointerEvent::Enter, &mut CursorSelection(&window));
            }
            WindowEvent::CursorLeft { .. } => {
                session.dispatch(PointerEvent::Leave, &mut CursorSelection(&window));
            }
            WindowEvent::CursorMoved { position, .. } => {
                last_cursor = Some(position);
                session.dispatch(
                    PointerEvent::Move(pixel(position)),
                    &mut CursorSelection(&window),
                );
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let event = match state {
                    ElementState::Pressed => PointerEvent::Press(last_cursor.map(pixel)),
                    ElementState::Released => PointerEvent::Release,
                };
                session.dispatch(event, &mut CursorSelection(&window));
            }
            WindowEvent::RedrawRequested => {
                let Some(mounted) = mounted.as_mut() else {
                    return;
                };
                let result = mounted
                    .animation
                    .tick(&mut session, &mut mounted.gpu, wall_clock_seconds())
                    .and_then(|outcome| {
                        mounted
                            .animation
                            .requester_mut()
                            .pacer
                            .mark_rendered(Instant::now());
                        if outcome.resized && !outcome.drew {
                            match mounted.gpu.present() {
                                Err(err @ FrameError::Fatal(_)) => return Err(err.into()),
                                Err(err) => {
                                    tracing::warn!(error = %err, "failed to present resized buffer")
                                }
                                Ok(()) => {}
                            }
                        }
                        Ok(())
                    });
                if let Err(err) = result {
                    tracing::error!(error = %err, "rendering stopped");
                    mounted.animation.teardown();
                    failure = Some(err);
                    elwt.exit();
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let flow = match mounted.as_mut() {
                Some(mounted) => mounted
                    .animation
                    .requester_mut()
                    .control_flow(Instant::now(), || window.request_redraw()),
                None => ControlFlow::Wait,
            };
            elwt.set_control_flow(flow);
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))?;
    exit_result(failure, unavailable)
}

/// Only a failure while rendering is reported to the caller. A window that
/// fell back to the context-unavailable notice and was then closed exits cleanly.
fn exit_result(failure: Option<SketchError>, unavailable: Option<SketchError>) -> Result<()> {
    if let Some(err) = unavailable {
        tracing::info!(error = %err, "window closed after showing the fallback notice");
    }
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    #[test]
    fn idle_requester_never_redraws() {
        let mut requester = RedrawRequester::new(Some(4.0));
        let redraws = Cell::new(0);
        let flow = requester.control_flow(Instant::now(), || redraws.set(redraws.get() + 1));
        assert_eq!(flow, ControlFlow::Wait);
        assert_eq!(redraws.get(), 0);
    }

    #[test]
    fn wanted_frame_is_issued_once() {
        let mut requester = RedrawRequester::new(Some(4.0));
        let redraws = Cell::new(0);
        requester.request_frame();

        let now = Instant::now();
        let flow = requester.control_flow(now, || redraws.set(redraws.get() + 1));
        assert_eq!(flow, ControlFlow::Wait);
        assert_eq!(redraws.get(), 1);
        assert!(!requester.wanted);

        requester.control_flow(now, || redraws.set(redraws.get() + 1));
        assert_eq!(redraws.get(), 1);
    }

    #[test]
    fn throttled_frame_waits_for_deadline() {
        let mut requester = RedrawRequester::new(Some(4.0));
        let redraws = Cell::new(0);
        let start = Instant::now();
        requester.pacer.mark_rendered(start);
        requester.request_frame();

        let early = start + Duration::from_millis(10);
        let flow = requester.control_flow(early, || redraws.set(redraws.get() + 1));
        assert_eq!(
            flow,
            ControlFlow::WaitUntil(start + Duration::from_millis(250))
        );
        assert_eq!(redraws.get(), 0);
        assert!(requester.wanted);

        let due = start + Duration::from_millis(250);
        requester.control_flow(due, || redraws.set(redraws.get() + 1));
        assert_eq!(redraws.get(), 1);
        assert!(!requester.wanted);
    }

    #[test]
    fn closing_after_fallback_is_not_an_error() {
        let unavailable = SketchError::ContextUnavailable("no adapter".into());
        assert!(exit_result(None, Some(unavailable)).is_ok());
        assert!(exit_result(None, None).is_ok());
    }

    #[test]
    fn render_failure_is_reported() {
        let failure = SketchError::Frame(FrameError::Fatal("device lost".into()));
        let err = exit_result(Some(failure), None).unwrap_err();
        assert!(err.to_string().contains("device lost"));
    }
}
