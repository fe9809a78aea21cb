#![cfg(feature = "windowed")]
//! Windowed presentation sink.
//!
//! The game loop runs on its own thread and posts each finished frame to
//! the UI thread through the event-loop proxy; the UI thread stretches
//! the latest frame to the current window size (independent X/Y scale
//! factors, nearest neighbour) and presents it. Frames are produced
//! fresh per tick, so the loop never mutates a posted frame.

use std::thread;

use anyhow::{anyhow, Context, Result};
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::frame::Frame;
use crate::game_loop::GameLoop;
use crate::input::{ActionQueue, GameAction};
use crate::sink::FrameSink;

const WINDOW_CLOSED: &str = "presentation window closed";

/// Messages the loop thread posts to the UI thread.
#[derive(Debug)]
enum LoopEvent {
    Frame(Frame),
    Finished,
}

struct WindowSink {
    proxy: EventLoopProxy<LoopEvent>,
}

impl FrameSink for WindowSink {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.proxy
            .send_event(LoopEvent::Frame(frame.clone()))
            .map_err(|_| anyhow!(WINDOW_CLOSED))
    }
}

pub fn run_windowed(mut game_loop: GameLoop, queue: ActionQueue) -> Result<()> {
    let event_loop = EventLoopBuilder::<LoopEvent>::with_user_event()
        .build()
        .context("failed to create event loop")?;

    let window = WindowBuilder::new()
        .with_title("corewake")
        .with_inner_size(PhysicalSize::new(960u32, 540u32))
        .build(&event_loop)
        .context("failed to create window")?;

    let initial = window.inner_size();
    let mut surface_size = (initial.width.max(1), initial.height.max(1));
    let mut pixels = {
        let surface_texture = SurfaceTexture::new(surface_size.0, surface_size.1, &window);
        Pixels::new(surface_size.0, surface_size.1, surface_texture)
            .context("failed to create presentation surface")?
    };

    let proxy = event_loop.create_proxy();
    let finish_proxy = event_loop.create_proxy();
    let worker = thread::Builder::new()
        .name("game-loop".to_owned())
        .spawn(move || {
            let mut sink = WindowSink { proxy };
            let result = game_loop.run(&mut sink);
            let _ = finish_proxy.send_event(LoopEvent::Finished);
            result
        })
        .context("failed to spawn game loop thread")?;

    let mut latest: Option<Frame> = None;
    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            match event {
                Event::UserEvent(LoopEvent::Frame(frame)) => {
                    latest = Some(frame);
                    window.request_redraw();
                }
                Event::UserEvent(LoopEvent::Finished) => target.exit(),
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        queue.publish(GameAction::Quit);
                    }
                    WindowEvent::Resized(size) => {
                        surface_size = (size.width.max(1), size.height.max(1));
                        let resized = pixels
                            .resize_surface(surface_size.0, surface_size.1)
                            .and_then(|_| pixels.resize_buffer(surface_size.0, surface_size.1));
                        if resized.is_err() {
                            eprintln!("[corewake] failed to resize presentation surface");
                        }
                        window.request_redraw();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state == ElementState::Pressed && !event.repeat {
                            if let PhysicalKey::Code(code) = event.physical_key {
                                if let Some(action) = map_key(code) {
                                    queue.publish(action);
                                }
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(frame) = &latest {
                            stretch_into(frame, pixels.frame_mut(), surface_size.0, surface_size.1);
                            if pixels.render().is_err() {
                                eprintln!("[corewake] presentation failed");
                                target.exit();
                            }
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        })
        .context("event loop terminated abnormally")?;

    match worker.join() {
        Ok(Ok(())) => Ok(()),
        // losing the race against window teardown is a normal quit
        Ok(Err(error)) if error.to_string() == WINDOW_CLOSED => Ok(()),
        Ok(Err(error)) => Err(error),
        Err(_) => Err(anyhow!("game loop thread panicked")),
    }
}

fn map_key(code: KeyCode) -> Option<GameAction> {
    match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(GameAction::MoveUp),
        KeyCode::ArrowDown | KeyCode::KeyS => Some(GameAction::MoveDown),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(GameAction::MoveLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(GameAction::MoveRight),
        KeyCode::Enter | KeyCode::Space => Some(GameAction::Confirm),
        KeyCode::Escape => Some(GameAction::Quit),
        _ => None,
    }
}

/// Nearest-neighbour stretch of the frame into the surface buffer with
/// independent horizontal and vertical scale factors.
fn stretch_into(frame: &Frame, buffer: &mut [u8], width: u32, height: u32) {
    for y in 0..height {
        let sy = ((u64::from(y) * u64::from(frame.height())) / u64::from(height)) as u32;
        for x in 0..width {
            let sx = ((u64::from(x) * u64::from(frame.width())) / u64::from(width)) as u32;
            let pixel = frame.pixel(sx, sy);
            let index = ((y * width + x) * 4) as usize;
            if index + 4 <= buffer.len() {
                buffer[index..index + 4].copy_from_slice(&pixel);
            }
        }
    }
}
