#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Amida.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature. Consumers that need sound playback can opt back
//! in by enabling `macroquad/audio` in their own `Cargo.toml` dependency
//! specification.

use amida_core::LineIndex;
use amida_rendering::{
    interpolate_along, Color, FrameInput, Presentation, RenderingBackend, Scene,
};
use anyhow::Result;
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, KeyCode},
    shapes::{draw_circle, draw_line},
    text::{draw_text, measure_text},
};
use std::time::Duration;

const RAIL_THICKNESS: f32 = 2.0;
const RUNG_THICKNESS: f32 = 4.0;
const TRACE_THICKNESS: f32 = 6.0;
const MARKER_RADIUS: f32 = 10.0;
const LABEL_FONT_SIZE: f32 = 22.0;
const BANNER_FONT_SIZE: f32 = 28.0;
const BANNER_BAND: f32 = 60.0;

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the game loop.
    quit_requested: bool,
    /// `C` to create a fresh ladder.
    create_pressed: bool,
    /// `Space` or `Enter` to start the selected descent.
    run_pressed: bool,
    /// `R` to reset the session.
    reset_pressed: bool,
    /// `Left` to move the start selection one rail left.
    left_pressed: bool,
    /// `Right` to move the start selection one rail right.
    right_pressed: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let create_pressed = is_key_pressed(KeyCode::C);
        let run_pressed = is_key_pressed(KeyCode::Space) || is_key_pressed(KeyCode::Enter);
        let reset_pressed = is_key_pressed(KeyCode::R);
        let left_pressed = is_key_pressed(KeyCode::Left);
        let right_pressed = is_key_pressed(KeyCode::Right);

        Self {
            quit_requested,
            create_pressed,
            run_pressed,
            reset_pressed,
            left_pressed,
            right_pressed,
        }
    }

    fn frame_input(self) -> FrameInput {
        FrameInput {
            create_requested: self.create_pressed,
            run_requested: self.run_pressed,
            reset_requested: self.reset_pressed,
            select_left: self.left_pressed,
            select_right: self.right_pressed,
        }
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second average once one
    /// second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames;
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        if seconds <= f32::EPSILON {
            return None;
        }
        Some(frames as f32 / seconds)
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display
    /// refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 720,
            window_height: 900,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let banner_panel = to_macroquad_color(clear_color.lighten(0.12));
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                update_scene(frame_dt, keyboard.frame_input(), &mut scene);

                let metrics = BoardMetrics::fit(&scene, screen_width, screen_height);
                draw_rails(&scene, &metrics);
                draw_rungs(&scene, &metrics);
                draw_run(&scene, &metrics);
                draw_labels(&scene, &metrics);
                draw_banner(&scene, banner_panel, screen_width, screen_height);

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                        println!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Uniform scale and centring offsets that fit the board onto the screen.
#[derive(Clone, Copy, Debug)]
struct BoardMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl BoardMetrics {
    fn fit(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let board_width = scene.ladder.width();
        let board_height = scene.ladder.height();
        let available_height = (screen_height - BANNER_BAND).max(0.0);

        let scale = if board_width <= f32::EPSILON || board_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / board_width).min(available_height / board_height)
        };

        let offset_x = ((screen_width - board_width * scale) * 0.5).max(0.0);
        let offset_y = ((available_height - board_height * scale) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    fn project(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + position.x * self.scale,
            self.offset_y + position.y * self.scale,
        )
    }

    fn stroke(&self, thickness: f32) -> f32 {
        (thickness * self.scale).max(1.0)
    }
}

fn draw_rails(scene: &Scene, metrics: &BoardMetrics) {
    let color = to_macroquad_color(scene.ladder.rail_color);
    for line in 0..scene.ladder.lines {
        let (top, bottom) = scene.ladder.rail_segment(LineIndex::new(line));
        let top = metrics.project(top);
        let bottom = metrics.project(bottom);
        draw_line(
            top.x,
            top.y,
            bottom.x,
            bottom.y,
            metrics.stroke(RAIL_THICKNESS),
            color,
        );
    }
}

fn draw_rungs(scene: &Scene, metrics: &BoardMetrics) {
    let color = to_macroquad_color(scene.ladder.rung_color);
    for rung in &scene.rungs {
        let (left, right) = scene.ladder.rung_segment(rung);
        let left = metrics.project(left);
        let right = metrics.project(right);
        draw_line(
            left.x,
            left.y,
            right.x,
            right.y,
            metrics.stroke(RUNG_THICKNESS),
            color,
        );
    }
}

fn draw_run(scene: &Scene, metrics: &BoardMetrics) {
    let Some(run) = scene.run.as_ref() else {
        return;
    };

    let polyline = run.polyline(&scene.ladder);
    let trace_color = to_macroquad_color(scene.ladder.trace_color);
    for pair in polyline.windows(2) {
        let from = metrics.project(pair[0]);
        let to = metrics.project(pair[1]);
        draw_line(
            from.x,
            from.y,
            to.x,
            to.y,
            metrics.stroke(TRACE_THICKNESS),
            trace_color,
        );
    }

    let marker = metrics.project(interpolate_along(&polyline, run.progress));
    draw_circle(
        marker.x,
        marker.y,
        metrics.stroke(MARKER_RADIUS),
        to_macroquad_color(scene.ladder.marker_color),
    );
}

fn draw_labels(scene: &Scene, metrics: &BoardMetrics) {
    let font_size = (LABEL_FONT_SIZE * metrics.scale).max(12.0);
    let plain = macroquad::color::WHITE;
    let selected = to_macroquad_color(scene.ladder.marker_color);

    for (index, label) in scene.top_labels.iter().enumerate() {
        let line = LineIndex::new(index as u32);
        let anchor = metrics.project(scene.ladder.top_label_anchor(line));
        let color = if scene.selected_start == Some(line) {
            selected
        } else {
            plain
        };
        draw_centred_text(label, anchor, font_size, color);
    }

    for (index, label) in scene.bottom_labels.iter().enumerate() {
        let line = LineIndex::new(index as u32);
        let anchor = metrics.project(scene.ladder.bottom_label_anchor(line));
        draw_centred_text(label, anchor, font_size, plain);
    }
}

fn draw_banner(
    scene: &Scene,
    panel: macroquad::color::Color,
    screen_width: f32,
    screen_height: f32,
) {
    macroquad::shapes::draw_rectangle(
        0.0,
        screen_height - BANNER_BAND,
        screen_width,
        BANNER_BAND,
        panel,
    );
    let anchor = Vec2::new(screen_width * 0.5, screen_height - BANNER_BAND * 0.5);
    draw_centred_text(
        &scene.banner,
        anchor,
        BANNER_FONT_SIZE,
        macroquad::color::WHITE,
    );
}

fn draw_centred_text(text: &str, anchor: Vec2, font_size: f32, color: macroquad::color::Color) {
    let dimensions = measure_text(text, None, font_size as u16, 1.0);
    let _ = draw_text(
        text,
        anchor.x - dimensions.width * 0.5,
        anchor.y + dimensions.height * 0.5,
        font_size,
        color,
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
