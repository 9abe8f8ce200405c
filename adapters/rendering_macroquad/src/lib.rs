#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for the layout editor.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, so the crate depends on macroquad without its default `audio`
//! feature. The canvas is drawn at a fixed margin from the window corner with
//! the status panel to its right.

use std::time::Duration;

use anyhow::{ensure, Result};
use glam::DVec2;
use log::info;
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    shapes::{draw_circle, draw_line, draw_rectangle, draw_rectangle_lines, draw_triangle},
};
use wflop_editor_core::CursorHint;
use wflop_editor_rendering::{
    palette, CellHighlight, Color, FrameInput, Layer, Presentation, Rect, RenderingBackend, Scene,
};

/// Gap between the window edge and the canvas in pixels.
const CANVAS_MARGIN: f32 = 20.0;
/// Width reserved for the status panel in pixels.
const STATUS_PANEL_WIDTH: f32 = 320.0;
const STATUS_FONT_SIZE: f32 = 22.0;
const STATUS_LINE_HEIGHT: f32 = 28.0;
const HOVER_OUTLINE_WIDTH: f32 = 2.0;

const WIND_KEYS: [KeyCode; 9] = [
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Key4,
    KeyCode::Key5,
    KeyCode::Key6,
    KeyCode::Key7,
    KeyCode::Key8,
    KeyCode::Key9,
];

/// Snapshot of edge-triggered keyboard shortcuts observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the editor loop.
    quit_requested: bool,
    /// Digits `1`-`9` select a wind profile.
    wind_digit: Option<u8>,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let quit_requested = is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q);
        let wind_digit = WIND_KEYS
            .iter()
            .zip(1u8..)
            .find_map(|(key, digit)| is_key_pressed(*key).then_some(digit));

        Self {
            quit_requested,
            wind_digit,
        }
    }
}

/// Zero-based wind profile index for a pressed digit key.
fn wind_shortcut(digit: Option<u8>) -> Option<usize> {
    digit
        .filter(|digit| *digit > 0)
        .map(|digit| usize::from(digit) - 1)
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
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

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs the frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Counts rendered frames and reports the rate once per second.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(FrameInput, &mut Scene) + 'static,
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
        ensure!(scene.canvas_size > 0, "cannot present an empty canvas");

        let metrics = CanvasMetrics::new(scene.canvas_size);
        let (window_width, window_height) = metrics.window_size();
        let mut config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut metrics = metrics;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let (cursor_x, cursor_y) = mouse_position();
                let frame_input = gather_frame_input(
                    &scene,
                    &metrics,
                    MacroquadVec2::new(cursor_x, cursor_y),
                    is_mouse_button_pressed(MouseButton::Left),
                    keyboard,
                );
                update_scene(frame_input, &mut scene);
                if scene.canvas_size != metrics.canvas_size {
                    metrics = CanvasMetrics::new(scene.canvas_size);
                }

                for layer in Layer::BACK_TO_FRONT {
                    draw_layer(&scene, layer, &metrics);
                }
                if let (Some(hovered), CursorHint::Pointer) = (&scene.hovered, scene.cursor) {
                    draw_hover(hovered, &metrics);
                }
                draw_status(&scene, &metrics);

                let frame = Duration::from_secs_f32(macroquad::time::get_frame_time().max(0.0));
                if let Some(per_second) = fps_counter.record_frame(frame) {
                    if show_fps {
                        info!("FPS: {per_second:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Placement of the canvas and status panel inside the window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct CanvasMetrics {
    canvas_size: u32,
    origin: MacroquadVec2,
}

impl CanvasMetrics {
    fn new(canvas_size: u32) -> Self {
        Self {
            canvas_size,
            origin: MacroquadVec2::new(CANVAS_MARGIN, CANVAS_MARGIN),
        }
    }

    fn extent(&self) -> f32 {
        self.canvas_size as f32
    }

    fn window_size(&self) -> (i32, i32) {
        let width = self.extent() + 2.0 * CANVAS_MARGIN + STATUS_PANEL_WIDTH;
        let height = self.extent() + 2.0 * CANVAS_MARGIN;
        (width.ceil() as i32, height.ceil() as i32)
    }

    /// Canvas-local position of a window coordinate.
    fn to_canvas(&self, screen: MacroquadVec2) -> DVec2 {
        DVec2::new(
            f64::from(screen.x - self.origin.x),
            f64::from(screen.y - self.origin.y),
        )
    }

    /// Window coordinate of a canvas-local position.
    fn to_screen(&self, point: DVec2) -> MacroquadVec2 {
        MacroquadVec2::new(
            self.origin.x + point.x as f32,
            self.origin.y + point.y as f32,
        )
    }

    fn to_screen_rect(&self, rect: &Rect) -> (MacroquadVec2, MacroquadVec2) {
        let origin = self.to_screen(rect.origin);
        let size = MacroquadVec2::new(rect.size.x as f32, rect.size.y as f32);
        (origin, size)
    }

    /// Baseline of the `line`-th status line.
    fn status_line_origin(&self, line: usize) -> MacroquadVec2 {
        MacroquadVec2::new(
            self.origin.x + self.extent() + CANVAS_MARGIN,
            self.origin.y + STATUS_FONT_SIZE + line as f32 * STATUS_LINE_HEIGHT,
        )
    }
}

/// Resolves the pointer through the scene's hit surface.
fn gather_frame_input(
    scene: &Scene,
    metrics: &CanvasMetrics,
    cursor: MacroquadVec2,
    click: bool,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    FrameInput {
        hovered: scene.hit_test(metrics.to_canvas(cursor)),
        click,
        wind_shortcut: wind_shortcut(keyboard.wind_digit),
    }
}

/// Tint laid over the whole canvas for a pointer affordance.
fn canvas_veil(cursor: CursorHint) -> Option<Color> {
    match cursor {
        CursorHint::Wait => Some(palette::EVALUATING_VEIL),
        CursorHint::Default | CursorHint::Pointer => None,
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

fn draw_quad(corners: &[DVec2; 4], fill: Color, metrics: &CanvasMetrics) {
    let [a, b, c, d] = corners.map(|corner| metrics.to_screen(corner));
    let fill = to_macroquad_color(fill);
    draw_triangle(a, b, c, fill);
    draw_triangle(a, c, d, fill);
}

fn draw_outline(corners: &[DVec2; 4], stroke: Color, width: f32, metrics: &CanvasMetrics) {
    let stroke = to_macroquad_color(stroke);
    for (index, corner) in corners.iter().enumerate() {
        let from = metrics.to_screen(*corner);
        let to = metrics.to_screen(corners[(index + 1) % corners.len()]);
        draw_line(from.x, from.y, to.x, to.y, width, stroke);
    }
}

fn draw_filled_rect(rect: &Rect, color: Color, metrics: &CanvasMetrics) {
    let (origin, size) = metrics.to_screen_rect(rect);
    draw_rectangle(origin.x, origin.y, size.x, size.y, to_macroquad_color(color));
}

fn draw_layer(scene: &Scene, layer: Layer, metrics: &CanvasMetrics) {
    match layer {
        Layer::Wakes => {
            for wake in &scene.wakes {
                draw_quad(wake.vertices(), palette::WAKE_FILL, metrics);
                draw_outline(
                    wake.vertices(),
                    palette::WAKE_STROKE,
                    palette::WAKE_STROKE_WIDTH,
                    metrics,
                );
            }
        }
        Layer::Turbines => {
            for glyph in &scene.turbines {
                draw_filled_rect(&glyph.tower, palette::TOWER, metrics);
                for blade in &glyph.blades {
                    draw_quad(blade, palette::BLADE_FILL, metrics);
                    draw_outline(
                        blade,
                        palette::BLADE_STROKE,
                        palette::BLADE_STROKE_WIDTH,
                        metrics,
                    );
                }
                let hub = metrics.to_screen(glyph.hub);
                draw_circle(
                    hub.x,
                    hub.y,
                    glyph.hub_radius as f32,
                    to_macroquad_color(palette::HUB),
                );
            }
        }
        Layer::GridLines => {
            let color = to_macroquad_color(palette::GRID_LINE);
            for line in &scene.grid_lines {
                let from = metrics.to_screen(line.from);
                let to = metrics.to_screen(line.to);
                draw_line(from.x, from.y, to.x, to.y, palette::GRID_LINE_WIDTH, color);
            }
        }
        Layer::Occupancy => {
            for highlight in &scene.occupancy {
                draw_filled_rect(&highlight.bounds, palette::OCCUPANCY, metrics);
            }
        }
        Layer::HitSurface => {
            if let Some(veil) = canvas_veil(scene.cursor) {
                draw_filled_rect(&scene.hit_surface.bounds(), veil, metrics);
            }
        }
    }
}

fn draw_hover(hovered: &CellHighlight, metrics: &CanvasMetrics) {
    let (origin, size) = metrics.to_screen_rect(&hovered.bounds);
    draw_rectangle_lines(
        origin.x,
        origin.y,
        size.x,
        size.y,
        HOVER_OUTLINE_WIDTH,
        to_macroquad_color(palette::HOVER),
    );
}

fn draw_status(scene: &Scene, metrics: &CanvasMetrics) {
    let text = to_macroquad_color(palette::TEXT);
    let mut lines = scene.status.lines();
    let failure_line = scene.status.last_failure.as_ref().map(|failure| {
        lines.push(format!("Last error: {failure}"));
        lines.len() - 1
    });

    for (index, line) in lines.iter().enumerate() {
        let color = if Some(index) == failure_line {
            to_macroquad_color(palette::ERROR_TEXT)
        } else {
            text
        };
        let origin = metrics.status_line_origin(index);
        let _ = macroquad::text::draw_text(line, origin.x, origin.y, STATUS_FONT_SIZE, color);
    }
}
