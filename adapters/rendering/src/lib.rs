#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Amida adapters.

use anyhow::Result as AnyResult;
use amida_core::{LineIndex, Rung, TracePoint};
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Whether the adapter detected a create-ladder press on this frame.
    pub create_requested: bool,
    /// Whether the adapter detected a start-run press on this frame.
    pub run_requested: bool,
    /// Whether the adapter detected a reset press on this frame.
    pub reset_requested: bool,
    /// Whether the adapter detected a move-selection-left press on this frame.
    pub select_left: bool,
    /// Whether the adapter detected a move-selection-right press on this frame.
    pub select_right: bool,
}

/// Describes the ladder board geometry and palette used by adapters.
///
/// Rails are centred inside equal-width slots, so `rail_x` of the first rail
/// sits half a slot from the left edge. A label band above the board carries
/// participant numbers and a matching band below carries outcome labels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LadderPresentation {
    /// Number of vertical rails drawn on the board.
    pub lines: u32,
    /// Number of interior rows between the top and bottom boundaries.
    pub levels: u32,
    /// Horizontal width of one rail slot in world units.
    pub rail_spacing: f32,
    /// Vertical distance between two levels in world units.
    pub level_spacing: f32,
    /// Height of each label band in world units.
    pub label_band: f32,
    /// Color used when drawing rails.
    pub rail_color: Color,
    /// Color used when drawing rungs.
    pub rung_color: Color,
    /// Color used when drawing the highlighted trace.
    pub trace_color: Color,
    /// Color used when drawing the descending marker.
    pub marker_color: Color,
}

impl LadderPresentation {
    /// Creates a new board descriptor.
    ///
    /// Returns an error when a spacing value is not strictly positive.
    #[allow(clippy::too_many_arguments)] // Board construction intentionally enumerates every channel explicitly.
    pub fn new(
        lines: u32,
        levels: u32,
        rail_spacing: f32,
        level_spacing: f32,
        label_band: f32,
        rail_color: Color,
        rung_color: Color,
        trace_color: Color,
        marker_color: Color,
    ) -> Result<Self, RenderingError> {
        if !rail_spacing.is_finite() || rail_spacing <= 0.0 {
            return Err(RenderingError::InvalidSpacing {
                value: rail_spacing,
            });
        }
        if !level_spacing.is_finite() || level_spacing <= 0.0 {
            return Err(RenderingError::InvalidSpacing {
                value: level_spacing,
            });
        }
        if !label_band.is_finite() || label_band < 0.0 {
            return Err(RenderingError::InvalidSpacing { value: label_band });
        }

        Ok(Self {
            lines,
            levels,
            rail_spacing,
            level_spacing,
            label_band,
            rail_color,
            rung_color,
            trace_color,
            marker_color,
        })
    }

    /// Total width of the board in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.lines as f32 * self.rail_spacing
    }

    /// Total height of the board including both label bands.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.levels as f32 * self.level_spacing + 2.0 * self.label_band
    }

    /// Horizontal centre of the provided rail's slot.
    #[must_use]
    pub fn rail_x(&self, line: LineIndex) -> f32 {
        (line.get() as f32 + 0.5) * self.rail_spacing
    }

    /// Vertical position of the provided level row.
    #[must_use]
    pub fn level_y(&self, level: u32) -> f32 {
        self.label_band + level as f32 * self.level_spacing
    }

    /// World-space position of a trace point.
    #[must_use]
    pub fn position(&self, point: TracePoint) -> Vec2 {
        Vec2::new(self.rail_x(point.line()), self.level_y(point.level().get()))
    }

    /// World-space endpoints of a rail from the top row to the bottom row.
    #[must_use]
    pub fn rail_segment(&self, line: LineIndex) -> (Vec2, Vec2) {
        let x = self.rail_x(line);
        (
            Vec2::new(x, self.level_y(0)),
            Vec2::new(x, self.level_y(self.levels)),
        )
    }

    /// World-space endpoints of a rung between its two rails.
    #[must_use]
    pub fn rung_segment(&self, rung: &Rung) -> (Vec2, Vec2) {
        let y = self.level_y(rung.level().get());
        (
            Vec2::new(self.rail_x(rung.left_line()), y),
            Vec2::new(self.rail_x(rung.right_line()), y),
        )
    }

    /// Anchor point for the participant number above a rail.
    #[must_use]
    pub fn top_label_anchor(&self, line: LineIndex) -> Vec2 {
        Vec2::new(self.rail_x(line), self.label_band * 0.5)
    }

    /// Anchor point for the outcome label below a rail.
    #[must_use]
    pub fn bottom_label_anchor(&self, line: LineIndex) -> Vec2 {
        Vec2::new(self.rail_x(line), self.height() - self.label_band * 0.5)
    }
}

/// Highlighted descent shown while a run animates or rests finished.
#[derive(Clone, Debug, PartialEq)]
pub struct RunPresentation {
    /// Positions visited by the token, in descent order.
    pub points: Vec<TracePoint>,
    /// Playback progress in `[0.0, 1.0]` driving the marker position.
    pub progress: f32,
}

impl RunPresentation {
    /// Creates a new run descriptor.
    #[must_use]
    pub fn new(points: Vec<TracePoint>, progress: f32) -> Self {
        Self { points, progress }
    }

    /// World-space polyline of the descent on the provided board.
    #[must_use]
    pub fn polyline(&self, ladder: &LadderPresentation) -> Vec<Vec2> {
        self.points
            .iter()
            .map(|point| ladder.position(*point))
            .collect()
    }
}

/// Scene description combining the board, its inhabitants and the banner.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board geometry and palette.
    pub ladder: LadderPresentation,
    /// Rungs currently drawn across the board.
    pub rungs: Vec<Rung>,
    /// Participant numbers displayed above the rails, left to right.
    pub top_labels: Vec<String>,
    /// Outcome labels displayed below the rails, left to right.
    pub bottom_labels: Vec<String>,
    /// Rail currently selected as the starting position, if any.
    pub selected_start: Option<LineIndex>,
    /// Highlighted descent, present while animating or finished.
    pub run: Option<RunPresentation>,
    /// Status text displayed beneath the board.
    pub banner: String,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    #[allow(clippy::too_many_arguments)] // Scene construction intentionally enumerates every channel explicitly.
    pub fn new(
        ladder: LadderPresentation,
        rungs: Vec<Rung>,
        top_labels: Vec<String>,
        bottom_labels: Vec<String>,
        selected_start: Option<LineIndex>,
        run: Option<RunPresentation>,
        banner: String,
    ) -> Self {
        Self {
            ladder,
            rungs,
            top_labels,
            bottom_labels,
            selected_start,
            run,
            banner,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Amida scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered, allowing the composition root to animate world
    /// snapshots deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Position along a polyline parameterised by travelled arc length.
///
/// `t` is clamped to `[0.0, 1.0]`; `0.0` rests on the first point and `1.0`
/// on the last. An empty polyline yields the origin, a single point yields
/// that point, and a zero-length polyline yields its first point.
#[must_use]
pub fn interpolate_along(points: &[Vec2], t: f32) -> Vec2 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec2::ZERO;
    };
    if points.len() == 1 {
        return *first;
    }

    let mut segment_lengths = Vec::with_capacity(points.len() - 1);
    let mut total = 0.0;
    for pair in points.windows(2) {
        let length = pair[1].distance(pair[0]);
        segment_lengths.push(length);
        total += length;
    }
    if total <= 0.0 {
        return *first;
    }

    let mut target = total * t.clamp(0.0, 1.0);
    for (index, length) in segment_lengths.iter().enumerate() {
        if target <= *length {
            let factor = if *length == 0.0 { 0.0 } else { target / length };
            return points[index] + (points[index + 1] - points[index]) * factor;
        }
        target -= length;
    }

    *last
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Spacing values must be positive to avoid a degenerate board.
    InvalidSpacing {
        /// Provided spacing that failed validation.
        value: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpacing { value } => {
                write!(f, "board spacing must be positive (received {value})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use amida_core::LevelIndex;

    fn board(lines: u32, levels: u32) -> LadderPresentation {
        LadderPresentation::new(
            lines,
            levels,
            40.0,
            20.0,
            30.0,
            Color::from_rgb_u8(200, 200, 200),
            Color::from_rgb_u8(128, 128, 128),
            Color::from_rgb_u8(220, 40, 40),
            Color::from_rgb_u8(220, 40, 220),
        )
        .expect("test board is valid")
    }

    #[test]
    fn board_creation_rejects_degenerate_spacing() {
        let error = LadderPresentation::new(
            4,
            20,
            0.0,
            20.0,
            30.0,
            Color::from_rgb_u8(0, 0, 0),
            Color::from_rgb_u8(0, 0, 0),
            Color::from_rgb_u8(0, 0, 0),
            Color::from_rgb_u8(0, 0, 0),
        )
        .expect_err("zero rail spacing must be rejected");
        assert_eq!(error, RenderingError::InvalidSpacing { value: 0.0 });
    }

    #[test]
    fn rails_are_centred_inside_their_slots() {
        let board = board(4, 20);
        assert_eq!(board.rail_x(LineIndex::new(0)), 20.0);
        assert_eq!(board.rail_x(LineIndex::new(3)), 140.0);
        assert_eq!(board.width(), 160.0);
    }

    #[test]
    fn levels_are_offset_by_the_label_band() {
        let board = board(4, 20);
        assert_eq!(board.level_y(0), 30.0);
        assert_eq!(board.level_y(20), 430.0);
        assert_eq!(board.height(), 460.0);
    }

    #[test]
    fn rail_segments_span_top_to_bottom_rows() {
        let board = board(3, 10);
        let (top, bottom) = board.rail_segment(LineIndex::new(1));
        assert_eq!(top, Vec2::new(60.0, 30.0));
        assert_eq!(bottom, Vec2::new(60.0, 230.0));
    }

    #[test]
    fn rung_segments_join_adjacent_rail_centres() {
        let board = board(3, 10);
        let rung = Rung::new(LevelIndex::new(4), LineIndex::new(0));
        let (left, right) = board.rung_segment(&rung);
        assert_eq!(left, Vec2::new(20.0, 110.0));
        assert_eq!(right, Vec2::new(60.0, 110.0));
    }

    #[test]
    fn label_anchors_sit_inside_their_bands() {
        let board = board(2, 5);
        assert_eq!(board.top_label_anchor(LineIndex::new(0)).y, 15.0);
        assert_eq!(board.bottom_label_anchor(LineIndex::new(0)).y, 145.0);
    }

    #[test]
    fn interpolation_rests_on_the_endpoints() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert_eq!(interpolate_along(&points, 0.0), points[0]);
        assert_eq!(interpolate_along(&points, 1.0), points[1]);
        assert_eq!(interpolate_along(&points, -0.5), points[0]);
        assert_eq!(interpolate_along(&points, 1.5), points[1]);
    }

    #[test]
    fn interpolation_walks_arc_length_not_point_count() {
        // Three points with unequal segment lengths: halfway through the
        // travelled distance lands inside the longer first segment.
        let points = [
            Vec2::new(0.0, 0.0),
            Vec2::new(40.0, 0.0),
            Vec2::new(40.0, 10.0),
        ];
        let halfway = interpolate_along(&points, 0.5);
        assert_eq!(halfway, Vec2::new(25.0, 0.0));
    }

    #[test]
    fn interpolation_handles_degenerate_polylines() {
        assert_eq!(interpolate_along(&[], 0.5), Vec2::ZERO);
        let single = [Vec2::new(3.0, 4.0)];
        assert_eq!(interpolate_along(&single, 0.7), single[0]);
        let collapsed = [Vec2::new(2.0, 2.0), Vec2::new(2.0, 2.0)];
        assert_eq!(interpolate_along(&collapsed, 0.9), collapsed[0]);
    }

    #[test]
    fn run_polyline_projects_points_onto_the_board() {
        let board = board(3, 2);
        let run = RunPresentation::new(
            vec![
                TracePoint::new(LineIndex::new(0), LevelIndex::new(0)),
                TracePoint::new(LineIndex::new(0), LevelIndex::new(1)),
                TracePoint::new(LineIndex::new(1), LevelIndex::new(1)),
            ],
            0.0,
        );
        assert_eq!(
            run.polyline(&board),
            vec![
                Vec2::new(20.0, 30.0),
                Vec2::new(20.0, 50.0),
                Vec2::new(60.0, 50.0),
            ],
        );
    }

    #[test]
    fn lighten_moves_channels_towards_white() {
        let color = Color::from_rgb_u8(0, 128, 255).lighten(0.5);
        assert!(color.red > 0.49 && color.red < 0.51);
        assert!(color.blue > 0.99);
        assert_eq!(color.alpha, 1.0);
    }

    #[test]
    fn scene_new_preserves_every_channel() {
        let board = board(2, 5);
        let rungs = vec![Rung::new(LevelIndex::new(2), LineIndex::new(0))];
        let scene = Scene::new(
            board,
            rungs.clone(),
            vec!["1".to_owned(), "2".to_owned()],
            vec!["-".to_owned(), "winner".to_owned()],
            Some(LineIndex::new(1)),
            None,
            "pick a rail".to_owned(),
        );
        assert_eq!(scene.ladder, board);
        assert_eq!(scene.rungs, rungs);
        assert_eq!(scene.selected_start, Some(LineIndex::new(1)));
        assert!(scene.run.is_none());
        assert_eq!(scene.banner, "pick a rail");
    }
}
