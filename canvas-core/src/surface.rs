//! The drawing surface contract consumed by the scene graph.
//!
//! Any immediate-mode 2D raster context satisfies [`DrawingSurface`]:
//! the browser binding wraps `CanvasRenderingContext2d`, tests use
//! [`RecordingSurface`].

use crate::geometry::{Point, Rect};
use crate::style::TextAlign;
use crate::{CanvasError, CanvasResult};

/// Ambient style of a surface: what the next fill/stroke/text call uses.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStyle {
    /// CSS colour used by fills.
    pub fill_style: String,
    /// CSS colour used by strokes.
    pub stroke_style: String,
    /// Stroke width in surface pixels.
    pub line_width: f64,
    /// CSS font shorthand.
    pub font: String,
    /// Horizontal text anchor.
    pub text_align: TextAlign,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        Self {
            fill_style: "#000000".to_string(),
            stroke_style: "#000000".to_string(),
            line_width: 1.0,
            font: "10px sans-serif".to_string(),
            text_align: TextAlign::Left,
        }
    }
}

/// A 2D immediate-mode drawing context.
pub trait DrawingSurface {
    /// Current ambient style.
    fn style(&self) -> SurfaceStyle;

    /// Replace the ambient style.
    fn set_style(&mut self, style: &SurfaceStyle);

    /// Replace only the font.
    fn set_font(&mut self, font: &str);

    /// Start a new path, discarding any current one.
    fn begin_path(&mut self);

    /// Start a sub-path at `to`.
    fn move_to(&mut self, to: Point);

    /// Straight segment to `to`.
    fn line_to(&mut self, to: Point);

    /// Quadratic Bézier segment.
    fn quadratic_curve_to(&mut self, control: Point, to: Point);

    /// Full ellipse around `center` with per-axis `radius`.
    fn ellipse(&mut self, center: Point, radius: Point);

    /// Close the current sub-path.
    fn close_path(&mut self);

    /// Fill the current path with the ambient fill style.
    fn fill(&mut self);

    /// Stroke the current path with the ambient stroke style.
    fn stroke(&mut self);

    /// Fill an axis-aligned rectangle.
    fn fill_rect(&mut self, rect: &Rect);

    /// Stroke an axis-aligned rectangle.
    fn stroke_rect(&mut self, rect: &Rect);

    /// Clear an axis-aligned rectangle to transparent.
    fn clear_rect(&mut self, rect: &Rect);

    /// Draw `text` with its baseline anchored at `at`.
    fn fill_text(&mut self, text: &str, at: Point);

    /// Advance width of `text` in the ambient font.
    fn measure_text(&mut self, text: &str) -> f64;
}

/// Text measurement outside of a draw pass (element sizing on attach).
pub trait TextMeasurer {
    /// Advance width of `text` when set in `font`.
    fn measure(&self, text: &str, font: &str) -> f64;
}

/// The main and effect surfaces a canvas draws into.
pub struct Surfaces<'a> {
    /// Surface for regular scene content.
    pub main: &'a mut dyn DrawingSurface,
    /// Surface layered above `main` for transient effect elements.
    pub effect: &'a mut dyn DrawingSurface,
}

/// Checked path writer over a surface.
///
/// Path primitives fail with [`CanvasError::NoActivePath`] until
/// [`Pen::begin_path`] has been called.
pub struct Pen<'a> {
    surface: &'a mut dyn DrawingSurface,
    path_open: bool,
}

impl<'a> Pen<'a> {
    /// Wrap a surface. No path is open initially.
    pub fn new(surface: &'a mut dyn DrawingSurface) -> Self {
        Self {
            surface,
            path_open: false,
        }
    }

    /// Whether a path has been begun.
    #[must_use]
    pub fn is_path_open(&self) -> bool {
        self.path_open
    }

    fn require_path(&self, operation: &'static str) -> CanvasResult<()> {
        if self.path_open {
            Ok(())
        } else {
            Err(CanvasError::NoActivePath(operation))
        }
    }

    /// Begin a new path.
    pub fn begin_path(&mut self) {
        self.surface.begin_path();
        self.path_open = true;
    }

    /// Move the pen without drawing.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn move_to(&mut self, to: Point) -> CanvasResult<()> {
        self.require_path("move_to")?;
        self.surface.move_to(to);
        Ok(())
    }

    /// Straight segment.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn line_to(&mut self, to: Point) -> CanvasResult<()> {
        self.require_path("line_to")?;
        self.surface.line_to(to);
        Ok(())
    }

    /// Quadratic curve segment.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn quadratic_curve_to(&mut self, control: Point, to: Point) -> CanvasResult<()> {
        self.require_path("quadratic_curve_to")?;
        self.surface.quadratic_curve_to(control, to);
        Ok(())
    }

    /// Full ellipse.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn ellipse(&mut self, center: Point, radius: Point) -> CanvasResult<()> {
        self.require_path("ellipse")?;
        self.surface.ellipse(center, radius);
        Ok(())
    }

    /// Close the current sub-path.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn close_path(&mut self) -> CanvasResult<()> {
        self.require_path("close_path")?;
        self.surface.close_path();
        Ok(())
    }

    /// Fill the current path.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn fill(&mut self) -> CanvasResult<()> {
        self.require_path("fill")?;
        self.surface.fill();
        Ok(())
    }

    /// Stroke the current path.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::NoActivePath`] without a begun path.
    pub fn stroke(&mut self) -> CanvasResult<()> {
        self.require_path("stroke")?;
        self.surface.stroke();
        Ok(())
    }

    /// Fill a rectangle (no path needed).
    pub fn fill_rect(&mut self, rect: &Rect) {
        self.surface.fill_rect(rect);
    }

    /// Stroke a rectangle (no path needed).
    pub fn stroke_rect(&mut self, rect: &Rect) {
        self.surface.stroke_rect(rect);
    }

    /// Replace the font for subsequent text calls.
    pub fn set_font(&mut self, font: &str) {
        self.surface.set_font(font);
    }

    /// Draw text at a baseline point.
    pub fn fill_text(&mut self, text: &str, at: Point) {
        self.surface.fill_text(text, at);
    }
}

/// Pixel size parsed from a CSS font shorthand such as `"bold 12px Arial"`.
#[must_use]
pub fn font_pixel_size(font: &str) -> Option<f64> {
    font.split_whitespace()
        .find_map(|token| token.strip_suffix("px")?.parse::<f64>().ok())
}

/// Measures every glyph as a fixed fraction of the font's pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    /// Advance per character, as a fraction of the font size.
    pub advance_ratio: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self { advance_ratio: 0.5 }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font: &str) -> f64 {
        let size = font_pixel_size(font).unwrap_or(10.0);
        text.chars().count() as f64 * size * self.advance_ratio
    }
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DrawCommand {
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    QuadraticCurveTo { control: Point, to: Point },
    Ellipse { center: Point, radius: Point },
    ClosePath,
    Fill { style: String },
    Stroke { style: String, line_width: f64 },
    FillRect { rect: Rect, style: String },
    StrokeRect { rect: Rect, style: String },
    ClearRect(Rect),
    FillText { text: String, at: Point, font: String, align: TextAlign },
}

/// In-memory surface that records every call, for tests and headless use.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    style: SurfaceStyle,
    commands: Vec<DrawCommand>,
    measurer: FixedAdvanceMeasurer,
}

impl RecordingSurface {
    /// Create an empty recording with default canvas style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recording.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded calls excluding `ClearRect`, i.e. actual content.
    pub fn content_commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| !matches!(c, DrawCommand::ClearRect(_)))
    }
}

impl DrawingSurface for RecordingSurface {
    fn style(&self) -> SurfaceStyle {
        self.style.clone()
    }

    fn set_style(&mut self, style: &SurfaceStyle) {
        self.style = style.clone();
    }

    fn set_font(&mut self, font: &str) {
        self.style.font = font.to_string();
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, to: Point) {
        self.commands.push(DrawCommand::MoveTo(to));
    }

    fn line_to(&mut self, to: Point) {
        self.commands.push(DrawCommand::LineTo(to));
    }

    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        self.commands
            .push(DrawCommand::QuadraticCurveTo { control, to });
    }

    fn ellipse(&mut self, center: Point, radius: Point) {
        self.commands.push(DrawCommand::Ellipse { center, radius });
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill {
            style: self.style.fill_style.clone(),
        });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke {
            style: self.style.stroke_style.clone(),
            line_width: self.style.line_width,
        });
    }

    fn fill_rect(&mut self, rect: &Rect) {
        self.commands.push(DrawCommand::FillRect {
            rect: *rect,
            style: self.style.fill_style.clone(),
        });
    }

    fn stroke_rect(&mut self, rect: &Rect) {
        self.commands.push(DrawCommand::StrokeRect {
            rect: *rect,
            style: self.style.stroke_style.clone(),
        });
    }

    fn clear_rect(&mut self, rect: &Rect) {
        self.commands.push(DrawCommand::ClearRect(*rect));
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            at,
            font: self.style.font.clone(),
            align: self.style.text_align,
        });
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.measurer.measure(text, &self.style.font)
    }
}
