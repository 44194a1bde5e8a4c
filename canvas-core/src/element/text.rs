use crate::element::Shape;
use crate::geometry::{Point, Rect};
use crate::style::{ElementStyle, TextAlign};
use crate::surface::Pen;
use crate::viewport::Projection;
use crate::CanvasResult;

/// Single-line text label.
///
/// The element box is `measured width × scale` wide and
/// `font size × scale` tall; glyphs sit on the box's bottom edge.
///
/// Glyphs are drawn at the smaller of the two zoom factors, so under
/// non-uniform zoom they stay inside the projected box instead of
/// stretching to its height.
#[derive(Debug, Clone, PartialEq)]
pub struct TextShape {
    content: String,
    scale: f64,
    // display font size as a fraction of the display box height
    glyph_ratio: f64,
}

impl TextShape {
    /// New label at scale 1.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            scale: 1.0,
            glyph_ratio: 1.0,
        }
    }

    /// The label text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Accumulated effect scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Line breaking is not supported; labels always render on one line.
    #[must_use]
    pub fn flow_lines(&self, _max_width: f64) -> Option<Vec<String>> {
        None
    }
}

impl Shape for TextShape {
    fn on_draw(&self, display: &Rect, style: &ElementStyle, pen: &mut Pen<'_>) -> CanvasResult<()> {
        if let Some(fill) = style.fill().filter(|f| f.solid_color().is_none()) {
            tracing::debug!(?fill, "unsupported fill style skipped");
            return Ok(());
        }
        pen.set_font(&style.font_string_at(display.h * self.glyph_ratio));
        let x = match style.text_align() {
            TextAlign::Left => display.x,
            TextAlign::Center => display.center().x,
            TextAlign::Right => display.right(),
        };
        pen.fill_text(&self.content, Point::new(x, display.bottom()));
        Ok(())
    }

    fn clone_for_effect(&self) -> Self {
        self.clone()
    }

    fn scale(&mut self, dimensions: &Rect, factor: f64) -> Rect {
        self.scale *= factor;
        dimensions.scale_about_center(factor)
    }

    fn project(&mut self, projection: &Projection) {
        let zoom = projection.zoom;
        self.glyph_ratio = if zoom.y > 0.0 {
            (zoom.x / zoom.y).min(1.0)
        } else {
            1.0
        };
    }
}
