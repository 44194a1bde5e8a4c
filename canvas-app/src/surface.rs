//! `DrawingSurface` over a browser `CanvasRenderingContext2d`.

use std::f64::consts::TAU;

use canvas_core::{DrawingSurface, Point, Rect, SurfaceStyle, TextMeasurer};
use web_sys::CanvasRenderingContext2d;

/// A 2D context plus the ambient style last applied through it.
///
/// The context's own getters return `JsValue`s for fill/stroke styles,
/// so the applied style is tracked on the Rust side instead.
#[derive(Debug, Clone)]
pub struct WebSurface {
    ctx: CanvasRenderingContext2d,
    style: SurfaceStyle,
}

impl WebSurface {
    /// Wrap `ctx`, resetting it to the default canvas style.
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        let mut surface = Self {
            ctx,
            style: SurfaceStyle::default(),
        };
        let style = surface.style.clone();
        surface.set_style(&style);
        surface
    }

    /// The wrapped context.
    #[must_use]
    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }
}

impl DrawingSurface for WebSurface {
    fn style(&self) -> SurfaceStyle {
        self.style.clone()
    }

    fn set_style(&mut self, style: &SurfaceStyle) {
        self.ctx.set_fill_style_str(&style.fill_style);
        self.ctx.set_stroke_style_str(&style.stroke_style);
        self.ctx.set_line_width(style.line_width);
        self.ctx.set_font(&style.font);
        self.ctx.set_text_align(style.text_align.as_css());
        self.style = style.clone();
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
        self.style.font = font.to_string();
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, to: Point) {
        self.ctx.move_to(to.x, to.y);
    }

    fn line_to(&mut self, to: Point) {
        self.ctx.line_to(to.x, to.y);
    }

    fn quadratic_curve_to(&mut self, control: Point, to: Point) {
        self.ctx.quadratic_curve_to(control.x, control.y, to.x, to.y);
    }

    fn ellipse(&mut self, center: Point, radius: Point) {
        if let Err(err) = self
            .ctx
            .ellipse(center.x, center.y, radius.x, radius.y, 0.0, 0.0, TAU)
        {
            tracing::warn!(?err, "ellipse rejected by context");
        }
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, rect: &Rect) {
        self.ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn stroke_rect(&mut self, rect: &Rect) {
        self.ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn clear_rect(&mut self, rect: &Rect) {
        self.ctx.clear_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        if let Err(err) = self.ctx.fill_text(text, at.x, at.y) {
            tracing::warn!(?err, "fill_text rejected by context");
        }
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        measure(&self.ctx, text)
    }
}

fn measure(ctx: &CanvasRenderingContext2d, text: &str) -> f64 {
    ctx.measure_text(text).map_or_else(
        |err| {
            tracing::warn!(?err, "measure_text failed");
            0.0
        },
        |metrics| metrics.width(),
    )
}

/// Measures text with a context, leaving its font as it was.
#[derive(Debug, Clone)]
pub struct WebTextMeasurer {
    ctx: CanvasRenderingContext2d,
}

impl WebTextMeasurer {
    /// Measure with `ctx`.
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMeasurer for WebTextMeasurer {
    fn measure(&self, text: &str, font: &str) -> f64 {
        let previous = self.ctx.font();
        self.ctx.set_font(font);
        let width = measure(&self.ctx, text);
        self.ctx.set_font(&previous);
        width
    }
}
