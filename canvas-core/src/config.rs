//! Canvas configuration.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};
use crate::{CanvasError, CanvasResult};

/// Size, placement and zoom limits of a canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Backing-store size of the drawing surfaces, in pixels.
    pub pixel_size: Size,
    /// Position and displayed size of the surface on the host document.
    /// Defaults to the pixel size at the origin.
    pub surface_bounds: Option<Rect>,
    /// Absolute-space rectangle shown initially. Defaults to the pixel
    /// size at the origin (zoom 1).
    pub initial_view: Option<Rect>,
    /// Lower zoom bound, per axis.
    pub min_zoom: Point,
    /// Upper zoom bound, per axis.
    pub max_zoom: Point,
    /// Fraction of the current zoom added or removed per zoom step.
    pub zoom_rate: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            pixel_size: Size::new(800.0, 600.0),
            surface_bounds: None,
            initial_view: None,
            min_zoom: Point::new(0.1, 0.1),
            max_zoom: Point::new(10.0, 10.0),
            zoom_rate: 0.1,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`] for malformed JSON and
    /// [`CanvasError::InvalidConfig`] when validation fails.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check sizes are positive and zoom limits are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> CanvasResult<()> {
        if !self.pixel_size.is_positive() {
            return Err(invalid("pixel_size must be positive"));
        }
        if let Some(bounds) = &self.surface_bounds {
            if !bounds.size().is_positive() || !bounds.origin().is_finite() {
                return Err(invalid("surface_bounds must have a positive size"));
            }
        }
        if let Some(view) = &self.initial_view {
            if !view.size().is_positive() || !view.origin().is_finite() {
                return Err(invalid("initial_view must have a positive size"));
            }
        }
        let positive = |p: Point| p.is_finite() && p.x > 0.0 && p.y > 0.0;
        if !positive(self.min_zoom) || !positive(self.max_zoom) {
            return Err(invalid("zoom limits must be positive"));
        }
        if self.min_zoom.x > self.max_zoom.x || self.min_zoom.y > self.max_zoom.y {
            return Err(invalid("min_zoom must not exceed max_zoom"));
        }
        if !self.zoom_rate.is_finite() || self.zoom_rate <= 0.0 {
            return Err(invalid("zoom_rate must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> CanvasError {
    CanvasError::InvalidConfig(reason.to_string())
}
