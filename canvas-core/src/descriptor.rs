//! Serializable element descriptions, for hosts that build scenes from
//! JSON.
//!
//! ```json
//! {"id": "box", "type": "rectangle", "x": 10, "y": 10, "width": 40,
//!  "height": 20, "layer": 1, "style": {"fill_color": "#336699"}}
//! ```

use serde::{Deserialize, Serialize};

use crate::element::{CanvasElement, ElementId};
use crate::geometry::{Point, Rect};
use crate::style::{ElementStyle, TextAlign};
use crate::CanvasResult;

/// Style overrides; unset fields keep the element's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct StyleDescriptor {
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_variant: Option<String>,
    pub text_align: Option<TextAlign>,
    pub font: Option<String>,
}

impl StyleDescriptor {
    /// Copy every set field onto `style`.
    pub fn apply_to(&self, style: &mut ElementStyle) {
        if let Some(color) = &self.fill_color {
            style.set_fill_color(color.clone());
        }
        if self.stroke_color.is_some() {
            style.set_stroke_color(self.stroke_color.clone());
        }
        if let Some(width) = self.stroke_width {
            style.set_stroke_width(width);
        }
        if let Some(family) = &self.font_family {
            style.set_font_family(family.clone());
        }
        if let Some(size) = self.font_size {
            style.set_font_size(size);
        }
        if let Some(variant) = &self.font_variant {
            style.set_font_variant(variant.clone());
        }
        if let Some(align) = self.text_align {
            style.set_text_align(align);
        }
        if self.font.is_some() {
            style.set_font(self.font.clone());
        }
    }
}

/// Shape-specific fields, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ShapeDescriptor {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default)]
        border_radius: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
    },
    Circle {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
    },
    Path {
        points: Vec<Point>,
    },
    Group {
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        #[serde(default)]
        children: Vec<ElementDescriptor>,
    },
}

/// A complete element description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Element id.
    pub id: ElementId,
    /// Draw-order layer.
    #[serde(default)]
    pub layer: i32,
    /// Style overrides.
    #[serde(default)]
    pub style: StyleDescriptor,
    /// Geometry.
    #[serde(flatten)]
    pub shape: ShapeDescriptor,
}

impl ElementDescriptor {
    /// Parse a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CanvasError::Serialization`] for malformed input.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the element, validating its geometry. Group children are
    /// built recursively and placed relative to the group's `x`/`y`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CanvasError::InvalidGeometry`] for malformed
    /// shapes and [`crate::CanvasError::DuplicateElement`] for repeated
    /// child ids.
    pub fn into_element(self) -> CanvasResult<CanvasElement> {
        let element = match self.shape {
            ShapeDescriptor::Rectangle {
                x,
                y,
                width,
                height,
                border_radius,
            } => CanvasElement::rounded_rectangle(
                self.id,
                Rect::try_new(x, y, width, height)?,
                border_radius,
            )?,
            ShapeDescriptor::Text { x, y, content } => {
                CanvasElement::text(self.id, Point::new(x, y), content)
            }
            ShapeDescriptor::Circle { cx, cy, rx, ry } => {
                CanvasElement::circle(self.id, Point::new(cx, cy), Point::new(rx, ry))?
            }
            ShapeDescriptor::Path { points } => {
                let mut path = CanvasElement::path(self.id, Vec::new());
                for point in points {
                    path.add_point(point)?;
                }
                path
            }
            ShapeDescriptor::Group { x, y, children } => {
                let mut group = CanvasElement::group(self.id, Point::new(x, y));
                for child in children {
                    group.add_element(child.into_element()?)?;
                }
                group
            }
        };
        let style = self.style;
        Ok(element
            .with_layer(self.layer)
            .with_style(|s| style.apply_to(s)))
    }
}
