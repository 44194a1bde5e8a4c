//! # Canvas Core
//!
//! Retained-mode scene graph for 2D immediate-mode drawing surfaces.
//! Pure Rust with no browser dependency; `canvas-app` binds it to
//! `CanvasRenderingContext2d`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                Html5Canvas                  │
//! │  viewport (pan / zoom)  │  render loop      │
//! │  coordinate spaces      │  focus, drag      │
//! ├─────────────────────────────────────────────┤
//! │  layer 0 group  │  layer 1 group  │  ...    │
//! ├─────────────────────────────────────────────┤
//! │  CanvasElement: Rectangle Text Circle Path  │
//! │                 Group (nested children)     │
//! ├─────────────────────────────────────────────┤
//! │  ElementStyle   │  DrawingSurface / Pen     │
//! │  geometry       │  events & listeners       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use canvas_core::{CanvasConfig, CanvasElement, Html5Canvas, Point, Rect};
//!
//! let mut canvas = Html5Canvas::recording(CanvasConfig::default()).unwrap();
//! let square = CanvasElement::rectangle("square", Rect::new(50.0, 50.0, 20.0, 20.0))
//!     .unwrap()
//!     .with_style(|s| s.set_fill_color("#336699"));
//! canvas.add_element(square).unwrap();
//! canvas.zoom(1);
//! assert!(canvas.render_frame().unwrap());
//! assert!(canvas.hover(Point::new(60.0, 60.0)).len() <= 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod canvas;
pub mod config;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod group;
pub mod scheduler;
pub mod style;
pub mod surface;
pub mod viewport;

pub use canvas::Html5Canvas;
pub use config::CanvasConfig;
pub use descriptor::{ElementDescriptor, ShapeDescriptor, StyleDescriptor};
pub use element::{
    CanvasElement, CanvasLink, CircleShape, ElementId, ElementKind, ElementType, PathShape,
    RectangleShape, Shape, TextShape, TransformDetails,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{CanvasEvent, EventAction, EventContext, EventKind, EventOutcome};
pub use geometry::{
    angle, distance, intersection, point_in_rect, rect_contains, rects_overlap, Extrema, Point,
    Rect, Size,
};
pub use group::CanvasGroup;
pub use scheduler::{FrameScheduler, ManualScheduler, RenderLoop};
pub use style::{ElementStyle, FillStyle, StyleListenerId, StyleProperty, TextAlign};
pub use surface::{
    DrawCommand, DrawingSurface, FixedAdvanceMeasurer, Pen, RecordingSurface, SurfaceStyle,
    Surfaces, TextMeasurer,
};
pub use viewport::Projection;

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
