//! # Canvas WASM Binding
//!
//! Runs the `canvas-core` scene graph in a browser: two stacked
//! `<canvas>` elements (main content below, effects above), drawn
//! through `CanvasRenderingContext2d` and redrawn on
//! `requestAnimationFrame` whenever the scene is dirty.
//!
//! ## Usage
//!
//! Build for WASM:
//! ```bash
//! wasm-pack build --target web canvas-app
//! ```
//!
//! Then import in JavaScript:
//! ```javascript
//! import init, { WasmCanvas } from './pkg/canvas_app.js';
//!
//! await init();
//! const canvas = new WasmCanvas('main-canvas', 'effect-canvas');
//! canvas.addElement(JSON.stringify({
//!     id: 'box', type: 'rectangle', x: 10, y: 10, width: 40, height: 20,
//!     style: { fill_color: '#336699' },
//! }));
//! canvas.start();
//!
//! // pointer positions are element-local (offsetX / offsetY)
//! el.addEventListener('click', (e) => canvas.click(e.offsetX, e.offsetY));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod scheduler;
pub mod surface;

use std::{cell::RefCell, rc::Rc};

use canvas_core::{
    CanvasConfig, CanvasError, ElementDescriptor, ElementId, Html5Canvas, Point, Rect,
    RenderLoop, Size,
};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

pub use scheduler::AnimationFrameScheduler;
pub use surface::{WebSurface, WebTextMeasurer};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init_wasm() {
    console_error_panic_hook::set_once();
    tracing::info!("canvas WASM binding initialized");
}

fn to_js(err: CanvasError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn ids(hits: Vec<ElementId>) -> Vec<String> {
    hits.into_iter().map(|id| id.as_str().to_string()).collect()
}

fn find_canvas(
    document: &Document,
    canvas_id: &str,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("Canvas element '{canvas_id}' not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("Element is not a canvas"))?;

    let ctx = canvas
        .get_context("2d")
        .map_err(|_| JsValue::from_str("Failed to get 2D context"))?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| JsValue::from_str("Failed to cast to 2D context"))?;

    Ok((canvas, ctx))
}

fn client_bounds(canvas: &HtmlCanvasElement) -> Rect {
    let rect = canvas.get_bounding_client_rect();
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

/// The scene graph bound to a main and an effect `<canvas>`.
#[wasm_bindgen]
pub struct WasmCanvas {
    canvas: Rc<RefCell<Html5Canvas<WebSurface>>>,
    render_loop: RenderLoop<WebSurface>,
    element: HtmlCanvasElement,
    effect_element: HtmlCanvasElement,
}

#[wasm_bindgen]
impl WasmCanvas {
    /// Bind to the `<canvas>` elements with ids `main_id` and
    /// `effect_id`.
    ///
    /// `config_json` is an optional JSON `CanvasConfig`; without it the
    /// backing size is taken from the main element's `width`/`height`.
    /// Unless configured, the surface bounds follow the element's
    /// on-page rectangle.
    ///
    /// # Errors
    ///
    /// Returns an error if either element is missing, is not a canvas,
    /// or the configuration is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(
        main_id: &str,
        effect_id: &str,
        config_json: Option<String>,
    ) -> Result<WasmCanvas, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object"))?;

        let (element, main_ctx) = find_canvas(&document, main_id)?;
        let (effect_element, effect_ctx) = find_canvas(&document, effect_id)?;

        let mut config = match config_json {
            Some(json) => CanvasConfig::from_json(&json).map_err(to_js)?,
            None => CanvasConfig {
                pixel_size: Size::new(f64::from(element.width()), f64::from(element.height())),
                ..CanvasConfig::default()
            },
        };
        if config.surface_bounds.is_none() {
            let bounds = client_bounds(&element);
            if bounds.size().is_positive() {
                config.surface_bounds = Some(bounds);
            }
        }
        size_backing_store(&element, config.pixel_size);
        size_backing_store(&effect_element, config.pixel_size);

        let measurer = Rc::new(WebTextMeasurer::new(main_ctx.clone()));
        let canvas = Html5Canvas::new(
            WebSurface::new(main_ctx),
            WebSurface::new(effect_ctx),
            config,
            measurer,
        )
        .map_err(to_js)?;
        let canvas = Rc::new(RefCell::new(canvas));
        let render_loop = RenderLoop::new(
            Rc::clone(&canvas),
            Rc::new(AnimationFrameScheduler::new(window)),
        );

        tracing::info!(main = main_id, effect = effect_id, "canvas bound");
        Ok(Self {
            canvas,
            render_loop,
            element,
            effect_element,
        })
    }

    /// Add an element from a JSON descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, invalid geometry or a
    /// duplicate id.
    #[wasm_bindgen(js_name = addElement)]
    pub fn add_element(&self, json: &str) -> Result<(), JsValue> {
        let element = ElementDescriptor::from_json(json)
            .and_then(ElementDescriptor::into_element)
            .map_err(to_js)?;
        self.canvas.borrow_mut().add_element(element).map_err(to_js)
    }

    /// Remove an element. Returns `false` for unknown ids.
    #[wasm_bindgen(js_name = removeElement)]
    pub fn remove_element(&self, id: &str) -> bool {
        self.canvas.borrow_mut().remove_element(&ElementId::from(id))
    }

    /// Move the view origin to absolute `(x, y)`.
    pub fn pan(&self, x: f64, y: f64) {
        self.canvas.borrow_mut().pan(Point::new(x, y));
    }

    /// Zoom in (`direction > 0`) or out (`direction < 0`).
    pub fn zoom(&self, direction: i32) {
        self.canvas.borrow_mut().zoom(direction);
    }

    /// Show the absolute rectangle `(x, y, width, height)`.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive size.
    #[wasm_bindgen(js_name = changeView)]
    pub fn change_view(&self, x: f64, y: f64, width: f64, height: f64) -> Result<(), JsValue> {
        self.canvas
            .borrow_mut()
            .change_view(Rect::new(x, y, width, height))
            .map_err(to_js)
    }

    /// Frame all content. Returns `false` while empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the content envelope is degenerate.
    #[wasm_bindgen(js_name = fitToContent)]
    pub fn fit_to_content(&self) -> Result<bool, JsValue> {
        self.canvas.borrow_mut().fit_to_content().map_err(to_js)
    }

    /// Start a drag gesture.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f64, y: f64) {
        self.canvas.borrow_mut().begin_drag(Point::new(x, y));
    }

    /// Pan while dragging, otherwise hover. Returns the ids hovered.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64) -> Vec<String> {
        let mut canvas = self.canvas.borrow_mut();
        let point = Point::new(x, y);
        if canvas.drag_to(point) {
            return Vec::new();
        }
        ids(canvas.hover(point))
    }

    /// End a drag gesture.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self) -> bool {
        self.canvas.borrow_mut().end_drag()
    }

    /// Pointer left the surface.
    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self, x: f64, y: f64) -> Vec<String> {
        let mut canvas = self.canvas.borrow_mut();
        canvas.end_drag();
        ids(canvas.leave(Point::new(x, y)))
    }

    /// Click. Returns the ids hit.
    pub fn click(&self, x: f64, y: f64) -> Vec<String> {
        ids(self.canvas.borrow_mut().click(Point::new(x, y)))
    }

    /// Secondary click. Returns the ids hit.
    #[wasm_bindgen(js_name = rightClick)]
    pub fn right_click(&self, x: f64, y: f64) -> Vec<String> {
        ids(self.canvas.borrow_mut().right_click(Point::new(x, y)))
    }

    /// Double click. Returns the ids hit.
    #[wasm_bindgen(js_name = doubleClick)]
    pub fn double_click(&self, x: f64, y: f64) -> Vec<String> {
        ids(self.canvas.borrow_mut().double_click(Point::new(x, y)))
    }

    /// Mouse wheel: negative `delta_y` zooms in.
    pub fn wheel(&self, delta_y: f64) {
        self.canvas.borrow_mut().wheel(delta_y);
    }

    /// Deliver a key to the focused element.
    #[wasm_bindgen(js_name = keyPress)]
    pub fn key_press(&self, key: &str) -> Vec<String> {
        ids(self.canvas.borrow_mut().key_press(key))
    }

    /// Re-read the main element's on-page rectangle after layout changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the element currently has no size.
    #[wasm_bindgen(js_name = syncBounds)]
    pub fn sync_bounds(&self) -> Result<(), JsValue> {
        self.canvas
            .borrow_mut()
            .set_surface_bounds(client_bounds(&self.element))
            .map_err(to_js)
    }

    /// Change the backing-store size of both canvases.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive size.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), JsValue> {
        let size = Size::new(f64::from(width), f64::from(height));
        self.canvas.borrow_mut().resize(size).map_err(to_js)?;
        size_backing_store(&self.element, size);
        size_backing_store(&self.effect_element, size);
        Ok(())
    }

    /// Physical point → relative `[x, y]`.
    #[wasm_bindgen(js_name = physicalToRelative)]
    pub fn physical_to_relative(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self
            .canvas
            .borrow()
            .convert_physical_point_to_relative_point(Point::new(x, y));
        vec![p.x, p.y]
    }

    /// Relative point → physical `[x, y]`.
    #[wasm_bindgen(js_name = relativeToPhysical)]
    pub fn relative_to_physical(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self
            .canvas
            .borrow()
            .convert_relative_point_to_physical_point(Point::new(x, y));
        vec![p.x, p.y]
    }

    /// Absolute point → relative `[x, y]`.
    #[wasm_bindgen(js_name = absoluteToRelative)]
    pub fn absolute_to_relative(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self
            .canvas
            .borrow()
            .convert_absolute_point_to_relative_point(Point::new(x, y));
        vec![p.x, p.y]
    }

    /// Relative point → absolute `[x, y]`.
    #[wasm_bindgen(js_name = relativeToAbsolute)]
    pub fn relative_to_absolute(&self, x: f64, y: f64) -> Vec<f64> {
        let p = self
            .canvas
            .borrow()
            .convert_relative_point_to_absolute_point(Point::new(x, y));
        vec![p.x, p.y]
    }

    /// Current zoom as `[x, y]`.
    #[wasm_bindgen(js_name = zoomFactor)]
    pub fn zoom_factor(&self) -> Vec<f64> {
        let zoom = self.canvas.borrow().zoom_factor();
        vec![zoom.x, zoom.y]
    }

    /// Visible absolute window as `[x, y, width, height]`.
    #[wasm_bindgen(js_name = viewRect)]
    pub fn view_rect(&self) -> Vec<f64> {
        let view = *self.canvas.borrow().relative_view();
        vec![view.x, view.y, view.w, view.h]
    }

    /// Render immediately if dirty. Returns whether a pass ran.
    ///
    /// # Errors
    ///
    /// Returns drawing errors from elements.
    #[wasm_bindgen(js_name = renderNow)]
    pub fn render_now(&self) -> Result<bool, JsValue> {
        self.canvas.borrow_mut().render_frame().map_err(to_js)
    }

    /// Start the `requestAnimationFrame` render loop.
    pub fn start(&self) {
        self.render_loop.start();
    }

    /// Stop the render loop.
    pub fn stop(&self) {
        self.render_loop.stop();
    }

    /// Whether the render loop is running.
    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.render_loop.is_running()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn size_backing_store(canvas: &HtmlCanvasElement, size: Size) {
    canvas.set_width(size.width.round() as u32);
    canvas.set_height(size.height.round() as u32);
}
