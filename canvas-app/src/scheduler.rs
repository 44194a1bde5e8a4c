//! `FrameScheduler` backed by `window.requestAnimationFrame`.

use canvas_core::scheduler::{FrameCallback, FrameScheduler};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Window;

/// Runs frame callbacks before the browser's next repaint.
#[derive(Debug, Clone)]
pub struct AnimationFrameScheduler {
    window: Window,
}

impl AnimationFrameScheduler {
    /// Schedule against `window`.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_next_frame(&self, callback: FrameCallback) {
        let closure = Closure::once_into_js(callback);
        let callback: &js_sys::Function = closure.unchecked_ref();
        if let Err(err) = self.window.request_animation_frame(callback) {
            tracing::error!(?err, "requestAnimationFrame failed; render loop halted");
        }
    }
}
