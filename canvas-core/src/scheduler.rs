//! Frame scheduling and the self-rescheduling render loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::canvas::Html5Canvas;
use crate::surface::DrawingSurface;

/// Callback run at the next frame boundary.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Source of "run this before the next paint" callbacks.
pub trait FrameScheduler {
    /// Queue `callback` for the next frame.
    fn request_next_frame(&self, callback: FrameCallback);
}

/// Scheduler that queues callbacks until [`ManualScheduler::run_pending`]
/// is called. Useful for driving a [`RenderLoop`] in tests.
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<VecDeque<FrameCallback>>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl ManualScheduler {
    /// An empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run the callbacks queued so far (one frame). Callbacks queued while
    /// running wait for the next call. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let frame: Vec<FrameCallback> = self.pending.borrow_mut().drain(..).collect();
        let count = frame.len();
        for callback in frame {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_next_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push_back(callback);
    }
}

/// Drives [`Html5Canvas::render_frame`] once per frame until stopped.
///
/// Each tick renders if the canvas is dirty and then reschedules itself.
/// Render errors are logged and leave the dirty flag set, so the next
/// tick retries.
pub struct RenderLoop<S: DrawingSurface + 'static> {
    canvas: Rc<RefCell<Html5Canvas<S>>>,
    scheduler: Rc<dyn FrameScheduler>,
    running: Rc<Cell<bool>>,
}

impl<S: DrawingSurface + 'static> RenderLoop<S> {
    /// A stopped loop over `canvas`.
    pub fn new(canvas: Rc<RefCell<Html5Canvas<S>>>, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            canvas,
            scheduler,
            running: Rc::new(Cell::new(false)),
        }
    }

    /// The canvas being driven.
    #[must_use]
    pub fn canvas(&self) -> &Rc<RefCell<Html5Canvas<S>>> {
        &self.canvas
    }

    /// Whether ticks are being scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Start ticking. Starting a running loop does nothing.
    pub fn start(&self) {
        if self.running.replace(true) {
            return;
        }
        tracing::debug!("render loop started");
        schedule(
            Rc::clone(&self.canvas),
            Rc::clone(&self.scheduler),
            Rc::clone(&self.running),
        );
    }

    /// Stop after the currently scheduled tick, which becomes a no-op.
    pub fn stop(&self) {
        if self.running.replace(false) {
            tracing::debug!("render loop stopped");
        }
    }
}

impl<S: DrawingSurface + 'static> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.running.set(false);
    }
}

fn schedule<S: DrawingSurface + 'static>(
    canvas: Rc<RefCell<Html5Canvas<S>>>,
    scheduler: Rc<dyn FrameScheduler>,
    running: Rc<Cell<bool>>,
) {
    let next = Rc::clone(&scheduler);
    scheduler.request_next_frame(Box::new(move || {
        if !running.get() {
            return;
        }
        tick(&canvas);
        schedule(canvas, next, running);
    }));
}

fn tick<S: DrawingSurface>(canvas: &RefCell<Html5Canvas<S>>) {
    let Ok(mut canvas) = canvas.try_borrow_mut() else {
        tracing::trace!("canvas busy, frame skipped");
        return;
    };
    if let Err(err) = canvas.render_frame() {
        tracing::error!(%err, "render pass failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::element::CanvasElement;
    use crate::geometry::Rect;
    use crate::surface::RecordingSurface;

    fn setup() -> (Rc<RefCell<Html5Canvas<RecordingSurface>>>, Rc<ManualScheduler>) {
        let canvas = Html5Canvas::recording(CanvasConfig::default()).unwrap();
        (Rc::new(RefCell::new(canvas)), Rc::new(ManualScheduler::new()))
    }

    #[test]
    fn test_loop_renders_when_dirty_and_reschedules() {
        let (canvas, scheduler) = setup();
        let render_loop = RenderLoop::new(Rc::clone(&canvas), scheduler.clone());
        render_loop.start();
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.run_pending(), 1);
        assert!(!canvas.borrow().needs_redraw());
        assert_eq!(scheduler.pending(), 1);

        canvas
            .borrow_mut()
            .add_element(CanvasElement::rectangle("a", Rect::new(0.0, 0.0, 5.0, 5.0)).unwrap())
            .unwrap();
        assert!(canvas.borrow().needs_redraw());
        scheduler.run_pending();
        assert!(!canvas.borrow().needs_redraw());
    }

    #[test]
    fn test_stop_ends_rescheduling() {
        let (canvas, scheduler) = setup();
        let render_loop = RenderLoop::new(canvas, scheduler.clone());
        render_loop.start();
        render_loop.start();
        assert_eq!(scheduler.pending(), 1);

        render_loop.stop();
        assert!(!render_loop.is_running());
        scheduler.run_pending();
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_busy_canvas_skips_frame() {
        let (canvas, scheduler) = setup();
        let render_loop = RenderLoop::new(Rc::clone(&canvas), scheduler.clone());
        render_loop.start();
        {
            let _held = canvas.borrow_mut();
            scheduler.run_pending();
        }
        assert!(canvas.borrow().needs_redraw());
        assert_eq!(scheduler.pending(), 1);
    }
}
