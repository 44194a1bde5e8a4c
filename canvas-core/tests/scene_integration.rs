//! Scene Graph Integration Tests
//!
//! Drives the public API end to end:
//! - Viewport projection and off-screen culling
//! - Group translation and path scaling
//! - Hit testing and listener-driven effects
//! - Render loop coalescing with a manual scheduler

use std::cell::RefCell;
use std::rc::Rc;

use canvas_core::{
    angle, distance, CanvasConfig, CanvasElement, CanvasError, DrawCommand, ElementDescriptor,
    ElementId, EventKind, Html5Canvas, ManualScheduler, Point, RecordingSurface, Rect,
    RenderLoop, Size, TransformDetails,
};

const EPS: f64 = 1e-9;

/// A 100×100 canvas showing absolute (0,0)–(100,100) at zoom 1.
fn unit_canvas() -> Html5Canvas<RecordingSurface> {
    Html5Canvas::recording(CanvasConfig {
        pixel_size: Size::new(100.0, 100.0),
        ..CanvasConfig::default()
    })
    .expect("valid config")
}

fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    CanvasElement::rectangle(id, Rect::new(x, y, w, h)).expect("valid rectangle")
}

// ============================================================================
// Viewport Tests
// ============================================================================

#[test]
fn test_rectangle_visible_at_identity_projection() {
    let mut canvas = unit_canvas();
    canvas.add_element(rect("r", 50.0, 50.0, 20.0, 20.0)).unwrap();
    canvas.render_frame().unwrap();

    let element = canvas.element(&ElementId::from("r")).unwrap();
    assert!(!element.is_off_screen());
    assert_eq!(*element.display_dimensions(), Rect::new(50.0, 50.0, 20.0, 20.0));
}

#[test]
fn test_pan_moves_content_off_screen() {
    let mut canvas = unit_canvas();
    canvas.add_element(rect("r", 50.0, 50.0, 20.0, 20.0)).unwrap();
    canvas.pan(Point::new(1000.0, 1000.0));
    canvas.render_frame().unwrap();

    assert!(canvas.layer(0).unwrap().is_off_screen());
    assert_eq!(canvas.main_surface().content_commands().count(), 0);

    // an off-screen layer leaves children stale; update one directly
    let view = *canvas.relative_view();
    let element = canvas.element_mut(&ElementId::from("r")).unwrap();
    element.update_dimensions(&view);
    assert!(element.is_off_screen());
}

#[test]
fn test_zoom_projects_display_dimensions() {
    let mut canvas = unit_canvas();
    canvas.add_element(rect("r", 50.0, 50.0, 20.0, 20.0)).unwrap();
    canvas.change_view(Rect::new(40.0, 40.0, 50.0, 50.0)).unwrap();
    canvas.render_frame().unwrap();

    let display = *canvas.element(&ElementId::from("r")).unwrap().display_dimensions();
    assert_eq!(display, Rect::new(20.0, 20.0, 40.0, 40.0));
}

#[test]
fn test_zoom_limits_hold() {
    let mut canvas = Html5Canvas::recording(CanvasConfig {
        min_zoom: Point::new(0.5, 0.5),
        max_zoom: Point::new(2.0, 2.0),
        ..CanvasConfig::default()
    })
    .unwrap();
    for _ in 0..50 {
        canvas.zoom(1);
    }
    assert!((canvas.zoom_factor().x - 2.0).abs() < EPS);
    for _ in 0..50 {
        canvas.zoom(-1);
    }
    assert!((canvas.zoom_factor().y - 0.5).abs() < EPS);
}

#[test]
fn test_config_errors_surface_at_construction() {
    let result = Html5Canvas::recording(CanvasConfig {
        pixel_size: Size::new(0.0, 10.0),
        ..CanvasConfig::default()
    });
    assert!(matches!(result, Err(CanvasError::InvalidConfig(_))));
}

// ============================================================================
// Group And Shape Tests
// ============================================================================

#[test]
fn test_group_translate_moves_children_and_reference() {
    let mut group = CanvasElement::group("g", Point::ORIGIN);
    group.add_element(rect("r", 0.0, 0.0, 10.0, 10.0)).unwrap();
    group.adjust_dimensions(Point::new(5.0, 5.0));

    let child = group.find(&ElementId::from("r")).unwrap();
    assert_eq!(*child.dimensions(), Rect::new(5.0, 5.0, 10.0, 10.0));
    assert_eq!(group.as_group().unwrap().reference(), Point::new(5.0, 5.0));
    assert_eq!(*group.dimensions(), Rect::new(5.0, 5.0, 10.0, 10.0));
}

#[test]
fn test_path_effect_scales_radially() {
    let vertices = vec![Point::new(0.0, 0.0), Point::new(6.0, 0.0), Point::new(0.0, 6.0)];
    let centroid = Point::new(2.0, 2.0);
    let mut parent = CanvasElement::group("g", Point::ORIGIN);
    parent
        .add_element(CanvasElement::path("tri", vertices.clone()))
        .unwrap();
    let effect_id = parent
        .transform_child(&ElementId::from("tri"), &TransformDetails::default().with_scale(2.0))
        .unwrap();

    let effect = parent.find(&effect_id).unwrap();
    let canvas_core::ElementKind::Path(path) = effect.kind() else {
        panic!("effect of a path is a path");
    };
    for (before, after) in vertices.iter().zip(path.points()) {
        let d0 = distance(centroid, *before);
        let d1 = distance(centroid, *after);
        assert!((d1 - 2.0 * d0).abs() < 1e-6, "distance {d0} -> {d1}");
        assert!((angle(centroid, *before) - angle(centroid, *after)).abs() < 1e-6);
    }

    // the source is untouched
    let source = parent.find(&ElementId::from("tri")).unwrap();
    assert_eq!(*source.dimensions(), Rect::new(0.0, 0.0, 6.0, 6.0));
}

#[test]
fn test_text_sized_from_measurement() {
    let mut canvas = unit_canvas();
    let label = CanvasElement::text("label", Point::new(10.0, 10.0), "hello")
        .with_style(|s| s.set_font_size(20.0));
    canvas.add_element(label).unwrap();

    let id = ElementId::from("label");
    // fixed advance: 5 chars × 20px × 0.5
    assert_eq!(
        *canvas.element(&id).unwrap().dimensions(),
        Rect::new(10.0, 10.0, 50.0, 20.0)
    );
    canvas
        .element_mut(&id)
        .unwrap()
        .update_style(|s| s.set_font_size(10.0));
    assert!((canvas.element(&id).unwrap().dimensions().w - 25.0).abs() < EPS);
}

#[test]
fn test_grouped_text_counts_towards_bounds_once_attached() {
    let mut canvas = unit_canvas();
    let mut group = CanvasElement::group("labels", Point::ORIGIN);
    let label = CanvasElement::text("label", Point::new(-30.0, 10.0), "abcdefghij")
        .with_style(|s| s.set_font_size(10.0));
    group.add_element(label).unwrap();
    canvas.add_element(group).unwrap();

    let text = Rect::new(-30.0, 10.0, 50.0, 10.0);
    assert_eq!(
        *canvas.element(&ElementId::from("label")).unwrap().dimensions(),
        text
    );
    assert_eq!(*canvas.element(&ElementId::from("labels")).unwrap().dimensions(), text);
    assert_eq!(canvas.absolute_dimensions(), Some(&text));

    canvas.render_frame().unwrap();
    assert!(canvas
        .main_surface()
        .content_commands()
        .any(|c| matches!(c, DrawCommand::FillText { text, .. } if text == "abcdefghij")));

    canvas
        .element_mut(&ElementId::from("label"))
        .unwrap()
        .update_style(|s| s.set_font_size(20.0));
    canvas.render_frame().unwrap();
    let grown = Rect::new(-30.0, 10.0, 100.0, 20.0);
    assert_eq!(*canvas.element(&ElementId::from("labels")).unwrap().dimensions(), grown);
    assert_eq!(canvas.absolute_dimensions(), Some(&grown));
}

#[test]
fn test_fit_to_tiny_content_respects_zoom_limits() {
    let mut canvas = unit_canvas();
    canvas.add_element(rect("dot", 0.0, 0.0, 1.0, 1.0)).unwrap();
    assert!(canvas.fit_to_content().unwrap());

    // 100px over a 1-unit box would be zoom 100; the limit is 10
    assert_eq!(canvas.zoom_factor(), Point::new(10.0, 10.0));
    assert_eq!(*canvas.relative_view(), Rect::new(-4.5, -4.5, 10.0, 10.0));

    canvas.zoom(1);
    assert!(canvas.zoom_factor().x >= 10.0 - EPS);
    canvas.zoom(-1);
    assert!(canvas.zoom_factor().x < 10.0);
}

// ============================================================================
// Event Routing Tests
// ============================================================================

#[test]
fn test_click_reaches_only_the_hit_rectangle() {
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let mut canvas = unit_canvas();
    for (id, x) in [("left", 0.0), ("right", 50.0)] {
        let mut element = rect(id, x, 0.0, 20.0, 20.0);
        let sink = Rc::clone(&clicks);
        element.add_event_listener(EventKind::Click, move |ctx| {
            sink.borrow_mut().push(ctx.target().clone());
        });
        canvas.add_element(element).unwrap();
    }
    canvas.render_frame().unwrap();

    let hits = canvas.click(Point::new(10.0, 10.0));
    assert_eq!(hits, vec![ElementId::from("left")]);
    assert_eq!(*clicks.borrow(), vec![ElementId::from("left")]);
}

#[test]
fn test_hover_highlight_lifecycle() {
    let mut canvas = unit_canvas();
    let mut button = rect("button", 10.0, 10.0, 30.0, 10.0);
    button.add_event_listener(EventKind::Hover, |ctx| {
        ctx.transform(TransformDetails::default().with_color("#ffcc00"));
    });
    canvas.add_element(button).unwrap();
    canvas.render_frame().unwrap();

    canvas.hover(Point::new(15.0, 15.0));
    let id = ElementId::from("button");
    let effect = canvas.element(&id).unwrap().effect_id().cloned().unwrap();
    assert!(canvas.element(&effect).unwrap().is_effect());

    canvas.render_frame().unwrap();
    assert!(canvas
        .effect_surface()
        .content_commands()
        .any(|c| matches!(c, DrawCommand::FillRect { style, .. } if style == "#ffcc00")));

    canvas.hover(Point::new(90.0, 90.0));
    assert!(canvas.element(&effect).is_none());
    assert!(!canvas.element(&id).unwrap().is_hover_target());
}

#[test]
fn test_hover_clears_after_layer_pans_away() {
    let mut canvas = unit_canvas();
    let mut button = rect("button", 10.0, 10.0, 30.0, 10.0);
    button.add_event_listener(EventKind::Hover, |ctx| {
        ctx.transform(TransformDetails::default().with_color("#ffcc00"));
    });
    canvas.add_element(button).unwrap();
    canvas.render_frame().unwrap();

    canvas.hover(Point::new(15.0, 15.0));
    let id = ElementId::from("button");
    let effect = canvas.element(&id).unwrap().effect_id().cloned().unwrap();

    canvas.pan(Point::new(1000.0, 1000.0));
    canvas.render_frame().unwrap();
    assert!(canvas.layer(0).unwrap().is_off_screen());
    canvas.hover(Point::new(90.0, 90.0));
    canvas.leave(Point::new(-1.0, -1.0));

    canvas.pan(Point::ORIGIN);
    canvas.render_frame().unwrap();
    let button = canvas.element(&id).unwrap();
    assert!(!button.is_hover_target());
    assert!(button.effect_id().is_none());
    assert!(canvas.element(&effect).is_none());
}

#[test]
fn test_listener_can_remove_its_element() {
    let mut canvas = unit_canvas();
    let mut doomed = rect("doomed", 0.0, 0.0, 10.0, 10.0);
    doomed.add_event_listener(EventKind::RightClick, |ctx| ctx.remove());
    canvas.add_element(doomed).unwrap();
    canvas.render_frame().unwrap();

    canvas.right_click(Point::new(5.0, 5.0));
    assert!(canvas.element(&ElementId::from("doomed")).is_none());
    assert!(canvas.needs_redraw());
}

#[test]
fn test_hit_testing_uses_display_space() {
    let mut canvas = unit_canvas();
    canvas.add_element(rect("r", 50.0, 50.0, 10.0, 10.0)).unwrap();
    canvas.change_view(Rect::new(50.0, 50.0, 50.0, 50.0)).unwrap();
    canvas.render_frame().unwrap();

    // absolute (55, 55) is not hit; its display position (10, 10) is
    assert!(canvas.click(Point::new(55.0, 55.0)).is_empty());
    assert_eq!(canvas.click(Point::new(10.0, 10.0)), vec![ElementId::from("r")]);
}

// ============================================================================
// Descriptor And Render Loop Tests
// ============================================================================

#[test]
fn test_descriptor_scene_renders() {
    let mut canvas = unit_canvas();
    let element = ElementDescriptor::from_json(
        r##"{"id": "badge", "type": "circle", "cx": 50, "cy": 50, "rx": 10, "ry": 10,
            "style": {"fill_color": "#00aa00", "stroke_color": "#003300"}}"##,
    )
    .unwrap()
    .into_element()
    .unwrap();
    canvas.add_element(element).unwrap();
    canvas.render_frame().unwrap();

    let commands: Vec<_> = canvas.main_surface().content_commands().cloned().collect();
    assert!(commands.contains(&DrawCommand::Ellipse {
        center: Point::new(50.0, 50.0),
        radius: Point::new(10.0, 10.0),
    }));
    assert!(commands.contains(&DrawCommand::Fill {
        style: "#00aa00".into()
    }));
    assert!(commands.iter().any(|c| matches!(c, DrawCommand::Stroke { style, .. } if style == "#003300")));
}

#[test]
fn test_render_loop_coalesces_mutations() {
    let canvas = Rc::new(RefCell::new(unit_canvas()));
    let scheduler = Rc::new(ManualScheduler::new());
    let render_loop = RenderLoop::new(Rc::clone(&canvas), scheduler.clone());
    render_loop.start();
    scheduler.run_pending();

    {
        let mut c = canvas.borrow_mut();
        c.add_element(rect("a", 0.0, 0.0, 10.0, 10.0)).unwrap();
        c.add_element(rect("b", 20.0, 0.0, 10.0, 10.0)).unwrap();
        c.pan(Point::new(-5.0, 0.0));
        c.main_surface_mut().take_commands();
    }
    scheduler.run_pending();
    let fills = canvas
        .borrow()
        .main_surface()
        .content_commands()
        .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
        .count();
    assert_eq!(fills, 2);

    canvas.borrow_mut().main_surface_mut().take_commands();
    scheduler.run_pending();
    assert!(canvas.borrow().main_surface().commands().is_empty());
    render_loop.stop();
}
