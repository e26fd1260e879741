use std::path::Path;

use cellview::render::RenderLog;
use cellview::scene::{Scene, load_scene};
use cellview::stencil::Stencil;
use cellview::{CellId, Geometry, GraphModel, GraphView, Point, Rect};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn assert_point(actual: Point, x: f64, y: f64, what: &str) {
    assert!(
        close(actual.x, x) && close(actual.y, y),
        "{what}: expected ({x}, {y}), got ({}, {})",
        actual.x,
        actual.y
    );
}

fn assert_rect(actual: Rect, expected: Rect, what: &str) {
    assert!(
        close(actual.x, expected.x)
            && close(actual.y, expected.y)
            && close(actual.width, expected.width)
            && close(actual.height, expected.height),
        "{what}: expected {expected:?}, got {actual:?}"
    );
}

fn fixture(name: &str) -> Scene {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_scene(&path).expect("fixture load failed")
}

fn points(view: &GraphView<impl cellview::render::RenderListener>, cell: CellId) -> Vec<Point> {
    view.state(cell)
        .map(|s| s.absolute_points.clone())
        .unwrap_or_default()
}

fn apply(view: &mut GraphView<impl cellview::render::RenderListener>, model: &mut GraphModel) {
    let changes = model.take_changes();
    view.apply_changes(model, &changes);
    view.validate(model, None);
}

/// A source vertex and a target vertex joined by an edge with `edge_style`.
fn connected(
    source: (Geometry, Option<&str>),
    target: (Geometry, Option<&str>),
    edge_style: Option<&str>,
) -> (GraphModel, CellId, CellId, CellId) {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let s = model.add_vertex(parent, None, source.0, source.1).unwrap();
    let t = model.add_vertex(parent, None, target.0, target.1).unwrap();
    let e = model.add_edge(parent, None, Some(s), Some(t), edge_style).unwrap();
    model.take_changes();
    (model, s, t, e)
}

fn two_boxes() -> (GraphModel, CellId, CellId, CellId) {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let v1 = model
        .add_vertex(parent, Some("v1"), Geometry::new(0.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let v2 = model
        .add_vertex(parent, Some("v2"), Geometry::new(200.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let e = model.add_edge(parent, None, Some(v1), Some(v2), None).unwrap();
    model.take_changes();
    (model, v1, v2, e)
}

#[test]
fn validate_all_fixtures() {
    for name in ["basic.json5", "nested.json5", "routing.json5"] {
        let scene = fixture(name);
        let mut view = GraphView::new();
        view.validate(&scene.model, None);

        for state in view.states().iter() {
            assert!(!state.invalid, "{name}: {} left invalid", state.cell);
            if state.is_edge() {
                assert!(
                    state.absolute_points.len() >= 2,
                    "{name}: edge {} has {} points",
                    state.cell,
                    state.absolute_points.len()
                );
                assert_eq!(state.segments.len() + 1, state.absolute_points.len());
            }
            // Every state's parent is cached too.
            if let Some(parent) = scene.model.parent(state.cell) {
                assert!(view.state(parent).is_some(), "{name}: orphan state {}", state.cell);
            }
        }
    }
}

#[test]
fn scenario_two_boxes_connect_on_facing_sides() {
    let scene = fixture("basic.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);

    let e1 = scene.cell("e1").unwrap();
    let pts = points(&view, e1);
    assert_eq!(pts.len(), 2);
    assert_point(pts[0], 80.0, 20.0, "source end");
    assert_point(pts[1], 200.0, 20.0, "target end");

    let state = view.state(e1).unwrap();
    assert!(close(state.length, 120.0));
    assert_point(state.label_anchor(), 140.0, 20.0, "edge label anchor");
}

#[test]
fn scenario_scaled_and_translated_vertex() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let v = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 10.0, 10.0), None)
        .unwrap();

    let mut view = GraphView::new();
    view.scale_and_translate(&model, 2.0, 10.0, 5.0);
    let state = view.state(v).unwrap();
    assert_eq!(state.bounds, Rect::new(20.0, 10.0, 20.0, 20.0));
    assert_eq!(state.origin, Point::new(0.0, 0.0));
    assert_eq!(state.unscaled_width, 10.0);
}

#[test]
fn validate_is_idempotent() {
    let scene = fixture("routing.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);
    let snapshot: Vec<_> = view
        .states()
        .iter()
        .map(|s| (s.cell, s.bounds, s.absolute_points.clone(), s.origin))
        .collect();
    let generation = view.states().generation();

    view.validate(&scene.model, None);
    assert_eq!(view.states().generation(), generation, "a clean cache does no work");

    view.revalidate(&scene.model);
    let again: Vec<_> = view
        .states()
        .iter()
        .map(|s| (s.cell, s.bounds, s.absolute_points.clone(), s.origin))
        .collect();
    assert_eq!(snapshot, again);
}

#[test]
fn translation_shifts_every_state() {
    let scene = fixture("routing.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);
    let before: Vec<_> = view
        .states()
        .iter()
        .filter(|s| s.is_vertex() || s.is_edge())
        .map(|s| (s.cell, s.bounds, s.absolute_points.clone()))
        .collect();

    view.set_translate(&scene.model, 15.0, -7.0);
    for (cell, bounds, pts) in before {
        let state = view.state(cell).unwrap();
        assert_rect(
            state.bounds,
            Rect::new(bounds.x + 15.0, bounds.y - 7.0, bounds.width, bounds.height),
            "translated bounds",
        );
        for (moved, old) in state.absolute_points.iter().zip(&pts) {
            assert_point(*moved, old.x + 15.0, old.y - 7.0, "translated point");
        }
    }
}

#[test]
fn children_resolve_against_parent() {
    let scene = fixture("nested.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);

    let inner = view.state(scene.cell("inner").unwrap()).unwrap();
    assert_eq!(inner.bounds, Rect::new(110.0, 110.0, 20.0, 20.0));
    assert_eq!(inner.origin, Point::new(110.0, 110.0));

    let badge = view.state(scene.cell("badge").unwrap()).unwrap();
    assert_eq!(badge.bounds, Rect::new(292.0, 92.0, 16.0, 16.0));

    let mut view = GraphView::new();
    view.set_scale(&scene.model, 0.5);
    let badge = view.state(scene.cell("badge").unwrap()).unwrap();
    assert_eq!(badge.bounds, Rect::new(146.0, 46.0, 8.0, 8.0));
}

#[test]
fn child_of_edge_sits_on_its_path() {
    let (mut model, _, _, e) = two_boxes();
    let geo = Geometry {
        width: 10.0,
        height: 10.0,
        ..Geometry::relative(0.0, 0.0)
    };
    let label = model.add_vertex(e, None, geo, None).unwrap();

    let mut view = GraphView::new();
    view.validate(&model, None);
    let state = view.state(label).unwrap();
    assert!(close(state.x(), 140.0) && close(state.y(), 20.0), "{:?}", state.bounds);
}

#[test]
fn collapsed_groups_stand_in_for_hidden_terminals() {
    let scene = fixture("nested.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);

    let hidden = scene.cell("hidden").unwrap();
    let folded = scene.cell("folded").unwrap();
    let to_hidden = scene.cell("toHidden").unwrap();
    assert!(view.state(hidden).is_none());
    assert_eq!(
        view.visible_terminal_state(to_hidden, false).map(|s| s.cell),
        Some(folded)
    );
    let pts = points(&view, to_hidden);
    assert!(close(pts[pts.len() - 1].x, 60.0), "{pts:?}");

    let link = points(&view, scene.cell("link").unwrap());
    assert!(close(link[0].x, 400.0), "{link:?}");
    assert!(close(link[link.len() - 1].x, 130.0), "{link:?}");
}

#[test]
fn routing_fixture_paths() {
    let scene = fixture("routing.json5");
    let mut view = GraphView::new();
    view.validate(&scene.model, None);

    let elbow = points(&view, scene.cell("elbow").unwrap());
    assert_eq!(
        elbow,
        vec![
            Point::new(80.0, 20.0),
            Point::new(140.0, 20.0),
            Point::new(140.0, 120.0),
            Point::new(200.0, 120.0),
        ]
    );

    let looped = points(&view, scene.cell("loop").unwrap());
    assert_eq!(looped.len(), 4, "{looped:?}");
    assert_point(looped[0], 80.0, 40.0 / 3.0, "loop start");
    assert_point(looped[1], 100.0, 10.0, "loop first bend");
    assert_point(looped[2], 100.0, 30.0, "loop second bend");
    assert_point(looped[3], 80.0, 80.0 / 3.0, "loop end");

    let dangling = points(&view, scene.cell("dangling").unwrap());
    assert_point(dangling[0], 100.0, 250.0, "ellipse exit");
    assert_point(dangling[1], 200.0, 250.0, "dangling end");

    let fixed = points(&view, scene.cell("fixed").unwrap());
    assert_point(fixed[0], 40.0, 40.0, "constrained exit");
    assert_point(fixed[1], 200.0, 120.0, "constrained entry");
}

#[test]
fn removing_a_terminal_prunes_the_edge() {
    let (mut model, v1, v2, e) = two_boxes();
    let mut view = GraphView::with_renderer(RenderLog::new());
    view.validate(&model, None);
    assert!(view.state(e).is_some());
    view.renderer_mut().clear();

    model.remove(v1).unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    view.validate(&model, None);

    assert!(view.state(v1).is_none());
    assert!(view.state(e).is_none());
    assert!(view.state(v2).is_some());
    let removed: Vec<_> = view.renderer().removed().collect();
    assert!(removed.contains(&v1) && removed.contains(&e), "{removed:?}");
}

#[test]
fn edge_without_terminal_point_is_pruned() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let v = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let e = model.add_edge(parent, None, Some(v), None, None).unwrap();

    let mut view = GraphView::new();
    view.validate(&model, None);
    assert!(view.state(e).is_none());

    model
        .set_geometry(
            e,
            Some(Geometry::relative(0.0, 0.0).with_terminal_point(Point::new(300.0, 20.0), false)),
        )
        .unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    view.validate(&model, None);
    let pts = points(&view, e);
    assert_point(pts[0], 80.0, 20.0, "floating source");
    assert_point(pts[1], 300.0, 20.0, "dangling target");
}

#[test]
fn graph_bounds_union_all_shapes() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    for (x, y, w, h) in [(0.0, 0.0, 100.0, 100.0), (10.0, 10.0, 20.0, 20.0), (150.0, 150.0, 10.0, 10.0)] {
        model
            .add_vertex(parent, None, Geometry::new(x, y, w, h), None)
            .unwrap();
    }
    let mut view = GraphView::new();
    let bounds = view.validate(&model, None);
    assert_eq!(bounds, Rect::new(0.0, 0.0, 160.0, 160.0));
    assert_eq!(view.graph_bounds(), bounds);
}

#[test]
fn empty_model_has_empty_bounds_at_translate() {
    let model = GraphModel::new();
    let mut view = GraphView::new();
    view.scale_and_translate(&model, 2.0, 5.0, 7.0);
    assert_eq!(view.graph_bounds(), Rect::new(10.0, 14.0, 0.0, 0.0));
}

#[test]
fn rotated_vertex_reports_rotated_shape_box() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let v = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 40.0, 20.0), Some("rotation=90"))
        .unwrap();
    let mut view = GraphView::new();
    let bounds = view.validate(&model, None);

    let state = view.state(v).unwrap();
    assert_eq!(state.bounds, Rect::new(0.0, 0.0, 40.0, 20.0));
    assert_rect(state.shape_bounds.unwrap(), Rect::new(10.0, -10.0, 20.0, 40.0), "shape box");
    assert_rect(bounds, Rect::new(10.0, -10.0, 20.0, 40.0), "graph bounds");
}

#[test]
fn geometry_change_moves_connected_edge() {
    let (mut model, _, v2, e) = two_boxes();
    let mut view = GraphView::new();
    view.validate(&model, None);

    model
        .set_geometry(v2, Some(Geometry::new(300.0, 0.0, 80.0, 40.0)))
        .unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    assert!(view.state(e).is_some_and(|s| s.invalid));

    view.validate(&model, None);
    let pts = points(&view, e);
    assert_point(pts[1], 300.0, 20.0, "moved target end");
}

#[test]
fn stale_handles_stop_resolving() {
    let (mut model, v1, _, e) = two_boxes();
    let mut view = GraphView::new();
    view.validate(&model, None);

    let handle = view.states().handle(v1).unwrap();
    assert!(view.resolve(handle).is_some());
    assert_eq!(view.state(e).unwrap().visible_source, Some(handle));

    model
        .set_geometry(v1, Some(Geometry::new(0.0, 50.0, 80.0, 40.0)))
        .unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    assert!(view.resolve(handle).is_none());

    view.validate(&model, None);
    assert!(view.resolve(handle).is_none());
    let fresh = view.state(e).unwrap().visible_source.unwrap();
    assert_eq!(fresh.cell(), v1);
    assert!(view.resolve(fresh).is_some());
}

#[test]
fn hiding_a_vertex_evicts_it_and_its_edges() {
    let (mut model, v1, v2, e) = two_boxes();
    let mut view = GraphView::new();
    view.validate(&model, None);

    model.set_visible(v2, false).unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    view.validate(&model, None);
    assert!(view.state(v2).is_none());
    assert!(view.state(e).is_none());
    assert!(view.state(v1).is_some());

    model.set_visible(v2, true).unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    view.validate(&model, None);
    assert_point(points(&view, e)[1], 200.0, 20.0, "restored edge");
}

#[test]
fn terminals_validate_before_their_edges() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let e = model.add_edge(parent, None, None, None, None).unwrap();
    let v1 = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let v2 = model
        .add_vertex(parent, None, Geometry::new(200.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    model.set_terminal(e, Some(v1), true).unwrap();
    model.set_terminal(e, Some(v2), false).unwrap();

    let mut view = GraphView::with_renderer(RenderLog::new());
    view.validate(&model, None);
    let order: Vec<_> = view.renderer().validated().collect();
    let pos = |cell| order.iter().position(|c| *c == cell).unwrap();
    assert!(pos(v1) < pos(e) && pos(v2) < pos(e), "{order:?}");
    assert_eq!(order.iter().filter(|c| **c == e).count(), 1);
}

#[test]
fn drill_down_root_becomes_the_origin() {
    let scene = fixture("nested.json5");
    let group = scene.cell("group").unwrap();
    let inner = scene.cell("inner").unwrap();
    let outside = scene.cell("outside").unwrap();

    let mut view = GraphView::with_renderer(RenderLog::new());
    view.set_current_root(&scene.model, Some(group));
    assert_eq!(view.current_root(), Some(group));
    assert_eq!(view.state(inner).unwrap().bounds, Rect::new(10.0, 10.0, 20.0, 20.0));
    assert!(view.state(outside).is_none());
    assert!(view.renderer().validated().all(|c| c != group));

    view.set_current_root(&scene.model, None);
    assert_eq!(view.state(inner).unwrap().bounds, Rect::new(110.0, 110.0, 20.0, 20.0));
    assert!(view.state(outside).is_some());
}

#[test]
fn origin_validates_on_demand() {
    let scene = fixture("nested.json5");
    let mut view = GraphView::new();
    let inner = scene.cell("inner").unwrap();
    assert_eq!(view.origin(&scene.model, inner), Some(Point::new(110.0, 110.0)));
    assert_eq!(view.origin(&scene.model, scene.cell("hidden").unwrap()), None);
}

#[test]
fn relative_point_round_trips_through_get_point() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let e = model.add_edge(parent, None, None, None, None).unwrap();
    model
        .set_geometry(
            e,
            Some(
                Geometry::relative(0.0, 0.0)
                    .with_terminal_point(Point::new(0.0, 0.0), true)
                    .with_terminal_point(Point::new(100.0, 0.0), false),
            ),
        )
        .unwrap();

    let mut view = GraphView::new();
    view.validate(&model, None);
    let rel = view.get_relative_point(&model, e, 75.0, 10.0);
    assert_eq!(rel, Point::new(0.5, -10.0));

    let state = view.state(e).unwrap();
    let back = view.get_point(state, Some(&Geometry::relative(rel.x, rel.y)));
    assert_eq!(back, Point::new(75.0, 10.0));
}

#[test]
fn style_change_re_resolves_style() {
    let (mut model, v1, _, e) = two_boxes();
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_eq!(view.state(v1).unwrap().style.get("perimeter"), Some("rectanglePerimeter"));

    model.set_style(v1, Some("perimeter=ellipsePerimeter")).unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    view.validate(&model, None);
    assert_eq!(view.state(v1).unwrap().style.get("perimeter"), Some("ellipsePerimeter"));
    assert_point(points(&view, e)[0], 80.0, 20.0, "ellipse side");
}

#[test]
fn hiding_a_container_evicts_its_subtree() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let group = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 100.0, 100.0), None)
        .unwrap();
    let child = model
        .add_vertex(group, None, Geometry::new(10.0, 10.0, 20.0, 20.0), None)
        .unwrap();
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert!(view.state(child).is_some());

    model.set_visible(group, false).unwrap();
    apply(&mut view, &mut model);
    assert!(view.state(group).is_none());
    assert!(view.state(child).is_none());
    assert!(view.states().iter().all(|s| !s.invalid));

    model.set_visible(group, true).unwrap();
    apply(&mut view, &mut model);
    assert_eq!(view.state(child).unwrap().bounds, Rect::new(10.0, 10.0, 20.0, 20.0));
}

#[test]
fn collapsing_a_container_evicts_nested_descendants() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let group = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 200.0, 200.0), None)
        .unwrap();
    let mid = model
        .add_vertex(group, None, Geometry::new(10.0, 10.0, 100.0, 100.0), None)
        .unwrap();
    let leaf = model
        .add_vertex(mid, None, Geometry::new(5.0, 5.0, 10.0, 10.0), None)
        .unwrap();
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_eq!(view.state(leaf).unwrap().bounds, Rect::new(15.0, 15.0, 10.0, 10.0));

    model.set_collapsed(group, true).unwrap();
    apply(&mut view, &mut model);
    assert!(view.state(group).is_some());
    assert!(view.state(mid).is_none());
    assert!(view.state(leaf).is_none());

    model.set_collapsed(group, false).unwrap();
    apply(&mut view, &mut model);
    assert_eq!(view.state(leaf).unwrap().bounds, Rect::new(15.0, 15.0, 10.0, 10.0));
}

#[test]
fn moving_into_a_collapsed_container_evicts_the_subtree() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let folded = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 60.0, 30.0), None)
        .unwrap();
    model.set_collapsed(folded, true).unwrap();
    let mover = model
        .add_vertex(parent, None, Geometry::new(100.0, 0.0, 40.0, 40.0), None)
        .unwrap();
    let nested = model
        .add_vertex(mover, None, Geometry::new(5.0, 5.0, 10.0, 10.0), None)
        .unwrap();
    model.take_changes();
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert!(view.state(nested).is_some());

    model.set_parent(mover, folded, None).unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    assert!(view.state(mover).is_none());
    assert!(view.state(nested).is_none());

    view.validate(&model, None);
    assert!(view.state(mover).is_none());
    assert!(view.state(nested).is_none());
    assert!(view.state(folded).is_some());
}

#[test]
fn relative_children_follow_a_rotated_parent() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let group = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 100.0, 100.0), Some("rotation=90"))
        .unwrap();
    let handle = Geometry {
        width: 10.0,
        height: 10.0,
        ..Geometry::relative(1.0, 0.5)
    }
    .with_offset(Point::new(-5.0, -5.0));
    let rel = model.add_vertex(group, None, handle, None).unwrap();
    let abs = model
        .add_vertex(group, None, Geometry::new(10.0, 10.0, 10.0, 10.0), None)
        .unwrap();

    let mut view = GraphView::new();
    view.validate(&model, None);
    // The right-middle handle ends up at the bottom-middle.
    assert_rect(view.state(rel).unwrap().bounds, Rect::new(45.0, 95.0, 10.0, 10.0), "rotated child");
    assert_eq!(view.state(abs).unwrap().bounds, Rect::new(10.0, 10.0, 10.0, 10.0));
}

#[test]
fn floating_end_on_rotated_terminal() {
    let (model, _, _, e) = connected(
        (Geometry::new(0.0, 0.0, 80.0, 40.0), Some("rotation=90")),
        (Geometry::new(200.0, 0.0, 80.0, 40.0), None),
        None,
    );
    let mut view = GraphView::new();
    view.validate(&model, None);
    let pts = points(&view, e);
    // The upright box spans x 20..60.
    assert_point(pts[0], 60.0, 20.0, "rotated source");
    assert_point(pts[1], 200.0, 20.0, "target");
}

#[test]
fn perimeter_projection_uses_unswapped_flips() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let mut ends = Vec::new();
    for flip in ["flipH=1", "flipV=1"] {
        let style = format!("perimeter=trianglePerimeter;direction=south;{flip}");
        let v = model
            .add_vertex(parent, None, Geometry::new(0.0, 0.0, 100.0, 100.0), Some(&style))
            .unwrap();
        let e = model.add_edge(parent, None, Some(v), None, None).unwrap();
        model
            .set_geometry(
                e,
                Some(Geometry::relative(0.0, 0.0).with_terminal_point(Point::new(150.0, 100.0), false)),
            )
            .unwrap();
        ends.push(e);
    }
    let mut view = GraphView::new();
    view.validate(&model, None);

    // The south triangle is symmetric about its vertical axis.
    assert_point(points(&view, ends[0])[0], 70.0, 60.0, "flipH");
    assert_point(points(&view, ends[1])[0], 250.0 / 3.0, 200.0 / 3.0, "flipV");
}

#[test]
fn constraint_flips_swap_for_vertical_directions() {
    let exit = Some("exitX=0;exitY=0.5;exitPerimeter=0");
    let target = (Geometry::new(200.0, 0.0, 80.0, 40.0), None);

    let (model, _, _, e) = connected(
        (Geometry::new(0.0, 0.0, 80.0, 40.0), Some("flipH=1")),
        target.clone(),
        exit,
    );
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_point(points(&view, e)[0], 80.0, 20.0, "mirrored exit");

    let (model, _, _, e) = connected(
        (Geometry::new(0.0, 0.0, 80.0, 40.0), Some("direction=south;flipH=1")),
        target,
        exit,
    );
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_point(points(&view, e)[0], 40.0, 0.0, "south exit");
}

#[test]
fn exit_perimeter_projects_the_anchor() {
    let source = (Geometry::new(0.0, 0.0, 80.0, 40.0), None);
    let target = (Geometry::new(200.0, 0.0, 80.0, 40.0), None);

    let (model, _, _, e) = connected(
        source.clone(),
        target.clone(),
        Some("exitX=0.25;exitY=0.5;exitPerimeter=1"),
    );
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_point(points(&view, e)[0], 0.0, 20.0, "projected exit");

    let (model, _, _, e) = connected(source, target, Some("exitX=0.25;exitY=0.5;exitPerimeter=0"));
    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_point(points(&view, e)[0], 20.0, 20.0, "inner exit");
}

#[test]
fn source_port_replaces_the_terminal() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let s = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let t = model
        .add_vertex(parent, None, Geometry::new(200.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let port_geo = Geometry {
        width: 10.0,
        height: 10.0,
        ..Geometry::relative(1.0, 0.5)
    }
    .with_offset(Point::new(-5.0, -5.0));
    let port = model.add_vertex(s, None, port_geo, None).unwrap();
    let style = format!("sourcePort={}", port.0);
    let e = model.add_edge(parent, None, Some(s), Some(t), Some(&style)).unwrap();

    let mut view = GraphView::new();
    view.validate(&model, None);
    assert_eq!(view.state(port).unwrap().bounds, Rect::new(75.0, 15.0, 10.0, 10.0));
    let pts = points(&view, e);
    assert_point(pts[0], 85.0, 20.0, "port exit");
    assert_point(pts[1], 200.0, 20.0, "target");
}

#[test]
fn fixed_aspect_stencil_routes_with_drawn_bounds() {
    let (model, _, _, e) = connected(
        (Geometry::new(0.0, 0.0, 100.0, 40.0), Some("shape=box")),
        (Geometry::new(200.0, 100.0, 40.0, 40.0), None),
        Some("edgeStyle=sideToSideEdgeStyle"),
    );
    let mut view = GraphView::new();
    view.stencils_mut().add("box", Stencil::new(1.0, 1.0, true));
    view.validate(&model, None);

    // The square drawing of the source covers x 30..70.
    assert_eq!(
        points(&view, e),
        vec![
            Point::new(70.0, 20.0),
            Point::new(135.0, 20.0),
            Point::new(135.0, 120.0),
            Point::new(200.0, 120.0),
        ]
    );
}

#[test]
fn edge_to_edge_cycles_invalidate_once() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let v1 = model
        .add_vertex(parent, None, Geometry::new(0.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let v2 = model
        .add_vertex(parent, None, Geometry::new(200.0, 0.0, 80.0, 40.0), None)
        .unwrap();
    let e1 = model.add_edge(parent, None, Some(v1), None, None).unwrap();
    let e2 = model.add_edge(parent, None, Some(e1), Some(v2), None).unwrap();
    model.set_terminal(e1, Some(e2), false).unwrap();
    model.take_changes();

    let mut view = GraphView::new();
    view.validate(&model, None);
    assert!(view.state(e1).is_some() && view.state(e2).is_some());

    model
        .set_geometry(v1, Some(Geometry::new(0.0, 50.0, 80.0, 40.0)))
        .unwrap();
    let changes = model.take_changes();
    view.apply_changes(&model, &changes);
    assert!(view.state(e1).unwrap().invalid);
    assert!(view.state(e2).unwrap().invalid);

    view.invalidate(&model, Some(e2), true, true);
    view.validate(&model, None);
    assert!(view.states().iter().all(|s| !s.invalid));
}

#[test]
fn diagonal_ends_meet_both_perimeters() {
    let (model, _, _, e) = connected(
        (Geometry::new(0.0, 0.0, 80.0, 40.0), None),
        (Geometry::new(200.0, 150.0, 80.0, 40.0), None),
        None,
    );
    let mut view = GraphView::new();
    view.validate(&model, None);
    let pts = points(&view, e);
    // Both ends lie on the line between the centers (40,20) and (240,170).
    assert_point(pts[0], 200.0 / 3.0, 40.0, "source bottom side");
    assert_point(pts[1], 640.0 / 3.0, 150.0, "target top side");
}

#[test]
fn relative_children_of_the_drill_down_root() {
    let mut model = GraphModel::new();
    let parent = model.default_parent();
    let group = model
        .add_vertex(parent, None, Geometry::new(100.0, 100.0, 200.0, 100.0), None)
        .unwrap();
    let geo = Geometry {
        width: 10.0,
        height: 10.0,
        ..Geometry::relative(0.5, 0.5)
    };
    let child = model.add_vertex(group, None, geo, None).unwrap();

    let mut view = GraphView::new();
    view.set_current_root(&model, Some(group));
    let state = view.state(child).unwrap();
    assert_eq!(state.origin, Point::new(100.0, 50.0));
    assert_eq!(state.bounds, Rect::new(100.0, 50.0, 10.0, 10.0));
}
