// Integration tests for the layout engine

use envscope::config::DEFAULT_CONFIG;
use envscope::errors::LayoutWarning;
use envscope::layout::arrow::RouteKind;
use envscope::layout::draw::{ArrowSource, ArrowTarget, ShapeKind};
use envscope::layout::value::{UnitContent, ValueKind};
use envscope::layout::{LayoutContext, Reference, ValueId};
use envscope::snapshot::{Closure, Datum, DatumId, EnvId, RuntimeEnv, Snapshot};
use envscope::demo;

fn closure(name: &str, params: &[&str], env: u64) -> Closure {
    Closure {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body: "return 1;".to_string(),
        env: EnvId(env),
    }
}

fn functions(ctx: &LayoutContext) -> Vec<ValueId> {
    ctx.values()
        .iter()
        .filter(|v| v.as_function().is_some())
        .map(|v| v.id)
        .collect()
}

fn shared_closure() -> Snapshot {
    Snapshot::new(0)
        .with_env(
            RuntimeEnv::new(0, "global", None)
                .bind("a", Datum::object(1))
                .bind("b", Datum::object(1)),
        )
        .with_closure(1, closure("f", &["x"], 0))
}

#[test]
fn test_redraw_is_deterministic() {
    let snapshot = demo::trace("list").unwrap().remove(3);

    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let first = ctx.redraw(&snapshot, false);
    let second = ctx.redraw(&snapshot, false);
    assert_eq!(first, second);

    let mut fresh = LayoutContext::new(DEFAULT_CONFIG);
    assert_eq!(fresh.redraw(&snapshot, false), first);
}

#[test]
fn test_array_with_null_terminator() {
    // x → [1, 2, null]
    let snapshot = Snapshot::new(0)
        .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::object(7)))
        .with_array(7, vec![Datum::number(1.0), Datum::number(2.0), Datum::Null]);
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let diagram = ctx.redraw(&snapshot, false);

    let array_id = ctx.cached(DatumId(7)).unwrap();
    let array = ctx.value(array_id).as_array().unwrap();
    assert_eq!(array.units.len(), 3);
    assert_eq!(array.units[2].content, UnitContent::Null);
    assert!(array.units[0].is_first && array.units[2].is_last);

    assert_eq!(diagram.arrows_into(array_id), 1);
    let arrow = diagram.connectors().next().unwrap();
    assert_eq!(
        arrow.source,
        ArrowSource::Reference(Reference::Binding {
            frame: ctx.frame_for_env(EnvId(0)).unwrap(),
            index: 0
        })
    );
    assert_eq!(arrow.route.kind, RouteKind::Straight);
    assert_eq!(arrow.route.end().x, array.units[0].bounds.x);

    let nulls = diagram
        .shapes
        .iter()
        .filter(|s| matches!(s.kind, ShapeKind::Line { .. }))
        .count();
    assert_eq!(nulls, 1);
}

#[test]
fn test_shared_closure_is_drawn_once() {
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let diagram = ctx.redraw(&shared_closure(), false);

    let fns = functions(&ctx);
    assert_eq!(fns.len(), 1);
    let f = fns[0];
    assert_eq!(ctx.value(f).referenced_by.len(), 2);
    assert_eq!(diagram.arrows_into(f), 2);

    let glyphs = diagram
        .shapes
        .iter()
        .filter(|s| matches!(s.kind, ShapeKind::Circle { owner, .. } if owner == f))
        .count();
    assert_eq!(glyphs, 4);

    let global = ctx.frame_for_env(EnvId(0)).unwrap();
    let to_frame: Vec<_> = diagram
        .connectors()
        .filter(|c| c.source == ArrowSource::Function(f))
        .collect();
    assert_eq!(to_frame.len(), 1);
    assert_eq!(to_frame[0].target, ArrowTarget::Frame(global));
}

#[test]
fn test_self_referencing_array_terminates() {
    let snapshot = demo::trace("list").unwrap().remove(3);
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let diagram = ctx.redraw(&snapshot, false);

    // three list pairs, the self-referencing pair, four numbers
    let arrays = ctx.values().iter().filter(|v| v.as_array().is_some()).count();
    assert_eq!(arrays, 4);
    assert_eq!(ctx.values().len(), 8);

    let head = ctx.cached(DatumId(10)).unwrap();
    assert_eq!(diagram.arrows_into(head), 2);

    let ys = ctx.cached(DatumId(20)).unwrap();
    assert_eq!(diagram.arrows_into(ys), 2);
    let loops: Vec<_> = diagram
        .connectors()
        .filter(|c| c.route.kind == RouteKind::Loop)
        .collect();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].target, ArrowTarget::Value(ys));
    assert!(loops[0].route.length() > 0.0);
}

#[test]
fn test_reset_drops_stale_references() {
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    ctx.redraw(&shared_closure(), false);
    let diagram = ctx.redraw(&shared_closure(), false);
    let f = functions(&ctx)[0];
    assert_eq!(ctx.value(f).referenced_by.len(), 2);
    assert_eq!(diagram.arrows_into(f), 2);

    let only_a = Snapshot::new(1)
        .with_env(
            RuntimeEnv::new(0, "global", None)
                .bind("a", Datum::object(1))
                .bind("b", Datum::number(3.0)),
        )
        .with_closure(1, closure("f", &["x"], 0));
    let diagram = ctx.redraw(&only_a, false);
    let f = functions(&ctx)[0];
    assert_eq!(ctx.value(f).referenced_by.len(), 1);
    assert_eq!(diagram.arrows_into(f), 1);

    ctx.reset();
    assert!(ctx.values().is_empty());
    assert!(ctx.cached(DatumId(1)).is_none());
}

#[test]
fn test_nested_closure_frames_stack_by_level() {
    let snapshot = Snapshot::new(0)
        .with_env(RuntimeEnv::new(0, "global", None).bind("outer", Datum::object(1)))
        .with_env(RuntimeEnv::new(1, "outer", Some(0)).bind("inner", Datum::object(2)))
        .with_env(RuntimeEnv::new(2, "inner", Some(1)).bind("n", Datum::number(1.0)))
        .with_closure(1, closure("outer", &[], 0))
        .with_closure(2, closure("inner", &[], 1));
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    ctx.redraw(&snapshot, false);

    let levels: Vec<usize> = (0..3)
        .map(|e| ctx.tree().node(ctx.tree().resolve(EnvId(e)).unwrap()).level)
        .collect();
    assert_eq!(levels, vec![0, 1, 2]);

    let levels = ctx.levels();
    assert_eq!(levels.len(), 3);
    for depth in 1..3 {
        let parent = &levels[depth - 1].bounds;
        let expected = parent.y + parent.height + DEFAULT_CONFIG.frame_margin_y;
        assert_eq!(levels[depth].bounds.y, expected);

        let frame = ctx.frame_for_env(EnvId(depth as u64)).unwrap();
        assert_eq!(ctx.frame(frame).bounds.y, expected);
    }
}

#[test]
fn test_function_moves_next_to_its_own_frame() {
    // First reached through an array in the global frame, but bound in f's frame
    let snapshot = Snapshot::new(0)
        .with_env(RuntimeEnv::new(0, "global", None).bind("arr", Datum::object(5)))
        .with_env(RuntimeEnv::new(1, "f", Some(0)).bind("g", Datum::object(6)))
        .with_array(5, vec![Datum::object(6)])
        .with_closure(6, closure("g", &[], 1));
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    ctx.redraw(&snapshot, false);

    let g = ctx.cached(DatumId(6)).unwrap();
    assert!(matches!(
        ctx.value(g).main_reference(),
        Some(Reference::Unit { .. })
    ));

    let frame = ctx.frame(ctx.frame_for_env(EnvId(1)).unwrap());
    let binding = ctx.binding(EnvId(1), "g").unwrap();
    let function = ctx.value(g).as_function().unwrap();
    let config = &DEFAULT_CONFIG;
    assert_eq!(
        function.center.x,
        frame.bounds.right() + config.frame_margin_x / 4.0 + config.fn_radius * 2.0
    );
    assert_eq!(function.center.y, binding.arrow_start().y);
}

#[test]
fn test_moved_function_pushes_sibling_frame_right() {
    // h in global is seen first, but g closes over f, which has a sibling k
    let snapshot = Snapshot::new(0)
        .with_env(RuntimeEnv::new(0, "global", None).bind("h", Datum::object(6)))
        .with_env(RuntimeEnv::new(1, "f", Some(0)).bind("g", Datum::object(6)))
        .with_env(RuntimeEnv::new(2, "k", Some(0)).bind("n", Datum::number(1.0)))
        .with_closure(6, closure("g", &[], 1));
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    ctx.redraw(&snapshot, false);

    let f = ctx.frame(ctx.frame_for_env(EnvId(1)).unwrap());
    let k = ctx.frame(ctx.frame_for_env(EnvId(2)).unwrap());
    assert_eq!(f.bounds.y, k.bounds.y);

    let g = ctx.cached(DatumId(6)).unwrap();
    let function = ctx.value(g).as_function().unwrap();
    let config = &DEFAULT_CONFIG;
    assert_eq!(
        function.center.x,
        f.bounds.right() + config.frame_margin_x / 4.0 + config.fn_radius * 2.0
    );

    let glyph = ctx.value(g).bounds;
    assert!(glyph.right() <= f.bounds.x + f.total_width);
    assert_eq!(
        k.bounds.x,
        f.bounds.x + f.total_width + config.frame_margin_x
    );
    assert!(glyph.right() < k.bounds.x);
}

#[test]
fn test_aliased_array_holding_aliased_closure() {
    let snapshot = demo::trace("shared").unwrap().remove(3);
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let diagram = ctx.redraw(&snapshot, false);

    let f = ctx.cached(DatumId(1)).unwrap();
    let p = ctx.cached(DatumId(2)).unwrap();
    assert_eq!(functions(&ctx), vec![f]);
    assert_eq!(diagram.arrows_into(f), 3);
    assert_eq!(diagram.arrows_into(p), 2);
    assert!(diagram.warnings.is_empty());
}

#[test]
fn test_unresolvable_data_degrades_to_placeholders() {
    let snapshot = Snapshot::new(0)
        .with_env(
            RuntimeEnv::new(0, "global", None)
                .bind("missing", Datum::object(99))
                .bind("orphan", Datum::object(1)),
        )
        .with_closure(1, closure("f", &["a"], 42));
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    let diagram = ctx.redraw(&snapshot, false);

    assert!(diagram
        .warnings
        .contains(&LayoutWarning::UnresolvedDatum { datum: DatumId(99) }));
    assert!(diagram.warnings.contains(&LayoutWarning::MalformedClosure {
        datum: DatumId(1),
        env: EnvId(42)
    }));

    let texts: Vec<(String, bool)> = ctx
        .values()
        .iter()
        .filter_map(|v| match &v.kind {
            ValueKind::Primitive(p) => Some((p.text.clone(), p.placeholder)),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![("<unknown>".to_string(), true), ("f(a)".to_string(), false)]
    );
    assert_eq!(diagram.connectors().count(), 0);
}

#[test]
fn test_oversized_printable_export_is_scaled() {
    let mut global = RuntimeEnv::new(0, "global", None);
    for i in 0..400 {
        global = global.bind(&format!("v{}", i), Datum::number(i as f64));
    }
    let snapshot = Snapshot::new(0).with_env(global);
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);

    let interactive = ctx.redraw(&snapshot, false);
    assert!(interactive.warnings.is_empty());

    let printable = ctx.draw(true);
    let scale = printable.export_scale(&DEFAULT_CONFIG);
    assert!(scale < 1.0);
    assert!(printable
        .warnings
        .iter()
        .any(|w| matches!(w, LayoutWarning::OversizedExport { .. })));
}

#[test]
fn test_empty_call_frame_is_not_drawn() {
    let snapshot = demo::trace("counter").unwrap().remove(4);
    let mut ctx = LayoutContext::new(DEFAULT_CONFIG);
    ctx.redraw(&snapshot, false);

    assert_eq!(ctx.frame_for_env(EnvId(3)), ctx.frame_for_env(EnvId(2)));
    assert_eq!(ctx.frames().len(), 3);
    let increment = ctx.cached(DatumId(2)).unwrap();
    let enclosing = ctx.value(increment).as_function().unwrap().enclosing;
    assert_eq!(ctx.tree().node(enclosing).env, Some(EnvId(2)));
}
