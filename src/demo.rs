//! Built-in traces
//!
//! Hand-written snapshot sequences that stand in for an interpreter when the
//! viewer is started without one. Each trace shows off a different part of the
//! layout: closures and their frames, linked and cyclic arrays, shared data.

use crate::errors::HistoryError;
use crate::snapshot::{Closure, Datum, EnvId, RuntimeEnv, Snapshot, SnapshotHistory};

/// Names accepted by [`trace`]
pub const TRACES: [&str; 3] = ["counter", "list", "shared"];

/// Snapshots of the named trace, in step order
pub fn trace(name: &str) -> Option<Vec<Snapshot>> {
    match name {
        "counter" => Some(counter()),
        "list" => Some(list()),
        "shared" => Some(shared()),
        _ => None,
    }
}

/// Load a trace into a history with the given memory limit.
/// Unknown names yield `Ok(None)`.
pub fn history(name: &str, max_memory: usize) -> Result<Option<SnapshotHistory>, HistoryError> {
    let Some(snapshots) = trace(name) else {
        return Ok(None);
    };
    let mut history = SnapshotHistory::new(max_memory);
    for snapshot in snapshots {
        history.push(snapshot)?;
    }
    history.rewind();
    Ok(Some(history))
}

fn closure(name: &str, params: &[&str], body: &str, env: u64) -> Closure {
    Closure {
        name: name.to_string(),
        params: params.iter().map(|p| p.to_string()).collect(),
        body: body.to_string(),
        env: EnvId(env),
    }
}

// function make_counter(start) {
//     let count = start;
//     function increment() { count = count + 1; return count; }
//     return increment;
// }
// const c = make_counter(5);
// c();
fn counter() -> Vec<Snapshot> {
    let make_counter = closure(
        "make_counter",
        &["start"],
        "{\n  let count = start;\n  function increment() {\n    count = count + 1;\n    return count;\n  }\n  return increment;\n}",
        0,
    );
    let increment = closure("increment", &[], "{\n  count = count + 1;\n  return count;\n}", 2);

    let global = || RuntimeEnv::new(0, "global", None).constant("make_counter", Datum::object(1));
    let call = |count: Option<f64>, bound: bool| {
        let env = RuntimeEnv::new(1, "make_counter", Some(0)).bind("start", Datum::number(5.0));
        let body = RuntimeEnv::new(2, "make_counter body", Some(1));
        let body = match count {
            Some(n) => body.bind("count", Datum::number(n)),
            None => body.declare("count"),
        };
        let body = if bound {
            body.constant("increment", Datum::object(2))
        } else {
            body.declare("increment")
        };
        (env, body)
    };

    let step0 = Snapshot::new(0).with_env(global().declare("c")).with_closure(1, make_counter.clone());

    let (env, body) = call(None, false);
    let step1 = Snapshot::new(1)
        .with_env(global().declare("c"))
        .with_env(env)
        .with_env(body)
        .with_closure(1, make_counter.clone());

    let (env, body) = call(Some(5.0), true);
    let step2 = Snapshot::new(2)
        .with_env(global().declare("c"))
        .with_env(env)
        .with_env(body)
        .with_closure(1, make_counter.clone())
        .with_closure(2, increment.clone());

    let (env, body) = call(Some(5.0), true);
    let step3 = Snapshot::new(3)
        .with_env(global().constant("c", Datum::object(2)))
        .with_env(env)
        .with_env(body)
        .with_closure(1, make_counter.clone())
        .with_closure(2, increment.clone());

    // The call to increment has no locals; its frame is not drawn
    let (env, body) = call(Some(6.0), true);
    let step4 = Snapshot::new(4)
        .with_env(global().constant("c", Datum::object(2)))
        .with_env(env)
        .with_env(body)
        .with_env(RuntimeEnv::new(3, "increment", Some(2)))
        .with_closure(1, make_counter)
        .with_closure(2, increment);

    vec![step0, step1, step2, step3, step4]
}

// const xs = list(1, 2, 3);
// set_tail(tail(tail(xs)), xs);
// const ys = pair(null, 4);
// set_head(ys, ys);
fn list() -> Vec<Snapshot> {
    let global = |xs: Datum| RuntimeEnv::new(0, "global", None).constant("xs", xs);
    let pairs = |snapshot: Snapshot, last_tail: Datum| {
        snapshot
            .with_array(10, vec![Datum::number(1.0), Datum::object(11)])
            .with_array(11, vec![Datum::number(2.0), Datum::object(12)])
            .with_array(12, vec![Datum::number(3.0), last_tail])
    };

    let step0 = pairs(Snapshot::new(0).with_env(global(Datum::object(10)).declare("ys")), Datum::Null);
    let step1 = pairs(
        Snapshot::new(1).with_env(global(Datum::object(10)).declare("ys")),
        Datum::object(10),
    );
    let step2 = pairs(
        Snapshot::new(2).with_env(global(Datum::object(10)).constant("ys", Datum::object(20))),
        Datum::object(10),
    )
    .with_array(20, vec![Datum::Null, Datum::number(4.0)]);
    let step3 = pairs(
        Snapshot::new(3).with_env(global(Datum::object(10)).constant("ys", Datum::object(20))),
        Datum::object(10),
    )
    .with_array(20, vec![Datum::object(20), Datum::number(4.0)]);

    vec![step0, step1, step2, step3]
}

// let a = x => x + 1;
// let b = a;
// const p = [a, "shared"];
// const q = p;
fn shared() -> Vec<Snapshot> {
    let add_one = closure("a", &["x"], "x + 1", 1);
    let global = || RuntimeEnv::new(0, "global", None).constant("greeting", Datum::text("hello"));

    let step0 = Snapshot::new(0)
        .with_env(global())
        .with_env(RuntimeEnv::new(1, "program", Some(0)).declare("a").declare("b").declare("p").declare("q"));

    let step1 = Snapshot::new(1)
        .with_env(global())
        .with_env(
            RuntimeEnv::new(1, "program", Some(0))
                .bind("a", Datum::object(1))
                .declare("b")
                .declare("p")
                .declare("q"),
        )
        .with_closure(1, add_one.clone());

    let step2 = Snapshot::new(2)
        .with_env(global())
        .with_env(
            RuntimeEnv::new(1, "program", Some(0))
                .bind("a", Datum::object(1))
                .bind("b", Datum::object(1))
                .declare("p")
                .declare("q"),
        )
        .with_closure(1, add_one.clone());

    let step3 = Snapshot::new(3)
        .with_env(global())
        .with_env(
            RuntimeEnv::new(1, "program", Some(0))
                .bind("a", Datum::object(1))
                .bind("b", Datum::object(1))
                .constant("p", Datum::object(2))
                .constant("q", Datum::object(2)),
        )
        .with_closure(1, add_one)
        .with_array(2, vec![Datum::object(1), Datum::text("shared")]);

    vec![step0, step1, step2, step3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_trace_loads() {
        for name in TRACES {
            let history = history(name, usize::MAX).unwrap().unwrap();
            assert!(history.len() > 1, "{} is too short", name);
            assert_eq!(history.position(), 0);
        }
        assert!(history("nope", usize::MAX).unwrap().is_none());
    }

    #[test]
    fn test_steps_are_numbered_in_order() {
        for name in TRACES {
            let steps: Vec<usize> = trace(name).unwrap().iter().map(|s| s.step).collect();
            assert_eq!(steps, (0..steps.len()).collect::<Vec<_>>());
        }
    }
}
