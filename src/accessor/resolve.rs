//! Path resolution against a binding context.

use crate::error::{Error, ReactiveError};
use crate::reactive::{NodeId, Runtime};
use crate::value::Value;

use super::path::{PropertyPath, Segment};

/// Read through signals and computeds until a plain value is reached.
///
/// Each read is tracked, so a computation resolving a path subscribes to every
/// cell it passes through. A cell reached twice (a signal holding its own
/// handle, or `a -> b -> a`) fails with [`ReactiveError::CyclicDependency`].
pub fn unwrap_reactive(rt: &Runtime, mut value: Value) -> Result<Value, ReactiveError> {
    if !value.is_reactive() {
        return Ok(value);
    }
    let mut visited: Vec<NodeId> = Vec::new();
    loop {
        let id = match &value {
            Value::Signal(signal) => Some(signal.id),
            Value::Computed(computed) => Some(computed.id),
            _ => None,
        };
        let Some(id) = id else {
            return Ok(value);
        };
        if visited.contains(&id) {
            return Err(ReactiveError::CyclicDependency);
        }
        visited.push(id);
        value = match value {
            Value::Signal(signal) => signal.get(rt)?,
            Value::Computed(computed) => computed.get(rt)?,
            plain => plain,
        };
    }
}

/// Look up one segment on a plain value. Absent members yield `undefined`.
pub fn member(value: &Value, segment: &Segment) -> Value {
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(key).cloned().unwrap_or_default(),
        (Value::Object(map), Segment::Index(i)) => map
            .get(i.to_string().as_str())
            .cloned()
            .unwrap_or_default(),
        (Value::Array(items), Segment::Index(i)) => items.get(*i).cloned().unwrap_or_default(),
        (Value::Array(items), Segment::Key(key)) if &**key == "length" => Value::from(items.len()),
        (Value::Array(items), Segment::Key(key)) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or_default(),
        (Value::String(s), Segment::Key(key)) if &**key == "length" => {
            Value::from(s.chars().count())
        }
        (Value::String(s), Segment::Index(i)) => s
            .chars()
            .nth(*i)
            .map(|c| Value::from(c.to_string()))
            .unwrap_or_default(),
        _ => Value::Undefined,
    }
}

/// Resolve `path` against `context`.
///
/// Reactive cells met along the way (including `context` itself and the
/// final value) are unwrapped with a tracked read. A missing or `null`
/// intermediate yields [`Value::Undefined`] rather than an error.
pub fn resolve(rt: &Runtime, context: &Value, path: &PropertyPath) -> Result<Value, ReactiveError> {
    let mut current = unwrap_reactive(rt, context.clone())?;
    for segment in path.segments() {
        if current.is_nullish() {
            return Ok(Value::Undefined);
        }
        current = unwrap_reactive(rt, member(&current, segment))?;
    }
    Ok(current)
}

/// Parse `path` and resolve it against `context`.
pub fn resolve_str(rt: &Runtime, context: &Value, path: &str) -> Result<Value, Error> {
    let path = PropertyPath::parse(path)?;
    Ok(resolve(rt, context, &path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context(rt: &Runtime) -> Value {
        let name = rt.create_signal("first");
        let items = Value::array([Value::object([("name", Value::from(name))])]);
        Value::object([
            ("$count", Value::from(rt.create_signal(3))),
            ("$items", Value::from(rt.create_signal(items))),
            ("plain", Value::from("text")),
            ("zero", Value::from(0)),
            ("nothing", Value::Null),
        ])
    }

    #[test]
    fn unwraps_signal_leaf() {
        let rt = Runtime::new();
        let ctx = context(&rt);
        assert_eq!(resolve_str(&rt, &ctx, "this.$count").unwrap(), Value::from(3));
        assert_eq!(resolve_str(&rt, &ctx, "$count").unwrap(), Value::from(3));
    }

    #[test]
    fn unwraps_signals_mid_path() {
        let rt = Runtime::new();
        let ctx = context(&rt);
        assert_eq!(
            resolve_str(&rt, &ctx, "this.$items[0].name").unwrap(),
            Value::from("first")
        );
        assert_eq!(
            resolve_str(&rt, &ctx, "this.$items.length").unwrap(),
            Value::from(1)
        );
    }

    #[test]
    fn missing_fails_soft() {
        let rt = Runtime::new();
        let ctx = context(&rt);
        for path in [
            "this.missing",
            "this.missing.deeper",
            "this.nothing.deeper",
            "this.$items[5].name",
            "this.$count.name",
        ] {
            assert_eq!(resolve_str(&rt, &ctx, path).unwrap(), Value::Undefined, "{path}");
        }
    }

    #[test]
    fn deliberate_falsy_is_not_undefined() {
        let rt = Runtime::new();
        let ctx = context(&rt);
        assert_eq!(resolve_str(&rt, &ctx, "zero").unwrap(), Value::from(0));
        assert_eq!(resolve_str(&rt, &ctx, "nothing").unwrap(), Value::Null);
    }

    #[test]
    fn string_members() {
        let rt = Runtime::new();
        let ctx = context(&rt);
        assert_eq!(resolve_str(&rt, &ctx, "plain.length").unwrap(), Value::from(4));
        assert_eq!(resolve_str(&rt, &ctx, "plain[1]").unwrap(), Value::from("e"));
    }

    #[test]
    fn context_itself() {
        let rt = Runtime::new();
        let ctx = Value::from(rt.create_signal(9));
        assert_eq!(resolve_str(&rt, &ctx, "this").unwrap(), Value::from(9));
    }

    #[test]
    fn reads_are_tracked() {
        let rt = Runtime::new();
        let count = rt.create_signal(1);
        let ctx = Value::object([("$count", count)]);
        let path = PropertyPath::parse("this.$count").unwrap();
        let ctx_c = ctx.clone();
        let derived = rt.create_computed(move |rt| resolve(rt, &ctx_c, &path));
        assert_eq!(derived.get(&rt).unwrap(), Value::from(1));
        count.set(&rt, 2).unwrap();
        assert_eq!(derived.get(&rt).unwrap(), Value::from(2));
    }

    #[test]
    fn nested_cells_unwrap() {
        let rt = Runtime::new();
        let inner = rt.create_signal(5);
        let outer = rt.create_signal(inner);
        let ctx = Value::object([("n", outer)]);
        assert_eq!(resolve_str(&rt, &ctx, "this.n").unwrap(), Value::from(5));
    }

    #[test]
    fn self_holding_signal_is_cyclic() {
        let rt = Runtime::new();
        let s = rt.create_signal(0);
        s.set(&rt, s).unwrap();
        let ctx = Value::object([("s", s)]);
        assert_eq!(
            resolve_str(&rt, &ctx, "this.s"),
            Err(Error::Reactive(ReactiveError::CyclicDependency))
        );
    }

    #[test]
    fn signal_cycle_is_cyclic() {
        let rt = Runtime::new();
        let a = rt.create_signal(0);
        let b = rt.create_signal(a);
        a.set(&rt, b).unwrap();
        assert_eq!(
            unwrap_reactive(&rt, Value::from(a)),
            Err(ReactiveError::CyclicDependency)
        );
    }

    #[test]
    fn computed_returning_its_source_cell_is_cyclic() {
        let rt = Runtime::new();
        let s = rt.create_signal(0);
        let c = rt.create_computed(move |_| Ok(Value::from(s)));
        s.set(&rt, c).unwrap();
        assert_eq!(
            unwrap_reactive(&rt, Value::from(c)),
            Err(ReactiveError::CyclicDependency)
        );
    }

    #[test]
    fn syntax_errors_surface() {
        let rt = Runtime::new();
        let ctx = Value::Null;
        assert!(matches!(
            resolve_str(&rt, &ctx, "a..b"),
            Err(Error::Syntax(_))
        ));
    }
}
