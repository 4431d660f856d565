//! Tree-walking evaluation of parsed expressions against a binding context.

use crate::accessor::resolve;
use crate::error::ReactiveError;
use crate::reactive::Runtime;
use crate::template::{BinaryOp, Expr, ParsedTemplate, Part};
use crate::value::{Object, Value};

use super::ops;

/// Evaluate `expr` with `context` as `this`.
///
/// Property reads go through [`resolve`], so inside a computed every cell the
/// evaluation touches becomes a dependency. Branches not taken by `?:`, `&&`
/// and `||` are never evaluated and therefore never tracked.
///
/// Missing properties and numeric failures are absorbed into the result as
/// `undefined` and `NaN`; only reactive failures (a disposed cell, a cycle)
/// are returned as errors.
pub fn evaluate(rt: &Runtime, expr: &Expr, context: &Value) -> Result<Value, ReactiveError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => resolve(rt, context, path),
        Expr::Array(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(rt, item, context))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from(values))
        }
        Expr::Object(entries) => {
            let mut object = Object::with_capacity(entries.len());
            for (key, value) in entries {
                object.insert(key.clone(), evaluate(rt, value, context)?);
            }
            Ok(Value::from(object))
        }
        Expr::Unary { op, operand } => Ok(ops::unary(*op, &evaluate(rt, operand, context)?)),
        Expr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            let left = evaluate(rt, left, context)?;
            if left.is_truthy() {
                evaluate(rt, right, context)
            } else {
                Ok(left)
            }
        }
        Expr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => {
            let left = evaluate(rt, left, context)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                evaluate(rt, right, context)
            }
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(rt, left, context)?;
            let right = evaluate(rt, right, context)?;
            Ok(ops::binary(*op, &left, &right))
        }
        Expr::Ternary {
            condition,
            when_true,
            when_false,
        } => {
            if evaluate(rt, condition, context)?.is_truthy() {
                evaluate(rt, when_true, context)
            } else {
                evaluate(rt, when_false, context)
            }
        }
    }
}

/// Substitute every expression of `template` and concatenate the result.
pub fn render_template(
    rt: &Runtime,
    template: &ParsedTemplate,
    context: &Value,
) -> Result<String, ReactiveError> {
    if let Some(text) = template.as_constant() {
        return Ok(text.to_string());
    }
    let mut out = String::with_capacity(template.source().len());
    for part in template.parts() {
        match part {
            Part::Text(text) => out.push_str(text),
            Part::Expr { expr, .. } => out.push_str(&evaluate(rt, expr, context)?.to_template_string()),
        }
    }
    Ok(out)
}

/// Evaluate `template` keeping the native value of a pure expression
/// template; any other template renders to a string.
pub fn evaluate_template(
    rt: &Runtime,
    template: &ParsedTemplate,
    context: &Value,
) -> Result<Value, ReactiveError> {
    match template.pure_expression() {
        Some(expr) => evaluate(rt, expr, context),
        None => render_template(rt, template, context).map(Value::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{parse_expression, parse_template_literal};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn eval(source: &str, context: &Value) -> Value {
        let rt = Runtime::new();
        evaluate(&rt, &parse_expression(source).unwrap(), context).unwrap()
    }

    fn render(source: &str) -> String {
        let rt = Runtime::new();
        render_template(&rt, &parse_template_literal(source).unwrap(), &Value::Undefined).unwrap()
    }

    #[test]
    fn exponent_results() {
        assert_eq!(render("${2 ** 3}"), "8");
        assert_eq!(render("${4 ** 0.5}"), "2");
        assert_eq!(render("${5 ** 0}"), "1");
        assert_eq!(render("${0 ** 2}"), "0");
    }

    #[test]
    fn arithmetic_results() {
        assert_eq!(render("${2 + 3 * 4}"), "14");
        assert_eq!(render("${5 / 0}"), "Infinity");
        assert_eq!(render("${-5 / 0}"), "-Infinity");
        assert_eq!(render("${0 / 0}"), "NaN");
        assert_eq!(render("${(2 + 3) * 4}"), "20");
        assert_eq!(render("${10 - 4 - 3}"), "3");
        assert_eq!(render("${2 ** 3 ** 2}"), "64");
        assert_eq!(render("${0.1 + 0.2}"), "0.30000000000000004");
    }

    #[test]
    fn plus_dispatches_on_resolved_types() {
        let numbers = Value::object([("$a", 5), ("$b", 3)]);
        assert_eq!(eval("this.$a + this.$b", &numbers), Value::from(8));

        let strings = Value::object([("$str1", "Hello"), ("$str2", "World")]);
        assert_eq!(
            eval("this.$str1 + this.$str2", &strings),
            Value::from("HelloWorld")
        );

        assert_eq!(eval("'n=' + 1 + 2", &Value::Undefined), Value::from("n=12"));
        assert_eq!(eval("1 + 2 + 'px'", &Value::Undefined), Value::from("3px"));
    }

    #[test]
    fn missing_properties_degrade_softly() {
        let ctx = Value::object([("a", 1)]);
        assert_eq!(eval("this.missing", &ctx), Value::Undefined);
        assert_eq!(eval("this.missing.deeper", &ctx), Value::Undefined);
        assert!(eval("this.missing * 2", &ctx).as_number().is_some_and(f64::is_nan));
        assert_eq!(eval("this.missing || 'none'", &ctx), Value::from("none"));
    }

    #[test]
    fn comparisons_and_ternary() {
        let ctx = Value::object([("n", Value::from(3)), ("s", Value::from("3"))]);
        assert_eq!(eval("this.n == this.s", &ctx), Value::from(true));
        assert_eq!(eval("this.n === this.s", &ctx), Value::from(false));
        assert_eq!(eval("this.n < 10 && this.s != ''", &ctx).as_bool(), Some(true));
        assert_eq!(eval("this.n > 2 ? 'big' : 'small'", &ctx), Value::from("big"));
        assert_eq!(
            eval("this.n > 5 ? 'big' : this.n > 1 ? 'mid' : 'small'", &ctx),
            Value::from("mid")
        );
    }

    #[test]
    fn literals_build_values() {
        let ctx = Value::object([("x", 2)]);
        assert_eq!(
            eval("[1, this.x, 'three']", &ctx),
            Value::array([Value::from(1), Value::from(2), Value::from("three")])
        );
        assert_eq!(eval("[]", &ctx), Value::array(Vec::<Value>::new()));
    }

    #[test]
    fn object_literal() {
        let ctx = Value::object([("x", 2)]);
        assert_eq!(
            eval("{w: this.x * 10, unit: 'px'}", &ctx),
            Value::object([("w", Value::from(20)), ("unit", Value::from("px"))])
        );
    }

    #[test]
    fn signals_in_context_are_unwrapped() {
        let rt = Runtime::new();
        let count = rt.create_signal(4);
        let ctx = Value::object([("$count", count)]);
        let expr = parse_expression("this.$count ** 2").unwrap();
        assert_eq!(evaluate(&rt, &expr, &ctx).unwrap(), Value::from(16));
    }

    #[test]
    fn untaken_branch_is_not_evaluated() {
        let rt = Runtime::new();
        let flag = rt.create_signal(true);
        let other = rt.create_signal("other");
        let ctx = Value::object([("flag", Value::from(flag)), ("other", Value::from(other))]);
        let expr = Rc::new(parse_expression("this.flag ? 'yes' : this.other").unwrap());

        let runs = Rc::new(Cell::new(0));
        let (runs_c, expr_c, ctx_c) = (runs.clone(), expr.clone(), ctx.clone());
        let computed = rt.create_computed(move |rt| {
            runs_c.set(runs_c.get() + 1);
            evaluate(rt, &expr_c, &ctx_c)
        });
        assert_eq!(computed.get(&rt).unwrap(), Value::from("yes"));
        assert_eq!(computed.source_count(&rt), 1);

        other.set(&rt, "changed").unwrap();
        assert_eq!(computed.get(&rt).unwrap(), Value::from("yes"));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn short_circuit_skips_right_operand() {
        let rt = Runtime::new();
        let right = rt.create_signal(1);
        let ctx = Value::object([("r", right)]);
        let expr = parse_expression("false && this.r").unwrap();
        let computed = rt.create_computed(move |rt| evaluate(rt, &expr, &ctx));
        assert_eq!(computed.get(&rt).unwrap(), Value::from(false));
        assert_eq!(computed.source_count(&rt), 0);
    }

    #[test]
    fn pure_expression_keeps_native_type() {
        let rt = Runtime::new();
        let ctx = Value::object([("n", 2)]);
        let pure = parse_template_literal("${this.n * 2}").unwrap();
        let mixed = parse_template_literal("n=${this.n * 2}").unwrap();
        assert_eq!(evaluate_template(&rt, &pure, &ctx).unwrap(), Value::from(4));
        assert_eq!(
            evaluate_template(&rt, &mixed, &ctx).unwrap(),
            Value::from("n=4")
        );
    }

    #[test]
    fn disposed_signal_is_an_error() {
        let rt = Runtime::new();
        let scope = rt.create_scope();
        let s = rt.create_signal(1);
        let c = rt.create_computed_in(scope, move |rt| s.get(rt)).unwrap();
        let ctx = Value::object([("c", c)]);
        scope.dispose(&rt);
        let expr = parse_expression("this.c + 1").unwrap();
        assert_eq!(
            evaluate(&rt, &expr, &ctx),
            Err(ReactiveError::DisposedAccess { node: "computed" })
        );
    }
}
