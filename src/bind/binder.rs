//! Template bindings: parsed templates turned into live computeds.

use std::rc::Rc;

use tracing::{debug, warn};

use super::sink::Sink;
use crate::error::ReactiveError;
use crate::eval::{evaluate_template, render_template};
use crate::reactive::{Computed, Effect, Runtime, Scope};
use crate::template::ParsedTemplate;
use crate::value::Value;

/// What a binding feeds, which decides how its result is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Text content. Always a string.
    Text,
    /// An attribute value. Always a string.
    Attribute,
    /// A property value. A pure `${expr}` template keeps the expression's
    /// native value; any other template is a string.
    Property,
}

fn compute_fn(
    kind: BindingKind,
    template: &Rc<ParsedTemplate>,
    context: &Value,
) -> impl FnMut(&Runtime) -> Result<Value, ReactiveError> + 'static {
    let template = Rc::clone(template);
    let context = context.clone();
    move |rt| {
        if let Some(text) = template.as_constant() {
            return Ok(Value::from(text));
        }
        match kind {
            BindingKind::Text | BindingKind::Attribute => {
                render_template(rt, &template, &context).map(Value::from)
            }
            BindingKind::Property => evaluate_template(rt, &template, &context),
        }
    }
}

/// Bind `template` to `context` as text. The computed is unowned: it lives
/// until [`Computed::dispose`].
pub fn bind_template(rt: &Runtime, template: &Rc<ParsedTemplate>, context: &Value) -> Computed {
    rt.create_computed(compute_fn(BindingKind::Text, template, context))
}

/// Like [`bind_template`], for an attribute value.
pub fn bind_attribute_template(
    rt: &Runtime,
    template: &Rc<ParsedTemplate>,
    context: &Value,
) -> Computed {
    rt.create_computed(compute_fn(BindingKind::Attribute, template, context))
}

/// Like [`bind_template`], for a property value. See [`BindingKind::Property`].
pub fn bind_property_template(
    rt: &Runtime,
    template: &Rc<ParsedTemplate>,
    context: &Value,
) -> Computed {
    rt.create_computed(compute_fn(BindingKind::Property, template, context))
}

// ---------------------------------------------------------------------------
// Binder
// ---------------------------------------------------------------------------

/// Creates bindings and attachments owned by one [`Scope`].
///
/// Disposing the scope tears down every computed and attachment created
/// through the binder.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'rt> {
    rt: &'rt Runtime,
    scope: Scope,
}

impl<'rt> Binder<'rt> {
    pub fn new(rt: &'rt Runtime, scope: Scope) -> Self {
        Self { rt, scope }
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.rt
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Bind `template` to `context`, owned by this binder's scope.
    pub fn bind(
        &self,
        kind: BindingKind,
        template: &Rc<ParsedTemplate>,
        context: &Value,
    ) -> Result<Computed, ReactiveError> {
        self.rt
            .create_computed_in(self.scope, compute_fn(kind, template, context))
    }

    /// Push `computed`'s value into `sink` now and after every change.
    ///
    /// A failed evaluation is logged and leaves the sink untouched.
    pub fn attach(
        &self,
        computed: Computed,
        mut sink: impl Sink + 'static,
    ) -> Result<Attachment, ReactiveError> {
        let effect = self.rt.create_effect(self.scope, move |rt| match computed.get(rt) {
            Ok(value) => sink.apply(&value),
            Err(error) => warn!(%error, ?computed, "binding evaluation failed"),
        })?;
        debug!(?computed, ?effect, "binding attached");
        Ok(Attachment { effect })
    }

    /// [`bind`](Self::bind) followed by [`attach`](Self::attach).
    pub fn bind_to(
        &self,
        kind: BindingKind,
        template: &Rc<ParsedTemplate>,
        context: &Value,
        sink: impl Sink + 'static,
    ) -> Result<Attachment, ReactiveError> {
        let computed = self.bind(kind, template, context)?;
        self.attach(computed, sink)
    }
}

/// A live connection between a binding and a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    effect: Effect,
}

impl Attachment {
    /// Stop pushing values. The bound computed is left alive.
    pub fn detach(&self, rt: &Runtime) {
        self.effect.dispose(rt);
    }

    pub fn is_attached(&self, rt: &Runtime) -> bool {
        !self.effect.is_disposed(rt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse_template_literal;
    use crate::testing::RecordingSink;
    use pretty_assertions::assert_eq;

    fn template(source: &str) -> Rc<ParsedTemplate> {
        Rc::new(parse_template_literal(source).unwrap())
    }

    #[test]
    fn constant_template_is_source() {
        let rt = Runtime::new();
        let c = bind_template(&rt, &template("plain text"), &Value::Undefined);
        assert_eq!(c.get(&rt).unwrap(), Value::from("plain text"));
        assert_eq!(c.source_count(&rt), 0);
    }

    #[test]
    fn text_binding_follows_signal() {
        let rt = Runtime::new();
        let count = rt.create_signal(2);
        let ctx = Value::object([("$count", count)]);
        let c = bind_template(&rt, &template("Count: ${this.$count ** 2}"), &ctx);
        assert_eq!(c.get(&rt).unwrap(), Value::from("Count: 4"));
        count.set(&rt, 3).unwrap();
        assert_eq!(c.get(&rt).unwrap(), Value::from("Count: 9"));
    }

    #[test]
    fn attribute_binding_is_stringified() {
        let rt = Runtime::new();
        let ctx = Value::object([("w", 10)]);
        let c = bind_attribute_template(&rt, &template("${this.w * 2}"), &ctx);
        assert_eq!(c.get(&rt).unwrap(), Value::from("20"));
    }

    #[test]
    fn property_binding_keeps_native_value() {
        let rt = Runtime::new();
        let ctx = Value::object([("w", 10)]);
        let pure = bind_property_template(&rt, &template("${this.w > 5}"), &ctx);
        let mixed = bind_property_template(&rt, &template("${this.w}px"), &ctx);
        assert_eq!(pure.get(&rt).unwrap(), Value::from(true));
        assert_eq!(mixed.get(&rt).unwrap(), Value::from("10px"));
    }

    #[test]
    fn one_template_many_contexts() {
        let rt = Runtime::new();
        let t = template("${this.name}!");
        let a = rt.create_signal("a");
        let b = rt.create_signal("b");
        let ca = bind_template(&rt, &t, &Value::object([("name", a)]));
        let cb = bind_template(&rt, &t, &Value::object([("name", b)]));
        a.set(&rt, "A").unwrap();
        assert_eq!(ca.get(&rt).unwrap(), Value::from("A!"));
        assert_eq!(cb.get(&rt).unwrap(), Value::from("b!"));
    }

    #[test]
    fn attach_pushes_initial_and_changed_values() {
        let rt = Runtime::new();
        let scope = rt.create_scope();
        let binder = Binder::new(&rt, scope);
        let name = rt.create_signal("Ada");
        let ctx = Value::object([("name", name)]);
        let sink = RecordingSink::new();

        binder
            .bind_to(BindingKind::Text, &template("Hi ${this.name}"), &ctx, sink.clone())
            .unwrap();
        name.set(&rt, "Grace").unwrap();
        name.set(&rt, "Grace").unwrap();

        assert_eq!(
            sink.values(),
            vec![Value::from("Hi Ada"), Value::from("Hi Grace")]
        );
    }

    #[test]
    fn detach_stops_updates() {
        let rt = Runtime::new();
        let binder = Binder::new(&rt, rt.create_scope());
        let n = rt.create_signal(1);
        let ctx = Value::object([("n", n)]);
        let sink = RecordingSink::new();
        let computed = binder
            .bind(BindingKind::Property, &template("${this.n}"), &ctx)
            .unwrap();
        let attachment = binder.attach(computed, sink.clone()).unwrap();
        assert!(attachment.is_attached(&rt));

        attachment.detach(&rt);
        n.set(&rt, 2).unwrap();
        assert!(!attachment.is_attached(&rt));
        assert_eq!(sink.values(), vec![Value::from(1)]);
        assert_eq!(computed.get(&rt).unwrap(), Value::from(2));
    }

    #[test]
    fn scope_disposal_tears_down_bindings() {
        let rt = Runtime::new();
        let scope = rt.create_scope();
        let binder = Binder::new(&rt, scope);
        let n = rt.create_signal(1);
        let ctx = Value::object([("n", n)]);
        let sink = RecordingSink::new();
        let attachment = binder
            .bind_to(BindingKind::Text, &template("${this.n}"), &ctx, sink.clone())
            .unwrap();

        scope.dispose(&rt);
        n.set(&rt, 5).unwrap();
        assert!(!attachment.is_attached(&rt));
        assert_eq!(n.subscriber_count(&rt), 0);
        assert_eq!(sink.values(), vec![Value::from("1")]);
        assert!(binder
            .bind(BindingKind::Text, &template("x"), &ctx)
            .is_err());
    }

    #[test]
    fn failed_evaluation_skips_sink() {
        let rt = Runtime::new();
        let binder = Binder::new(&rt, rt.create_scope());
        let inner = rt.create_scope();
        let s = rt.create_signal(1);
        let doomed = rt.create_computed_in(inner, move |rt| s.get(rt)).unwrap();
        let ctx = Value::object([("d", doomed)]);
        let bound = binder
            .bind(BindingKind::Text, &template("v=${this.d}"), &ctx)
            .unwrap();
        inner.dispose(&rt);

        let sink = RecordingSink::new();
        binder.attach(bound, sink.clone()).unwrap();
        assert!(sink.values().is_empty());
    }
}
