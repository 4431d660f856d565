//! # vellum
//!
//! Reactive template expressions for declarative UI.
//!
//! vellum parses strings with embedded `${expression}` regions, evaluates them
//! against a binding context made of plain values and reactive cells, and keeps
//! the result up to date through a fine-grained, glitch-free signal graph. The
//! rendering layer plugs in through [`Sink`]s.
//!
//! ```ignore
//! use vellum::{parse_template_literal, Binder, BindingKind, Runtime, Value};
//! use std::rc::Rc;
//!
//! let rt = Runtime::new();
//! let count = rt.create_signal(2);
//! let ctx = Value::object([("$count", count)]);
//! let template = Rc::new(parse_template_literal("Count: ${this.$count ** 2}")?);
//!
//! let binder = Binder::new(&rt, rt.create_scope());
//! binder.bind_to(BindingKind::Text, &template, &ctx, |v: &Value| println!("{v}"))?;
//! count.set(&rt, 3)?; // prints "Count: 9"
//! ```
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: Signals, computeds, effects and watcher scopes on an explicit [`Runtime`]
//! - **[`accessor`]**: Property paths and fail-soft resolution through reactive cells
//! - **[`template`]**: `${}` scanning, logos tokenizer, precedence-climbing parser, parse cache
//! - **[`eval`]**: Expression evaluation and operator semantics
//! - **[`bind`]**: Template bindings, sinks and attachments
//! - **[`value`]**: The dynamic [`Value`] type
//! - **[`config`]**: Runtime configuration
//! - **[`testing`]**: Recording sink and one-shot rendering helpers

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Reactivity
pub mod reactive;

// Templates
pub mod accessor;
pub mod eval;
pub mod template;

// Binding
pub mod bind;

// Test support
pub mod testing;

pub use bind::{
    bind_attribute_template, bind_property_template, bind_template, Binder, BindingKind, Sink,
};
pub use config::{RuntimeConfig, WriteEquality};
pub use error::{Error, ReactiveError, Result, TemplateSyntaxError};
pub use reactive::{Computed, Effect, Runtime, Scope, Signal};
pub use template::{is_template_literal, parse_template_literal, ParsedTemplate, TemplateCache};
pub use value::Value;
