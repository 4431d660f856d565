//! Reactive template bindings.
//!
//! The free functions ([`bind_template`], [`bind_attribute_template`],
//! [`bind_property_template`]) create unowned computeds. A [`Binder`] creates
//! them inside a [`Scope`](crate::reactive::Scope) and attaches them to
//! [`Sink`]s, so the whole set is torn down with the scope.

pub mod binder;
pub mod sink;

pub use binder::{
    bind_attribute_template, bind_property_template, bind_template, Attachment, Binder,
    BindingKind,
};
pub use sink::Sink;
