//! Statement-side processing: everything that happens to SQL text
//! before it reaches the wire.

pub mod sql;

pub use sql::{Classifier, ClassifierContext, NativeKind, Statement};
