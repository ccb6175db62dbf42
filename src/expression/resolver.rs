//! Late binding of identifier operands.
//!
//! A tree only records variable names. Values are looked up at evaluation time
//! through a [`Resolver`] supplied by the caller, optionally with the opaque
//! [`DataSource`] handle installed on the identifier node.

use crate::expression::value::Var;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque handle to whatever a resolver reads values from (a row, a record...)
pub type DataSource = Arc<dyn Any + Send + Sync>;

/// A record keyed by field name; also usable as a [`DataSource`]
pub type Record = HashMap<String, Var>;

/// Supplies values for identifier operands.
///
/// Return [`Var::Invalid`] when the name cannot be resolved; the failure then
/// propagates up the tree instead of aborting evaluation.
pub trait Resolver {
    fn resolve(&self, name: &str, source: Option<&DataSource>) -> Var;
}

impl<F> Resolver for F
where
    F: Fn(&str, Option<&DataSource>) -> Var,
{
    fn resolve(&self, name: &str, source: Option<&DataSource>) -> Var {
        self(name, source)
    }
}

impl Resolver for HashMap<String, Var> {
    fn resolve(&self, name: &str, _source: Option<&DataSource>) -> Var {
        self.get(name).cloned().unwrap_or(Var::Invalid)
    }
}

/// Resolver for trees that must not depend on external values
pub struct NoResolver;

impl Resolver for NoResolver {
    fn resolve(&self, _name: &str, _source: Option<&DataSource>) -> Var {
        Var::Invalid
    }
}

/// Reads the field named by the identifier out of the node's own data source,
/// which must be a [`Record`].
pub struct RecordResolver;

impl Resolver for RecordResolver {
    fn resolve(&self, name: &str, source: Option<&DataSource>) -> Var {
        source
            .and_then(|source| source.downcast_ref::<Record>())
            .and_then(|record| record.get(name))
            .cloned()
            .unwrap_or(Var::Invalid)
    }
}
