//! Mutable state carried through a single validation walk.

use std::collections::HashMap;

use crate::ast::NodeKind;
use crate::functions::FunctionRegistry;
use crate::procedures::ProcedureRegistry;

use super::errors::ValidationError;

/// What an identifier is currently bound to. Expression-produced names
/// (e.g. `WITH 1 AS x`) are `Untyped`; an absent binding is represented by
/// `Option::None` at the lookup site, never by `Untyped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Untyped,
    Node,
    Edge,
    Path,
}

/// Bound-identifier environment: name to kind, last write wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    bindings: HashMap<String, IdentifierKind>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn insert(&mut self, name: &str, kind: IdentifierKind) {
        self.bindings.insert(name.to_string(), kind);
    }

    /// Insert only if absent; returns whether the name was newly added.
    pub fn try_insert(&mut self, name: &str, kind: IdentifierKind) -> bool {
        if self.bindings.contains_key(name) {
            return false;
        }
        self.bindings.insert(name.to_string(), kind);
        true
    }

    pub fn find(&self, name: &str) -> Option<IdentifierKind> {
        self.bindings.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// UNION flavour, pinned by the first UNION clause of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionMode {
    Undefined,
    Union,
    UnionAll,
}

/// Per-call context threaded through the visitor. Owns the environments and
/// the single error slot; borrows the registries from the caller.
pub struct ValidationCtx<'a> {
    /// Identifiers bound at the current program point.
    pub defined: Environment,
    /// Entities being created by the pattern currently under traversal;
    /// cleared when the pattern is left.
    pub intermediate: Environment,
    /// Enclosing top-level clause; handlers adjust policy on it.
    pub clause: NodeKind,
    pub union_mode: UnionMode,
    pub procedures: &'a dyn ProcedureRegistry,
    pub functions: &'a dyn FunctionRegistry,
    error: Option<ValidationError>,
    broken: bool,
}

impl<'a> ValidationCtx<'a> {
    pub fn new(
        procedures: &'a dyn ProcedureRegistry,
        functions: &'a dyn FunctionRegistry,
    ) -> Self {
        ValidationCtx {
            defined: Environment::new(),
            intermediate: Environment::new(),
            // No handler compares against Query; it only marks "no clause
            // entered yet".
            clause: NodeKind::Query,
            union_mode: UnionMode::Undefined,
            procedures,
            functions,
            error: None,
            broken: false,
        }
    }

    /// Record a diagnostic. The first one sticks; later calls are ignored so
    /// exactly one message reaches the caller.
    pub fn fail(&mut self, error: ValidationError) {
        if self.error.is_none() {
            log::debug!("validation failed: {error}");
            self.error = Some(error);
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Abort the walk without recording a diagnostic.
    pub(super) fn stop(&mut self) {
        self.broken = true;
    }

    /// Whether the walk must not proceed (diagnostic recorded, or a handler
    /// broke out without one).
    pub fn stopped(&self) -> bool {
        self.broken || self.error.is_some()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_distinct_from_untyped() {
        let mut env = Environment::new();
        assert_eq!(env.find("n"), None);
        env.insert("n", IdentifierKind::Untyped);
        assert_eq!(env.find("n"), Some(IdentifierKind::Untyped));
    }

    #[test]
    fn insert_overwrites_try_insert_does_not() {
        let mut env = Environment::new();
        assert!(env.try_insert("n", IdentifierKind::Node));
        assert!(!env.try_insert("n", IdentifierKind::Edge));
        assert_eq!(env.find("n"), Some(IdentifierKind::Node));
        env.insert("n", IdentifierKind::Edge);
        assert_eq!(env.find("n"), Some(IdentifierKind::Edge));
    }

    #[test]
    fn clone_is_independent() {
        let mut original = Environment::new();
        original.insert("a", IdentifierKind::Node);
        let mut cloned = original.clone();
        cloned.insert("b", IdentifierKind::Edge);
        cloned.remove("a");
        assert_eq!(original.find("a"), Some(IdentifierKind::Node));
        assert_eq!(original.find("b"), None);
        assert_eq!(cloned.find("b"), Some(IdentifierKind::Edge));
    }

    #[test]
    fn first_error_sticks() {
        use crate::functions::BuiltinFunctionRegistry;
        use crate::procedures::BuiltinProcedureRegistry;

        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        ctx.fail(ValidationError::NotDefined("x".into()));
        ctx.fail(ValidationError::EmptyQuery);
        assert_eq!(
            ctx.into_result(),
            Err(ValidationError::NotDefined("x".into()))
        );
    }
}
