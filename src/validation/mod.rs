//! # Semantic validation
//!
//! Validation of a parsed statement runs in two stages:
//!
//! 1. **Structural passes** over the clause list (no environment needed):
//!    statement root shape, query termination, `WITH *`/`RETURN *` at the
//!    start, reading-after-updating and OPTIONAL MATCH ordering, UNION
//!    column agreement, and shortestPath placement.
//! 2. **Scoped walk**: a depth-first visitor over the body carrying a
//!    [`context::ValidationCtx`] — the bound-identifier environment, the
//!    entities the current pattern is creating, the enclosing clause and the
//!    query's UNION mode. Handlers are registered per node kind; the first
//!    diagnostic aborts the walk.
//!
//! Index creation and drop statements skip stage 1 (they have no clause
//! list) and only run the scoped walk.
//!
//! ## Module organisation
//!
//! - `errors.rs`: the diagnostic vocabulary (message text is wire contract)
//! - `context.rs`: environments and the per-call validation context
//! - `visitor.rs`: traversal driver and the kind-to-handler table
//! - `clauses.rs` / `patterns.rs` / `expressions.rs`: the handlers
//! - `structure.rs`: stage-1 passes and statement-option validation

pub mod context;
pub mod errors;
pub mod visitor;

mod clauses;
mod expressions;
mod patterns;
mod structure;

use crate::ast::{AstNode, NodeKind, ParseResult};
use crate::functions::FunctionRegistry;
use crate::procedures::ProcedureRegistry;

use context::ValidationCtx;
use visitor::traverse;

pub use errors::ValidationError;

/// Semantic validator for parsed statements. Holds the registries the CALL
/// and function checks consult; one instance serves any number of queries.
pub struct Validator<'a> {
    procedures: &'a dyn ProcedureRegistry,
    functions: &'a dyn FunctionRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(
        procedures: &'a dyn ProcedureRegistry,
        functions: &'a dyn FunctionRegistry,
    ) -> Self {
        Validator {
            procedures,
            functions,
        }
    }

    /// Validate a full parse result: locate the statement root (skipping
    /// comments) and validate it.
    pub fn validate_parse_result(&self, result: &ParseResult) -> Result<(), ValidationError> {
        let index = structure::validate_parse_result_root(result)?;
        self.validate_query(&result.roots[index])
    }

    /// Validate one statement.
    pub fn validate_query(&self, statement: &AstNode) -> Result<(), ValidationError> {
        let AstNode::Statement { body, .. } = statement else {
            return Err(ValidationError::UnsupportedQueryType(
                statement.kind().to_string(),
            ));
        };

        // index creation/drop bodies have no clause list to check
        if matches!(
            body.kind(),
            NodeKind::CreateNodePropsIndex
                | NodeKind::CreatePatternPropsIndex
                | NodeKind::DropPropsIndex
        ) {
            return self.validate_scopes(body);
        }

        let AstNode::Query { clauses } = body.as_ref() else {
            return Err(ValidationError::UnsupportedQueryType(
                body.kind().to_string(),
            ));
        };
        log::debug!("validating query with {} clauses", clauses.len());

        structure::validate_query_sequence(clauses)?;
        structure::validate_clause_order(clauses)?;
        structure::validate_union_clauses(clauses)?;

        if !structure::all_shortest_paths_well_placed(body) {
            return Err(ValidationError::AllShortestPathsPlacement);
        }
        if !structure::shortest_paths_well_placed(body) {
            return Err(ValidationError::ShortestPathPlacement);
        }

        self.validate_scopes(body)
    }

    /// Validate the parameter prefix of a statement (`CYPHER name=value ..`):
    /// no EXPLAIN/PROFILE options, no duplicated names, and all identifier
    /// references resolvable.
    pub fn validate_query_params(&self, result: &ParseResult) -> Result<(), ValidationError> {
        let index = structure::validate_parse_result_root(result)?;
        let statement = &result.roots[index];

        let AstNode::Statement { options, .. } = statement else {
            return Err(ValidationError::UnsupportedQueryType(
                statement.kind().to_string(),
            ));
        };
        if options.is_empty() {
            return Ok(());
        }

        structure::validate_params_only(options)?;
        structure::validate_duplicate_parameters(options)?;

        // re-run the scoped walk over the whole statement so identifiers in
        // parameter expressions are checked too
        let mut ctx = ValidationCtx::new(self.procedures, self.functions);
        traverse(statement, &mut ctx);
        ctx.into_result()
    }

    fn validate_scopes(&self, body: &AstNode) -> Result<(), ValidationError> {
        let mut ctx = ValidationCtx::new(self.procedures, self.functions);
        traverse(body, &mut ctx);
        ctx.into_result()
    }
}
