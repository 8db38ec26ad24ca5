//! ArcGraph semantic validation layer.
//!
//! This crate decides whether a parsed Cypher query is semantically
//! well-formed before it is handed to the planner:
//! - identifier bindings and their kinds (node / relationship / path)
//! - clause ordering and query termination
//! - pattern well-formedness (CREATE/MERGE restrictions, variable-length
//!   bounds, shortestPath placement)
//! - UNION column compatibility
//! - procedure-call arity and YIELD lists
//! - inline property-map restrictions
//!
//! The input is the AST produced by the parser (see [`ast`]); the output is
//! either `Ok(())` or a single user-facing [`validation::ValidationError`].
//! Queries are never executed or planned here.

pub mod ast;
pub mod functions;
pub mod procedures;
pub mod validation;

pub use validation::{ValidationError, Validator};
