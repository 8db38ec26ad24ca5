//! Generic AST traversal with per-kind handlers.
//!
//! Each node is offered to its handler twice: pre-order (`start = true`) and,
//! after its children, post-order (`start = false`). The pre-order return
//! value steers the walk:
//!
//! - [`VisitorStrategy::Recurse`]: visit children, then make the post-order
//!   call.
//! - [`VisitorStrategy::Continue`]: skip the children *and* the post-order
//!   call. Handlers that walked the relevant children themselves return this.
//! - [`VisitorStrategy::Break`]: abort the entire traversal.
//!
//! The post-order call exists for cleanup duties (clearing the
//! in-creation environment after a pattern, dropping shadowed YIELD names
//! after a CALL); collapsing it into the pre-order call would lose those.

use crate::ast::{AstNode, NodeKind};

use super::clauses;
use super::context::ValidationCtx;
use super::errors::ValidationError;
use super::expressions;
use super::patterns;

/// Handler verdict for a pre-order visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorStrategy {
    Recurse,
    Continue,
    Break,
}

pub type Handler = fn(&AstNode, bool, &mut ValidationCtx) -> VisitorStrategy;

fn default_visit(_node: &AstNode, _start: bool, _ctx: &mut ValidationCtx) -> VisitorStrategy {
    VisitorStrategy::Recurse
}

fn visit_unsupported(node: &AstNode, start: bool, ctx: &mut ValidationCtx) -> VisitorStrategy {
    if start {
        ctx.fail(ValidationError::UnsupportedAstNode(node.kind().to_string()));
    }
    VisitorStrategy::Break
}

/// Handler registered for a node kind. The table is fixed: kinds without a
/// dedicated handler recurse, legacy kinds break with an "unsupported"
/// diagnostic.
pub fn handler_for(kind: NodeKind) -> Handler {
    match kind {
        NodeKind::Match => clauses::validate_match_clause,
        NodeKind::Create => clauses::validate_create_clause,
        NodeKind::Merge => clauses::validate_merge_clause,
        NodeKind::OnCreate => clauses::validate_on_create_clause,
        NodeKind::OnMatch => clauses::validate_on_match_clause,
        NodeKind::With => clauses::validate_with_clause,
        NodeKind::Return => clauses::validate_return_clause,
        NodeKind::Union => clauses::validate_union_clause,
        NodeKind::Unwind => clauses::validate_unwind_clause,
        NodeKind::Call => clauses::validate_call_clause,
        NodeKind::Delete => clauses::validate_delete_clause,
        NodeKind::Set => clauses::validate_set_clause,
        NodeKind::SetProperty => clauses::validate_set_property,
        NodeKind::Foreach => clauses::validate_foreach_clause,
        NodeKind::CreatePatternPropsIndex => clauses::validate_index_creation,

        NodeKind::Pattern => patterns::validate_pattern,
        NodeKind::PatternPath => patterns::validate_pattern_path,
        NodeKind::NodePattern => patterns::validate_node_pattern,
        NodeKind::RelPattern => patterns::validate_rel_pattern,
        NodeKind::NamedPath => patterns::validate_named_path,
        NodeKind::ShortestPath => patterns::validate_shortest_path,

        NodeKind::Identifier => expressions::validate_identifier,
        NodeKind::Map => expressions::validate_map,
        NodeKind::Projection => expressions::validate_projection,
        NodeKind::ApplyOperator => expressions::validate_apply_operator,
        NodeKind::ApplyAllOperator => expressions::validate_apply_all_operator,
        NodeKind::Reduce => expressions::validate_reduce,
        NodeKind::BinaryOperator => expressions::validate_binary_operator,
        NodeKind::ListComprehension
        | NodeKind::Any
        | NodeKind::All
        | NodeKind::None
        | NodeKind::Single => expressions::validate_list_comprehension,
        NodeKind::PatternComprehension => expressions::validate_pattern_comprehension,

        NodeKind::Start
        | NodeKind::Filter
        | NodeKind::Extract
        | NodeKind::Command
        | NodeKind::LoadCsv
        | NodeKind::MatchHint
        | NodeKind::UsingJoin
        | NodeKind::UsingScan
        | NodeKind::IndexName
        | NodeKind::RelIdLookup
        | NodeKind::AllRelsScan
        | NodeKind::UsingIndex
        | NodeKind::StartPoint
        | NodeKind::RemoveItem
        | NodeKind::QueryOption
        | NodeKind::RelIndexQuery
        | NodeKind::ExplainOption
        | NodeKind::ProfileOption
        | NodeKind::SchemaCommand
        | NodeKind::NodeIdLookup
        | NodeKind::AllNodesScan
        | NodeKind::RelIndexLookup
        | NodeKind::NodeIndexQuery
        | NodeKind::NodeIndexLookup
        | NodeKind::UsingPeriodicCommit
        | NodeKind::DropRelPropConstraint
        | NodeKind::DropNodePropConstraint
        | NodeKind::CreateRelPropConstraint
        | NodeKind::CreateNodePropConstraint => visit_unsupported,

        _ => default_visit,
    }
}

/// Depth-first walk from `node`. A no-op once the context is stopped, so
/// handlers that visit children manually can call this unconditionally.
pub fn traverse(node: &AstNode, ctx: &mut ValidationCtx) {
    if ctx.stopped() {
        return;
    }

    let handler = handler_for(node.kind());
    match handler(node, true, ctx) {
        VisitorStrategy::Break => ctx.stop(),
        VisitorStrategy::Continue => {}
        VisitorStrategy::Recurse => {
            for child in node.children() {
                traverse(child, ctx);
                if ctx.stopped() {
                    return;
                }
            }
            if let VisitorStrategy::Break = handler(node, false, ctx) {
                ctx.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::BuiltinFunctionRegistry;
    use crate::procedures::BuiltinProcedureRegistry;

    const UNSUPPORTED: &[NodeKind] = &[
        NodeKind::Start,
        NodeKind::Filter,
        NodeKind::Extract,
        NodeKind::Command,
        NodeKind::LoadCsv,
        NodeKind::MatchHint,
        NodeKind::UsingJoin,
        NodeKind::UsingScan,
        NodeKind::IndexName,
        NodeKind::RelIdLookup,
        NodeKind::AllRelsScan,
        NodeKind::UsingIndex,
        NodeKind::StartPoint,
        NodeKind::RemoveItem,
        NodeKind::QueryOption,
        NodeKind::RelIndexQuery,
        NodeKind::ExplainOption,
        NodeKind::ProfileOption,
        NodeKind::SchemaCommand,
        NodeKind::NodeIdLookup,
        NodeKind::AllNodesScan,
        NodeKind::RelIndexLookup,
        NodeKind::NodeIndexQuery,
        NodeKind::NodeIndexLookup,
        NodeKind::UsingPeriodicCommit,
        NodeKind::DropRelPropConstraint,
        NodeKind::DropNodePropConstraint,
        NodeKind::CreateRelPropConstraint,
        NodeKind::CreateNodePropConstraint,
    ];

    #[test]
    fn unsupported_kinds_emit_a_diagnostic_and_break() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        for kind in UNSUPPORTED {
            let node = AstNode::Unsupported {
                kind: *kind,
                children: vec![],
            };
            let mut ctx = ValidationCtx::new(&procedures, &functions);
            traverse(&node, &mut ctx);
            assert_eq!(
                ctx.into_result(),
                Err(ValidationError::UnsupportedAstNode(kind.to_string())),
                "kind {kind} should be rejected"
            );
        }
    }

    #[test]
    fn literals_and_parameters_walk_through() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let node = AstNode::List {
            elements: vec![
                AstNode::Literal(crate::ast::Literal::Integer(1)),
                AstNode::Parameter { name: "p".into() },
            ],
        };
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        traverse(&node, &mut ctx);
        assert!(ctx.into_result().is_ok());
    }

    #[test]
    fn traversal_stops_at_the_first_diagnostic() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        // Both list elements are invalid; only the first may report.
        let node = AstNode::List {
            elements: vec![
                AstNode::Identifier { name: "a".into() },
                AstNode::Identifier { name: "b".into() },
            ],
        };
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        traverse(&node, &mut ctx);
        assert_eq!(
            ctx.into_result(),
            Err(ValidationError::NotDefined("a".into()))
        );
    }
}
