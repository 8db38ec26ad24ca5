//! Expression-level validation: identifier references, function calls and
//! the scoped sub-expressions (comprehensions, reduce).

use crate::ast::{AstNode, BinaryOp, NodeKind};
use crate::functions::FunctionRegistry;

use super::context::{IdentifierKind, ValidationCtx};
use super::errors::ValidationError;
use super::visitor::{traverse, VisitorStrategy};

pub(super) fn validate_identifier(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Identifier { name } = node else {
        return VisitorStrategy::Recurse;
    };

    // MATCH (n) DELETE x
    if ctx.defined.find(name).is_none() {
        ctx.fail(ValidationError::NotDefined(name.clone()));
        return VisitorStrategy::Break;
    }

    // an entity still being created by the current pattern cannot be read:
    // CREATE (a {v:0}), ()-[:R {k:toJSON(a)}]->()
    if matches!(ctx.intermediate.find(name), Some(kind) if kind != IdentifierKind::Untyped) {
        ctx.fail(ValidationError::NotDefined(name.clone()));
        return VisitorStrategy::Break;
    }

    VisitorStrategy::Recurse
}

/// Map values are expressions; keys are plain property names and carry no
/// bindings.
pub(super) fn validate_map(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::Map { entries } = node else {
        return VisitorStrategy::Recurse;
    };
    for (_key, value) in entries {
        traverse(value, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }
    VisitorStrategy::Continue
}

/// Only the projected expression is a reference; the alias is introduced by
/// the enclosing clause handler.
pub(super) fn validate_projection(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::Projection { expression, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    traverse(expression, ctx);
    if ctx.has_error() {
        return VisitorStrategy::Break;
    }
    VisitorStrategy::Continue
}

fn validate_function_call(
    name: &str,
    include_aggregates: bool,
    functions: &dyn FunctionRegistry,
) -> Result<(), ValidationError> {
    if !functions.exists(name) {
        return Err(ValidationError::UnknownFunction(name.to_string()));
    }
    if !include_aggregates && functions.is_aggregate(name) {
        return Err(ValidationError::InvalidAggregateUse(name.to_string()));
    }
    Ok(())
}

pub(super) fn validate_apply_operator(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::ApplyOperator { func_name, .. } = node else {
        return VisitorStrategy::Recurse;
    };

    // aggregations only make sense under a projecting clause:
    // MATCH (m:P)--(y:P) WITH m.age AS age, count(y.age) AS cnt ...
    let include_aggregates = matches!(
        ctx.clause,
        NodeKind::With | NodeKind::ApplyOperator | NodeKind::Return
    );
    let functions = ctx.functions;
    if let Err(error) = validate_function_call(func_name, include_aggregates, functions) {
        ctx.fail(error);
        return VisitorStrategy::Break;
    }

    VisitorStrategy::Recurse
}

pub(super) fn validate_apply_all_operator(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::ApplyAllOperator {
        func_name,
        distinct,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    if !func_name.eq_ignore_ascii_case("COUNT") {
        ctx.fail(ValidationError::ApplyAllNotCount);
        return VisitorStrategy::Break;
    }

    if *distinct {
        ctx.fail(ValidationError::DistinctStarCount);
        return VisitorStrategy::Break;
    }

    VisitorStrategy::Recurse
}

/// `reduce(acc = init, var IN list | eval)` introduces `acc` and `var` for
/// the eval expression only, and forbids aggregations inside it.
pub(super) fn validate_reduce(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Reduce {
        accumulator,
        init,
        identifier,
        expression,
        eval,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    let orig_clause = ctx.clause;
    ctx.clause = NodeKind::Reduce;

    // the init expression must be a known variable or a valid expression
    if let AstNode::Identifier { name } = init.as_ref() {
        if ctx.defined.find(name).is_none() {
            ctx.fail(ValidationError::NotDefined(name.clone()));
            return VisitorStrategy::Break;
        }
    } else {
        traverse(init, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    // same for the list expression
    if let AstNode::Identifier { name } = expression.as_ref() {
        if ctx.defined.find(name).is_none() {
            ctx.fail(ValidationError::NotDefined(name.clone()));
            return VisitorStrategy::Break;
        }
    }
    traverse(expression, ctx);
    if ctx.has_error() {
        return VisitorStrategy::Break;
    }

    let Some(eval) = eval else {
        ctx.fail(ValidationError::ReduceMissingEval);
        return VisitorStrategy::Break;
    };

    // accumulator and loop variable are visible to the eval expression only;
    // names that already exist keep their binding afterwards
    let introduce_accum = match accumulator.identifier_name() {
        Some(name) if ctx.defined.find(name).is_none() => {
            ctx.defined.insert(name, IdentifierKind::Untyped);
            Some(name.to_string())
        }
        _ => None,
    };
    let introduce_var = match identifier.identifier_name() {
        Some(name) if ctx.defined.find(name).is_none() => {
            ctx.defined.insert(name, IdentifierKind::Untyped);
            Some(name.to_string())
        }
        _ => None,
    };

    traverse(eval, ctx);
    if ctx.has_error() {
        return VisitorStrategy::Break;
    }

    ctx.clause = orig_clause;

    if let Some(name) = introduce_accum {
        ctx.defined.remove(&name);
    }
    if let Some(name) = introduce_var {
        ctx.defined.remove(&name);
    }

    VisitorStrategy::Continue
}

/// `[x IN xs WHERE pred | eval]` and the ANY/ALL/NONE/SINGLE predicates: the
/// loop variable lives in a scoped copy of the environment.
pub(super) fn validate_list_comprehension(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::ListComprehension {
        identifier,
        expression,
        predicate,
        eval,
        ..
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    let orig_env = ctx.defined.clone();

    // a colliding outer name is shadowed inside the comprehension
    if let Some(name) = identifier.identifier_name() {
        ctx.defined.insert(name, IdentifierKind::Untyped);
    }

    for part in [expression, predicate, eval].into_iter().flatten() {
        traverse(part, ctx);
        if ctx.has_error() {
            break;
        }
    }

    ctx.defined = orig_env;

    if ctx.has_error() {
        VisitorStrategy::Break
    } else {
        VisitorStrategy::Continue
    }
}

/// `[p = (a)-[e]->(f) WHERE pred | eval]`: the pattern may introduce new
/// names, so it is visited in pattern-comprehension mode instead of being
/// reference-checked; everything stays local to a scoped environment.
pub(super) fn validate_pattern_comprehension(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::PatternComprehension {
        identifier,
        pattern,
        predicate,
        eval,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    let orig_env = ctx.defined.clone();

    if let Some(path_id) = identifier {
        // MATCH (a) RETURN [a=()-[]->() | 0] -- 'a' is shadowed locally
        if let Some(name) = path_id.identifier_name() {
            ctx.defined.insert(name, IdentifierKind::Path);
        }
    }

    let clause_backup = ctx.clause;
    ctx.clause = NodeKind::PatternComprehension;
    traverse(pattern, ctx);
    ctx.clause = clause_backup;

    if !ctx.has_error() {
        if let Some(predicate) = predicate {
            // MATCH (a) RETURN [(a)-[:R]->() WHERE u | 0]
            traverse(predicate, ctx);
        }
    }

    if !ctx.has_error() {
        // MATCH (a) RETURN [(a)-[:R]->() | u]
        traverse(eval, ctx);
    }

    ctx.defined = orig_env;

    if ctx.has_error() {
        VisitorStrategy::Break
    } else {
        VisitorStrategy::Continue
    }
}

pub(super) fn validate_binary_operator(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::BinaryOperator { op, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    match op {
        BinaryOp::Subscript | BinaryOp::MapProjection | BinaryOp::Regex => {
            ctx.fail(ValidationError::UnsupportedOperator(op.to_string()));
            VisitorStrategy::Break
        }
        _ => VisitorStrategy::Recurse,
    }
}

/// Property maps inlined in node and relationship patterns. Returns false
/// when a diagnostic was recorded.
pub(super) fn validate_inlined_properties(
    properties: Option<&AstNode>,
    alias: Option<&str>,
    ctx: &mut ValidationCtx,
) -> bool {
    let Some(properties) = properties else {
        return true;
    };

    // MATCH (p {invalid_property_construction}) RETURN p
    let AstNode::Map { entries } = properties else {
        ctx.fail(ValidationError::UnhandledInlinedPropertyType);
        return false;
    };

    for (_key, value) in entries {
        match value {
            AstNode::PatternPath { .. } => {
                // MATCH (a {prop: ()-[]->()}) RETURN a
                ctx.fail(ValidationError::UnhandledInlinedPropertyType);
                return false;
            }
            AstNode::Identifier { name } => {
                // CREATE (a {name: missing})
                let kind = ctx.defined.find(name);
                if kind.is_none() {
                    ctx.fail(ValidationError::NotDefined(name.clone()));
                    return false;
                }
                // CREATE (a:A)-[:R]->(b:B {v:a})
                if matches!(
                    ctx.intermediate.find(name),
                    Some(k) if k != IdentifierKind::Untyped
                ) {
                    ctx.fail(ValidationError::NotDefined(name.clone()));
                    return false;
                }
                // CREATE (a:A) WITH a CREATE (b:B {v:a})
                if matches!(
                    kind,
                    Some(IdentifierKind::Node) | Some(IdentifierKind::Edge)
                ) {
                    ctx.fail(ValidationError::NonPrimitivePropertyValue);
                    return false;
                }
            }
            AstNode::PropertyOperator { expression, .. } => {
                if let AstNode::Identifier { name } = expression.as_ref() {
                    // a property of the entity under creation itself:
                    // CREATE (a {v:a.p})
                    // CREATE ()-[r {v:r.x}]->()
                    if ctx.clause != NodeKind::Match && alias == Some(name.as_str()) {
                        ctx.fail(ValidationError::NotDefined(name.clone()));
                        return false;
                    }
                    // a property of a sibling entity under creation:
                    // CREATE (a:A), (b:B {v:a.v})
                    if matches!(
                        ctx.intermediate.find(name),
                        Some(IdentifierKind::Node) | Some(IdentifierKind::Edge)
                    ) {
                        ctx.fail(ValidationError::NotDefined(name.clone()));
                        return false;
                    }
                }
            }
            AstNode::SubscriptOperator { expression, .. } => {
                if let AstNode::Identifier { name } = expression.as_ref() {
                    // CREATE ({v:bar[0]})
                    if ctx.defined.find(name).is_none() {
                        ctx.fail(ValidationError::NotDefined(name.clone()));
                        return false;
                    }
                }
            }
            other => {
                traverse(other, ctx);
                if ctx.has_error() {
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ComprehensionForm, Literal};
    use crate::functions::BuiltinFunctionRegistry;
    use crate::procedures::BuiltinProcedureRegistry;

    fn ident(name: &str) -> AstNode {
        AstNode::Identifier { name: name.into() }
    }

    #[test]
    fn comprehension_scope_is_restored() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        ctx.defined.insert("xs", IdentifierKind::Untyped);

        let comprehension = AstNode::ListComprehension {
            form: ComprehensionForm::ListComprehension,
            identifier: Box::new(ident("x")),
            expression: Some(Box::new(ident("xs"))),
            predicate: None,
            eval: Some(Box::new(ident("x"))),
        };
        assert_eq!(
            validate_list_comprehension(&comprehension, true, &mut ctx),
            VisitorStrategy::Continue
        );
        // the loop variable does not leak
        assert_eq!(ctx.defined.find("x"), None);
        assert!(!ctx.has_error());
    }

    #[test]
    fn reduce_requires_an_eval_expression() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);

        let reduce = AstNode::Reduce {
            accumulator: Box::new(ident("acc")),
            init: Box::new(AstNode::Literal(Literal::Integer(0))),
            identifier: Box::new(ident("v")),
            expression: Box::new(AstNode::List { elements: vec![] }),
            eval: None,
        };
        assert_eq!(
            validate_reduce(&reduce, true, &mut ctx),
            VisitorStrategy::Break
        );
        assert_eq!(
            ctx.into_result(),
            Err(ValidationError::ReduceMissingEval)
        );
    }

    #[test]
    fn reduce_keeps_preexisting_bindings() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        ctx.defined.insert("acc", IdentifierKind::Untyped);

        let reduce = AstNode::Reduce {
            accumulator: Box::new(ident("acc")),
            init: Box::new(AstNode::Literal(Literal::Integer(0))),
            identifier: Box::new(ident("v")),
            expression: Box::new(AstNode::List { elements: vec![] }),
            eval: Some(Box::new(ident("acc"))),
        };
        assert_eq!(
            validate_reduce(&reduce, true, &mut ctx),
            VisitorStrategy::Continue
        );
        assert_eq!(ctx.defined.find("acc"), Some(IdentifierKind::Untyped));
        assert_eq!(ctx.defined.find("v"), None);
    }

    #[test]
    fn star_argument_is_count_only() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();

        let mut ctx = ValidationCtx::new(&procedures, &functions);
        let collect_star = AstNode::ApplyAllOperator {
            func_name: "collect".into(),
            distinct: false,
        };
        assert_eq!(
            validate_apply_all_operator(&collect_star, true, &mut ctx),
            VisitorStrategy::Break
        );
        assert_eq!(ctx.into_result(), Err(ValidationError::ApplyAllNotCount));

        let mut ctx = ValidationCtx::new(&procedures, &functions);
        let count_distinct_star = AstNode::ApplyAllOperator {
            func_name: "Count".into(),
            distinct: true,
        };
        assert_eq!(
            validate_apply_all_operator(&count_distinct_star, true, &mut ctx),
            VisitorStrategy::Break
        );
        assert_eq!(ctx.into_result(), Err(ValidationError::DistinctStarCount));
    }

    #[test]
    fn unsupported_binary_operators_break() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);
        ctx.defined.insert("a", IdentifierKind::Untyped);

        let regex = AstNode::BinaryOperator {
            op: BinaryOp::Regex,
            left: Box::new(ident("a")),
            right: Box::new(AstNode::Literal(Literal::String("x.*".into()))),
        };
        assert_eq!(
            validate_binary_operator(&regex, true, &mut ctx),
            VisitorStrategy::Break
        );
        assert_eq!(
            ctx.into_result(),
            Err(ValidationError::UnsupportedOperator("=~".into()))
        );
    }
}
