//! Clause-level validation. Every handler records the clause it entered on
//! the context so nested pattern and expression handlers can adjust policy.

use crate::ast::{AstNode, NodeKind};
use crate::procedures::Arity;

use super::context::{Environment, IdentifierKind, UnionMode, ValidationCtx};
use super::errors::ValidationError;
use super::visitor::{traverse, VisitorStrategy};

/// Clauses allowed inside a FOREACH body.
const FOREACH_UPDATING_CLAUSES: &[NodeKind] = &[
    NodeKind::Create,
    NodeKind::Set,
    NodeKind::Remove,
    NodeKind::Merge,
    NodeKind::Delete,
    NodeKind::Foreach,
];

fn validate_limit_skip(
    limit: Option<&AstNode>,
    skip: Option<&AstNode>,
) -> Result<(), ValidationError> {
    // only the syntactic kind is checked here; value validation happens at
    // evaluation time
    if let Some(limit) = limit {
        if !matches!(limit.kind(), NodeKind::Integer | NodeKind::Parameter) {
            return Err(ValidationError::InvalidLimitValue);
        }
    }
    if let Some(skip) = skip {
        if !matches!(skip.kind(), NodeKind::Integer | NodeKind::Parameter) {
            return Err(ValidationError::InvalidSkipValue);
        }
    }
    Ok(())
}

pub(super) fn validate_match_clause(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Match {
        pattern, predicate, ..
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    let backup_clause = ctx.clause;

    ctx.clause = NodeKind::Match;
    traverse(pattern, ctx);
    if ctx.has_error() {
        return VisitorStrategy::Break;
    }

    // the predicate is evaluated in the enclosing clause context, which is
    // what rejects aggregations in MATCH (n) WHERE count(n) > 1 ...
    ctx.clause = backup_clause;
    if let Some(predicate) = predicate {
        traverse(predicate, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    ctx.clause = NodeKind::Match;
    VisitorStrategy::Continue
}

pub(super) fn validate_create_clause(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    ctx.clause = NodeKind::Create;
    VisitorStrategy::Recurse
}

pub(super) fn validate_merge_clause(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    ctx.clause = NodeKind::Merge;
    VisitorStrategy::Recurse
}

pub(super) fn validate_on_create_clause(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    ctx.clause = NodeKind::OnCreate;
    VisitorStrategy::Recurse
}

pub(super) fn validate_on_match_clause(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    ctx.clause = NodeKind::OnMatch;
    VisitorStrategy::Recurse
}

pub(super) fn validate_set_clause(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    ctx.clause = NodeKind::Set;
    VisitorStrategy::Recurse
}

/// The left-hand side of `SET x.p = ..` must be a property of an alias.
pub(super) fn validate_set_property(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::SetProperty { property, .. } = node else {
        return VisitorStrategy::Recurse;
    };

    let lhs_is_alias = matches!(
        property.as_ref(),
        AstNode::PropertyOperator { expression, .. }
            if expression.kind() == NodeKind::Identifier
    );
    if !lhs_is_alias {
        ctx.fail(ValidationError::SetNonAliasLhs);
        return VisitorStrategy::Break;
    }

    VisitorStrategy::Recurse
}

pub(super) fn validate_delete_clause(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Delete { expressions, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    ctx.clause = NodeKind::Delete;

    for expression in expressions {
        // expecting an alias or a call that resolves to an entity; anything
        // that cannot name a node, path or edge is rejected up front
        if !matches!(
            expression.kind(),
            NodeKind::Identifier
                | NodeKind::ApplyOperator
                | NodeKind::ApplyAllOperator
                | NodeKind::SubscriptOperator
        ) {
            ctx.fail(ValidationError::DeleteInvalidTarget);
            return VisitorStrategy::Break;
        }
    }

    VisitorStrategy::Recurse
}

pub(super) fn validate_unwind_clause(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Unwind { alias, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    ctx.clause = NodeKind::Unwind;

    if let Some(name) = alias.identifier_name() {
        ctx.defined.insert(name, IdentifierKind::Untyped);
    }
    VisitorStrategy::Recurse
}

/// UNION pins the query's union mode and opens a fresh scope for the next
/// branch.
pub(super) fn validate_union_clause(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::Union { all } = node else {
        return VisitorStrategy::Recurse;
    };

    let this_mode = if *all {
        UnionMode::UnionAll
    } else {
        UnionMode::Union
    };
    match ctx.union_mode {
        UnionMode::Undefined => ctx.union_mode = this_mode,
        mode if mode != this_mode => {
            ctx.fail(ValidationError::MixedUnion);
            return VisitorStrategy::Break;
        }
        _ => {}
    }

    ctx.clause = NodeKind::Union;
    ctx.defined.clear();
    VisitorStrategy::Recurse
}

/// FOREACH runs its updating clauses in a scoped copy of the environment;
/// the loop variable and anything the body binds stay local.
/// MATCH (n) FOREACH(x in [1,2,3] | CREATE (n)-[:R]->({v:x}))
pub(super) fn validate_foreach_clause(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::Foreach {
        identifier,
        expression,
        clauses,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    let orig_env = ctx.defined.clone();
    ctx.clause = NodeKind::Foreach;

    // the list expression is evaluated before the loop variable exists
    traverse(expression, ctx);

    if let Some(name) = identifier.identifier_name() {
        ctx.defined.insert(name, IdentifierKind::Untyped);
    }

    for clause in clauses {
        if !FOREACH_UPDATING_CLAUSES.contains(&clause.kind()) {
            // MATCH (n) FOREACH(x IN [1,2,3] | RETURN x)
            ctx.fail(ValidationError::ForeachNonUpdatingClause);
            break;
        }
        traverse(clause, ctx);
    }

    ctx.defined = orig_env;

    if ctx.has_error() {
        VisitorStrategy::Break
    } else {
        VisitorStrategy::Continue
    }
}

/// CALL checks the procedure against the registry and introduces the YIELD
/// names. Post-order removes output names that an alias shadowed, so
/// `CALL db.labels() YIELD label AS l RETURN label` fails while `RETURN l`
/// succeeds.
pub(super) fn validate_call_clause(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::Call {
        proc_name,
        arguments,
        projections,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    if start {
        ctx.clause = NodeKind::Call;

        // CALL db.labels() YIELD label         -> introduces `label`
        // CALL db.labels() YIELD label AS l    -> introduces `l` and `label`
        for projection in projections {
            let AstNode::Projection { expression, alias } = projection else {
                continue;
            };
            if let Some(alias) = alias {
                if let Some(name) = alias.identifier_name() {
                    ctx.defined.insert(name, IdentifierKind::Untyped);
                }
            }
            if let Some(name) = expression.identifier_name() {
                ctx.defined.insert(name, IdentifierKind::Untyped);
            }
        }

        let procedures = ctx.procedures;
        let Some(procedure) = procedures.get(proc_name) else {
            ctx.fail(ValidationError::UnknownProcedure(proc_name.clone()));
            return VisitorStrategy::Break;
        };

        if let Arity::Fixed(expected) = procedure.arity {
            if expected != arguments.len() {
                ctx.fail(ValidationError::ProcedureArgumentCount {
                    name: proc_name.clone(),
                    expected,
                    actual: arguments.len(),
                });
                return VisitorStrategy::Break;
            }
        }

        let mut yielded = Environment::new();
        for projection in projections {
            let AstNode::Projection { expression, .. } = projection else {
                continue;
            };
            let Some(output) = expression.identifier_name() else {
                continue;
            };
            if !yielded.try_insert(output, IdentifierKind::Untyped) {
                ctx.fail(ValidationError::VariableAlreadyDeclared(output.to_string()));
                return VisitorStrategy::Break;
            }
            if !procedure.contains_output(output) {
                ctx.fail(ValidationError::UnknownYieldOutput {
                    name: proc_name.clone(),
                    output: output.to_string(),
                });
                return VisitorStrategy::Break;
            }
        }

        return VisitorStrategy::Recurse;
    }

    // post-order: aliased outputs leave only the alias in scope
    for projection in projections {
        if let AstNode::Projection {
            expression,
            alias: Some(_),
        } = projection
        {
            if let Some(name) = expression.identifier_name() {
                ctx.defined.remove(name);
            }
        }
    }
    VisitorStrategy::Continue
}

// Aliases of a WITH clause, introduced after the projections themselves have
// been validated. When a projection merely renames an identifier the alias
// inherits its kind:
// MATCH (n)-[x:T]->() WITH x AS edge WHERE (edge)-[]->()
fn introduce_with_aliases(
    projections: &[AstNode],
    defined: &mut Environment,
) -> Result<(), ValidationError> {
    let mut local_env = Environment::new();

    for projection in projections {
        let AstNode::Projection { expression, alias } = projection else {
            continue;
        };

        let column: &str;
        if let Some(alias) = alias {
            let Some(alias_name) = alias.identifier_name() else {
                continue;
            };
            let kind = expression
                .identifier_name()
                .and_then(|name| defined.find(name))
                .unwrap_or(IdentifierKind::Untyped);
            defined.insert(alias_name, kind);
            column = alias_name;
        } else {
            // WITH a -- the expression must itself be an identifier
            let Some(name) = expression.identifier_name() else {
                return Err(ValidationError::WithProjectionNotAliased);
            };
            column = name;
        }

        if !local_env.try_insert(column, IdentifierKind::Untyped) {
            return Err(ValidationError::DuplicateResultColumn);
        }
    }

    Ok(())
}

/// WITH validates its projections against the current scope, then replaces
/// the scope with the projected names (unless `WITH *` keeps it).
pub(super) fn validate_with_clause(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::With {
        include_existing,
        projections,
        order_by,
        skip,
        limit,
        predicate,
        ..
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    ctx.clause = NodeKind::With;

    if let Err(error) = validate_limit_skip(limit.as_deref(), skip.as_deref()) {
        ctx.fail(error);
        return VisitorStrategy::Break;
    }

    // projections are visited before the aliases exist; WHERE and ORDER BY
    // are visited after, so they see the new names
    for projection in projections {
        traverse(projection, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    if let Err(error) = introduce_with_aliases(projections, &mut ctx.defined) {
        ctx.fail(error);
        return VisitorStrategy::Break;
    }

    if let Some(predicate) = predicate {
        traverse(predicate, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    if let Some(order_by) = order_by {
        traverse(order_by, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    if !include_existing {
        // re-project: only the projected columns survive this clause
        let mut projected = Environment::new();
        for projection in projections {
            let AstNode::Projection { expression, alias } = projection else {
                continue;
            };
            if let Some(alias) = alias {
                if let Some(alias_name) = alias.identifier_name() {
                    // MATCH (x) WITH x AS a MATCH ()-[a]->() must still see
                    // that 'a' names a node
                    let kind = expression
                        .identifier_name()
                        .and_then(|name| ctx.defined.find(name))
                        .unwrap_or(IdentifierKind::Untyped);
                    projected.insert(alias_name, kind);
                }
            } else if let Some(name) = expression.identifier_name() {
                let kind = ctx.defined.find(name).unwrap_or(IdentifierKind::Untyped);
                projected.insert(name, kind);
            }
        }
        ctx.defined = projected;
    }

    VisitorStrategy::Continue
}

fn projection_column_name(projection: &AstNode) -> Option<&str> {
    let AstNode::Projection { expression, alias } = projection else {
        return None;
    };
    match alias {
        Some(alias) => alias.identifier_name(),
        None => expression.identifier_name(),
    }
}

pub(super) fn validate_return_clause(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::Return {
        include_existing,
        projections,
        order_by,
        skip,
        limit,
        ..
    } = node
    else {
        return VisitorStrategy::Recurse;
    };

    ctx.clause = NodeKind::Return;

    if let Err(error) = validate_limit_skip(limit.as_deref(), skip.as_deref()) {
        ctx.fail(error);
        return VisitorStrategy::Break;
    }

    if !include_existing {
        let mut columns = Environment::new();
        for projection in projections {
            if let Some(name) = projection_column_name(projection) {
                if !columns.try_insert(name, IdentifierKind::Untyped) {
                    ctx.fail(ValidationError::DuplicateResultColumn);
                    return VisitorStrategy::Break;
                }
            }
        }
    }

    for projection in projections {
        traverse(projection, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    // aliases become visible to ORDER BY:
    // MATCH (n) RETURN count(*) AS c ORDER BY c
    for projection in projections {
        if let AstNode::Projection {
            alias: Some(alias), ..
        } = projection
        {
            if let Some(name) = alias.identifier_name() {
                ctx.defined.insert(name, IdentifierKind::Untyped);
            }
        }
    }

    if let Some(order_by) = order_by {
        traverse(order_by, ctx);
        if ctx.has_error() {
            return VisitorStrategy::Break;
        }
    }

    VisitorStrategy::Continue
}

/// `CREATE INDEX FOR (n:L) ON (n.p)` binds its pattern identifier for the
/// property references that follow.
pub(super) fn validate_index_creation(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::CreatePatternPropsIndex { identifier, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    ctx.clause = NodeKind::CreatePatternPropsIndex;

    if let Some(name) = identifier.identifier_name() {
        ctx.defined.insert(name, IdentifierKind::Untyped);
    }
    VisitorStrategy::Recurse
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::functions::BuiltinFunctionRegistry;
    use crate::procedures::BuiltinProcedureRegistry;

    fn ident(name: &str) -> AstNode {
        AstNode::Identifier { name: name.into() }
    }

    fn projection(expression: AstNode, alias: Option<&str>) -> AstNode {
        AstNode::Projection {
            expression: Box::new(expression),
            alias: alias.map(|a| Box::new(ident(a))),
        }
    }

    #[test]
    fn with_aliases_inherit_identifier_kinds() {
        let mut defined = Environment::new();
        defined.insert("n", IdentifierKind::Node);
        let projections = vec![projection(ident("n"), Some("e"))];
        introduce_with_aliases(&projections, &mut defined).unwrap();
        assert_eq!(defined.find("e"), Some(IdentifierKind::Node));
    }

    #[test]
    fn with_requires_aliases_on_expressions() {
        let mut defined = Environment::new();
        let projections = vec![projection(AstNode::Literal(Literal::Integer(1)), None)];
        assert_eq!(
            introduce_with_aliases(&projections, &mut defined),
            Err(ValidationError::WithProjectionNotAliased)
        );
    }

    #[test]
    fn with_rejects_duplicate_columns() {
        let mut defined = Environment::new();
        defined.insert("a", IdentifierKind::Untyped);
        let projections = vec![
            projection(ident("a"), Some("x")),
            projection(AstNode::Literal(Literal::Integer(2)), Some("x")),
        ];
        assert_eq!(
            introduce_with_aliases(&projections, &mut defined),
            Err(ValidationError::DuplicateResultColumn)
        );
    }

    #[test]
    fn call_yield_alias_shadows_output_after_the_clause() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);

        let call = AstNode::Call {
            proc_name: "db.labels".into(),
            arguments: vec![],
            projections: vec![projection(ident("label"), Some("l"))],
        };
        traverse(&call, &mut ctx);
        assert!(!ctx.has_error());
        assert_eq!(ctx.defined.find("l"), Some(IdentifierKind::Untyped));
        // the unaliased output name was removed on clause exit
        assert_eq!(ctx.defined.find("label"), None);
    }

    #[test]
    fn call_rejects_unknown_yield_output() {
        let procedures = BuiltinProcedureRegistry::new();
        let functions = BuiltinFunctionRegistry::new();
        let mut ctx = ValidationCtx::new(&procedures, &functions);

        let call = AstNode::Call {
            proc_name: "db.labels".into(),
            arguments: vec![],
            projections: vec![projection(ident("wrong"), None)],
        };
        traverse(&call, &mut ctx);
        assert_eq!(
            ctx.into_result(),
            Err(ValidationError::UnknownYieldOutput {
                name: "db.labels".into(),
                output: "wrong".into(),
            })
        );
    }

    #[test]
    fn limit_and_skip_must_be_integers_or_parameters() {
        assert!(validate_limit_skip(
            Some(&AstNode::Literal(Literal::Integer(5))),
            Some(&AstNode::Parameter { name: "s".into() }),
        )
        .is_ok());
        assert_eq!(
            validate_limit_skip(Some(&AstNode::Literal(Literal::String("5".into()))), None),
            Err(ValidationError::InvalidLimitValue)
        );
        assert_eq!(
            validate_limit_skip(None, Some(&AstNode::Literal(Literal::Float(1.5)))),
            Err(ValidationError::InvalidSkipValue)
        );
    }
}
