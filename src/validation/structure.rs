//! Whole-query structural checks, run before the scoped visitor walk: root
//! shape, clause ordering, UNION column agreement, shortest-path placement
//! and statement-option validation.

use std::collections::HashSet;

use crate::ast::{AstNode, NodeKind, ParseResult};

use super::errors::ValidationError;

const UPDATING_CLAUSES: &[NodeKind] = &[
    NodeKind::Create,
    NodeKind::Merge,
    NodeKind::Delete,
    NodeKind::Set,
    NodeKind::Remove,
    NodeKind::Foreach,
];

/// Kinds a query may conclude with.
const TERMINATING_CLAUSES: &[NodeKind] = &[
    NodeKind::Return,
    NodeKind::Create,
    NodeKind::Merge,
    NodeKind::Delete,
    NodeKind::Set,
    NodeKind::Call,
    NodeKind::Remove,
    NodeKind::Foreach,
];

/// Locate the statement root, skipping comment roots. `;` alone parses to no
/// roots at all.
pub(super) fn validate_parse_result_root(
    result: &ParseResult,
) -> Result<usize, ValidationError> {
    for (index, root) in result.roots.iter().enumerate() {
        match root.kind() {
            NodeKind::Comment | NodeKind::LineComment | NodeKind::BlockComment => continue,
            NodeKind::Statement => return Ok(index),
            other => {
                return Err(ValidationError::UnsupportedQueryType(other.to_string()));
            }
        }
    }
    Err(ValidationError::EmptyQuery)
}

// The parser does not enforce clause sequence order: 'RETURN CREATE' and
// 'RETURN RETURN' parse fine. A query must end with RETURN, CALL or an
// updating clause, and the only clause allowed after a RETURN is UNION.
fn validate_query_termination(clauses: &[AstNode]) -> Result<(), ValidationError> {
    if let Some(return_idx) = clauses
        .iter()
        .position(|clause| clause.kind() == NodeKind::Return)
    {
        if return_idx + 1 < clauses.len()
            && clauses[return_idx + 1].kind() != NodeKind::Union
        {
            return Err(ValidationError::ClauseAfterReturn);
        }
    }

    let Some(last) = clauses.last() else {
        return Err(ValidationError::EmptyQuery);
    };
    if !TERMINATING_CLAUSES.contains(&last.kind()) {
        return Err(ValidationError::InvalidQueryConclusion(
            last.kind().to_string(),
        ));
    }
    Ok(())
}

pub(super) fn validate_query_sequence(clauses: &[AstNode]) -> Result<(), ValidationError> {
    validate_query_termination(clauses)?;

    match clauses.first() {
        Some(AstNode::With {
            include_existing: true,
            ..
        }) => return Err(ValidationError::StartsWithWithStar),
        Some(AstNode::Return {
            include_existing: true,
            ..
        }) => return Err(ValidationError::StartsWithReturnStar),
        _ => {}
    }

    Ok(())
}

// In any query scope, reading clauses (MATCH, UNWIND, CALL) cannot follow
// updating clauses, and a non-optional MATCH cannot follow an OPTIONAL
// MATCH. WITH opens a new scope and clears both restrictions.
pub(super) fn validate_clause_order(clauses: &[AstNode]) -> Result<(), ValidationError> {
    let mut encountered_optional_match = false;
    let mut encountered_updating_clause = false;

    for clause in clauses {
        let kind = clause.kind();
        encountered_updating_clause =
            encountered_updating_clause || UPDATING_CLAUSES.contains(&kind);

        if encountered_updating_clause
            && matches!(kind, NodeKind::Match | NodeKind::Unwind | NodeKind::Call)
        {
            return Err(ValidationError::ReadingAfterUpdating(kind.to_string()));
        }

        if let AstNode::Match { optional, .. } = clause {
            if !optional && encountered_optional_match {
                return Err(ValidationError::MatchAfterOptionalMatch);
            }
            encountered_optional_match |= optional;
        }

        if kind == NodeKind::With {
            encountered_optional_match = false;
            encountered_updating_clause = false;
        }
    }

    Ok(())
}

// Output column names of a RETURN clause: the alias when present, the
// identifier name for a bare identifier projection, unnamed otherwise.
fn return_column_names(clause: &AstNode) -> Option<Vec<Option<&str>>> {
    let AstNode::Return { projections, .. } = clause else {
        return None;
    };
    Some(
        projections
            .iter()
            .map(|projection| match projection {
                AstNode::Projection { expression, alias } => match alias {
                    Some(alias) => alias.identifier_name(),
                    None => expression.identifier_name(),
                },
                _ => None,
            })
            .collect(),
    )
}

/// Every UNION branch must produce the same column-name sequence, which also
/// implies one RETURN per branch.
pub(super) fn validate_union_clauses(clauses: &[AstNode]) -> Result<(), ValidationError> {
    let union_count = clauses
        .iter()
        .filter(|clause| clause.kind() == NodeKind::Union)
        .count();
    if union_count == 0 {
        return Ok(());
    }

    let returns: Vec<&AstNode> = clauses
        .iter()
        .filter(|clause| clause.kind() == NodeKind::Return)
        .collect();
    if returns.len() != union_count + 1 {
        return Err(ValidationError::UnionReturnCountMismatch {
            unions: union_count,
            returns: returns.len(),
        });
    }

    let first_columns = return_column_names(returns[0]);
    for clause in &returns[1..] {
        if return_column_names(clause) != first_columns {
            return Err(ValidationError::UnionColumnMismatch);
        }
    }

    Ok(())
}

/// `allShortestPaths` may only appear inside a MATCH pattern; a MATCH's
/// predicate subtree is still scanned.
pub(super) fn all_shortest_paths_well_placed(node: &AstNode) -> bool {
    if let AstNode::ShortestPath { single: false, .. } = node {
        return false;
    }

    if let AstNode::Match { predicate, .. } = node {
        return predicate
            .as_deref()
            .map_or(true, all_shortest_paths_well_placed);
    }

    node.children()
        .into_iter()
        .all(all_shortest_paths_well_placed)
}

/// Single `shortestPath` may only appear under WITH or RETURN. A MATCH
/// contributes only its pattern to this scan, so a shortestPath in a MATCH
/// predicate passes.
pub(super) fn shortest_paths_well_placed(node: &AstNode) -> bool {
    if let AstNode::ShortestPath { single: true, .. } = node {
        return false;
    }

    if let AstNode::Match { pattern, .. } = node {
        return shortest_paths_well_placed(pattern);
    }

    if matches!(node.kind(), NodeKind::With | NodeKind::Return) {
        return true;
    }

    node.children().into_iter().all(shortest_paths_well_placed)
}

/// EXPLAIN and PROFILE are commands of their own, not statement options.
pub(super) fn validate_params_only(options: &[AstNode]) -> Result<(), ValidationError> {
    for option in options {
        let kind = option.kind();
        if matches!(kind, NodeKind::ExplainOption | NodeKind::ProfileOption) {
            return Err(ValidationError::UnsupportedQueryOption(kind.to_string()));
        }
    }
    Ok(())
}

pub(super) fn validate_duplicate_parameters(
    options: &[AstNode],
) -> Result<(), ValidationError> {
    let mut param_names: HashSet<&str> = HashSet::new();
    for option in options {
        let AstNode::CypherOption { params } = option else {
            continue;
        };
        for param in params {
            let AstNode::CypherOptionParam { name, .. } = param else {
                continue;
            };
            if !param_names.insert(name) {
                return Err(ValidationError::DuplicateParameter(name.clone()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    fn ident(name: &str) -> AstNode {
        AstNode::Identifier { name: name.into() }
    }

    fn return_clause(columns: &[(&str, bool)]) -> AstNode {
        // (name, aliased): aliased columns project a literal AS name
        AstNode::Return {
            distinct: false,
            include_existing: false,
            projections: columns
                .iter()
                .map(|(name, aliased)| AstNode::Projection {
                    expression: if *aliased {
                        Box::new(AstNode::Literal(Literal::Integer(1)))
                    } else {
                        Box::new(ident(name))
                    },
                    alias: aliased.then(|| Box::new(ident(name))),
                })
                .collect(),
            order_by: None,
            skip: None,
            limit: None,
        }
    }

    fn match_clause(optional: bool) -> AstNode {
        AstNode::Match {
            optional,
            pattern: Box::new(AstNode::Pattern { paths: vec![] }),
            predicate: None,
        }
    }

    #[test]
    fn query_must_terminate_properly() {
        let clauses = vec![match_clause(false)];
        assert_eq!(
            validate_query_termination(&clauses),
            Err(ValidationError::InvalidQueryConclusion("MATCH".into()))
        );

        let clauses = vec![match_clause(false), return_clause(&[("n", false)])];
        assert_eq!(validate_query_termination(&clauses), Ok(()));
    }

    #[test]
    fn only_union_may_follow_return() {
        let clauses = vec![
            return_clause(&[("n", false)]),
            return_clause(&[("n", false)]),
        ];
        assert_eq!(
            validate_query_termination(&clauses),
            Err(ValidationError::ClauseAfterReturn)
        );
    }

    #[test]
    fn reading_after_updating_requires_with() {
        let clauses = vec![
            AstNode::Create {
                pattern: Box::new(AstNode::Pattern { paths: vec![] }),
            },
            match_clause(false),
            return_clause(&[("b", false)]),
        ];
        assert_eq!(
            validate_clause_order(&clauses),
            Err(ValidationError::ReadingAfterUpdating("MATCH".into()))
        );
    }

    #[test]
    fn match_after_optional_match_requires_with() {
        let clauses = vec![
            match_clause(true),
            match_clause(false),
            return_clause(&[("n", false)]),
        ];
        assert_eq!(
            validate_clause_order(&clauses),
            Err(ValidationError::MatchAfterOptionalMatch)
        );

        let with = AstNode::With {
            distinct: false,
            include_existing: true,
            projections: vec![],
            order_by: None,
            skip: None,
            limit: None,
            predicate: None,
        };
        let clauses = vec![
            match_clause(true),
            with,
            match_clause(false),
            return_clause(&[("n", false)]),
        ];
        assert_eq!(validate_clause_order(&clauses), Ok(()));
    }

    #[test]
    fn union_branches_must_agree_on_columns() {
        let clauses = vec![
            return_clause(&[("a", false)]),
            AstNode::Union { all: true },
            return_clause(&[("b", false)]),
        ];
        assert_eq!(
            validate_union_clauses(&clauses),
            Err(ValidationError::UnionColumnMismatch)
        );

        let clauses = vec![
            return_clause(&[("a", false)]),
            AstNode::Union { all: true },
            return_clause(&[("a", false)]),
        ];
        assert_eq!(validate_union_clauses(&clauses), Ok(()));
    }

    #[test]
    fn union_requires_a_return_per_branch() {
        let clauses = vec![return_clause(&[("a", false)]), AstNode::Union { all: false }];
        assert_eq!(
            validate_union_clauses(&clauses),
            Err(ValidationError::UnionReturnCountMismatch {
                unions: 1,
                returns: 1
            })
        );
    }

    #[test]
    fn duplicate_parameters_are_rejected() {
        let options = vec![AstNode::CypherOption {
            params: vec![
                AstNode::CypherOptionParam {
                    name: "p".into(),
                    value: Box::new(AstNode::Literal(Literal::Integer(1))),
                },
                AstNode::CypherOptionParam {
                    name: "p".into(),
                    value: Box::new(AstNode::Literal(Literal::Integer(2))),
                },
            ],
        }];
        assert_eq!(
            validate_duplicate_parameters(&options),
            Err(ValidationError::DuplicateParameter("p".into()))
        );
    }
}
