//! Pattern-level validation: node / relationship / path shapes and the
//! alias-kind bookkeeping they imply.

use crate::ast::{AstNode, Direction, NodeKind, Range};

use super::context::{Environment, IdentifierKind, ValidationCtx};
use super::errors::ValidationError;
use super::expressions::validate_inlined_properties;
use super::visitor::VisitorStrategy;

fn identifier_of<'a>(node: Option<&'a AstNode>) -> Option<&'a str> {
    node.and_then(AstNode::identifier_name)
}

// Largest hop count a range may default to when no upper bound is written.
const DEFAULT_MAX_HOPS: i64 = (i32::MAX - 2) as i64;

/// A pattern groups pattern paths; while it is traversed, `intermediate`
/// accumulates the entities the pattern itself creates. Leaving the pattern
/// discards them.
pub(super) fn validate_pattern(
    _node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        ctx.intermediate.clear();
        return VisitorStrategy::Continue;
    }
    VisitorStrategy::Recurse
}

/// Per-path entity rules, applied before the path elements are visited.
pub(super) fn validate_pattern_path(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::PatternPath { elements } = node else {
        return VisitorStrategy::Recurse;
    };

    let result = if ctx.clause == NodeKind::Create {
        validate_create_entities(elements, &ctx.defined)
    } else if ctx.clause == NodeKind::Match {
        validate_match_entities(elements, &ctx.defined)
    } else {
        Ok(())
    };

    if let Err(error) = result {
        ctx.fail(error);
        return VisitorStrategy::Break;
    }
    VisitorStrategy::Recurse
}

// Redeclaring a node is only an error for a single-node path:
//   MATCH (a) CREATE (a)       -> rejected
//   MATCH (a) CREATE (a)-[:E]->(:B) -> allowed, (a) is reused
fn validate_create_entities(
    elements: &[AstNode],
    defined: &Environment,
) -> Result<(), ValidationError> {
    if elements.len() == 1 {
        if let AstNode::NodePattern { identifier, .. } = &elements[0] {
            if let Some(alias) = identifier_of(identifier.as_deref()) {
                if defined.find(alias).is_some() {
                    return Err(ValidationError::CreateRedeclaresVariable(alias.to_string()));
                }
            }
        }
    }
    Ok(())
}

// Kind-consistency of every named element of a MATCH path, checked against
// both the bound variables and a path-local environment. Nodes sit at even
// positions, relationships at odd ones.
fn validate_match_entities(
    elements: &[AstNode],
    defined: &Environment,
) -> Result<(), ValidationError> {
    let mut local_env = Environment::new();

    for (position, element) in elements.iter().enumerate() {
        let name = match element {
            AstNode::NodePattern { identifier, .. } if position % 2 == 0 => {
                identifier_of(identifier.as_deref())
            }
            AstNode::RelPattern { identifier, .. } if position % 2 == 1 => {
                identifier_of(identifier.as_deref())
            }
            _ => None,
        };
        let Some(name) = name else { continue };
        let bound = defined.find(name);

        if position % 2 == 0 {
            // node element
            match bound {
                Some(IdentifierKind::Edge) => {
                    // MATCH ()-[r]->() MATCH (r)
                    return Err(ValidationError::AliasNodeAndRelationship(name.to_string()));
                }
                Some(IdentifierKind::Path) => {
                    // MATCH n=() MATCH (n)-[:R]->()
                    return Err(ValidationError::AliasPathAndNode(name.to_string()));
                }
                _ => {}
            }
            match local_env.find(name) {
                None => local_env.insert(name, IdentifierKind::Node),
                Some(IdentifierKind::Node) => {}
                Some(_) => {
                    // MATCH (r)-[r]-() RETURN 0
                    return Err(ValidationError::AliasNodeAndRelationship(name.to_string()));
                }
            }
        } else {
            // relationship element
            // A previously bound name may only carry the edge kind or no
            // kind at all:
            //   MATCH (a) WITH a MATCH (a:L)-[e]->(b) RETURN a  -- fine
            //   WITH NULL AS e MATCH (a:L)-[e]->(b) RETURN e    -- fine
            //   MATCH (n) WITH n AS e MATCH (a:L)-[e]->(b)      -- rejected
            match bound {
                Some(IdentifierKind::Node) => {
                    return Err(ValidationError::AliasNodeAndRelationship(name.to_string()));
                }
                Some(IdentifierKind::Path) => {
                    return Err(ValidationError::AliasPathAndRelationship(name.to_string()));
                }
                _ => {}
            }
            match local_env.find(name) {
                None => local_env.insert(name, IdentifierKind::Edge),
                Some(IdentifierKind::Edge) => {
                    // a relationship variable cannot repeat within one path:
                    // MATCH (a)-[r]->()-[r]->(a) RETURN 0
                    return Err(ValidationError::DuplicateRelationshipVariable(
                        name.to_string(),
                    ));
                }
                Some(_) => {
                    return Err(ValidationError::AliasNodeAndRelationship(name.to_string()));
                }
            }
        }
    }

    Ok(())
}

pub(super) fn validate_rel_pattern(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::RelPattern {
        identifier,
        direction,
        reltypes,
        properties,
        varlength,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };
    let alias = identifier_of(identifier.as_deref());

    if ctx.clause == NodeKind::Create {
        if let Some(alias) = alias {
            // CREATE ()-[e:R]->()-[e]->()
            if ctx.defined.find(alias).is_some() {
                ctx.fail(ValidationError::CreateRedeclaresVariable(alias.to_string()));
                return VisitorStrategy::Break;
            }
        }
        if reltypes.len() != 1 {
            // CREATE ()-[e]->()
            ctx.fail(ValidationError::CreateRelationshipTypeCount);
            return VisitorStrategy::Break;
        }
        if *direction == Direction::Bidirectional {
            ctx.fail(ValidationError::CreateUndirectedRelationship);
            return VisitorStrategy::Break;
        }
        if varlength.is_some() {
            ctx.fail(ValidationError::CreateVariableLengthRelationship);
            return VisitorStrategy::Break;
        }
    }

    if !validate_inlined_properties(properties.as_deref(), alias, ctx) {
        return VisitorStrategy::Break;
    }

    if ctx.clause == NodeKind::Merge {
        if let Err(error) = validate_merge_relation(alias, reltypes, *varlength, &ctx.defined) {
            ctx.fail(error);
            return VisitorStrategy::Break;
        }
    }

    if let Some(range) = varlength {
        if let Err(error) = validate_multi_hop_traversal(range) {
            ctx.fail(error);
            return VisitorStrategy::Break;
        }
    }

    if let Some(alias) = alias {
        match ctx.defined.find(alias) {
            Some(kind) => {
                // a MATCH path has already been vetted as a whole
                if ctx.clause != NodeKind::Match {
                    // CREATE ()-[e]->()-[e]->()
                    // MATCH (a) RETURN [(b)-[b]->() | 0]
                    match kind {
                        IdentifierKind::Edge => ctx.fail(
                            ValidationError::DuplicateRelationshipVariable(alias.to_string()),
                        ),
                        IdentifierKind::Node => ctx.fail(
                            ValidationError::AliasNodeAndRelationship(alias.to_string()),
                        ),
                        IdentifierKind::Path => ctx.fail(
                            ValidationError::AliasPathAndRelationship(alias.to_string()),
                        ),
                        IdentifierKind::Untyped => {}
                    }
                    return VisitorStrategy::Break;
                }
            }
            None => {
                ctx.defined.insert(alias, IdentifierKind::Edge);
                if ctx.clause == NodeKind::Create {
                    ctx.intermediate.insert(alias, IdentifierKind::Edge);
                }
            }
        }
    }

    VisitorStrategy::Continue
}

pub(super) fn validate_node_pattern(
    node: &AstNode,
    _start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    let AstNode::NodePattern {
        identifier,
        labels,
        properties,
    } = node
    else {
        return VisitorStrategy::Recurse;
    };
    let alias = identifier_of(identifier.as_deref());

    if !validate_inlined_properties(properties.as_deref(), alias, ctx) {
        return VisitorStrategy::Break;
    }

    if ctx.clause == NodeKind::Merge {
        if let Err(error) =
            validate_merge_node(alias, labels, properties.is_some(), &ctx.defined)
        {
            ctx.fail(error);
            return VisitorStrategy::Break;
        }
    }

    if let Some(alias) = alias {
        let bound = ctx.defined.find(alias);
        match bound {
            Some(IdentifierKind::Edge) => {
                // MATCH ()-[n]->() CREATE (n)-[:R]->()
                ctx.fail(ValidationError::AliasNodeAndRelationship(alias.to_string()));
                return VisitorStrategy::Break;
            }
            Some(IdentifierKind::Path) => {
                ctx.fail(ValidationError::AliasPathAndNode(alias.to_string()));
                return VisitorStrategy::Break;
            }
            _ => {}
        }

        ctx.defined.insert(alias, IdentifierKind::Node);
        if bound.is_none() && ctx.clause == NodeKind::Create {
            ctx.intermediate.insert(alias, IdentifierKind::Node);
        }
    }

    VisitorStrategy::Continue
}

pub(super) fn validate_named_path(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::NamedPath { identifier, .. } = node else {
        return VisitorStrategy::Recurse;
    };
    let Some(alias) = identifier.identifier_name() else {
        return VisitorStrategy::Recurse;
    };

    match ctx.defined.find(alias) {
        Some(IdentifierKind::Edge) => {
            // MATCH m=() WITH m AS n MATCH ()-[n:R]->()
            ctx.fail(ValidationError::AliasPathAndRelationship(alias.to_string()));
            return VisitorStrategy::Break;
        }
        Some(IdentifierKind::Node) => {
            // MATCH m=() WITH m AS n MATCH (n)-[:R]->()
            ctx.fail(ValidationError::AliasPathAndNode(alias.to_string()));
            return VisitorStrategy::Break;
        }
        _ => {}
    }

    ctx.defined.insert(alias, IdentifierKind::Path);
    VisitorStrategy::Recurse
}

pub(super) fn validate_shortest_path(
    node: &AstNode,
    start: bool,
    ctx: &mut ValidationCtx,
) -> VisitorStrategy {
    if !start {
        return VisitorStrategy::Continue;
    }
    let AstNode::ShortestPath { single, path } = node else {
        return VisitorStrategy::Recurse;
    };

    if *single {
        // shortestPath requires both endpoints to be named and already bound
        let endpoints = match path.as_ref() {
            AstNode::PatternPath { elements } if !elements.is_empty() => {
                let first = match elements.first() {
                    Some(AstNode::NodePattern { identifier, .. }) => {
                        identifier_of(identifier.as_deref())
                    }
                    _ => None,
                };
                let last = match elements.last() {
                    Some(AstNode::NodePattern { identifier, .. }) => {
                        identifier_of(identifier.as_deref())
                    }
                    _ => None,
                };
                first.zip(last)
            }
            _ => None,
        };
        let Some((first, last)) = endpoints else {
            ctx.fail(ValidationError::ShortestPathUnboundNodes);
            return VisitorStrategy::Break;
        };
        if ctx.defined.find(first).is_none() || ctx.defined.find(last).is_none() {
            ctx.fail(ValidationError::ShortestPathUnboundNodes);
            return VisitorStrategy::Break;
        }
    } else {
        // MATCH (a), (b), p = allShortestPaths((a)-[*2..]->(b)) RETURN p
        let mut ranges = Vec::new();
        collect_varlength_ranges(path, &mut ranges);
        for range in ranges {
            if range.start.unwrap_or(1) != 1 {
                ctx.fail(ValidationError::AllShortestPathsMinLength);
                return VisitorStrategy::Break;
            }
        }
    }

    VisitorStrategy::Recurse
}

fn collect_varlength_ranges(node: &AstNode, ranges: &mut Vec<Range>) {
    if let AstNode::RelPattern {
        varlength: Some(range),
        ..
    } = node
    {
        ranges.push(*range);
    }
    for child in node.children() {
        collect_varlength_ranges(child, ranges);
    }
}

fn validate_multi_hop_traversal(range: &Range) -> Result<(), ValidationError> {
    let start = range.start.unwrap_or(1);
    let end = range.end.unwrap_or(DEFAULT_MAX_HOPS);
    if start > end {
        return Err(ValidationError::VariableLengthInvalidRange);
    }
    Ok(())
}

// MERGE may not redeclare a bound relation, requires exactly one reltype for
// the relations it introduces, and never accepts variable length.
fn validate_merge_relation(
    alias: Option<&str>,
    reltypes: &[String],
    varlength: Option<Range>,
    defined: &Environment,
) -> Result<(), ValidationError> {
    if varlength.is_some() {
        return Err(ValidationError::MergeVariableLengthRelationship);
    }

    if let Some(alias) = alias {
        if defined.find(alias).is_some() {
            return Err(ValidationError::MergeRedeclaresVariable(alias.to_string()));
        }
    }

    if reltypes.len() != 1 {
        return Err(ValidationError::MergeRelationshipTypeCount);
    }

    // An undirected MERGE edge simply creates a single outgoing edge, so the
    // direction needs no check here.
    Ok(())
}

// MERGE may not attach labels or properties to an already-bound node:
// MATCH (n)-[:R]->() MERGE (n:L)-[:R]->()
fn validate_merge_node(
    alias: Option<&str>,
    labels: &[String],
    has_properties: bool,
    defined: &Environment,
) -> Result<(), ValidationError> {
    if defined.is_empty() {
        return Ok(());
    }
    let Some(alias) = alias else {
        return Ok(());
    };

    match defined.find(alias) {
        None => Ok(()),
        Some(IdentifierKind::Edge) => {
            // MATCH ()-[n]->() MERGE (n)-[:R]->()
            Err(ValidationError::AliasNodeAndRelationship(alias.to_string()))
        }
        Some(IdentifierKind::Path) => {
            // MATCH n=() MERGE (n)-[:R]->()
            Err(ValidationError::AliasPathAndNode(alias.to_string()))
        }
        Some(_) => {
            if !labels.is_empty() || has_properties {
                Err(ValidationError::MergeRedeclaresNode(alias.to_string()))
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_pattern(name: &str) -> AstNode {
        AstNode::NodePattern {
            identifier: Some(Box::new(AstNode::Identifier { name: name.into() })),
            labels: vec![],
            properties: None,
        }
    }

    fn rel_pattern(name: &str) -> AstNode {
        AstNode::RelPattern {
            identifier: Some(Box::new(AstNode::Identifier { name: name.into() })),
            direction: Direction::Right,
            reltypes: vec![],
            properties: None,
            varlength: None,
        }
    }

    #[test]
    fn match_path_rejects_repeated_relationship_variable() {
        // MATCH (a)-[r]->()-[r]->(a)
        let elements = vec![
            node_pattern("a"),
            rel_pattern("r"),
            AstNode::NodePattern {
                identifier: None,
                labels: vec![],
                properties: None,
            },
            rel_pattern("r"),
            node_pattern("a"),
        ];
        let env = Environment::new();
        assert_eq!(
            validate_match_entities(&elements, &env),
            Err(ValidationError::DuplicateRelationshipVariable("r".into()))
        );
    }

    #[test]
    fn match_path_rejects_node_reused_as_relationship() {
        // MATCH (r)-[r]-()
        let elements = vec![
            node_pattern("r"),
            rel_pattern("r"),
            AstNode::NodePattern {
                identifier: None,
                labels: vec![],
                properties: None,
            },
        ];
        let env = Environment::new();
        assert_eq!(
            validate_match_entities(&elements, &env),
            Err(ValidationError::AliasNodeAndRelationship("r".into()))
        );
    }

    #[test]
    fn single_node_create_path_rejects_bound_alias() {
        let mut env = Environment::new();
        env.insert("a", IdentifierKind::Node);
        assert_eq!(
            validate_create_entities(&[node_pattern("a")], &env),
            Err(ValidationError::CreateRedeclaresVariable("a".into()))
        );
        // longer paths may reuse the alias
        let elements = vec![node_pattern("a"), rel_pattern("e"), node_pattern("b")];
        assert_eq!(validate_create_entities(&elements, &env), Ok(()));
    }

    #[test]
    fn varlength_range_bounds() {
        assert!(validate_multi_hop_traversal(&Range {
            start: Some(2),
            end: Some(1)
        })
        .is_err());
        assert!(validate_multi_hop_traversal(&Range {
            start: Some(2),
            end: None
        })
        .is_ok());
        assert!(validate_multi_hop_traversal(&Range {
            start: None,
            end: Some(3)
        })
        .is_ok());
    }

    #[test]
    fn merge_node_rules() {
        let mut env = Environment::new();
        env.insert("n", IdentifierKind::Node);
        // MATCH (n)-[:R]->() MERGE (n:L)-[:R]->()
        assert_eq!(
            validate_merge_node(Some("n"), &["L".into()], false, &env),
            Err(ValidationError::MergeRedeclaresNode("n".into()))
        );
        assert_eq!(validate_merge_node(Some("n"), &[], false, &env), Ok(()));
        assert_eq!(validate_merge_node(Some("m"), &["L".into()], true, &env), Ok(()));
    }
}
