//! Diagnostic vocabulary of the validator.
//!
//! Message text is part of the wire contract: clients parse these strings,
//! so variants must not be reworded without a protocol bump.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("'{0}' not defined")]
    NotDefined(String),

    #[error("The alias '{0}' was specified for both a node and a relationship")]
    AliasNodeAndRelationship(String),

    #[error("The alias '{0}' was specified for both a path and a node")]
    AliasPathAndNode(String),

    #[error("The alias '{0}' was specified for both a path and a relationship")]
    AliasPathAndRelationship(String),

    #[error("Cannot use the same relationship variable '{0}'")]
    DuplicateRelationshipVariable(String),

    #[error("WITH clause projections must be aliased")]
    WithProjectionNotAliased,

    #[error("Multiple result columns with the same name are not supported")]
    DuplicateResultColumn,

    #[error("The bound variable '{0}' can't be redeclared in a CREATE clause")]
    CreateRedeclaresVariable(String),

    #[error("Exactly one relationship type must be specified for CREATE")]
    CreateRelationshipTypeCount,

    #[error("Only directed relationships are supported in CREATE")]
    CreateUndirectedRelationship,

    #[error("Variable length relationships cannot be used in CREATE")]
    CreateVariableLengthRelationship,

    #[error("The bound variable '{0}' can't be redeclared in a MERGE clause")]
    MergeRedeclaresVariable(String),

    #[error("The bound node '{0}' can't be redeclared in a MERGE clause")]
    MergeRedeclaresNode(String),

    #[error("Exactly one relationship type must be specified for each relation in a MERGE pattern")]
    MergeRelationshipTypeCount,

    #[error("Variable length relationships cannot be used in MERGE")]
    MergeVariableLengthRelationship,

    #[error("Variable length path, maximum number of hops must be greater or equal to minimum number of hops")]
    VariableLengthInvalidRange,

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Invalid use of aggregating function '{0}'")]
    InvalidAggregateUse(String),

    #[error("COUNT is the only function which can accept * as an argument")]
    ApplyAllNotCount,

    #[error("Cannot specify both DISTINCT and * in COUNT(DISTINCT *)")]
    DistinctStarCount,

    #[error("No eval expression given in reduce")]
    ReduceMissingEval,

    #[error("Encountered unhandled type in inlined properties")]
    UnhandledInlinedPropertyType,

    #[error("Property values can only be of primitive types or arrays of primitive types")]
    NonPrimitivePropertyValue,

    #[error("A shortestPath requires bound nodes")]
    ShortestPathUnboundNodes,

    #[error("allShortestPaths(...) does not support a minimal length different from 1")]
    AllShortestPathsMinLength,

    #[error("ArcGraph supports allShortestPaths only in match clauses")]
    AllShortestPathsPlacement,

    #[error("ArcGraph currently only supports shortestPath in WITH or RETURN clauses")]
    ShortestPathPlacement,

    #[error("DELETE can only be called on nodes, paths and relationships")]
    DeleteInvalidTarget,

    #[error("ArcGraph does not currently support non-alias references on the left-hand side of SET expressions")]
    SetNonAliasLhs,

    #[error("Only updating clauses may reside in FOREACH")]
    ForeachNonUpdatingClause,

    #[error("Procedure `{0}` is not registered")]
    UnknownProcedure(String),

    #[error("Procedure `{name}` requires {expected} arguments, got {actual}")]
    ProcedureArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Procedure `{name}` does not yield output `{output}`")]
    UnknownYieldOutput { name: String, output: String },

    #[error("Variable `{0}` already declared")]
    VariableAlreadyDeclared(String),

    #[error("Invalid combination of UNION and UNION ALL")]
    MixedUnion,

    #[error("Found {unions} UNION clauses but only {returns} RETURN clauses")]
    UnionReturnCountMismatch { unions: usize, returns: usize },

    #[error("All sub queries in a UNION must have the same column names")]
    UnionColumnMismatch,

    #[error("Query cannot conclude with {0} (must be RETURN or an update clause)")]
    InvalidQueryConclusion(String),

    #[error("Unexpected clause following RETURN")]
    ClauseAfterReturn,

    #[error("Query cannot begin with 'WITH *'")]
    StartsWithWithStar,

    #[error("Query cannot begin with 'RETURN *'")]
    StartsWithReturnStar,

    #[error("A WITH clause is required to introduce {0} after an updating clause")]
    ReadingAfterUpdating(String),

    #[error("A WITH clause is required to introduce a MATCH clause after an OPTIONAL MATCH")]
    MatchAfterOptionalMatch,

    #[error("LIMIT specified value of invalid type, must be a positive integer")]
    InvalidLimitValue,

    #[error("SKIP specified value of invalid type, must be a positive integer")]
    InvalidSkipValue,

    #[error("Unsupported AST node: {0}")]
    UnsupportedAstNode(String),

    #[error("Unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("Error: empty query")]
    EmptyQuery,

    #[error("Encountered unsupported query type '{0}'")]
    UnsupportedQueryType(String),

    #[error("'{0}' is not a supported query option")]
    UnsupportedQueryOption(String),

    #[error("Duplicated parameter: {0}")]
    DuplicateParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wire-compatibility check on a sample of messages clients are known to
    // match on.
    #[test]
    fn message_text_is_stable() {
        assert_eq!(
            ValidationError::NotDefined("x".into()).to_string(),
            "'x' not defined"
        );
        assert_eq!(
            ValidationError::AliasNodeAndRelationship("e".into()).to_string(),
            "The alias 'e' was specified for both a node and a relationship"
        );
        assert_eq!(
            ValidationError::ReadingAfterUpdating("MATCH".into()).to_string(),
            "A WITH clause is required to introduce MATCH after an updating clause"
        );
        assert_eq!(
            ValidationError::ProcedureArgumentCount {
                name: "db.idx.fulltext.queryNodes".into(),
                expected: 2,
                actual: 3,
            }
            .to_string(),
            "Procedure `db.idx.fulltext.queryNodes` requires 2 arguments, got 3"
        );
        assert_eq!(ValidationError::EmptyQuery.to_string(), "Error: empty query");
    }
}
