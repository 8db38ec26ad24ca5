//! AST contract consumed by the validator.
//!
//! The parser hands the validator a tree of [`AstNode`]s. Every node exposes
//! a discriminant ([`NodeKind`]) used for handler dispatch and an ordered
//! child list ([`AstNode::children`]) used for the generic depth-first walk;
//! kind-specific payloads are carried on the enum variants themselves.
//!
//! A handful of node kinds exist only so the validator can reject them: the
//! dialect's parser still recognises legacy constructs (START, LOAD CSV,
//! index hints, schema commands, ...) which ArcGraph does not execute. Those
//! appear in the tree as [`AstNode::Unsupported`].

use std::fmt;

/// Discriminant for every node shape the parser can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Statement,
    Query,
    Comment,
    LineComment,
    BlockComment,

    // clauses
    Match,
    Create,
    Merge,
    OnCreate,
    OnMatch,
    With,
    Return,
    Union,
    Unwind,
    Call,
    Delete,
    Set,
    SetProperty,
    Remove,
    Foreach,

    // patterns
    Pattern,
    NamedPath,
    ShortestPath,
    PatternPath,
    NodePattern,
    RelPattern,

    // projections and ordering
    Projection,
    OrderBy,
    SortItem,

    // expressions
    Identifier,
    Parameter,
    Integer,
    Float,
    String,
    Boolean,
    Null,
    List,
    Map,
    ApplyOperator,
    ApplyAllOperator,
    PropertyOperator,
    SubscriptOperator,
    BinaryOperator,
    UnaryOperator,
    Reduce,
    ListComprehension,
    PatternComprehension,
    Any,
    All,
    None,
    Single,

    // schema statements
    CreateNodePropsIndex,
    CreatePatternPropsIndex,
    DropPropsIndex,

    // statement options
    CypherOption,
    CypherOptionParam,

    // recognised by the parser, rejected by the validator
    Start,
    Filter,
    Extract,
    Command,
    LoadCsv,
    MatchHint,
    UsingJoin,
    UsingScan,
    IndexName,
    RelIdLookup,
    AllRelsScan,
    UsingIndex,
    StartPoint,
    RemoveItem,
    QueryOption,
    RelIndexQuery,
    ExplainOption,
    ProfileOption,
    SchemaCommand,
    NodeIdLookup,
    AllNodesScan,
    RelIndexLookup,
    NodeIndexQuery,
    NodeIndexLookup,
    UsingPeriodicCommit,
    DropRelPropConstraint,
    DropNodePropConstraint,
    CreateRelPropConstraint,
    CreateNodePropConstraint,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Statement => "STATEMENT",
            NodeKind::Query => "QUERY",
            NodeKind::Comment => "COMMENT",
            NodeKind::LineComment => "LINE_COMMENT",
            NodeKind::BlockComment => "BLOCK_COMMENT",
            NodeKind::Match => "MATCH",
            NodeKind::Create => "CREATE",
            NodeKind::Merge => "MERGE",
            NodeKind::OnCreate => "ON_CREATE",
            NodeKind::OnMatch => "ON_MATCH",
            NodeKind::With => "WITH",
            NodeKind::Return => "RETURN",
            NodeKind::Union => "UNION",
            NodeKind::Unwind => "UNWIND",
            NodeKind::Call => "CALL",
            NodeKind::Delete => "DELETE",
            NodeKind::Set => "SET",
            NodeKind::SetProperty => "SET_PROPERTY",
            NodeKind::Remove => "REMOVE",
            NodeKind::Foreach => "FOREACH",
            NodeKind::Pattern => "PATTERN",
            NodeKind::NamedPath => "NAMED_PATH",
            NodeKind::ShortestPath => "SHORTEST_PATH",
            NodeKind::PatternPath => "PATTERN_PATH",
            NodeKind::NodePattern => "NODE_PATTERN",
            NodeKind::RelPattern => "REL_PATTERN",
            NodeKind::Projection => "PROJECTION",
            NodeKind::OrderBy => "ORDER_BY",
            NodeKind::SortItem => "SORT_ITEM",
            NodeKind::Identifier => "IDENTIFIER",
            NodeKind::Parameter => "PARAMETER",
            NodeKind::Integer => "INTEGER",
            NodeKind::Float => "FLOAT",
            NodeKind::String => "STRING",
            NodeKind::Boolean => "BOOLEAN",
            NodeKind::Null => "NULL",
            NodeKind::List => "LIST",
            NodeKind::Map => "MAP",
            NodeKind::ApplyOperator => "APPLY_OPERATOR",
            NodeKind::ApplyAllOperator => "APPLY_ALL_OPERATOR",
            NodeKind::PropertyOperator => "PROPERTY_OPERATOR",
            NodeKind::SubscriptOperator => "SUBSCRIPT_OPERATOR",
            NodeKind::BinaryOperator => "BINARY_OPERATOR",
            NodeKind::UnaryOperator => "UNARY_OPERATOR",
            NodeKind::Reduce => "REDUCE",
            NodeKind::ListComprehension => "LIST_COMPREHENSION",
            NodeKind::PatternComprehension => "PATTERN_COMPREHENSION",
            NodeKind::Any => "ANY",
            NodeKind::All => "ALL",
            NodeKind::None => "NONE",
            NodeKind::Single => "SINGLE",
            NodeKind::CreateNodePropsIndex => "CREATE_NODE_PROPS_INDEX",
            NodeKind::CreatePatternPropsIndex => "CREATE_PATTERN_PROPS_INDEX",
            NodeKind::DropPropsIndex => "DROP_PROPS_INDEX",
            NodeKind::CypherOption => "CYPHER_OPTION",
            NodeKind::CypherOptionParam => "CYPHER_OPTION_PARAM",
            NodeKind::Start => "START",
            NodeKind::Filter => "FILTER",
            NodeKind::Extract => "EXTRACT",
            NodeKind::Command => "COMMAND",
            NodeKind::LoadCsv => "LOAD_CSV",
            NodeKind::MatchHint => "MATCH_HINT",
            NodeKind::UsingJoin => "USING_JOIN",
            NodeKind::UsingScan => "USING_SCAN",
            NodeKind::IndexName => "INDEX_NAME",
            NodeKind::RelIdLookup => "REL_ID_LOOKUP",
            NodeKind::AllRelsScan => "ALL_RELS_SCAN",
            NodeKind::UsingIndex => "USING_INDEX",
            NodeKind::StartPoint => "START_POINT",
            NodeKind::RemoveItem => "REMOVE_ITEM",
            NodeKind::QueryOption => "QUERY_OPTION",
            NodeKind::RelIndexQuery => "REL_INDEX_QUERY",
            NodeKind::ExplainOption => "EXPLAIN_OPTION",
            NodeKind::ProfileOption => "PROFILE_OPTION",
            NodeKind::SchemaCommand => "SCHEMA_COMMAND",
            NodeKind::NodeIdLookup => "NODE_ID_LOOKUP",
            NodeKind::AllNodesScan => "ALL_NODES_SCAN",
            NodeKind::RelIndexLookup => "REL_INDEX_LOOKUP",
            NodeKind::NodeIndexQuery => "NODE_INDEX_QUERY",
            NodeKind::NodeIndexLookup => "NODE_INDEX_LOOKUP",
            NodeKind::UsingPeriodicCommit => "USING_PERIODIC_COMMIT",
            NodeKind::DropRelPropConstraint => "DROP_REL_PROP_CONSTRAINT",
            NodeKind::DropNodePropConstraint => "DROP_NODE_PROP_CONSTRAINT",
            NodeKind::CreateRelPropConstraint => "CREATE_REL_PROP_CONSTRAINT",
            NodeKind::CreateNodePropConstraint => "CREATE_NODE_PROP_CONSTRAINT",
        };
        write!(f, "{}", name)
    }
}

/// Relationship direction as written in the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<-[..]-`
    Left,
    /// `-[..]->`
    Right,
    /// `-[..]-`
    Bidirectional,
}

/// Variable-length range on a relationship pattern, e.g. `*2..5`, `*..3`, `*`.
/// Absent bounds default to 1 and an effectively unbounded maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

/// Literal scalar values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    Null,
}

/// Binary operators the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    And,
    Or,
    Xor,
    In,
    StartsWith,
    EndsWith,
    Contains,
    Regex,
    Subscript,
    MapProjection,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
            BinaryOp::Equal => "=",
            BinaryOp::NotEqual => "<>",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::In => "IN",
            BinaryOp::StartsWith => "STARTS WITH",
            BinaryOp::EndsWith => "ENDS WITH",
            BinaryOp::Contains => "CONTAINS",
            BinaryOp::Regex => "=~",
            BinaryOp::Subscript => "[]",
            BinaryOp::MapProjection => "{}",
        };
        write!(f, "{}", symbol)
    }
}

/// Unary and postfix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    IsNull,
    IsNotNull,
}

/// Which surface syntax produced a list-comprehension-shaped node.
/// `ANY`/`ALL`/`NONE`/`SINGLE` predicates share the comprehension structure
/// (`identifier IN expression WHERE predicate`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionForm {
    ListComprehension,
    Any,
    All,
    None,
    Single,
}

/// One node of the parsed tree.
///
/// Variant fields mirror the getters the parser exposes; `children()` yields
/// the sub-nodes in source order for the generic traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// Top-level statement: leading options (e.g. `CYPHER param=1`) plus the
    /// query or schema-command body.
    Statement {
        options: Vec<AstNode>,
        body: Box<AstNode>,
    },
    /// Sequence of clauses; UNION appears inline between its branches.
    Query { clauses: Vec<AstNode> },
    Comment { text: String },
    LineComment { text: String },
    BlockComment { text: String },

    Match {
        optional: bool,
        pattern: Box<AstNode>,
        predicate: Option<Box<AstNode>>,
    },
    Create { pattern: Box<AstNode> },
    /// MERGE takes a single pattern path plus ON CREATE / ON MATCH actions.
    Merge {
        path: Box<AstNode>,
        actions: Vec<AstNode>,
    },
    OnCreate { items: Vec<AstNode> },
    OnMatch { items: Vec<AstNode> },
    With {
        distinct: bool,
        /// `WITH *`
        include_existing: bool,
        projections: Vec<AstNode>,
        order_by: Option<Box<AstNode>>,
        skip: Option<Box<AstNode>>,
        limit: Option<Box<AstNode>>,
        predicate: Option<Box<AstNode>>,
    },
    Return {
        distinct: bool,
        /// `RETURN *`
        include_existing: bool,
        projections: Vec<AstNode>,
        order_by: Option<Box<AstNode>>,
        skip: Option<Box<AstNode>>,
        limit: Option<Box<AstNode>>,
    },
    Union { all: bool },
    Unwind {
        expression: Box<AstNode>,
        alias: Box<AstNode>,
    },
    Call {
        proc_name: String,
        arguments: Vec<AstNode>,
        /// YIELD items, as projections over the procedure outputs.
        projections: Vec<AstNode>,
    },
    Delete {
        detach: bool,
        expressions: Vec<AstNode>,
    },
    Set { items: Vec<AstNode> },
    /// `SET <property> = <expression>`; the property is a property operator.
    SetProperty {
        property: Box<AstNode>,
        expression: Box<AstNode>,
    },
    Remove { items: Vec<AstNode> },
    Foreach {
        identifier: Box<AstNode>,
        expression: Box<AstNode>,
        clauses: Vec<AstNode>,
    },

    Pattern { paths: Vec<AstNode> },
    /// `p = (a)-[r]->(b)`
    NamedPath {
        identifier: Box<AstNode>,
        path: Box<AstNode>,
    },
    /// `shortestPath(..)` when `single`, `allShortestPaths(..)` otherwise.
    ShortestPath {
        single: bool,
        path: Box<AstNode>,
    },
    /// Alternating node / relationship elements; even positions are nodes.
    PatternPath { elements: Vec<AstNode> },
    NodePattern {
        identifier: Option<Box<AstNode>>,
        labels: Vec<String>,
        properties: Option<Box<AstNode>>,
    },
    RelPattern {
        identifier: Option<Box<AstNode>>,
        direction: Direction,
        reltypes: Vec<String>,
        properties: Option<Box<AstNode>>,
        varlength: Option<Range>,
    },

    Projection {
        expression: Box<AstNode>,
        alias: Option<Box<AstNode>>,
    },
    OrderBy { items: Vec<AstNode> },
    SortItem {
        expression: Box<AstNode>,
        ascending: bool,
    },

    Identifier { name: String },
    Parameter { name: String },
    Literal(Literal),
    List { elements: Vec<AstNode> },
    /// Map literal; keys are plain property names, values are expressions.
    Map { entries: Vec<(String, AstNode)> },
    /// Function call `f(args..)`.
    ApplyOperator {
        func_name: String,
        distinct: bool,
        arguments: Vec<AstNode>,
    },
    /// Function call with a star argument, `f(*)`.
    ApplyAllOperator {
        func_name: String,
        distinct: bool,
    },
    /// `expression.prop`
    PropertyOperator {
        expression: Box<AstNode>,
        prop_name: String,
    },
    /// `expression[subscript]`
    SubscriptOperator {
        expression: Box<AstNode>,
        subscript: Box<AstNode>,
    },
    BinaryOperator {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    UnaryOperator {
        op: UnaryOp,
        argument: Box<AstNode>,
    },
    /// `reduce(acc = init, var IN list | eval)`
    Reduce {
        accumulator: Box<AstNode>,
        init: Box<AstNode>,
        identifier: Box<AstNode>,
        expression: Box<AstNode>,
        eval: Option<Box<AstNode>>,
    },
    /// `[x IN xs WHERE pred | eval]` and the ANY/ALL/NONE/SINGLE predicates.
    ListComprehension {
        form: ComprehensionForm,
        identifier: Box<AstNode>,
        expression: Option<Box<AstNode>>,
        predicate: Option<Box<AstNode>>,
        eval: Option<Box<AstNode>>,
    },
    /// `[p = (a)-[r]->(b) WHERE pred | eval]`
    PatternComprehension {
        identifier: Option<Box<AstNode>>,
        pattern: Box<AstNode>,
        predicate: Option<Box<AstNode>>,
        eval: Box<AstNode>,
    },

    /// Legacy `CREATE INDEX ON :Label(prop)`.
    CreateNodePropsIndex {
        label: String,
        prop_names: Vec<String>,
    },
    /// `CREATE INDEX FOR (n:Label) ON (n.prop, ..)`.
    CreatePatternPropsIndex {
        identifier: Box<AstNode>,
        label: String,
        properties: Vec<AstNode>,
        relationship: bool,
    },
    DropPropsIndex {
        label: String,
        prop_names: Vec<String>,
    },

    /// `CYPHER name=value ..` prefix.
    CypherOption { params: Vec<AstNode> },
    CypherOptionParam {
        name: String,
        value: Box<AstNode>,
    },

    /// A construct the parser recognises but the dialect does not support;
    /// `kind` is restricted to the legacy kinds listed in [`NodeKind`].
    Unsupported {
        kind: NodeKind,
        children: Vec<AstNode>,
    },
}

impl AstNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AstNode::Statement { .. } => NodeKind::Statement,
            AstNode::Query { .. } => NodeKind::Query,
            AstNode::Comment { .. } => NodeKind::Comment,
            AstNode::LineComment { .. } => NodeKind::LineComment,
            AstNode::BlockComment { .. } => NodeKind::BlockComment,
            AstNode::Match { .. } => NodeKind::Match,
            AstNode::Create { .. } => NodeKind::Create,
            AstNode::Merge { .. } => NodeKind::Merge,
            AstNode::OnCreate { .. } => NodeKind::OnCreate,
            AstNode::OnMatch { .. } => NodeKind::OnMatch,
            AstNode::With { .. } => NodeKind::With,
            AstNode::Return { .. } => NodeKind::Return,
            AstNode::Union { .. } => NodeKind::Union,
            AstNode::Unwind { .. } => NodeKind::Unwind,
            AstNode::Call { .. } => NodeKind::Call,
            AstNode::Delete { .. } => NodeKind::Delete,
            AstNode::Set { .. } => NodeKind::Set,
            AstNode::SetProperty { .. } => NodeKind::SetProperty,
            AstNode::Remove { .. } => NodeKind::Remove,
            AstNode::Foreach { .. } => NodeKind::Foreach,
            AstNode::Pattern { .. } => NodeKind::Pattern,
            AstNode::NamedPath { .. } => NodeKind::NamedPath,
            AstNode::ShortestPath { .. } => NodeKind::ShortestPath,
            AstNode::PatternPath { .. } => NodeKind::PatternPath,
            AstNode::NodePattern { .. } => NodeKind::NodePattern,
            AstNode::RelPattern { .. } => NodeKind::RelPattern,
            AstNode::Projection { .. } => NodeKind::Projection,
            AstNode::OrderBy { .. } => NodeKind::OrderBy,
            AstNode::SortItem { .. } => NodeKind::SortItem,
            AstNode::Identifier { .. } => NodeKind::Identifier,
            AstNode::Parameter { .. } => NodeKind::Parameter,
            AstNode::Literal(Literal::Integer(_)) => NodeKind::Integer,
            AstNode::Literal(Literal::Float(_)) => NodeKind::Float,
            AstNode::Literal(Literal::Boolean(_)) => NodeKind::Boolean,
            AstNode::Literal(Literal::String(_)) => NodeKind::String,
            AstNode::Literal(Literal::Null) => NodeKind::Null,
            AstNode::List { .. } => NodeKind::List,
            AstNode::Map { .. } => NodeKind::Map,
            AstNode::ApplyOperator { .. } => NodeKind::ApplyOperator,
            AstNode::ApplyAllOperator { .. } => NodeKind::ApplyAllOperator,
            AstNode::PropertyOperator { .. } => NodeKind::PropertyOperator,
            AstNode::SubscriptOperator { .. } => NodeKind::SubscriptOperator,
            AstNode::BinaryOperator { .. } => NodeKind::BinaryOperator,
            AstNode::UnaryOperator { .. } => NodeKind::UnaryOperator,
            AstNode::Reduce { .. } => NodeKind::Reduce,
            AstNode::ListComprehension { form, .. } => match form {
                ComprehensionForm::ListComprehension => NodeKind::ListComprehension,
                ComprehensionForm::Any => NodeKind::Any,
                ComprehensionForm::All => NodeKind::All,
                ComprehensionForm::None => NodeKind::None,
                ComprehensionForm::Single => NodeKind::Single,
            },
            AstNode::PatternComprehension { .. } => NodeKind::PatternComprehension,
            AstNode::CreateNodePropsIndex { .. } => NodeKind::CreateNodePropsIndex,
            AstNode::CreatePatternPropsIndex { .. } => NodeKind::CreatePatternPropsIndex,
            AstNode::DropPropsIndex { .. } => NodeKind::DropPropsIndex,
            AstNode::CypherOption { .. } => NodeKind::CypherOption,
            AstNode::CypherOptionParam { .. } => NodeKind::CypherOptionParam,
            AstNode::Unsupported { kind, .. } => *kind,
        }
    }

    /// Child nodes in source order.
    pub fn children(&self) -> Vec<&AstNode> {
        fn opt(node: &Option<Box<AstNode>>) -> Option<&AstNode> {
            node.as_deref()
        }

        match self {
            AstNode::Statement { options, body } => {
                options.iter().chain(std::iter::once(body.as_ref())).collect()
            }
            AstNode::Query { clauses } => clauses.iter().collect(),
            AstNode::Comment { .. }
            | AstNode::LineComment { .. }
            | AstNode::BlockComment { .. } => vec![],
            AstNode::Match {
                pattern, predicate, ..
            } => std::iter::once(pattern.as_ref())
                .chain(opt(predicate))
                .collect(),
            AstNode::Create { pattern } => vec![pattern.as_ref()],
            AstNode::Merge { path, actions } => {
                std::iter::once(path.as_ref()).chain(actions.iter()).collect()
            }
            AstNode::OnCreate { items } | AstNode::OnMatch { items } => items.iter().collect(),
            AstNode::With {
                projections,
                order_by,
                skip,
                limit,
                predicate,
                ..
            } => projections
                .iter()
                .chain(opt(order_by))
                .chain(opt(skip))
                .chain(opt(limit))
                .chain(opt(predicate))
                .collect(),
            AstNode::Return {
                projections,
                order_by,
                skip,
                limit,
                ..
            } => projections
                .iter()
                .chain(opt(order_by))
                .chain(opt(skip))
                .chain(opt(limit))
                .collect(),
            AstNode::Union { .. } => vec![],
            AstNode::Unwind { expression, alias } => vec![expression.as_ref(), alias.as_ref()],
            AstNode::Call {
                arguments,
                projections,
                ..
            } => arguments.iter().chain(projections.iter()).collect(),
            AstNode::Delete { expressions, .. } => expressions.iter().collect(),
            AstNode::Set { items } => items.iter().collect(),
            AstNode::SetProperty {
                property,
                expression,
            } => vec![property.as_ref(), expression.as_ref()],
            AstNode::Remove { items } => items.iter().collect(),
            AstNode::Foreach {
                identifier,
                expression,
                clauses,
            } => std::iter::once(expression.as_ref())
                .chain(std::iter::once(identifier.as_ref()))
                .chain(clauses.iter())
                .collect(),
            AstNode::Pattern { paths } => paths.iter().collect(),
            AstNode::NamedPath { identifier, path } => vec![identifier.as_ref(), path.as_ref()],
            AstNode::ShortestPath { path, .. } => vec![path.as_ref()],
            AstNode::PatternPath { elements } => elements.iter().collect(),
            AstNode::NodePattern {
                identifier,
                properties,
                ..
            } => opt(identifier).into_iter().chain(opt(properties)).collect(),
            AstNode::RelPattern {
                identifier,
                properties,
                ..
            } => opt(identifier).into_iter().chain(opt(properties)).collect(),
            AstNode::Projection { expression, alias } => std::iter::once(expression.as_ref())
                .chain(opt(alias))
                .collect(),
            AstNode::OrderBy { items } => items.iter().collect(),
            AstNode::SortItem { expression, .. } => vec![expression.as_ref()],
            AstNode::Identifier { .. }
            | AstNode::Parameter { .. }
            | AstNode::Literal(_) => vec![],
            AstNode::List { elements } => elements.iter().collect(),
            AstNode::Map { entries } => entries.iter().map(|(_, value)| value).collect(),
            AstNode::ApplyOperator { arguments, .. } => arguments.iter().collect(),
            AstNode::ApplyAllOperator { .. } => vec![],
            AstNode::PropertyOperator { expression, .. } => vec![expression.as_ref()],
            AstNode::SubscriptOperator {
                expression,
                subscript,
            } => vec![expression.as_ref(), subscript.as_ref()],
            AstNode::BinaryOperator { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            AstNode::UnaryOperator { argument, .. } => vec![argument.as_ref()],
            AstNode::Reduce {
                accumulator,
                init,
                identifier,
                expression,
                eval,
            } => std::iter::once(accumulator.as_ref())
                .chain(std::iter::once(init.as_ref()))
                .chain(std::iter::once(identifier.as_ref()))
                .chain(std::iter::once(expression.as_ref()))
                .chain(opt(eval))
                .collect(),
            AstNode::ListComprehension {
                identifier,
                expression,
                predicate,
                eval,
                ..
            } => std::iter::once(identifier.as_ref())
                .chain(opt(expression))
                .chain(opt(predicate))
                .chain(opt(eval))
                .collect(),
            AstNode::PatternComprehension {
                identifier,
                pattern,
                predicate,
                eval,
            } => opt(identifier)
                .into_iter()
                .chain(std::iter::once(pattern.as_ref()))
                .chain(opt(predicate))
                .chain(std::iter::once(eval.as_ref()))
                .collect(),
            AstNode::CreateNodePropsIndex { .. } | AstNode::DropPropsIndex { .. } => vec![],
            AstNode::CreatePatternPropsIndex {
                identifier,
                properties,
                ..
            } => std::iter::once(identifier.as_ref())
                .chain(properties.iter())
                .collect(),
            AstNode::CypherOption { params } => params.iter().collect(),
            AstNode::CypherOptionParam { value, .. } => vec![value.as_ref()],
            AstNode::Unsupported { children, .. } => children.iter().collect(),
        }
    }

    /// Name of an identifier node, `None` for any other shape.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            AstNode::Identifier { name } => Some(name),
            _ => None,
        }
    }
}

/// Parser output: a list of roots (comments and at most one statement per
/// query string in this dialect).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub roots: Vec<AstNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_of_comprehension_forms() {
        let comp = |form| AstNode::ListComprehension {
            form,
            identifier: Box::new(AstNode::Identifier { name: "x".into() }),
            expression: None,
            predicate: None,
            eval: None,
        };
        assert_eq!(
            comp(ComprehensionForm::ListComprehension).kind(),
            NodeKind::ListComprehension
        );
        assert_eq!(comp(ComprehensionForm::Any).kind(), NodeKind::Any);
        assert_eq!(comp(ComprehensionForm::Single).kind(), NodeKind::Single);
    }

    #[test]
    fn children_are_in_source_order() {
        let unwind = AstNode::Unwind {
            expression: Box::new(AstNode::List { elements: vec![] }),
            alias: Box::new(AstNode::Identifier { name: "x".into() }),
        };
        let kinds: Vec<NodeKind> = unwind.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::List, NodeKind::Identifier]);
    }

    #[test]
    fn kind_names_match_parser_vocabulary() {
        assert_eq!(NodeKind::Match.to_string(), "MATCH");
        assert_eq!(NodeKind::LoadCsv.to_string(), "LOAD_CSV");
        assert_eq!(NodeKind::UsingPeriodicCommit.to_string(), "USING_PERIODIC_COMMIT");
    }
}
