//! Function registry.
//!
//! The validator only needs two answers about a function: does it exist, and
//! does it aggregate. Embedders with their own function catalog implement
//! [`FunctionRegistry`]; [`BuiltinFunctionRegistry`] covers the dialect's
//! built-in functions and is what the server wires in by default.

use std::collections::HashMap;

/// Answers function-existence and aggregation queries during validation.
pub trait FunctionRegistry {
    fn exists(&self, name: &str) -> bool;
    fn is_aggregate(&self, name: &str) -> bool;
}

/// Function table entry.
#[derive(Clone, Copy)]
struct FunctionDef {
    aggregate: bool,
}

const SCALAR: FunctionDef = FunctionDef { aggregate: false };
const AGGREGATE: FunctionDef = FunctionDef { aggregate: true };

// Static function table, keyed by lower-cased name. Function names are
// case-insensitive in the dialect.
lazy_static::lazy_static! {
    static ref FUNCTIONS: HashMap<&'static str, FunctionDef> = {
        let mut m = HashMap::new();

        // ===== AGGREGATIONS =====
        m.insert("avg", AGGREGATE);
        m.insert("collect", AGGREGATE);
        m.insert("count", AGGREGATE);
        m.insert("max", AGGREGATE);
        m.insert("min", AGGREGATE);
        m.insert("sum", AGGREGATE);
        m.insert("percentilecont", AGGREGATE);
        m.insert("percentiledisc", AGGREGATE);
        m.insert("stdev", AGGREGATE);
        m.insert("stdevp", AGGREGATE);

        // ===== SCALAR =====
        m.insert("coalesce", SCALAR);
        m.insert("endnode", SCALAR);
        m.insert("startnode", SCALAR);
        m.insert("exists", SCALAR);
        m.insert("head", SCALAR);
        m.insert("last", SCALAR);
        m.insert("id", SCALAR);
        m.insert("labels", SCALAR);
        m.insert("type", SCALAR);
        m.insert("length", SCALAR);
        m.insert("size", SCALAR);
        m.insert("timestamp", SCALAR);
        m.insert("tointeger", SCALAR);
        m.insert("tofloat", SCALAR);
        m.insert("toboolean", SCALAR);
        m.insert("properties", SCALAR);
        m.insert("keys", SCALAR);

        // ===== LISTS AND PATHS =====
        m.insert("nodes", SCALAR);
        m.insert("relationships", SCALAR);
        m.insert("range", SCALAR);
        m.insert("reverse", SCALAR);
        m.insert("tail", SCALAR);

        // ===== STRINGS =====
        m.insert("left", SCALAR);
        m.insert("right", SCALAR);
        m.insert("ltrim", SCALAR);
        m.insert("rtrim", SCALAR);
        m.insert("trim", SCALAR);
        m.insert("replace", SCALAR);
        m.insert("split", SCALAR);
        m.insert("substring", SCALAR);
        m.insert("tolower", SCALAR);
        m.insert("toupper", SCALAR);
        m.insert("tostring", SCALAR);
        m.insert("tojson", SCALAR);

        // ===== NUMERICS =====
        m.insert("abs", SCALAR);
        m.insert("ceil", SCALAR);
        m.insert("floor", SCALAR);
        m.insert("rand", SCALAR);
        m.insert("round", SCALAR);
        m.insert("sign", SCALAR);
        m.insert("sqrt", SCALAR);
        m.insert("e", SCALAR);
        m.insert("exp", SCALAR);
        m.insert("log", SCALAR);
        m.insert("log10", SCALAR);
        m.insert("pi", SCALAR);
        m.insert("acos", SCALAR);
        m.insert("asin", SCALAR);
        m.insert("atan", SCALAR);
        m.insert("atan2", SCALAR);
        m.insert("cos", SCALAR);
        m.insert("cot", SCALAR);
        m.insert("degrees", SCALAR);
        m.insert("haversin", SCALAR);
        m.insert("radians", SCALAR);
        m.insert("sin", SCALAR);
        m.insert("tan", SCALAR);

        // ===== SPATIAL =====
        m.insert("point", SCALAR);
        m.insert("distance", SCALAR);

        m
    };
}

/// Registry backed by the static built-in function table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinFunctionRegistry;

impl BuiltinFunctionRegistry {
    pub fn new() -> Self {
        BuiltinFunctionRegistry
    }
}

impl FunctionRegistry for BuiltinFunctionRegistry {
    fn exists(&self, name: &str) -> bool {
        FUNCTIONS.contains_key(name.to_lowercase().as_str())
    }

    fn is_aggregate(&self, name: &str) -> bool {
        FUNCTIONS
            .get(name.to_lowercase().as_str())
            .map(|def| def.aggregate)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = BuiltinFunctionRegistry::new();
        assert!(registry.exists("count"));
        assert!(registry.exists("COUNT"));
        assert!(registry.exists("toUpper"));
        assert!(!registry.exists("fibonacci"));
    }

    #[test]
    fn aggregates_are_flagged() {
        let registry = BuiltinFunctionRegistry::new();
        assert!(registry.is_aggregate("collect"));
        assert!(registry.is_aggregate("Count"));
        assert!(!registry.is_aggregate("toUpper"));
        assert!(!registry.is_aggregate("no_such_function"));
    }
}
