//! Procedure registry.
//!
//! CALL validation needs three facts about a procedure: whether it exists,
//! its declared argument count, and which outputs it yields. Embedders
//! expose their catalog through [`ProcedureRegistry`];
//! [`BuiltinProcedureRegistry`] registers the schema-metadata procedures the
//! server ships with.

use std::collections::HashMap;

/// Declared argument count of a procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// The procedure accepts any number of arguments; arity is not checked.
    Variadic,
}

/// Callable procedure as declared in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureSignature {
    pub name: String,
    pub arity: Arity,
    pub outputs: Vec<String>,
}

impl ProcedureSignature {
    pub fn new(name: &str, arity: Arity, outputs: &[&str]) -> Self {
        ProcedureSignature {
            name: name.to_string(),
            arity,
            outputs: outputs.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Whether the procedure yields an output with the given name.
    pub fn contains_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|output| output == name)
    }
}

/// Answers procedure lookups during CALL validation.
pub trait ProcedureRegistry {
    fn get(&self, name: &str) -> Option<&ProcedureSignature>;
}

/// Registry of the built-in schema-metadata procedures.
#[derive(Debug, Default, Clone)]
pub struct BuiltinProcedureRegistry {
    procedures: HashMap<String, ProcedureSignature>,
}

impl BuiltinProcedureRegistry {
    pub fn new() -> Self {
        let mut registry = BuiltinProcedureRegistry {
            procedures: HashMap::new(),
        };

        registry.register(ProcedureSignature::new(
            "db.labels",
            Arity::Fixed(0),
            &["label"],
        ));
        registry.register(ProcedureSignature::new(
            "db.relationshipTypes",
            Arity::Fixed(0),
            &["relationshipType"],
        ));
        registry.register(ProcedureSignature::new(
            "db.propertyKeys",
            Arity::Fixed(0),
            &["propertyKey"],
        ));
        registry.register(ProcedureSignature::new(
            "dbms.components",
            Arity::Fixed(0),
            &["name", "versions", "edition"],
        ));
        registry.register(ProcedureSignature::new(
            "db.idx.fulltext.createNodeIndex",
            Arity::Variadic,
            &[],
        ));
        registry.register(ProcedureSignature::new(
            "db.idx.fulltext.queryNodes",
            Arity::Fixed(2),
            &["node", "score"],
        ));

        registry
    }

    pub fn register(&mut self, signature: ProcedureSignature) {
        self.procedures.insert(signature.name.clone(), signature);
    }
}

impl ProcedureRegistry for BuiltinProcedureRegistry {
    fn get(&self, name: &str) -> Option<&ProcedureSignature> {
        self.procedures.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = BuiltinProcedureRegistry::new();
        let labels = registry.get("db.labels").unwrap();
        assert_eq!(labels.arity, Arity::Fixed(0));
        assert!(labels.contains_output("label"));
        assert!(!labels.contains_output("name"));
        assert!(registry.get("db.nope").is_none());
    }

    #[test]
    fn custom_registration() {
        let mut registry = BuiltinProcedureRegistry::new();
        registry.register(ProcedureSignature::new(
            "algo.pageRank",
            Arity::Fixed(2),
            &["node", "score"],
        ));
        assert_eq!(
            registry.get("algo.pageRank").unwrap().arity,
            Arity::Fixed(2)
        );
    }
}
