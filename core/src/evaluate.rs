//! Evaluated views of a project.
//!
//! A [`ProjectEvaluator`] turns a document plus a configuration into the
//! flat property and item tables that the differ compares. The trait exists
//! so the diff and conversion layers never depend on a particular evaluation
//! strategy.

use std::collections::BTreeMap;

use crate::configuration::Configuration;
use crate::document::ProjectDocument;
use crate::error_codes;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    #[error("[SDKIFY_EVAL_001] unterminated property reference in '{text}'. Suggestion: check for a missing ')' after '$('.")]
    UnterminatedReference { text: String },
}

impl EvalError {
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::UnterminatedReference { .. } => error_codes::EVAL_UNTERMINATED,
        }
    }
}

/// A property as it stands after evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedProperty {
    pub name: String,
    pub evaluated_value: String,
    pub unevaluated_value: String,
    /// False for properties seeded by the toolchain (SDK defaults,
    /// reserved properties). The differ only considers project-defined
    /// properties on the original side.
    pub defined_in_project: bool,
}

/// An item as it stands after evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluatedItem {
    pub item_type: String,
    pub evaluated_include: String,
    pub metadata: BTreeMap<String, String>,
}

impl EvaluatedItem {
    pub fn new(item_type: impl Into<String>, include: impl Into<String>) -> Self {
        EvaluatedItem {
            item_type: item_type.into(),
            evaluated_include: include.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Simple name of the include: for assembly references the part before
    /// the first comma of a full name, trimmed.
    pub fn include_simple_name(&self) -> &str {
        match self.evaluated_include.split_once(',') {
            Some((head, _)) => head.trim(),
            None => self.evaluated_include.trim(),
        }
    }
}

/// The flat result of evaluating a document under one configuration.
#[derive(Debug, Clone, Default)]
pub struct EvaluatedProject {
    pub properties: Vec<EvaluatedProperty>,
    pub items: Vec<EvaluatedItem>,
}

impl EvaluatedProject {
    pub fn property(&self, name: &str) -> Option<&EvaluatedProperty> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.evaluated_value.as_str())
    }

    pub fn items_of_type<'a>(
        &'a self,
        item_type: &'a str,
    ) -> impl Iterator<Item = &'a EvaluatedItem> {
        self.items
            .iter()
            .filter(move |i| i.item_type.eq_ignore_ascii_case(item_type))
    }

    /// True if any Reference item matches `simple_name` (case-insensitive,
    /// ignoring version and key qualifiers).
    pub fn has_reference(&self, simple_name: &str) -> bool {
        self.items_of_type("Reference")
            .any(|i| i.include_simple_name().eq_ignore_ascii_case(simple_name))
    }
}

/// Evaluates a document under a configuration plus global property
/// overrides. Globals win over everything the document defines.
pub trait ProjectEvaluator {
    fn evaluate(
        &self,
        doc: &ProjectDocument,
        config: &Configuration,
        globals: &[(String, String)],
    ) -> Result<EvaluatedProject, EvalError>;
}
