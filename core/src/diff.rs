//! Structural diff between a legacy project and its synthesized baseline.
//!
//! Every property and item of the legacy project lands in exactly one
//! bucket per configuration. The rewrite engine consumes these buckets;
//! it never looks at the raw documents to decide what to delete.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::evaluate::{EvaluatedItem, EvaluatedProject, EvaluatedProperty};

/// A property the baseline also defines, with a different value.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedProperty {
    pub name: String,
    pub project_value: String,
    pub baseline_value: String,
}

/// Properties of the legacy project, bucketed against the baseline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PropertiesDiff {
    /// Same value in the baseline; the SDK supplies it.
    pub defaulted: Vec<EvaluatedPropertyRef>,
    /// Defined in the baseline with a different value.
    pub changed: Vec<ChangedProperty>,
    /// Not defined in the baseline at all.
    pub not_defaulted: Vec<EvaluatedPropertyRef>,
}

/// The serializable slice of an evaluated property the diff carries.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluatedPropertyRef {
    pub name: String,
    pub evaluated_value: String,
}

impl From<&EvaluatedProperty> for EvaluatedPropertyRef {
    fn from(property: &EvaluatedProperty) -> Self {
        EvaluatedPropertyRef {
            name: property.name.clone(),
            evaluated_value: property.evaluated_value.clone(),
        }
    }
}

impl PropertiesDiff {
    pub fn is_defaulted(&self, name: &str) -> bool {
        self.defaulted.iter().any(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn changed(&self, name: &str) -> Option<&ChangedProperty> {
        self.changed.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// An item present on both sides with differing metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ChangedItem {
    pub item: EvaluatedItem,
    /// Metadata entries whose values differ from (or are absent in) the
    /// baseline item with the same include.
    pub differing_metadata: BTreeMap<String, String>,
}

/// Items bucketed against the baseline, per item type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemsDiff {
    /// Present in the baseline with satisfying metadata; globs supply it.
    pub defaulted: Vec<EvaluatedItem>,
    /// Not present in the baseline.
    pub not_defaulted: Vec<EvaluatedItem>,
    /// Present only in the baseline (globs pull in something the legacy
    /// project never listed).
    pub introduced: Vec<EvaluatedItem>,
    /// Present on both sides with differing metadata.
    pub changed: Vec<ChangedItem>,
}

impl ItemsDiff {
    pub fn is_defaulted(&self, include: &str) -> bool {
        self.defaulted
            .iter()
            .any(|i| i.evaluated_include.eq_ignore_ascii_case(include))
    }

    pub fn changed(&self, include: &str) -> Option<&ChangedItem> {
        self.changed
            .iter()
            .find(|c| c.item.evaluated_include.eq_ignore_ascii_case(include))
    }
}

/// The full diff for one configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectDiff {
    pub properties: PropertiesDiff,
    pub items: BTreeMap<String, ItemsDiff>,
}

impl ProjectDiff {
    pub fn items_of_type(&self, item_type: &str) -> Option<&ItemsDiff> {
        self.items
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(item_type))
            .map(|(_, diff)| diff)
    }
}

/// Diffs keyed by configuration identity.
#[derive(Debug, Default)]
pub struct DiffCollection {
    by_identity: FxHashMap<String, ProjectDiff>,
}

impl DiffCollection {
    pub fn new() -> Self {
        DiffCollection::default()
    }

    pub fn insert(&mut self, identity: String, diff: ProjectDiff) {
        self.by_identity.insert(identity, diff);
    }

    pub fn get(&self, identity: &str) -> Option<&ProjectDiff> {
        self.by_identity.get(identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.by_identity.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectDiff)> {
        self.by_identity.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Diffs one evaluated configuration of the legacy project against the
/// baseline's evaluation of the same configuration.
pub fn diff_project(project: &EvaluatedProject, baseline: &EvaluatedProject) -> ProjectDiff {
    ProjectDiff {
        properties: diff_properties(project, baseline),
        items: diff_items(project, baseline),
    }
}

fn diff_properties(project: &EvaluatedProject, baseline: &EvaluatedProject) -> PropertiesDiff {
    let mut diff = PropertiesDiff::default();
    for property in project.properties.iter().filter(|p| p.defined_in_project) {
        match baseline.property(&property.name) {
            Some(base) if base.evaluated_value.eq_ignore_ascii_case(&property.evaluated_value) => {
                diff.defaulted.push(property.into());
            }
            Some(base) => diff.changed.push(ChangedProperty {
                name: property.name.clone(),
                project_value: property.evaluated_value.clone(),
                baseline_value: base.evaluated_value.clone(),
            }),
            None => diff.not_defaulted.push(property.into()),
        }
    }
    diff
}

fn diff_items(
    project: &EvaluatedProject,
    baseline: &EvaluatedProject,
) -> BTreeMap<String, ItemsDiff> {
    let mut types: Vec<String> = Vec::new();
    for item in project.items.iter().chain(baseline.items.iter()) {
        if !types.iter().any(|t| t.eq_ignore_ascii_case(&item.item_type)) {
            types.push(item.item_type.clone());
        }
    }

    types
        .into_iter()
        .map(|item_type| {
            let diff = diff_items_of_type(project, baseline, &item_type);
            (item_type, diff)
        })
        .collect()
}

fn diff_items_of_type(
    project: &EvaluatedProject,
    baseline: &EvaluatedProject,
    item_type: &str,
) -> ItemsDiff {
    let project_items: Vec<_> = project.items_of_type(item_type).collect();
    let baseline_items: Vec<_> = baseline.items_of_type(item_type).collect();

    let mut diff = ItemsDiff::default();

    for item in &project_items {
        let same_include: Vec<_> = baseline_items
            .iter()
            .filter(|b| includes_equal(&b.evaluated_include, &item.evaluated_include))
            .collect();
        if same_include.is_empty() {
            diff.not_defaulted.push((*item).clone());
        } else if same_include.iter().any(|b| metadata_satisfies(b, item)) {
            diff.defaulted.push((*item).clone());
        } else {
            diff.changed.push(ChangedItem {
                item: (*item).clone(),
                differing_metadata: differing_metadata(same_include[0], item),
            });
        }
    }

    for base in &baseline_items {
        let in_project = project_items
            .iter()
            .any(|i| includes_equal(&i.evaluated_include, &base.evaluated_include));
        if !in_project {
            diff.introduced.push((*base).clone());
        }
    }

    diff
}

fn includes_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Asymmetric: the baseline satisfies a project item when every metadata
/// entry the project spells out is already carried by the baseline item
/// with the same value. Extra baseline metadata is fine; extra project
/// metadata counts as changed.
fn metadata_satisfies(baseline: &EvaluatedItem, project: &EvaluatedItem) -> bool {
    project.metadata.iter().all(|(name, value)| {
        baseline
            .metadata
            .get(name)
            .map(|base| base.eq_ignore_ascii_case(value))
            .unwrap_or(false)
    })
}

fn differing_metadata(
    baseline: &EvaluatedItem,
    project: &EvaluatedItem,
) -> BTreeMap<String, String> {
    project
        .metadata
        .iter()
        .filter(|(name, value)| {
            baseline
                .metadata
                .get(*name)
                .map(|base| !base.eq_ignore_ascii_case(value))
                .unwrap_or(true)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
