//! A deliberately simple evaluator.
//!
//! Handles `$(Property)` expansion, conditioned groups matching the active
//! configuration, and the toolchain-seeded defaults the converter needs.
//! It does not attempt the full build-system expression language; a
//! conditioned group whose condition it cannot parse is treated as
//! unconditioned so that evaluation never silently drops content.

use rustc_hash::FxHashMap;

use crate::configuration::Configuration;
use crate::document::{GroupKind, ProjectDocument};
use crate::evaluate::{
    EvalError, EvaluatedItem, EvaluatedProject, EvaluatedProperty, ProjectEvaluator,
};
use crate::rules;

#[derive(Debug, Default)]
pub struct SimpleEvaluator;

impl SimpleEvaluator {
    pub fn new() -> Self {
        SimpleEvaluator
    }
}

struct PropertyTable {
    entries: Vec<EvaluatedProperty>,
    index: FxHashMap<String, usize>,
    globals: FxHashMap<String, ()>,
}

impl PropertyTable {
    fn new() -> Self {
        PropertyTable {
            entries: Vec::new(),
            index: FxHashMap::default(),
            globals: FxHashMap::default(),
        }
    }

    fn get(&self, name: &str) -> Option<&EvaluatedProperty> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&i| &self.entries[i])
    }

    fn is_global(&self, name: &str) -> bool {
        self.globals.contains_key(&name.to_ascii_lowercase())
    }

    fn set(&mut self, name: &str, evaluated: String, unevaluated: String, from_project: bool) {
        if self.is_global(name) {
            return;
        }
        let key = name.to_ascii_lowercase();
        let property = EvaluatedProperty {
            name: name.to_string(),
            evaluated_value: evaluated,
            unevaluated_value: unevaluated,
            defined_in_project: from_project,
        };
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = property,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(property);
            }
        }
    }

    fn set_global(&mut self, name: &str, value: &str) {
        self.set(name, value.to_string(), value.to_string(), false);
        self.globals.insert(name.to_ascii_lowercase(), ());
    }

    fn set_default(&mut self, name: &str, value: &str) {
        if self.get(name).is_none() {
            self.set(name, value.to_string(), value.to_string(), false);
        }
    }

    fn expand(&self, text: &str) -> Result<String, EvalError> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find("$(") {
            out.push_str(&rest[..open]);
            let tail = &rest[open + 2..];
            let Some(close) = tail.find(')') else {
                return Err(EvalError::UnterminatedReference {
                    text: text.to_string(),
                });
            };
            let name = &tail[..close];
            if let Some(property) = self.get(name) {
                out.push_str(&property.evaluated_value);
            }
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// A group applies when it is unconditioned, or when its condition parses
/// and matches the active configuration. Unparseable conditions apply:
/// guessing "no" could drop real content.
fn group_applies(condition: Option<&str>, config: &Configuration) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    match Configuration::parse(condition) {
        Ok(parsed) => parsed.identity() == config.identity(),
        Err(_) => true,
    }
}

impl ProjectEvaluator for SimpleEvaluator {
    fn evaluate(
        &self,
        doc: &ProjectDocument,
        config: &Configuration,
        globals: &[(String, String)],
    ) -> Result<EvaluatedProject, EvalError> {
        let mut table = PropertyTable::new();

        table.set(
            "MSBuildProjectName",
            doc.project_name.clone(),
            doc.project_name.clone(),
            false,
        );
        for (name, value) in globals {
            table.set_global(name, value);
        }
        for (name, value) in config.dimensions() {
            table.set_global(name, value);
        }

        if doc.sdk.is_some() {
            for (name, value) in rules::sdk_default_properties(config, &doc.project_name) {
                table.set_default(&name, &value);
            }
        }

        for id in doc.group_ids() {
            let Some(GroupKind::Properties(group)) = doc.group(id) else {
                continue;
            };
            if !group_applies(group.condition.as_deref(), config) {
                continue;
            }
            for property in &group.properties {
                let evaluated = table.expand(&property.value)?;
                table.set(&property.name, evaluated, property.value.clone(), true);
            }
        }

        let mut items = Vec::new();
        for id in doc.group_ids() {
            let Some(GroupKind::Items(group)) = doc.group(id) else {
                continue;
            };
            if !group_applies(group.condition.as_deref(), config) {
                continue;
            }
            for item in &group.items {
                // Update/Remove declarations adjust globbed items; they are
                // not items themselves.
                let Some(include) = &item.include else {
                    continue;
                };
                let mut evaluated = EvaluatedItem::new(&item.item_type, table.expand(include)?);
                for (name, value) in &item.metadata {
                    evaluated
                        .metadata
                        .insert(name.clone(), table.expand(value)?);
                }
                items.push(evaluated);
            }
        }

        Ok(EvaluatedProject {
            properties: table.entries,
            items,
        })
    }
}
