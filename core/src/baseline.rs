//! Baseline synthesis.
//!
//! Builds the minimal SDK-style counterpart of a legacy project and
//! evaluates it under each configuration the legacy project names. The
//! differ later compares the legacy project against this baseline to
//! decide what the rewrite can drop.

use rustc_hash::FxHashMap;

use crate::configuration::Configuration;
use crate::convert::ConvertError;
use crate::document::{GroupKind, ProjectDocument, ProjectProperty, PropertyGroup};
use crate::evaluate::{EvaluatedProject, ProjectEvaluator};
use crate::rules;
use crate::style::ProjectStyle;

/// The synthesized minimal project plus its per-configuration evaluations.
#[derive(Debug)]
pub struct BaselineProject {
    pub style: ProjectStyle,
    pub sdk: &'static str,
    pub output_type: String,
    pub target_framework: String,
    pub uses_wpf: bool,
    pub uses_winforms: bool,
    pub global_properties: Vec<(String, String)>,
    evaluated: FxHashMap<String, EvaluatedProject>,
}

impl BaselineProject {
    pub fn evaluated(&self, identity: &str) -> Option<&EvaluatedProject> {
        self.evaluated.get(identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.evaluated.keys().map(String::as_str)
    }
}

/// Collects the configurations a document mentions: the empty
/// configuration first, then each distinct parseable group condition.
pub fn discover_configurations(doc: &ProjectDocument) -> Vec<Configuration> {
    let mut configurations = vec![Configuration::empty()];
    let mut seen: Vec<String> = vec![Configuration::empty().identity()];

    for id in doc.group_ids() {
        let condition = match doc.group(id) {
            Some(GroupKind::Properties(g)) => g.condition.as_deref(),
            Some(GroupKind::Items(g)) => g.condition.as_deref(),
            _ => None,
        };
        let Some(condition) = condition else { continue };
        let Ok(config) = Configuration::parse(condition) else {
            continue;
        };
        let identity = config.identity();
        if !seen.contains(&identity) {
            seen.push(identity);
            configurations.push(config);
        }
    }

    configurations
}

/// Synthesizes the baseline for `doc`. `unconditioned` is the legacy
/// project evaluated under the empty configuration, which supplies the
/// output type and target framework.
pub fn synthesize(
    doc: &ProjectDocument,
    unconditioned: &EvaluatedProject,
    style: ProjectStyle,
    uses_wpf: bool,
    uses_winforms: bool,
    evaluator: &dyn ProjectEvaluator,
    configurations: &[Configuration],
    tfm_override: Option<&str>,
) -> Result<BaselineProject, ConvertError> {
    let output_type = match unconditioned.property_value("OutputType") {
        Some(value) => value.to_string(),
        // An SDK-style document may legitimately omit OutputType.
        None if doc.sdk.is_some() => "Library".to_string(),
        None => return Err(ConvertError::OutputTypeUnknown),
    };

    let target_framework = resolve_target_framework(unconditioned, tfm_override)?;
    let sdk = rules::sdk_for_style(style, uses_wpf, uses_winforms);

    let minimal = minimal_document(
        &doc.project_name,
        sdk,
        &output_type,
        &target_framework,
        style,
        uses_wpf,
        uses_winforms,
    );

    let global_properties = vec![("TargetFramework".to_string(), target_framework.clone())];

    let mut evaluated = FxHashMap::default();
    for config in configurations {
        let project = evaluator.evaluate(&minimal, config, &global_properties)?;
        evaluated.insert(config.identity(), project);
    }

    Ok(BaselineProject {
        style,
        sdk,
        output_type,
        target_framework,
        uses_wpf,
        uses_winforms,
        global_properties,
        evaluated,
    })
}

fn resolve_target_framework(
    unconditioned: &EvaluatedProject,
    tfm_override: Option<&str>,
) -> Result<String, ConvertError> {
    if let Some(tfm) = tfm_override {
        return Ok(tfm.to_string());
    }
    if let Some(tfm) = unconditioned.property_value("TargetFramework") {
        if !tfm.is_empty() {
            return Ok(tfm.to_string());
        }
    }
    unconditioned
        .property_value("TargetFrameworkVersion")
        .and_then(rules::tfm_from_framework_version)
        .ok_or(ConvertError::TargetFrameworkUnknown)
}

fn minimal_document(
    project_name: &str,
    sdk: &'static str,
    output_type: &str,
    target_framework: &str,
    style: ProjectStyle,
    uses_wpf: bool,
    uses_winforms: bool,
) -> ProjectDocument {
    let mut doc = ProjectDocument::new(project_name);
    doc.sdk = Some(sdk.to_string());

    let mut properties = vec![
        ProjectProperty {
            name: "TargetFramework".to_string(),
            value: target_framework.to_string(),
        },
        ProjectProperty {
            name: "OutputType".to_string(),
            value: output_type.to_string(),
        },
    ];
    if style.is_desktop() || uses_wpf || uses_winforms {
        if uses_wpf {
            properties.push(ProjectProperty {
                name: "UseWPF".to_string(),
                value: "true".to_string(),
            });
        }
        if uses_winforms {
            properties.push(ProjectProperty {
                name: "UseWindowsForms".to_string(),
                value: "true".to_string(),
            });
        }
    }

    doc.append_group(GroupKind::Properties(PropertyGroup {
        condition: None,
        properties,
    }));
    doc
}
