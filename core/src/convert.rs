//! The rewrite engine.
//!
//! Orchestrates the whole conversion: classify, synthesize the baseline,
//! diff every configuration, then run the ordered rewrite passes over a
//! copy of the document. Every pass is idempotent; running the converter
//! on its own output produces an empty report.

use thiserror::Error;

use crate::baseline::{self, BaselineProject};
use crate::configuration::Configuration;
use crate::diff::{self, DiffCollection, ProjectDiff};
use crate::document::{GroupKind, ItemGroup, ProjectDocument, ProjectItem};
use crate::error_codes;
use crate::evaluate::{EvalError, ProjectEvaluator};
use crate::packages::{PackageEntry, PackageVersionSource};
use crate::report::{ConversionReport, RewriteOp};
use crate::rules;
use crate::style::{self, StyleReport};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    #[error("[SDKIFY_CONV_001] unsupported project style: {reason}. Suggestion: projects with custom imports must be converted by hand.")]
    UnsupportedStyle { reason: String },
    #[error("[SDKIFY_CONV_002] the project does not define OutputType under any configuration. Suggestion: add an explicit OutputType property before converting.")]
    OutputTypeUnknown,
    #[error("[SDKIFY_CONV_003] cannot determine a target framework. Suggestion: pass an explicit target framework override.")]
    TargetFrameworkUnknown,
    #[error("[SDKIFY_CONV_004] evaluation failed: {0}")]
    Eval(#[from] EvalError),
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::UnsupportedStyle { .. } => error_codes::CONV_UNSUPPORTED_STYLE,
            ConvertError::OutputTypeUnknown => error_codes::CONV_OUTPUT_TYPE,
            ConvertError::TargetFrameworkUnknown => error_codes::CONV_TARGET_FRAMEWORK,
            ConvertError::Eval(_) => error_codes::CONV_EVAL,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Replaces the moniker mapped from the legacy framework version.
    pub target_framework: Option<String>,
}

/// A parsed packages.config manifest plus where it came from, so the
/// report can flag the file as obsolete.
#[derive(Debug, Clone)]
pub struct PackagesManifest {
    pub path: String,
    pub entries: Vec<PackageEntry>,
}

/// The converted document plus everything the CLI needs to describe what
/// happened.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub document: ProjectDocument,
    pub report: ConversionReport,
    pub style: StyleReport,
    pub target_framework: String,
}

pub struct ProjectConverter<'a> {
    evaluator: &'a dyn ProjectEvaluator,
    versions: &'a dyn PackageVersionSource,
    options: ConvertOptions,
}

impl<'a> ProjectConverter<'a> {
    pub fn new(
        evaluator: &'a dyn ProjectEvaluator,
        versions: &'a dyn PackageVersionSource,
    ) -> Self {
        ProjectConverter {
            evaluator,
            versions,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Classifies without mutating anything.
    pub fn inspect(&self, doc: &ProjectDocument) -> Result<StyleReport, ConvertError> {
        let unconditioned = self.evaluator.evaluate(doc, &Configuration::empty(), &[])?;
        Ok(style::classify(doc, &unconditioned))
    }

    pub fn convert(
        &self,
        doc: &ProjectDocument,
        manifest: Option<&PackagesManifest>,
    ) -> Result<ConversionOutcome, ConvertError> {
        let unconditioned = self.evaluator.evaluate(doc, &Configuration::empty(), &[])?;
        let style_report = style::classify(doc, &unconditioned);
        if !style_report.style.is_supported() {
            return Err(ConvertError::UnsupportedStyle {
                reason: format!("{} projects are not converted", style_report.style),
            });
        }

        let configurations = baseline::discover_configurations(doc);
        let baseline = baseline::synthesize(
            doc,
            &unconditioned,
            style_report.style,
            style_report.uses_wpf,
            style_report.uses_winforms,
            self.evaluator,
            &configurations,
            self.options.target_framework.as_deref(),
        )?;

        let mut diffs = DiffCollection::new();
        for config in &configurations {
            let original = self.evaluator.evaluate(doc, config, &[])?;
            if let Some(base) = baseline.evaluated(&config.identity()) {
                diffs.insert(config.identity(), diff::diff_project(&original, base));
            }
        }

        let mut document = doc.clone();
        let mut report = ConversionReport::new();
        let passes = Passes {
            baseline: &baseline,
            diffs: &diffs,
            versions: self.versions,
        };
        passes.run(&mut document, manifest, &mut report);

        Ok(ConversionOutcome {
            target_framework: baseline.target_framework.clone(),
            document,
            report,
            style: style_report,
        })
    }
}

struct Passes<'a> {
    baseline: &'a BaselineProject,
    diffs: &'a DiffCollection,
    versions: &'a dyn PackageVersionSource,
}

impl Passes<'_> {
    fn run(
        &self,
        doc: &mut ProjectDocument,
        manifest: Option<&PackagesManifest>,
        report: &mut ConversionReport,
    ) {
        self.pass_packages(doc, manifest, report);
        self.pass_imports(doc, report);
        self.pass_prune_properties(doc, report);
        self.pass_insert_properties(doc, report);
        self.pass_prune_items(doc, report);
        self.pass_negate_introduced(doc, report);
        self.pass_merge_property_groups(doc);
        self.pass_cleanup(doc);
    }

    /// Diff for a group condition. `None` means the group must be left
    /// untouched: either the condition is not canonical or no diff was
    /// computed for its configuration.
    fn diff_for(&self, condition: Option<&str>) -> Option<&ProjectDiff> {
        let identity = match condition {
            None => String::new(),
            Some(c) => Configuration::parse(c).ok()?.identity(),
        };
        self.diffs.get(&identity)
    }

    fn pass_packages(
        &self,
        doc: &mut ProjectDocument,
        manifest: Option<&PackagesManifest>,
        report: &mut ConversionReport,
    ) {
        let Some(manifest) = manifest else { return };

        let mut added = Vec::new();
        for entry in &manifest.entries {
            if rules::is_denied_package(&entry.id) {
                report.add_warning(format!("dropped deny-listed package {}", entry.id));
                continue;
            }
            if rules::package_satisfied_by_tfm(&entry.id, &self.baseline.target_framework) {
                continue;
            }
            if doc.has_item_include("PackageReference", &entry.id) {
                continue;
            }
            let version = if entry.version.is_empty() {
                match self.versions.resolve(&entry.id) {
                    Some(v) => v,
                    None => {
                        report.add_warning(format!("no version resolved for package {}", entry.id));
                        continue;
                    }
                }
            } else {
                entry.version.clone()
            };
            let mut item =
                ProjectItem::include("PackageReference", &entry.id).with_metadata("Version", &version);
            if entry.development_dependency {
                item = item.with_metadata("PrivateAssets", "all");
            }
            report.record(RewriteOp::PackageAdded {
                id: entry.id.clone(),
                version,
            });
            added.push(item);
        }

        let added_any = !added.is_empty();
        if added_any {
            doc.append_group(GroupKind::Items(ItemGroup {
                condition: None,
                items: added,
            }));
        }

        // Drop the None/Content item that points at the manifest itself.
        let mut removed_manifest_item = false;
        for id in doc.group_ids() {
            let Some(group) = doc.item_group_mut(id) else {
                continue;
            };
            group.items.retain(|item| {
                let is_manifest = item
                    .include
                    .as_deref()
                    .map(|inc| rules::normalize_include(inc).ends_with("packages.config"))
                    .unwrap_or(false);
                if is_manifest {
                    report.record(RewriteOp::ItemRemoved {
                        item_type: item.item_type.clone(),
                        include: item.include.clone().unwrap_or_default(),
                    });
                    removed_manifest_item = true;
                }
                !is_manifest
            });
        }

        if added_any || removed_manifest_item {
            report.record(RewriteOp::ObsoleteFile {
                path: manifest.path.clone(),
            });
        }
    }

    fn pass_imports(&self, doc: &mut ProjectDocument, report: &mut ConversionReport) {
        let removable: Vec<_> = doc
            .imports()
            .filter(|(_, import)| {
                if import.label.as_deref() == Some("Shared") {
                    return false;
                }
                let name = import.file_name();
                rules::RECOGNIZED_IMPORTS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(name))
                    || rules::is_package_injected_import(&import.project)
            })
            .map(|(id, import)| (id, import.project.clone()))
            .collect();
        for (id, project) in removable {
            doc.remove_group(id);
            report.record(RewriteOp::ImportRemoved { project });
        }

        if doc.sdk.as_deref() != Some(self.baseline.sdk) {
            doc.sdk = Some(self.baseline.sdk.to_string());
            report.record(RewriteOp::SdkSet {
                sdk: self.baseline.sdk.to_string(),
            });
        }
    }

    fn pass_prune_properties(&self, doc: &mut ProjectDocument, report: &mut ConversionReport) {
        let project_name = doc.project_name.clone();
        for id in doc.group_ids() {
            let Some(GroupKind::Properties(group)) = doc.group(id) else {
                continue;
            };
            let config = match group.condition.as_deref() {
                None => Configuration::empty(),
                Some(condition) => match Configuration::parse(condition) {
                    Ok(config) => config,
                    // non-canonical condition, leave the group untouched
                    Err(_) => continue,
                },
            };
            let Some(diff) = self.diffs.get(&config.identity()) else {
                continue;
            };

            let mut removals = Vec::new();
            for property in &group.properties {
                if rules::is_protected_property(&property.name) {
                    continue;
                }
                // OutputType only defaults away when it spells the SDK's
                // own default.
                if property.name.eq_ignore_ascii_case("OutputType")
                    && !property.value.eq_ignore_ascii_case("Library")
                {
                    continue;
                }
                let redundant = rules::is_never_needed_property(&property.name)
                    || rules::is_structural_default(
                        &property.name,
                        &property.value,
                        &project_name,
                        &config,
                    )
                    || diff.properties.is_defaulted(&property.name);
                if redundant {
                    removals.push((property.name.clone(), property.value.clone()));
                }
            }

            let Some(group) = doc.property_group_mut(id) else {
                continue;
            };
            for (name, value) in removals {
                if group.remove_property(&name) {
                    report.record(RewriteOp::PropertyRemoved { name, value });
                }
            }
        }
    }

    fn pass_insert_properties(&self, doc: &mut ProjectDocument, report: &mut ConversionReport) {
        let mut inserts: Vec<(&str, String)> = vec![(
            "TargetFramework",
            self.baseline.target_framework.clone(),
        )];
        if self.baseline.uses_wpf {
            inserts.push(("UseWPF", "true".to_string()));
        }
        if self.baseline.uses_winforms {
            inserts.push(("UseWindowsForms", "true".to_string()));
        }
        // The legacy build never auto-generated assembly attributes;
        // letting the SDK start doing so would change build output.
        inserts.push(("GenerateAssemblyInfo", "false".to_string()));

        let top = doc.ensure_top_level_property_group();
        for (name, value) in inserts {
            if doc.find_property(name).is_some() {
                continue;
            }
            let Some(group) = doc.property_group_mut(top) else {
                continue;
            };
            group.set_property(name, &value);
            report.record(RewriteOp::PropertyAdded {
                name: name.to_string(),
                value,
            });
        }
    }

    fn pass_prune_items(&self, doc: &mut ProjectDocument, report: &mut ConversionReport) {
        let is_desktop = self.baseline.style.is_desktop()
            || self.baseline.uses_wpf
            || self.baseline.uses_winforms;
        let tfm = self.baseline.target_framework.clone();

        for id in doc.group_ids() {
            let Some(GroupKind::Items(group)) = doc.group(id) else {
                continue;
            };
            let diff = self.diff_for(group.condition.as_deref());
            if diff.is_none() && group.condition.is_some() {
                continue;
            }

            enum Action {
                Keep,
                Remove,
                Update(std::collections::BTreeMap<String, String>),
            }

            let mut actions = Vec::with_capacity(group.items.len());
            for item in &group.items {
                let Some(include) = item.include.as_deref() else {
                    actions.push(Action::Keep);
                    continue;
                };
                if item.item_type.eq_ignore_ascii_case("Reference") {
                    let simple = include
                        .split(',')
                        .next()
                        .unwrap_or(include)
                        .trim()
                        .to_string();
                    let package_supplied = item
                        .metadata_value("HintPath")
                        .map(rules::is_package_hint_path)
                        .unwrap_or(false);
                    if rules::is_implicit_framework_reference(&simple)
                        || rules::package_satisfied_by_tfm(&simple, &tfm)
                        || package_supplied
                        || (is_desktop
                            && (rules::WPF_REFERENCES
                                .iter()
                                .any(|r| r.eq_ignore_ascii_case(&simple))
                                || rules::WINFORMS_REFERENCES
                                    .iter()
                                    .any(|r| r.eq_ignore_ascii_case(&simple))))
                    {
                        actions.push(Action::Remove);
                        continue;
                    }
                }
                if item.item_type.eq_ignore_ascii_case("PackageReference")
                    && (rules::is_denied_package(include)
                        || rules::package_satisfied_by_tfm(include, &tfm))
                {
                    actions.push(Action::Remove);
                    continue;
                }
                if is_desktop {
                    let normalized = rules::normalize_include(include);
                    if rules::DESKTOP_GENERATED_FILES
                        .iter()
                        .any(|f| normalized.ends_with(&rules::normalize_include(f)))
                    {
                        actions.push(Action::Remove);
                        continue;
                    }
                }
                if let Some(diff) = diff {
                    if let Some(items) = diff.items_of_type(&item.item_type) {
                        if items.is_defaulted(include) {
                            actions.push(Action::Remove);
                            continue;
                        }
                        if let Some(changed) = items.changed(include) {
                            actions.push(Action::Update(changed.differing_metadata.clone()));
                            continue;
                        }
                    }
                }
                actions.push(Action::Keep);
            }

            let Some(group) = doc.item_group_mut(id) else {
                continue;
            };
            let mut kept = Vec::with_capacity(group.items.len());
            for (item, action) in group.items.drain(..).zip(actions) {
                match action {
                    Action::Keep => kept.push(item),
                    Action::Remove => report.record(RewriteOp::ItemRemoved {
                        item_type: item.item_type.clone(),
                        include: item.include.clone().unwrap_or_default(),
                    }),
                    Action::Update(metadata) => {
                        let include = item.include.clone().unwrap_or_default();
                        report.record(RewriteOp::ItemUpdated {
                            item_type: item.item_type.clone(),
                            include: include.clone(),
                        });
                        kept.push(ProjectItem {
                            item_type: item.item_type,
                            include: None,
                            update: Some(include),
                            remove: None,
                            metadata: metadata.into_iter().collect(),
                        });
                    }
                }
            }
            group.items = kept;
        }
    }

    fn pass_negate_introduced(&self, doc: &mut ProjectDocument, report: &mut ConversionReport) {
        let mut negations: Vec<(String, String)> = Vec::new();
        for (_, diff) in self.diffs.iter() {
            for (item_type, items) in &diff.items {
                for introduced in &items.introduced {
                    let include = introduced.evaluated_include.clone();
                    let duplicate = negations.iter().any(|(t, i)| {
                        t.eq_ignore_ascii_case(item_type) && i.eq_ignore_ascii_case(&include)
                    });
                    if !duplicate && !doc.has_item_remove(item_type, &include) {
                        negations.push((item_type.clone(), include));
                    }
                }
            }
        }
        if negations.is_empty() {
            return;
        }

        negations.sort();
        let items = negations
            .into_iter()
            .map(|(item_type, include)| {
                report.record(RewriteOp::ItemNegated {
                    item_type: item_type.clone(),
                    include: include.clone(),
                });
                ProjectItem::remove_decl(&item_type, &include)
            })
            .collect();
        doc.append_group(GroupKind::Items(ItemGroup {
            condition: None,
            items,
        }));
    }

    /// Folds redundant property groups into the single top-level group.
    /// Unconditioned secondary groups always fold. Conditioned groups fold
    /// only when they are structurally identical to each other and their
    /// configurations cover every non-empty diff identity, which means the
    /// properties hold under every configuration anyway.
    fn pass_merge_property_groups(&self, doc: &mut ProjectDocument) {
        let top = match doc.top_level_property_group() {
            Some(id) => id,
            None => return,
        };

        let mut fold: Vec<crate::document::GroupId> = Vec::new();
        let mut conditioned: Vec<(crate::document::GroupId, String, Vec<(String, String)>)> =
            Vec::new();
        for (id, group) in doc.property_groups() {
            if id == top {
                continue;
            }
            match group.condition.as_deref() {
                None => fold.push(id),
                Some(condition) => {
                    if let Ok(config) = Configuration::parse(condition) {
                        let mut signature: Vec<(String, String)> = group
                            .properties
                            .iter()
                            .map(|p| (p.name.to_ascii_lowercase(), p.value.clone()))
                            .collect();
                        signature.sort();
                        conditioned.push((id, config.identity(), signature));
                    }
                }
            }
        }

        if let Some((_, _, first_signature)) = conditioned.first() {
            let identical = conditioned
                .iter()
                .all(|(_, _, sig)| sig == first_signature);
            let covered = self
                .diffs
                .identities()
                .filter(|identity| !identity.is_empty())
                .all(|identity| conditioned.iter().any(|(_, covered, _)| covered == identity));
            if identical && conditioned.len() > 1 && covered {
                fold.extend(conditioned.iter().map(|(id, _, _)| *id));
            }
        }

        for id in fold {
            let Some(GroupKind::Properties(group)) = doc.group(id) else {
                continue;
            };
            let properties = group.properties.clone();
            let Some(top_group) = doc.property_group_mut(top) else {
                continue;
            };
            for property in properties {
                // first writer wins
                if top_group.property(&property.name).is_none() {
                    top_group.properties.push(property);
                }
            }
            doc.remove_group(id);
        }
    }

    fn pass_cleanup(&self, doc: &mut ProjectDocument) {
        let empty: Vec<_> = doc
            .group_ids()
            .into_iter()
            .filter(|&id| match doc.group(id) {
                Some(GroupKind::Properties(g)) => g.properties.is_empty(),
                Some(GroupKind::Items(g)) => g.items.is_empty(),
                _ => false,
            })
            .collect();
        for id in empty {
            doc.remove_group(id);
        }
        doc.tools_version = None;
        doc.default_targets = None;
        doc.xmlns = None;
    }
}
