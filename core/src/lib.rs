//! sdkify: converts legacy, verbose project files into their minimal
//! SDK-style equivalent.
//!
//! The pipeline classifies a legacy project's shape, synthesizes the
//! minimal SDK-style document the new toolchain would generate on its own,
//! diffs the original against that baseline under every configuration the
//! original names, and then runs an ordered set of idempotent rewrite
//! passes so that only genuinely non-default state survives.

pub mod baseline;
pub mod configuration;
pub mod convert;
pub mod diff;
pub mod document;
pub mod error_codes;
pub mod evaluate;
pub mod evaluator;
pub mod packages;
pub mod project_xml;
pub mod report;
pub mod rules;
pub mod style;

pub use configuration::{ConditionParseError, Configuration};
pub use convert::{
    ConversionOutcome, ConvertError, ConvertOptions, PackagesManifest, ProjectConverter,
};
pub use document::{GroupId, GroupKind, ProjectDocument};
pub use evaluate::{EvalError, EvaluatedProject, ProjectEvaluator};
pub use evaluator::SimpleEvaluator;
pub use packages::{
    parse_packages_config, CachedVersionSource, PackageVersionSource, StaticVersionTable,
};
pub use project_xml::{parse_project, write_project, ProjectXmlError};
pub use report::{ConversionReport, RewriteOp, SCHEMA_VERSION};
pub use style::{ProjectStyle, StyleReport};
