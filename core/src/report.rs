//! The conversion report.
//!
//! Records every mutation a conversion performed, plus warnings for the
//! things conversion left alone on purpose. Serialized to JSON for
//! tooling, schema-versioned so downstream consumers can detect drift.

use serde::Serialize;

pub const SCHEMA_VERSION: u32 = 1;

/// One mutation the rewrite engine performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RewriteOp {
    SdkSet {
        sdk: String,
    },
    ImportRemoved {
        project: String,
    },
    PropertyRemoved {
        name: String,
        value: String,
    },
    PropertyAdded {
        name: String,
        value: String,
    },
    ItemRemoved {
        item_type: String,
        include: String,
    },
    ItemUpdated {
        item_type: String,
        include: String,
    },
    ItemNegated {
        item_type: String,
        include: String,
    },
    PackageAdded {
        id: String,
        version: String,
    },
    ObsoleteFile {
        path: String,
    },
}

impl RewriteOp {
    /// Short label used by the text renderer to group ops.
    pub fn kind(&self) -> &'static str {
        match self {
            RewriteOp::SdkSet { .. } => "sdk",
            RewriteOp::ImportRemoved { .. } => "imports",
            RewriteOp::PropertyRemoved { .. } | RewriteOp::PropertyAdded { .. } => "properties",
            RewriteOp::ItemRemoved { .. }
            | RewriteOp::ItemUpdated { .. }
            | RewriteOp::ItemNegated { .. } => "items",
            RewriteOp::PackageAdded { .. } => "packages",
            RewriteOp::ObsoleteFile { .. } => "files",
        }
    }
}

impl std::fmt::Display for RewriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RewriteOp::SdkSet { sdk } => write!(f, "set Sdk=\"{sdk}\""),
            RewriteOp::ImportRemoved { project } => write!(f, "removed import {project}"),
            RewriteOp::PropertyRemoved { name, value } => {
                write!(f, "removed property {name} ({value})")
            }
            RewriteOp::PropertyAdded { name, value } => {
                write!(f, "added property {name}={value}")
            }
            RewriteOp::ItemRemoved { item_type, include } => {
                write!(f, "removed {item_type} {include}")
            }
            RewriteOp::ItemUpdated { item_type, include } => {
                write!(f, "updated {item_type} {include}")
            }
            RewriteOp::ItemNegated { item_type, include } => {
                write!(f, "added {item_type} Remove=\"{include}\"")
            }
            RewriteOp::PackageAdded { id, version } => {
                write!(f, "added package {id} {version}")
            }
            RewriteOp::ObsoleteFile { path } => write!(f, "obsolete file {path}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub version: u32,
    pub ops: Vec<RewriteOp>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Default for ConversionReport {
    fn default() -> Self {
        ConversionReport::new()
    }
}

impl ConversionReport {
    pub fn new() -> Self {
        ConversionReport {
            version: SCHEMA_VERSION,
            ops: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn record(&mut self, op: RewriteOp) {
        self.ops.push(op);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    /// Paths conversion made obsolete (deleted by the CLI under no-backup).
    pub fn obsolete_files(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            RewriteOp::ObsoleteFile { path } => Some(path.as_str()),
            _ => None,
        })
    }
}
