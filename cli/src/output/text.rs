//! Plain-text rendering of conversion results.

use std::fmt::Write;
use std::path::Path;

use sdkify::{ConversionOutcome, ConversionReport};

pub fn render_summary(project: &Path, outcome: &ConversionOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}:", project.display());
    let _ = writeln!(out, "  style: {}", outcome.style.style);
    let _ = writeln!(
        out,
        "  sdk: {}",
        outcome.document.sdk.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "  target framework: {}", outcome.target_framework);
    if outcome.report.is_noop() {
        let _ = writeln!(out, "  already converted, nothing to do");
    } else {
        let _ = writeln!(out, "  {} rewrite(s) applied", outcome.report.op_count());
    }
    for warning in &outcome.report.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }
    out
}

/// One line per rewrite, grouped by kind, in a stable order.
pub fn render_report(report: &ConversionReport) -> String {
    let mut out = String::new();
    for kind in ["sdk", "imports", "properties", "items", "packages", "files"] {
        let ops: Vec<_> = report.ops.iter().filter(|op| op.kind() == kind).collect();
        if ops.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{kind}:");
        for op in ops {
            let _ = writeln!(out, "  {op}");
        }
    }
    if out.is_empty() {
        out.push_str("no changes\n");
    }
    out
}
