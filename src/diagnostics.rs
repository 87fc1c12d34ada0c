use crate::detector::DetectorDescriptor;
use crate::severity::Severity;
use itertools::Itertools;

/// A single finding produced by a detector, anchored to a source line.
#[derive(Debug, Clone)]
#[must_use]
pub struct Diagnostic {
    pub detector: &'static DetectorDescriptor,
    pub severity: Severity,
    pub file: String,
    pub line: u32,
    pub message: String,
}

/// Render diagnostics in the stable report format.
///
/// Lines are sorted by (file, line) ascending, each formatted as
/// `<file>:<line>: <severity>: <message>`, joined with newlines and with no
/// trailing separator. Existing consumers parse this exact shape; treat it
/// as a contract.
pub fn render_report(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .sorted_by(|a, b| a.file.cmp(&b.file).then_with(|| a.line.cmp(&b.line)))
        .map(|d| {
            format!(
                "{}:{}: {}: {}",
                d.file,
                d.line,
                d.severity.as_str(),
                d.message
            )
        })
        .join("\n")
}
