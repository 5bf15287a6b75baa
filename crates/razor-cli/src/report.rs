//! Text rendering of parse results, shared by `--dump` and the browser.

use anyhow::{Context, Result};
use razor_syntax::{ParserOptions, ParserResults, parse_with};
use std::path::Path;

pub fn parse_file(path: &Path, options: &ParserOptions) -> Result<ParserResults> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template {}", path.display()))?;
    log::debug!("parsing {} ({} bytes)", path.display(), source.len());
    Ok(parse_with(&source, options))
}

/// Tree dump followed by a diagnostics section.
pub fn report_lines(results: &ParserResults) -> Vec<String> {
    let mut lines: Vec<String> = results
        .document
        .to_string()
        .lines()
        .map(str::to_string)
        .collect();
    lines.push(String::new());
    lines.extend(diagnostic_lines(results));
    lines
}

pub fn diagnostic_lines(results: &ParserResults) -> Vec<String> {
    if results.success() {
        return vec!["No diagnostics.".to_string()];
    }
    let mut lines = vec![format!("{} diagnostic(s):", results.errors.len())];
    lines.extend(
        results
            .errors
            .iter()
            .map(|error| format!("  {error} [{} chars]", error.length)),
    );
    lines
}
