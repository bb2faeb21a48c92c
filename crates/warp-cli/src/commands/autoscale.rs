use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};
use warpgrid_autoscale::{Capacity, DeciderResults, EvaluationFile, ReasonRegistry, Resources};

/// Aggregate the deciders of an evaluation file and print the verdict.
pub fn evaluate(path: &str, format: &str, out: Option<&str>) -> anyhow::Result<()> {
    let file = EvaluationFile::from_file(Path::new(path))
        .with_context(|| format!("failed to load evaluation file {path}"))?;
    let results = file.into_results()?;

    match results.required_capacity() {
        Some(_) => info!(deciders = results.len(), "required capacity determined"),
        None => warn!(
            undetermined = ?results.undetermined_deciders(),
            "required capacity undetermined"
        ),
    }

    match (format, out) {
        ("wire", Some(out)) => {
            let bytes = results.to_bytes();
            std::fs::write(out, &bytes)?;
            println!("✓ Wrote {} bytes to {out}", bytes.len());
        }
        ("wire", None) => println!("{}", hex::encode(results.to_bytes())),
        (_, out) => {
            let rendered = render(&results, format)?;
            match out {
                Some(out) => std::fs::write(out, rendered)?,
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}

/// Decode wire bytes (raw, or hex text with `--hex`) and print the document.
pub fn decode(path: &str, hex_input: bool) -> anyhow::Result<()> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {path}"))?;
    let bytes = if hex_input {
        hex::decode(String::from_utf8(raw)?.trim())?
    } else {
        raw
    };
    let results = DeciderResults::from_bytes(&bytes, &ReasonRegistry::default())?;
    println!("{}", render(&results, "json")?);
    Ok(())
}

/// Render results as `json` (default) or `text`.
pub fn render(results: &DeciderResults, format: &str) -> anyhow::Result<String> {
    match format {
        "text" => Ok(format_text(results)),
        _ => Ok(serde_json::to_string_pretty(results)?),
    }
}

fn format_text(results: &DeciderResults) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "current capacity:  {}", format_capacity(results.current_capacity()));
    match results.required_capacity() {
        Some(required) => {
            let _ = writeln!(out, "required capacity: {}", format_capacity(&required));
        }
        None => {
            let _ = writeln!(
                out,
                "required capacity: undetermined ({})",
                results.undetermined_deciders().join(", ")
            );
        }
    }
    let _ = writeln!(out, "deciders:");
    let width = results.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, result) in results.iter() {
        let verdict = match result.required_capacity() {
            Some(capacity) => format_capacity(capacity),
            None => "undetermined".to_string(),
        };
        let _ = write!(out, "  {name:<width$}  {verdict}");
        if let Some(reason) = result.reason() {
            let _ = write!(out, " ({})", reason.summary());
        }
        out.push('\n');
    }
    out
}

fn format_capacity(capacity: &Capacity) -> String {
    let mut out = format!("total[{}]", format_resources(&capacity.total));
    if let Some(node) = capacity.node.as_ref().filter(|node| !node.is_empty()) {
        let _ = write!(out, " node[{}]", format_resources(node));
    }
    out
}

fn format_resources(resources: &Resources) -> String {
    if resources.is_empty() {
        return "none".to_string();
    }
    let mut parts = Vec::new();
    if let Some(storage) = resources.storage {
        parts.push(format!("storage={storage}"));
    }
    if let Some(memory) = resources.memory {
        parts.push(format!("memory={memory}"));
    }
    parts.join(" ")
}
