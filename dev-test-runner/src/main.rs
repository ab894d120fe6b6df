//! Runs every `fixtures/*.catalog.json` through the generator and compares
//! each root's document with `fixtures/*.expected.json`.
//!
//! Expected files map root type → document, or root type →
//! `{"error": "<substring of the error message>"}` for roots that must fail.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;

use schema_gen::{generate, Catalog};

#[derive(Default)]
struct Tally {
    passed: usize,
    failed: usize,
    unchecked: usize,
}

fn main() -> Result<()> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| "fixtures".to_string());
    let pattern = format!("{dir}/*.catalog.json");
    let mut tally = Tally::default();
    for entry in glob::glob(&pattern)? {
        run_fixture(&entry?, &mut tally)?;
    }
    eprintln!(
        "{} passed, {} failed, {} without expectations",
        tally.passed, tally.failed, tally.unchecked
    );
    if tally.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn expected_path(catalog_path: &Path) -> Option<PathBuf> {
    let name = catalog_path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".catalog.json")?;
    Some(catalog_path.with_file_name(format!("{stem}.expected.json")))
}

fn run_fixture(catalog_path: &Path, tally: &mut Tally) -> Result<()> {
    let label = catalog_path.display().to_string();
    let source = std::fs::read_to_string(catalog_path).with_context(|| format!("read {label}"))?;
    let catalog = Catalog::from_json_str(&source).with_context(|| format!("load {label}"))?;

    let expected: Value = match expected_path(catalog_path).filter(|p| p.exists()) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?
        }
        None => Value::Null,
    };

    for root in catalog.roots() {
        let key = root.to_string();
        let outcome = generate(&catalog, root);
        let Some(want) = expected.get(&key) else {
            tally.unchecked += 1;
            eprintln!("➖ {label} {key}: no expectation");
            if let Ok(doc) = &outcome {
                println!("{}", serde_json::to_string_pretty(&doc.to_json())?);
            }
            continue;
        };

        let verdict = match (&outcome, want.get("error").and_then(Value::as_str)) {
            (Err(error), Some(needle)) => {
                let message = error.to_string();
                message.contains(needle).then_some(()).ok_or(format!("error `{message}` lacks `{needle}`"))
            }
            (Err(error), None) => Err(format!("unexpected error: {error}")),
            (Ok(_), Some(needle)) => Err(format!("expected an error containing `{needle}`")),
            (Ok(doc), None) => {
                let dangling = doc.dangling_refs();
                if !dangling.is_empty() {
                    Err(format!("dangling references: {dangling:?}"))
                } else if &doc.to_json() != want {
                    Err(format!(
                        "document differs:\n{}",
                        serde_json::to_string_pretty(&doc.to_json())?
                    ))
                } else {
                    Ok(())
                }
            }
        };

        match verdict {
            Ok(()) => {
                tally.passed += 1;
                eprintln!("{} {label} {key}", "✅".green());
            }
            Err(reason) => {
                tally.failed += 1;
                eprintln!("{} {label} {key}: {reason}", "❌".red());
            }
        }
    }
    Ok(())
}
