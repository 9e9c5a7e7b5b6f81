//! Edit scripts: a JSON list of edit commands replayed against a fresh
//! session.

use anyhow::Context;
use cutline_core::{EditCommand, EditOutcome, Session};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScriptFile {
    Wrapped { edits: Vec<EditCommand> },
    Bare(Vec<EditCommand>),
}

pub fn parse(json: &str) -> anyhow::Result<Vec<EditCommand>> {
    let file: ScriptFile = serde_json::from_str(json).context("not a valid edit script")?;
    Ok(match file {
        ScriptFile::Wrapped { edits } => edits,
        ScriptFile::Bare(edits) => edits,
    })
}

pub fn load(path: &Path) -> anyhow::Result<Vec<EditCommand>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse(&json)
}

/// Apply every edit in order. Stops at the first rejected edit.
pub fn replay(session: &mut Session, edits: Vec<EditCommand>) -> anyhow::Result<Vec<EditOutcome>> {
    let mut outcomes = Vec::with_capacity(edits.len());
    for (i, edit) in edits.into_iter().enumerate() {
        let description = edit.description().to_string();
        let outcome = session
            .apply(edit)
            .with_context(|| format!("edit #{} ({description}) was rejected", i + 1))?;
        tracing::debug!(index = i + 1, ?outcome, "edit applied");
        outcomes.push(outcome);
    }
    session.check_invariants()?;
    Ok(outcomes)
}
