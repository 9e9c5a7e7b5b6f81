//! Compile an edit script into a render plan and print it.

use std::path::PathBuf;

use cutline_core::EngineConfig;
use cutline_render::compile;

pub fn run(config: &EngineConfig, script: PathBuf) -> anyhow::Result<()> {
    let session = super::load_session(config, &script)?;
    let plan = compile(&session)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
