pub mod inspect;
pub mod plan;
pub mod render;

use crate::script;
use cutline_core::{EngineConfig, Session};
use std::path::Path;

/// Build a session from config and replay `script_path` into it.
pub fn load_session(config: &EngineConfig, script_path: &Path) -> anyhow::Result<Session> {
    let mut session = Session::from_config(config);
    let edits = script::load(script_path)?;
    script::replay(&mut session, edits)?;
    Ok(session)
}
