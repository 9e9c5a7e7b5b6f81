//! Print the session an edit script produces.

use std::path::PathBuf;

use cutline_core::EngineConfig;

pub fn run(config: &EngineConfig, script: PathBuf, json: bool) -> anyhow::Result<()> {
    let session = super::load_session(config, &script)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    let timeline = session.timeline();
    println!("Media: {}", session.catalog().len());
    for media in session.catalog().iter() {
        println!(
            "  {} {} [{}] {}",
            media.id, media.name, media.mime_type, media.duration
        );
    }
    println!("Duration: {}", timeline.total_duration());
    for track in timeline.tracks() {
        println!("{} {} ({:?})", track.id, track.name, track.kind);
        for clip in &track.clips {
            println!(
                "  {} {} {} -> {} (source {} -> {})",
                clip.id,
                clip.name,
                clip.start,
                clip.end(),
                clip.trim_start,
                clip.trim_end
            );
        }
    }
    Ok(())
}
