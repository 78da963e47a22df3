// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation Studio command-line driver
//!
//! Loads a rig description and a `.dca` animation and runs one headless
//! action over them:
//! - `summary` prints keyframes and timing
//! - `procedure <Name>` prints the runtime playback procedure
//! - `json` prints the baked snapshots
//! - `frames [fps]` renders frames and reports the count
//! - `reencode <out>` writes the animation back out at the current version

use animstudio_editor::{export_frames, EditorContext, EditorError, EditorSettings, FrameBuffer, SETTINGS_FILE_NAME};
use animstudio_sequencer::{Rig, RigDescription};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: animstudio <rig.ron> <animation.dca> [summary|procedure <Name>|json|frames [fps]|reencode <out>]";

fn main() -> ExitCode {
    let settings = match EditorSettings::load_or_default(Path::new(SETTINGS_FILE_NAME)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to read {SETTINGS_FILE_NAME}: {e}");
            EditorSettings::default()
        }
    };

    // Initialize logging; RUST_LOG wins over the configured filter
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Animation Studio v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String], settings: EditorSettings) -> Result<(), EditorError> {
    let [rig_path, animation_path, rest @ ..] = args else {
        return Err(EditorError::InvalidInput(USAGE.to_string()));
    };

    let description: RigDescription = ron::from_str(&std::fs::read_to_string(rig_path)?)?;
    let rig = Rig::from_description(&description)?;
    tracing::info!("Loaded rig {} with {} parts", rig.name, rig.part_count());

    let mut context = EditorContext::new(rig, settings);
    context.load_animation_file(Path::new(animation_path))?;

    match rest {
        [] => print_summary(&mut context),
        [command] if command == "summary" => print_summary(&mut context),
        [command, name] if command == "procedure" => println!("{}", context.export_procedure(name)?),
        [command] if command == "json" => println!("{}", context.export_json()?),
        [command, fps @ ..] if command == "frames" && fps.len() <= 1 => {
            let fps = match fps.first() {
                Some(text) => animstudio_editor::parse_axis_value(text)
                    .ok_or_else(|| EditorError::InvalidInput(format!("not a number: {text:?}")))?,
                None => context.settings.export_fps,
            };
            let mut buffer = FrameBuffer::default();
            let count = export_frames(&mut context, fps, &mut buffer, |done, total| {
                tracing::debug!("Rendered frame {done}/{total}");
            })?;
            println!("{count} frames at {fps} fps");
        }
        [command, out] if command == "reencode" => {
            context.save_animation_file(&PathBuf::from(out))?;
        }
        _ => return Err(EditorError::InvalidInput(USAGE.to_string())),
    }
    Ok(())
}

fn print_summary(context: &mut EditorContext) {
    let timeline = &mut context.state.timeline;
    let total = timeline.total_time();
    println!("keyframes: {}", timeline.len());
    println!("total time: {total} ticks");
    println!("looping: {} (re-enters at {})", timeline.looping, timeline.loop_offset());
    for keyframe in timeline.sorted_keyframes() {
        println!(
            "  {:>8.3} .. {:>8.3}  {} rotations, {} positions, {} curve points",
            keyframe.start_time(),
            keyframe.end_time(),
            keyframe.rotation_map.len(),
            keyframe.position_map.len(),
            keyframe.progression.points().len()
        );
    }
}
