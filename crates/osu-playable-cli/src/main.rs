//! osu-playable - beatmap and mod-set inspector
//!
//! Usage:
//!   osu-playable info <file> [--objects] [--touch] [--json]
//!   osu-playable mods <legacy-chars>
//!   osu-playable --help

use std::path::Path;

use anyhow::{bail, Context};
use osu_playable_core::{BeatmapParser, GameMode, ModSet};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    init_logging();

    match args[0].as_str() {
        "info" => run_info(&args[1..]),
        "mods" => run_mods(&args[1..]),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    }
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run_info(args: &[String]) -> anyhow::Result<()> {
    let mut file = None;
    let mut with_objects = false;
    let mut mode = GameMode::Standard;
    let mut json = false;

    for arg in args {
        match arg.as_str() {
            "--objects" => with_objects = true,
            "--touch" => mode = GameMode::Touch,
            "--json" => json = true,
            other if !other.starts_with("--") => file = Some(other.to_string()),
            other => bail!("Unknown option: {other}"),
        }
    }

    let Some(file) = file else {
        bail!("Usage: osu-playable info <file> [--objects] [--touch] [--json]");
    };

    let beatmap = BeatmapParser::new(Path::new(&file))
        .parse(with_objects, mode)
        .with_context(|| format!("Failed to parse {file}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&beatmap)?);
        return Ok(());
    }

    println!(
        "{} - {} [{}] by {}",
        beatmap.metadata.artist, beatmap.metadata.title, beatmap.metadata.version,
        beatmap.metadata.creator
    );
    println!("Format version: v{}", beatmap.format_version);
    println!("Ruleset:        {:?}", beatmap.mode);
    println!("MD5:            {}", beatmap.md5);
    println!(
        "Difficulty:     CS{:.1} AR{:.1} OD{:.1} HP{:.1}",
        beatmap.difficulty.gameplay_cs,
        beatmap.difficulty.ar(),
        beatmap.difficulty.od,
        beatmap.difficulty.hp
    );
    if with_objects {
        println!("Hit objects:    {}", beatmap.hit_objects.len());
        println!("Max combo:      {}", beatmap.max_combo());
    }

    Ok(())
}

fn run_mods(args: &[String]) -> anyhow::Result<()> {
    let Some(encoded) = args.first() else {
        bail!("Usage: osu-playable mods <legacy-chars>");
    };

    let mods = ModSet::decode_legacy(encoded)
        .with_context(|| format!("Failed to decode mod string '{encoded}'"))?;

    if mods.is_empty() {
        println!("No mods");
        return Ok(());
    }

    for m in mods.iter() {
        println!("{:<4}{}", m.acronym(), m.kind());
    }

    let difficulty = osu_playable_core::BeatmapDifficulty::default();
    println!("Score multiplier: {:.2}x", mods.score_multiplier(&difficulty));
    println!("Track rate:       {:.2}x", mods.track_rate());
    println!("Re-encoded:       {}", mods.encode_legacy());

    Ok(())
}

fn print_help() {
    println!("osu-playable - beatmap and mod-set inspector");
    println!();
    println!("Usage:");
    println!("  osu-playable info <file> [--objects] [--touch] [--json]");
    println!("      Parse a .osu file and print a summary.");
    println!("      --objects  parse and count hit objects");
    println!("      --touch    parse for the touch ruleset");
    println!("      --json     emit the parsed beatmap as JSON");
    println!();
    println!("  osu-playable mods <legacy-chars>");
    println!("      Decode a legacy mod string (e.g. 'hrd') and show the");
    println!("      resulting mod set and aggregate score multiplier.");
    println!();
    println!("  osu-playable --help");
}
