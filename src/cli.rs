use anyhow::{Result, anyhow};
use log::info;
use pico_args::Arguments;
use signal_hook::{consts::TERM_SIGNALS, flag};
use std::{
    env,
    fs::File,
    io::{self, BufWriter},
    path::PathBuf,
    sync::{Arc, atomic::AtomicBool},
};

use handsign::config::ConfigState;
use handsign::dataset::{DatasetKind, DatasetWriter};
use handsign::labels::LabelTable;
use handsign::model::Model;
use handsign::pipeline::GesturePipeline;
use handsign::session::{OutputMode, run_session};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    let text = pargs.contains("--text");
    let out_path: Option<PathBuf> = pargs.opt_value_from_str("--out")?;

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let cfg = load_config(config_path)?;
            let mut pipeline = GesturePipeline::from_config(&cfg)?;
            let mode = if text {
                OutputMode::Text
            } else {
                OutputMode::Json
            };
            stream(&mut pipeline, mode, None)
        }

        Some("record") => {
            let kind: DatasetKind = pargs
                .free_from_str::<String>()
                .map_err(|_| anyhow!("usage: handsign record <pose|motion> <label>"))?
                .parse()?;
            let label: u8 = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handsign record <pose|motion> <label>"))?;
            let cfg = load_config(config_path)?;
            let path = out_path.unwrap_or_else(|| default_dataset_path(kind));
            let mut writer = DatasetWriter::append(&path, kind, label)?;
            let mut pipeline = GesturePipeline::from_config(&cfg)?;
            stream(&mut pipeline, OutputMode::Text, Some(&mut writer))
        }

        Some("doctor") => {
            let cfg = load_config(config_path)?;
            print_response(&doctor_report(&cfg));
            Ok(())
        }

        Some("labels") => {
            let cfg = load_config(config_path)?;
            for (title, path) in [
                ("pose", cfg.pose_labels_path()),
                ("motion", cfg.motion_labels_path()),
            ] {
                let table = LabelTable::load(&path)?;
                println!("{title} ({}):", path.display());
                for (id, label) in table.iter().enumerate() {
                    println!("  {id:>3}  {label}");
                }
            }
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ConfigState> {
    let cfg = match path {
        Some(p) => ConfigState::load(&p)?,
        None => ConfigState::load_or_install_default()?,
    };
    info!("config '{}' from {}", cfg.name(), cfg.path.display());
    Ok(cfg)
}

fn default_dataset_path(kind: DatasetKind) -> PathBuf {
    match kind {
        DatasetKind::Pose => PathBuf::from("keypoint.csv"),
        DatasetKind::Motion => PathBuf::from("point_history.csv"),
    }
}

fn stream(
    pipeline: &mut GesturePipeline,
    mode: OutputMode,
    recorder: Option<&mut DatasetWriter<BufWriter<File>>>,
) -> Result<()> {
    // first signal stops between frames, a second one exits immediately
    let stop = Arc::new(AtomicBool::new(false));
    for sig in TERM_SIGNALS {
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&stop))?;
        flag::register(*sig, Arc::clone(&stop))?;
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stats = run_session(pipeline, stdin.lock(), stdout.lock(), mode, recorder, &stop)?;
    info!(
        "processed {} frames ({} hands, {} bad lines, {} rows recorded)",
        stats.frames, stats.hands, stats.skipped_lines, stats.recorded_rows
    );
    Ok(())
}

fn model_report(path: PathBuf) -> serde_json::Value {
    match Model::load(&path) {
        Ok(m) => serde_json::json!({
            "path": path,
            "input_width": m.input_width(),
            "classes": m.class_count(),
        }),
        Err(e) => serde_json::json!({"path": path, "error": e.to_string()}),
    }
}

fn labels_report(path: PathBuf) -> serde_json::Value {
    match LabelTable::load(&path) {
        Ok(t) => serde_json::json!({"path": path, "count": t.len()}),
        Err(e) => serde_json::json!({"path": path, "error": e.to_string()}),
    }
}

fn doctor_report(cfg: &ConfigState) -> serde_json::Value {
    let (ready, error) = match GesturePipeline::from_config(cfg) {
        Ok(_) => (true, None),
        Err(e) => (false, Some(format!("{e:#}"))),
    };
    let p = &cfg.config.pipeline;
    serde_json::json!({
        "config": cfg.path,
        "name": cfg.name(),
        "pipeline": {
            "history_length": p.history_length,
            "pointing_pose_id": p.pointing_pose_id,
            "max_hands": p.max_hands,
        },
        "models": {
            "pose": model_report(cfg.pose_model_path()),
            "motion": model_report(cfg.motion_model_path()),
        },
        "labels": {
            "pose": labels_report(cfg.pose_labels_path()),
            "motion": labels_report(cfg.motion_labels_path()),
        },
        "ready": ready,
        "error": error,
    })
}

fn print_help() {
    println!(
        r#"handsign — hand gesture recognition over detector landmarks

USAGE:
  handsign help [command]                 Show general or command-specific help
  handsign run [--text]                   Classify frames read from stdin
  handsign record <pose|motion> <label>   Append training rows while classifying
  handsign doctor                         Check config, models and labels
  handsign labels                         List pose and motion labels

OPTIONS:
  --config <path>                         Config file (default ~/.config/handsign/config.toml)
  --text                                  Human-readable output instead of JSON lines
  --out <path>                            Dataset file for `record`

INPUT (one JSON object per line):
  {{"width":640,"height":480,"hands":[{{"handedness":"Right","landmarks":[[x,y], ...21]}}]}}
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: handsign run [--config P] [--text]\nReads detector frames from stdin and writes one result per frame to stdout."
        ),
        "record" => println!(
            "usage: handsign record <pose|motion> <label 0-9> [--config P] [--out F]\nLike `run --text`, and appends normalized feature rows to F\n(default keypoint.csv / point_history.csv)."
        ),
        "doctor" => println!(
            "usage: handsign doctor [--config P]\nLoads models and label tables and reports shapes and mismatches."
        ),
        "labels" => println!("usage: handsign labels [--config P]\nPrints both label tables with class ids."),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
