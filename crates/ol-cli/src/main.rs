//! Outliner command driver
//!
//! Loads a RON scene, then reads one JSON request per line from stdin:
//!
//! ```text
//! {"command": "outliner_generate"}
//! {"command": "outliner_update", "payload": {"id": "...", "name": "Leg-A"}}
//! {"event": "layer_changed"}
//! ```
//!
//! Every request produces one JSON line on stdout. Invalidation notices are
//! printed after the response of the request that caused them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ol_core::{Controller, HostEvent, MemoryScene, OutlinerConfig};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "outliner", about = "Drive a scene outliner over line-delimited JSON")]
struct Cli {
    /// Scene file (RON)
    scene: PathBuf,

    /// Outliner configuration file (RON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print responses
    #[arg(long)]
    pretty: bool,

    /// Write the scene back to its file on exit
    #[arg(long)]
    save: bool,
}

/// One line of input
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Request {
    Command {
        command: String,
        #[serde(default)]
        payload: Option<Value>,
    },
    Event {
        event: HostEvent,
    },
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ol_core=info,ol_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let scene = MemoryScene::load(&cli.scene)
        .with_context(|| format!("Failed to load scene {}", cli.scene.display()))?;
    let config = match &cli.config {
        Some(path) => OutlinerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OutlinerConfig::default(),
    };
    tracing::info!("Loaded scene {}", cli.scene.display());

    let mut controller = Controller::new(scene, config);
    let notices: Arc<Mutex<Vec<Value>>> = Arc::default();
    let sink = Arc::clone(&notices);
    controller.on_invalidate(move |outliner| {
        sink.lock().push(json!({
            "notice": "outliner_obsolete",
            "filename": outliner.filename(),
        }));
    });

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Request>(&line) {
            Ok(Request::Command { command, payload }) => {
                serde_json::to_value(controller.execute_named(&command, payload))?
            }
            Ok(Request::Event { event }) => {
                json!({ "event": event, "invalidated": controller.on_host_event(event) })
            }
            Err(e) => {
                tracing::warn!("Unreadable request: {}", e);
                json!({ "errors": [{ "code": "tab.outliner.error.invalid_command" }] })
            }
        };

        print_line(&mut stdout, &output, cli.pretty)?;
        for notice in notices.lock().drain(..) {
            print_line(&mut stdout, &notice, cli.pretty)?;
        }
    }

    if cli.save {
        controller
            .host()
            .save(&cli.scene)
            .with_context(|| format!("Failed to save scene {}", cli.scene.display()))?;
        tracing::info!("Saved scene {}", cli.scene.display());
    }
    Ok(())
}

fn print_line(out: &mut impl Write, value: &Value, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
