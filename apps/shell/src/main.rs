//! PanelBus shell
//!
//! Headless host: creates the mediator, attaches the administration
//! components against an in-memory backend, replays a scripted session and
//! prints what the registry and the bus saw.

mod logging;
mod report;
mod script;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use panelbus_admin::{AdminComponentsBuilder, InMemoryAdminApi, Record, ResourceKind};
use panelbus_core::channels::system;
use panelbus_core::{now_millis, Mediator, MediatorConfig, SharedMediator};
use serde_json::json;
use tracing::{info, warn};

use crate::script::ScriptStep;

#[derive(Parser)]
#[command(name = "panelbus-shell")]
#[command(about = "Run the PanelBus mediator with the administration components")]
struct Cli {
    /// JSON script of publishes to replay (defaults to a built-in demo session)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Directory for rotated log files
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Console logging only
    #[arg(long, conflicts_with = "log_dir")]
    no_log_file: bool,

    /// Print the component list and pub/sub status as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logs_dir = match (&cli.log_dir, cli.no_log_file) {
        (_, true) => None,
        (Some(dir), false) => Some(dir.clone()),
        (None, false) => Some(logging::default_logs_dir()),
    };
    // Guard must be kept alive for the duration of the program
    let _log_guard = match logging::init(logs_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {e:#}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn demo_backend() -> InMemoryAdminApi {
    let record = |name: &str| -> Record {
        let mut record = Record::new();
        record.insert("name".to_string(), json!(name));
        record
    };

    InMemoryAdminApi::new()
        .with_account("admin", "admin")
        .with_record(ResourceKind::Role, record("administrator"))
        .with_record(ResourceKind::Role, record("operator"))
        .with_record(ResourceKind::User, record("admin"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let steps = match &cli.script {
        Some(path) => script::load(path)?,
        None => script::demo(),
    };

    let config = MediatorConfig::from_env();
    let mediator = Mediator::create(config);

    let components = AdminComponentsBuilder::new()
        .with_mediator(mediator.clone())
        .with_api(Arc::new(demo_backend()))
        .build()?;
    components.attach_all()?;

    publish_lifecycle(&mediator, system::START);
    replay(&mediator, &steps).await;
    publish_lifecycle(&mediator, system::STOP);

    let listing = mediator.list_components();
    let status = mediator.pubsub_status();
    if cli.json {
        let snapshot = json!({ "components": listing, "pubsubStatus": status });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", report::components_text(&listing));
        println!();
        print!("{}", report::status_text(&status));
    }

    mediator.shutdown();
    Ok(())
}

fn publish_lifecycle(mediator: &SharedMediator, event: &str) {
    mediator.publish(
        "Shell",
        "host",
        system::CHANNEL,
        event,
        system::lifecycle_payload(Utc::now()),
        now_millis(),
    );
}

async fn replay(mediator: &SharedMediator, steps: &[ScriptStep]) {
    info!(steps = steps.len(), "[Shell] Replaying script");
    for (index, step) in steps.iter().enumerate() {
        let publisher = step.publisher();
        let report = mediator.publish(
            &publisher.name,
            &publisher.code,
            &step.channel,
            &step.event,
            step.data.clone(),
            now_millis(),
        );
        if report.candidates == 0 {
            warn!(index, channel = %step.channel, event = %step.event, "[Shell] Step reached no subscribers");
        }
        tokio::time::sleep(Duration::from_millis(step.settle_ms())).await;
    }
}
