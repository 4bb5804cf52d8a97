//! scorebeat - run network checks and print their result documents
//!
//! Every configured check runs once, concurrently, under the probe deadline.
//! Each result is encoded for the admin, team and generic indexes and written
//! to stdout as `index<TAB>json` lines for a shipper to pick up.

use anyhow::{Context, Result};
use clap::Parser;
use scorebeat_checks::{load_checks_from_dir, CheckDefinition, CheckRegistry};
use scorebeat_common::logging::{init_logging_with_config, LogConfig};
use scorebeat_common::Config;
use scorebeat_core::{Check, RunContext};
use scorebeat_event::{encode_all, Event};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// scorebeat network checker
#[derive(Parser, Debug)]
#[command(name = "scorebeat")]
#[command(version)]
#[command(about = "Run TCP/UDP checks and emit scoring documents", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/scorebeat/scorebeat.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact)
    #[arg(long)]
    log_format: Option<String>,

    /// Directory of check definitions (overrides config)
    #[arg(long)]
    checks_dir: Option<String>,

    /// Deadline for each check run in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    /// Run a single ad-hoc check of this type (tcp, udp) instead of the checks directory
    #[arg(long = "type", requires_all = ["ip", "port", "content"])]
    check_type: Option<String>,

    /// Target IP or hostname for the ad-hoc check
    #[arg(long)]
    ip: Option<String>,

    /// Target port for the ad-hoc check
    #[arg(long)]
    port: Option<String>,

    /// Payload for an ad-hoc UDP check
    #[arg(long)]
    payload: Option<String>,

    /// Expected reply line for the ad-hoc check
    #[arg(long)]
    content: Option<String>,

    /// Group that owns the ad-hoc check
    #[arg(long, default_value = "adhoc")]
    group: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    let mut config = config.merge_env();

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &args.log_format {
        config.logging.format = format.clone();
    }
    if let Some(dir) = &args.checks_dir {
        config.checks.dir = Some(dir.clone());
    }
    if let Some(secs) = args.timeout {
        config.probe.timeout_seconds = secs;
    }
    config.validate()?;

    // Initialize logging
    init_logging_with_config(LogConfig::from_config(&config.logging)?)?;

    info!("scorebeat starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let registry = match &args.check_type {
        Some(check_type) => adhoc_registry(&args, check_type)?,
        None => {
            let dir = config
                .checks
                .dir
                .as_deref()
                .context("no checks directory configured")?;
            load_checks_from_dir(dir)?
        }
    };

    if registry.is_empty() {
        warn!("No checks to run");
        return Ok(());
    }

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shutdown.cancel();
        }
    });

    let ctx = RunContext::new(config.probe.timeout()).with_cancellation(token);
    info!(
        "Running {} checks with a {}s deadline",
        registry.len(),
        config.probe.timeout_seconds
    );

    let (passed, total) = run_checks(&registry, &ctx).await;
    info!("{}/{} checks passed", passed, total);

    Ok(())
}

/// Build a registry holding the single check described on the command line
fn adhoc_registry(args: &Args, check_type: &str) -> Result<CheckRegistry> {
    let mut attributes = HashMap::new();
    for (key, value) in [
        ("ip", &args.ip),
        ("port", &args.port),
        ("payload", &args.payload),
        ("content", &args.content),
    ] {
        if let Some(value) = value {
            attributes.insert(key.to_string(), value.clone());
        }
    }

    let id = format!(
        "{}-{}-{}",
        check_type.to_lowercase(),
        args.ip.as_deref().unwrap_or_default(),
        args.port.as_deref().unwrap_or_default()
    );
    let definition = CheckDefinition {
        name: id.clone(),
        id,
        check_type: check_type.to_string(),
        group: args.group.clone(),
        score_weight: 1.0,
        attributes,
    };

    let mut registry = CheckRegistry::new();
    registry.register(Arc::from(definition.build()?))?;
    Ok(registry)
}

/// Run every check once and print its documents; returns (passed, total)
async fn run_checks(registry: &CheckRegistry, ctx: &RunContext) -> (usize, usize) {
    let mut tasks = JoinSet::new();

    for check in registry.all() {
        let ctx = ctx.clone();
        tasks.spawn(async move { run_one(check, ctx).await });
    }

    let mut passed = 0;
    let mut total = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(ok) => {
                total += 1;
                if ok {
                    passed += 1;
                }
            }
            Err(e) => error!("Check task failed: {}", e),
        }
    }

    (passed, total)
}

async fn run_one(check: Arc<dyn Check>, ctx: RunContext) -> bool {
    let result = check.run(&ctx).await;
    if !result.passed {
        info!("Check {} failed: {}", check.id(), result.message);
    }

    let event = Event::from(result);
    match encode_all(&event) {
        Ok(documents) => {
            for doc in &documents {
                println!("{}\t{}", doc.index, String::from_utf8_lossy(&doc.body));
            }
        }
        Err(e) => error!("Dropping documents for check {}: {}", event.id, e),
    }

    event.passed
}
