// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod flow;
pub mod fs;
pub mod logging;
pub mod server;
pub mod source;
pub mod tasks;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::{config_path_for, load_or_default};
use crate::config::registry::resolve;
use crate::flow::{Flow, FlowGraph};
use crate::fs::RealFileSystem;
use crate::tasks::TaskContext;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the flow for the requested task and its destination check
/// - the shared task context
/// - Ctrl-C handling for long-running flows
pub async fn run(args: CliArgs) -> Result<()> {
    let root = PathBuf::from(&args.root);
    let config_path = config_path_for(&root, &args.config);
    let mut cfg = load_or_default(&config_path)?;

    if let Some(port) = args.port {
        if port == 0 {
            bail!("--port must be non-zero");
        }
        cfg.server.port = port;
    }

    let flow = Flow::for_command(args.command);
    let graph = FlowGraph::from_flow(&flow);
    graph.check_destinations(&root, &cfg.paths)?;

    if args.dry_run {
        print_dry_run(&root, &cfg, &flow, &graph);
        return Ok(());
    }

    let ctx = Arc::new(TaskContext::new(root, cfg, Arc::new(RealFileSystem)));

    // Ctrl-C → graceful shutdown of the server and watchers. Short flows keep
    // the default signal behaviour.
    if flow.tasks().iter().any(|t| t.is_long_running()) {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; shutting down");
            ctx.request_shutdown();
        });
    }

    info!(flow = %flow, "running");
    flow.run(ctx).await?;
    info!("done");
    Ok(())
}

/// Dry-run output: registry, settings and execution stages.
fn print_dry_run(root: &Path, cfg: &ConfigFile, flow: &Flow, graph: &FlowGraph) {
    let paths = &cfg.paths;

    println!("assetdag dry-run");
    println!("  root = {}", root.display());
    println!(
        "  config.triggered_while_running_behaviour = {:?}",
        cfg.config.triggered_while_running_behaviour
    );
    println!("  config.queue_length = {}", cfg.config.queue_length);
    println!("  config.cache_storage = {:?}", cfg.config.cache_storage);
    println!();

    println!("registry:");
    println!("  dist_root: {}", resolve(root, &paths.dist_root).display());
    println!("  scripts.lib: {}", paths.scripts.lib);
    for vendor in &paths.scripts.vendor {
        println!("  scripts.vendor: {vendor}");
    }
    println!("  scripts.dist: {}", paths.scripts.dist);
    println!("  styles.sources: {}", paths.styles.sources);
    println!("  styles.watch: {}", paths.styles.watch);
    println!("  css.framework: {}", paths.css.framework);
    println!("  css.app: {}", paths.css.app);
    println!("  css.frame: {}", paths.css.frame);
    println!("  markup.sources: {}", paths.markup.sources);
    println!("  markup.dist: {}", paths.markup.dist);
    println!("  favicon.source: {}", paths.favicon.source);
    println!("  favicon.dist: {}", paths.favicon.dist);
    println!("  images.sources: {}", paths.images.sources);
    println!("  images.dist: {}", paths.images.dist);
    println!("  images.watch: {}", paths.images.watch);
    println!();

    println!("server: http://{}:{} serving {}", cfg.server.host, cfg.server.port, cfg.server.base_dir);
    println!();

    println!("flow: {flow}");
    for (i, stage) in graph.stages().iter().enumerate() {
        let names: Vec<&str> = stage.iter().map(|t| t.as_str()).collect();
        println!("  stage {}: {}", i + 1, names.join(", "));
    }

    debug!("dry-run complete (no execution)");
}
