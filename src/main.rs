mod archive;
mod cancel;
mod config;
mod debounce;
mod error;
mod game_monitor;
mod logging;
mod paths;
mod process;
mod remote;
mod save_sync;
mod status;
mod util;
mod watcher;

use crate::config::{SharedConfig, init_first_run, load_cfg, save_cfg};
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::error::SyncError;
use crate::game_monitor::ProcessMonitor;
use crate::paths::PATH_APP_DATA;
use crate::process::{default_process_names, platform_probe};
use crate::remote::{DEFAULT_LIST_LIMIT, HttpRemoteStore};
use crate::save_sync::SyncController;
use crate::status::{StatusReporter, drain_to_log};
use crate::util::format_size;
use crate::watcher::{DebouncedUploader, SaveWatcher};

use std::error::Error;
use std::num::ParseIntError;
use std::sync::Arc;
use std::thread;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help") {
        println!("{}", USAGE_TEXT);
        std::process::exit(0);
    }

    logging::init(&PATH_APP_DATA.join("logs"));

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let mut cfg = load_cfg();
    if init_first_run(&mut cfg) {
        match save_cfg(&cfg) {
            Ok(()) => tracing::info!(device_id = %cfg.device_id, "wrote initial config"),
            Err(e) => tracing::warn!("could not write config: {}", e),
        }
    }

    if cfg.remote_url.is_empty() {
        return Err(format!(
            "remote_url is not set, edit {}",
            PATH_APP_DATA.join("config.json").display()
        )
        .into());
    }

    let remote = Arc::new(HttpRemoteStore::new(&cfg.remote_url, &cfg.device_id)?);
    let (status, events) = StatusReporter::new();
    let drain = thread::Builder::new()
        .name("status".into())
        .spawn(move || drain_to_log(events))?;

    let controller = Arc::new(SyncController::new(SharedConfig::new(cfg), remote, status));

    let result = if args.iter().any(|arg| arg == "--sync-now") {
        sync_now(&controller)
    } else if let Some(index) = args.iter().position(|arg| arg == "--list") {
        list(&controller, limit_after(args, index)?)
    } else if let Some(index) = args.iter().position(|arg| arg == "--restore") {
        match args.get(index + 1) {
            Some(id) => restore(&controller, id, limit_after(args, index + 1)?),
            None => {
                eprintln!("{}", USAGE_TEXT);
                std::process::exit(1);
            }
        }
    } else if args.iter().any(|arg| arg == "--health") {
        controller.check_health().map_err(Into::into)
    } else {
        run_daemon(&controller)
    };

    // Last reporter goes away with the controller, which ends the drain thread
    drop(controller);
    let _ = drain.join();
    result
}

/// Optional count following the argument at `index`
fn limit_after(args: &[String], index: usize) -> Result<usize, ParseIntError> {
    match args.get(index + 1) {
        Some(n) if !n.starts_with("--") => n.parse(),
        _ => Ok(DEFAULT_LIST_LIMIT),
    }
}

fn sync_now(controller: &SyncController) -> Result<(), Box<dyn Error>> {
    let uploaded = controller.manual_sync_all()?;
    println!("Uploaded {} save(s)", uploaded);
    Ok(())
}

fn list(controller: &SyncController, limit: usize) -> Result<(), Box<dyn Error>> {
    for save in controller.list_saves(limit)? {
        println!(
            "{}  {}  {:>9}  {}  ({})",
            save.id,
            save.timestamp.format("%Y-%m-%d %H:%M:%S"),
            format_size(save.file_size),
            save.file_name,
            save.device_id
        );
    }
    Ok(())
}

fn restore(controller: &SyncController, id: &str, limit: usize) -> Result<(), Box<dyn Error>> {
    let record = controller
        .list_saves(limit)?
        .into_iter()
        .find(|save| save.id == id)
        .ok_or_else(|| {
            SyncError::NotFound(format!("save {} among the newest {} saves", id, limit))
        })?;
    let dest = controller.restore_save(&record)?;
    println!("Restored into {}", dest.display());
    Ok(())
}

/// Watch the save directory and the game process until the watch loop ends
fn run_daemon(controller: &Arc<SyncController>) -> Result<(), Box<dyn Error>> {
    let cfg = controller.config().snapshot();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        save_path = %cfg.save_path.display(),
        device_id = %cfg.device_id,
        "starting save sync"
    );

    if let Err(e) = controller.check_health() {
        tracing::warn!("save server not reachable yet: {}", e);
    }

    let uploader = DebouncedUploader::new(Arc::clone(controller), DEFAULT_DEBOUNCE);
    let (mut watcher, rx) = SaveWatcher::start(controller.config().clone(), uploader)?;

    let names = cfg.process_names.unwrap_or_else(default_process_names);
    let monitor = ProcessMonitor::new(platform_probe(), names, Arc::clone(controller));

    let token = controller.shutdown_token();
    let monitor_cancel = token.child();
    let monitor_thread = thread::Builder::new()
        .name("process-monitor".into())
        .spawn(move || monitor.run(&monitor_cancel))?;

    let watch_thread = thread::Builder::new()
        .name("save-watcher".into())
        .spawn(move || watcher.run(&rx, &token))?;

    if watch_thread.join().is_err() {
        tracing::error!("watch loop panicked");
    }
    controller.shutdown();
    let _ = monitor_thread.join();
    Ok(())
}

static USAGE_TEXT: &str = r#"
Usage: savesync [OPTIONS]

Without options, watches the save directory and the game process and keeps
saves in sync with the server configured in config.json.

Options:
    --sync-now            Upload every save folder once and exit
    --list [N]            List the newest N saves on the server (default 100)
    --restore <id> [N]    Download save <id> and replace the local folder. The id
                          is looked up among the newest N saves (default 100)
    --health              Check that the server is reachable
    --help                Show this text
"#;
