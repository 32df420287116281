//! # filemon - Main Entry Point
//!
//! Thin glue around the monitor core: pre-flight checks, rlimit bump,
//! Start, wait for Ctrl-C (or `--duration`), Stop. Events stream to stdout
//! as plain text or JSON lines.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use filemon::cli::Args;
use filemon::domain::FileActivityEvent;
use filemon::monitor::{FileActivityMonitor, Subscriber, MONITORED_SYSCALLS};
use filemon::preflight;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOPERM: i32 = 77;

/// Prints each event to stdout, one line per event.
struct StdoutSubscriber {
    json: bool,
}

impl Subscriber for StdoutSubscriber {
    fn notify(&self, event: FileActivityEvent) {
        if self.json {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
        } else {
            println!(
                "cmd={} op={} file={} pid={} mntns={}",
                event.comm,
                event.operation.as_str(),
                event.file,
                event.pid,
                event.mount_ns_id
            );
        }
    }
}

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = err.to_string().to_lowercase();
    if msg.contains("permission denied") || msg.contains("requires root") {
        EXIT_NOPERM
    } else {
        EXIT_ERROR
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();

    preflight::run_preflight_checks()?;
    preflight::raise_memlock_limit();

    let subscriber = Arc::new(StdoutSubscriber { json: args.json });
    let mut monitor = FileActivityMonitor::new(subscriber);
    monitor.start()?;

    if !args.quiet {
        eprintln!(
            "filemon v{}: watching {} syscalls (Ctrl-C to exit)",
            env!("CARGO_PKG_VERSION"),
            MONITORED_SYSCALLS.len()
        );
    }

    if args.duration > 0 {
        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(args.duration)) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    } else {
        tokio::signal::ctrl_c().await?;
    }

    monitor.stop().await;
    Ok(())
}
