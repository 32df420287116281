//! CLI argument definitions

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "filemon",
    about = "Trace file open and execve syscalls system-wide via eBPF",
    after_help = "\
EXAMPLES:
    sudo filemon                      Stream events until Ctrl-C
    sudo filemon --json               One JSON object per event
    sudo filemon --duration 30        Stop after 30 seconds"
)]
pub struct Args {
    /// Emit events as JSON lines instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Stop after N seconds (0 = run until Ctrl-C)
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
