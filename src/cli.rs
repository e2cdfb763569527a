use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ccw")]
#[command(about = "Workflow session store, event bus, dashboard bridge, and MCP tool server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Dashboard Bridge (WebSocket + hook ingress HTTP server).
    Serve {
        /// Falls back to `CCW_PROJECT_ROOT` when omitted (spec §6).
        #[arg(long, env = "CCW_PROJECT_ROOT")]
        path: PathBuf,

        #[arg(long)]
        port: Option<u16>,
    },
    /// Start the Tool-Calling Server over stdio.
    Mcp {
        /// Falls back to `CCW_PROJECT_ROOT` when omitted (spec §6).
        #[arg(long, env = "CCW_PROJECT_ROOT")]
        path: PathBuf,
    },
}
