use blackboard::{AgentStatus, BroadcastKind, Priority};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `blackboard` - shared coordination board for autonomous agents.
#[derive(Parser, Debug)]
#[command(name = "blackboard")]
#[command(version)]
#[command(about = "Operate the agent blackboard: status, polling, broadcasts and tasks.", long_about = None)]
pub struct Cli {
    /// Project the board belongs to (overrides the config file)
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Agent identity used for this invocation
    #[arg(long, global = true)]
    pub agent: Option<String>,

    /// Path to a TOML file with tunables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pending broadcasts per agent, the task board, and the registry
    Status,

    /// Wait until broadcasts or queued tasks arrive for an agent
    Poll {
        /// Seconds between polls
        #[arg(long, default_value = "300")]
        interval: u64,

        /// Give up after this many seconds (default: wait forever)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Send a broadcast
    Send {
        /// Comma-separated recipients, or `all` for every registered agent
        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<String>,

        #[arg(long = "type", default_value = "task")]
        kind: BroadcastKind,

        #[arg(long)]
        subject: String,

        /// JSON object, or plain text sent as `{"text": ...}`
        #[arg(long, default_value = "{}")]
        body: String,

        #[arg(long, default_value = "normal")]
        priority: Priority,
    },

    /// Dispatch a task to an agent's queue
    Dispatch {
        #[arg(long)]
        to: String,

        #[arg(long)]
        task: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "normal")]
        priority: Priority,

        /// JSON context
        #[arg(long, default_value = "{}")]
        context: String,
    },

    /// Show the full task board
    Board,

    /// Dispatch every task of a JSON plan file
    Plan {
        #[arg(long)]
        file: PathBuf,
    },

    /// Recent session log entries
    Log {
        #[arg(short, default_value = "10")]
        n: usize,
    },

    /// Recent decisions, newest first
    Decisions {
        #[arg(short, default_value = "10")]
        n: usize,
    },

    /// Acknowledgements collected for a broadcast
    Acks {
        #[arg(long)]
        id: String,
    },

    /// Set an agent's registry status and optionally cache its profile
    Register {
        #[arg(long, value_parser = parse_status)]
        status: AgentStatus,

        #[arg(long)]
        scope: Option<String>,

        #[arg(long)]
        progress: Option<f64>,
    },
}

fn parse_status(value: &str) -> Result<AgentStatus, String> {
    if value.trim().is_empty() {
        return Err("status must not be empty".into());
    }
    Ok(AgentStatus::parse(value.trim()))
}
