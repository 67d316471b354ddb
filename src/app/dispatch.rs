use crate::app::status::render_status;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result};
use blackboard::{
    AgentProfile, AwaitOptions, Blackboard, BoardConfig, BroadcastEnvelope, BroadcastMessage,
    PlanItem, TaskRecord,
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

fn parse_json(flag: &str, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw).with_context(|| format!("--{flag} is not valid JSON"))
}

/// Broadcast bodies: a JSON object is taken as is, anything else is wrapped
/// as `{"text": ...}`.
fn message_body(raw: &str) -> Result<serde_json::Value> {
    if raw.trim_start().starts_with('{') {
        parse_json("body", raw)
    } else {
        Ok(serde_json::json!({ "text": raw }))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Default, Serialize)]
struct PollReport {
    broadcasts: Vec<BroadcastEnvelope>,
    tasks: Vec<TaskRecord>,
}

impl PollReport {
    fn is_empty(&self) -> bool {
        self.broadcasts.is_empty() && self.tasks.is_empty()
    }
}

async fn queued_tasks(board: &Blackboard) -> Result<Vec<TaskRecord>> {
    let agent = &board.scope().agent_id;
    let mut records = Vec::new();
    for id in board.tasks().queued(agent).await? {
        if let Some(record) = board.tasks().get(&id).await? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Sleep-and-recheck loop for one agent: returns as soon as broadcasts or
/// queued tasks exist, on timeout, or on Ctrl-C.
async fn run_poll(board: &Blackboard, interval: u64, timeout: Option<u64>) -> Result<()> {
    let agent = board.scope().agent_id.clone();
    let interval = Duration::from_secs(interval.max(1));
    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs(secs));

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut report = PollReport::default();
    loop {
        report.tasks = queued_tasks(board).await?;
        if !report.tasks.is_empty() {
            report.broadcasts = board.broadcast().pending().await?;
            board.broadcast().consume(&report.broadcasts, None).await?;
            break;
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                interval.min(deadline - now)
            }
            None => interval,
        };
        report.broadcasts = board
            .broadcast()
            .await_work(AwaitOptions::new(wait).with_timeout(wait), &cancel, None)
            .await?;
        if !report.broadcasts.is_empty() {
            report.tasks = queued_tasks(board).await?;
            break;
        }
        if cancel.is_cancelled() {
            info!(agent = %agent, "poll interrupted");
            break;
        }
        info!(agent = %agent, "no work, hibernating {}s", wait.as_secs());
    }

    if report.is_empty() {
        info!(agent = %agent, "poll finished without work");
        return Ok(());
    }
    for envelope in &report.broadcasts {
        info!(
            agent = %agent,
            priority = %envelope.message.priority,
            kind = %envelope.message.kind,
            from = %envelope.from_agent,
            "{}",
            envelope.message.subject
        );
    }
    for task in &report.tasks {
        info!(agent = %agent, priority = %task.priority, task_id = %task.id, "{}", task.task);
    }
    print_json(&report)
}

async fn run_plan(board: &Blackboard, file: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read plan {}", file.display()))?;
    let plan: Vec<PlanItem> = serde_json::from_str(&raw)
        .with_context(|| format!("plan {} is not a list of tasks", file.display()))?;
    info!(file = %file.display(), tasks = plan.len(), "dispatching plan");

    let ids = board.tasks().dispatch_plan(plan.clone()).await?;
    for (id, item) in ids.iter().zip(&plan) {
        println!("{id} -> {}: {}", item.agent, item.task);
    }
    info!(tasks = ids.len(), "plan dispatched");
    Ok(())
}

#[allow(clippy::too_many_lines)]
pub async fn dispatch(cli: Cli, config: BoardConfig) -> Result<()> {
    let board = Blackboard::connect(&config)?;

    match cli.command {
        Commands::Status => {
            println!("{}", render_status(&board).await?);
            Ok(())
        }

        Commands::Poll { interval, timeout } => run_poll(&board, interval, timeout).await,

        Commands::Send {
            to,
            kind,
            subject,
            body,
            priority,
        } => {
            let message = BroadcastMessage::new(kind, subject)
                .with_body(message_body(&body)?)
                .with_priority(priority);
            let id = if to.iter().any(|agent| agent == "all") {
                let sender = vec![board.scope().agent_id.clone()];
                board.broadcast().send_all(message, &sender).await?
            } else {
                Some(board.broadcast().send(&to, message).await?)
            };
            match id {
                Some(id) => println!("{id}"),
                None => println!("no recipients registered"),
            }
            Ok(())
        }

        Commands::Dispatch {
            to,
            task,
            description,
            priority,
            context,
        } => {
            let item = PlanItem::new(to, task)
                .describe(description)
                .with_priority(priority)
                .with_context(parse_json("context", &context)?);
            let id = board.tasks().dispatch_task(item).await?;
            println!("{id}");
            Ok(())
        }

        Commands::Board => {
            let tasks = board.tasks().board().await?;
            if tasks.is_empty() {
                println!("no tasks dispatched");
                return Ok(());
            }
            let mut rows: Vec<_> = tasks.iter().collect();
            rows.sort_by(|a, b| a.1.dispatched_at.cmp(&b.1.dispatched_at));
            for (id, summary) in rows {
                println!(
                    "{id:18} [{:6}] {:12} {:10} {}",
                    summary.priority.to_string(),
                    summary.agent,
                    summary.status.to_string(),
                    summary.task
                );
            }
            Ok(())
        }

        Commands::Plan { file } => run_plan(&board, &file).await,

        Commands::Log { n } => print_json(&board.session().session_log(n).await?),

        Commands::Decisions { n } => print_json(&board.decisions().recent(n).await?),

        Commands::Acks { id } => print_json(&board.broadcast().acks_for(&id).await?),

        Commands::Register {
            status,
            scope,
            progress,
        } => {
            let agent = board.scope().agent_id.clone();
            board.registry().set_status(&agent, &status).await?;
            if scope.is_some() || progress.is_some() {
                let profile = AgentProfile {
                    agent: agent.clone(),
                    status: status.to_string(),
                    scope: scope.unwrap_or_default(),
                    progress: progress.unwrap_or_default().clamp(0.0, 1.0),
                };
                board
                    .registry()
                    .cache_profile(&profile, blackboard::registry::PROFILE_TTL)
                    .await?;
            }
            println!("{agent}: {status}");
            Ok(())
        }
    }
}
