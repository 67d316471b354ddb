use anyhow::Result;
use blackboard::{Blackboard, TaskStatus, TaskSummary};
use std::collections::BTreeMap;

/// Subjects listed per agent in the status report.
const SUBJECT_PREVIEW: usize = 3;

fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

pub async fn render_status(board: &Blackboard) -> Result<String> {
    let mut lines = vec![format!("◆ Blackboard · {}", board.scope().project), String::new()];

    let statuses = board.registry().statuses().await?;
    let agents: Vec<String> = statuses.keys().cloned().collect();
    let marks = board.watermarks().for_agents(&agents).await?;

    lines.push("Broadcasts".to_string());
    let mut total = 0;
    for agent in &agents {
        let since = marks.get(agent).copied().unwrap_or(0.0);
        let pending = board.broadcast().poll_since(agent, since).await?;
        total += pending.len();
        if pending.is_empty() {
            lines.push(format!("  {agent:12}  idle"));
        } else {
            let subjects: Vec<String> = pending
                .iter()
                .take(SUBJECT_PREVIEW)
                .map(|envelope| clip(&envelope.message.subject, 40))
                .collect();
            lines.push(format!(
                "  {agent:12}  {} pending  [{}]",
                pending.len(),
                subjects.join(", ")
            ));
        }
    }
    lines.push(format!("  total pending: {total}"));
    lines.push(String::new());

    lines.push("Task board".to_string());
    let tasks = board.tasks().board().await?;
    if tasks.is_empty() {
        lines.push("  no tasks dispatched".to_string());
    } else {
        let mut by_status: BTreeMap<String, Vec<(&String, &TaskSummary)>> = BTreeMap::new();
        for (id, summary) in &tasks {
            by_status
                .entry(summary.status.to_string())
                .or_default()
                .push((id, summary));
        }
        for status in TaskStatus::ALL {
            let Some(group) = by_status.get(&status.to_string()) else {
                continue;
            };
            lines.push(format!(
                "  [{}] ({})",
                status.to_string().to_uppercase(),
                group.len()
            ));
            for (id, summary) in group {
                lines.push(format!(
                    "    {:16}  {:12}  {}",
                    clip(id, 16),
                    summary.agent,
                    clip(&summary.task, 50)
                ));
            }
        }
    }
    lines.push(String::new());

    lines.push("Agent registry".to_string());
    if statuses.is_empty() {
        lines.push("  no agents registered".to_string());
    }
    for (agent, status) in &statuses {
        lines.push(format!("  {agent:12}  {status}"));
    }

    Ok(lines.join("\n"))
}
