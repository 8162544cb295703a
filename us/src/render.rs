//! Terminal rendering of analysis results

use colored::{ColoredString, Colorize};

use crate::cache::CacheStats;
use crate::domain::{AnalysisResult, Level, Task};
use crate::limiter::{LimiterStats, format_wait};

fn level(level: Level) -> ColoredString {
    let text = level.to_string();
    match level {
        Level::Low => text.green(),
        Level::Medium => text.yellow(),
        Level::High => text.red(),
    }
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "  [{}] {} (effort: {}, impact: {})",
        task.id,
        task.text,
        level(task.effort),
        level(task.impact)
    );
    if !task.dependencies.is_empty() {
        let deps: Vec<String> = task.dependencies.iter().map(|d| d.to_string()).collect();
        line.push_str(&format!(" {}", format!("after {}", deps.join(", ")).dimmed()));
    }
    line
}

/// Render a plan: the next action first, then every cluster
pub fn render_plan(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.tasks.is_empty() {
        out.push_str(&format!("{}\n", "No tasks found.".dimmed()));
        return out;
    }

    match result.next_action() {
        Some(task) => {
            out.push_str(&format!("{}\n", "Next action".bright_green().bold()));
            out.push_str(&format!("{}\n\n", task_line(task)));
        }
        None => {
            out.push_str(&format!("{}\n\n", "No next action suggested.".dimmed()));
        }
    }

    let clusters = result.clusters();
    let remaining = result.remaining().count();
    out.push_str(&format!(
        "{}\n\n",
        format!(
            "{} more task{} across {} cluster{}",
            remaining,
            if remaining == 1 { "" } else { "s" },
            clusters.len(),
            if clusters.len() == 1 { "" } else { "s" }
        )
        .dimmed()
    ));

    for (name, tasks) in clusters {
        out.push_str(&format!("{} ({})\n", name.bright_cyan().bold(), tasks.len()));
        for task in tasks {
            out.push_str(&format!("{}\n", task_line(task)));
        }
        out.push('\n');
    }

    out
}

/// One-line summary of cache and limiter state
pub fn render_stats(cache: &CacheStats, limiter: &LimiterStats) -> String {
    format!(
        "cache: {}/{} entries, requests: {}/{} per {}",
        cache.size,
        cache.max_size,
        limiter.active,
        limiter.max_requests,
        format_wait(limiter.window)
    )
}
