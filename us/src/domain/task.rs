//! Task graph returned by the analysis service

use serde::{Deserialize, Serialize};

use super::level::{Effort, Impact};

/// A single actionable task
///
/// Wire names follow the proxy's response schema (`task`, `cluster`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the service, unique within one result
    pub id: i64,

    /// What to do
    #[serde(rename = "task")]
    pub text: String,

    /// Name of the group this task belongs to
    #[serde(rename = "cluster")]
    pub cluster_name: String,

    pub effort: Effort,

    pub impact: Impact,

    /// Ids of tasks that must happen first
    #[serde(default)]
    pub dependencies: Vec<i64>,
}

/// Full analysis: tasks in service order plus the suggested next action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub tasks: Vec<Task>,
    pub next_action_id: i64,
}

impl AnalysisResult {
    /// The task `next_action_id` points at, if the service produced a matching id
    pub fn next_action(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == self.next_action_id)
    }

    /// Tasks other than the next action, in service order
    pub fn remaining(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.id != self.next_action_id)
    }

    /// Tasks grouped by cluster name, clusters in order of first appearance
    pub fn clusters(&self) -> Vec<(&str, Vec<&Task>)> {
        let mut groups: Vec<(&str, Vec<&Task>)> = Vec::new();
        for task in &self.tasks {
            match groups.iter_mut().find(|(name, _)| *name == task.cluster_name) {
                Some((_, members)) => members.push(task),
                None => groups.push((task.cluster_name.as_str(), vec![task])),
            }
        }
        groups
    }

    /// Dependency edges whose target id is not present in this result
    ///
    /// Returned as `(task id, missing dependency id)` pairs. The service is
    /// not required to produce a closed graph, so this is informational.
    pub fn dangling_dependencies(&self) -> Vec<(i64, i64)> {
        self.tasks
            .iter()
            .flat_map(|task| {
                task.dependencies
                    .iter()
                    .filter(|dep| !self.tasks.iter().any(|t| t.id == **dep))
                    .map(move |dep| (task.id, *dep))
            })
            .collect()
    }
}
