//! Task dependency graph.
//!
//! Nodes are tasks, edges are depends-on relations. A validated graph runs
//! by releasing every node whose dependencies have finished into a
//! [`JoinSet`]; independent nodes are in flight together.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::task::{self, TaskContext, TaskError, TaskKind, TaskReport};
use crate::utils::plural::plural_count;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("task `{0}` is added twice")]
    Duplicate(TaskKind),

    #[error("task `{task}` depends on `{dependency}`, which is not in the graph")]
    UnknownDependency { task: TaskKind, dependency: TaskKind },

    #[error("dependency cycle between {}", TaskList(.0))]
    Cycle(Vec<TaskKind>),
}

/// Display helper: `a, b, c`.
struct TaskList<'a>(&'a [TaskKind]);

impl fmt::Display for TaskList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{kind}`")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("task `{kind}` failed: {source}")]
    Task {
        kind: TaskKind,
        #[source]
        source: TaskError,
    },

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// How a failing task affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any error stops scheduling and fails the run.
    Strict,
    /// Transform errors are reported and dependents still run; other errors fail.
    Tolerant,
}

#[derive(Debug)]
struct Node {
    kind: TaskKind,
    deps: Vec<TaskKind>,
}

#[derive(Debug, Default)]
pub struct TaskGraph {
    nodes: Vec<Node>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `kind`, to start once every task in `deps` has finished.
    pub fn add(&mut self, kind: TaskKind, deps: &[TaskKind]) -> &mut Self {
        self.nodes.push(Node {
            kind,
            deps: deps.to_vec(),
        });
        self
    }

    /// Check the graph and return its tasks in a dependency-respecting order.
    pub fn validate(&self) -> Result<Vec<TaskKind>, GraphError> {
        let mut index = FxHashMap::default();
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.kind, i).is_some() {
                return Err(GraphError::Duplicate(node.kind));
            }
        }
        for node in &self.nodes {
            if let Some(&dependency) = node.deps.iter().find(|d| !index.contains_key(*d)) {
                return Err(GraphError::UnknownDependency {
                    task: node.kind,
                    dependency,
                });
            }
        }

        // Kahn's algorithm
        let (mut pending, dependents) = self.edges();
        let mut ready: Vec<TaskKind> = self
            .nodes
            .iter()
            .filter(|n| pending[&n.kind] == 0)
            .map(|n| n.kind)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(kind) = ready.pop() {
            order.push(kind);
            release(kind, &dependents, &mut pending, &mut ready);
        }

        if order.len() < self.nodes.len() {
            let stuck = self
                .nodes
                .iter()
                .map(|n| n.kind)
                .filter(|k| !order.contains(k))
                .collect();
            return Err(GraphError::Cycle(stuck));
        }
        Ok(order)
    }

    /// Unmet dependency counts and reverse edges.
    fn edges(&self) -> (FxHashMap<TaskKind, usize>, FxHashMap<TaskKind, Vec<TaskKind>>) {
        let mut pending = FxHashMap::default();
        let mut dependents: FxHashMap<TaskKind, Vec<TaskKind>> = FxHashMap::default();
        for node in &self.nodes {
            pending.insert(node.kind, node.deps.len());
            for &dep in &node.deps {
                dependents.entry(dep).or_default().push(node.kind);
            }
        }
        (pending, dependents)
    }

    /// Run every task, each after its dependencies.
    ///
    /// On a fatal failure nothing new is started; tasks already running are
    /// awaited before the error is returned.
    pub async fn run(
        &self,
        ctx: &TaskContext,
        policy: FailurePolicy,
    ) -> Result<Vec<TaskReport>, PipelineError> {
        self.validate()?;

        let (mut pending, dependents) = self.edges();
        let mut ready: Vec<TaskKind> = self
            .nodes
            .iter()
            .filter(|n| n.deps.is_empty())
            .map(|n| n.kind)
            .collect();

        let mut running = JoinSet::new();
        let mut reports = Vec::with_capacity(self.nodes.len());
        let mut failure = None;

        loop {
            if failure.is_none() {
                for kind in ready.drain(..) {
                    let ctx = ctx.clone();
                    running.spawn(async move { (kind, task::run(kind, &ctx).await) });
                }
            }

            let Some(joined) = running.join_next().await else {
                break;
            };
            let (kind, result) = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    failure.get_or_insert(PipelineError::Join(err));
                    continue;
                }
            };

            match result {
                Ok(report) => {
                    crate::log!(kind.name(); "{}", plural_count(report.written, "file"));
                    reports.push(report);
                    release(kind, &dependents, &mut pending, &mut ready);
                }
                Err(err) if policy == FailurePolicy::Tolerant && err.is_transform() => {
                    crate::log!("error"; "{}: {}", kind, err);
                    release(kind, &dependents, &mut pending, &mut ready);
                }
                Err(source) => {
                    failure.get_or_insert(PipelineError::Task { kind, source });
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

/// Mark `kind` finished and queue dependents with nothing left to wait for.
fn release(
    kind: TaskKind,
    dependents: &FxHashMap<TaskKind, Vec<TaskKind>>,
    pending: &mut FxHashMap<TaskKind, usize>,
    ready: &mut Vec<TaskKind>,
) {
    for &next in dependents.get(&kind).into_iter().flatten() {
        if let Some(count) = pending.get_mut(&next) {
            *count -= 1;
            if *count == 0 {
                ready.push(next);
            }
        }
    }
}
