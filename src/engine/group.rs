// src/engine/group.rs

//! Groups: `pre -> main -> post` chains sharing one label.
//!
//! [`GroupChain`] is the pure state machine deciding which stage runs next;
//! [`run_group`] is the async driver that feeds it Handle outcomes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::engine::handle::{run_handle, HandleSpec, RunContext};
use crate::engine::{HandleOutcome, HandleState, Stage};

/// Command and extra environment for one stage of a Group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    pub command_line: String,
    pub env: BTreeMap<String, String>,
}

impl StageCommand {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// An ordered chain of one to three Handles sharing a label and a colour.
///
/// The shape is fixed at construction; nothing is looked up again while the
/// Group runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Creation order; doubles as the colour index.
    pub index: usize,
    pub label: String,
    pub handles: Vec<HandleSpec>,
}

impl Group {
    pub fn new(
        index: usize,
        label: impl Into<String>,
        cwd: impl Into<PathBuf>,
        pre: Option<StageCommand>,
        main: StageCommand,
        post: Option<StageCommand>,
    ) -> Self {
        let label = label.into();
        let cwd = cwd.into();

        let handles = [
            pre.map(|cmd| (Stage::Pre, cmd)),
            Some((Stage::Main, main)),
            post.map(|cmd| (Stage::Post, cmd)),
        ]
        .into_iter()
        .flatten()
        .map(|(stage, cmd)| HandleSpec {
            label: label.clone(),
            command_line: cmd.command_line,
            cwd: cwd.clone(),
            env: cmd.env,
            stage,
            color_index: index,
        })
        .collect();

        Self {
            index,
            label,
            handles,
        }
    }

    /// Group with only a main stage.
    pub fn single(
        index: usize,
        label: impl Into<String>,
        cwd: impl Into<PathBuf>,
        command_line: impl Into<String>,
    ) -> Self {
        Self::new(index, label, cwd, None, StageCommand::new(command_line), None)
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.handles.iter().map(|h| h.stage).collect()
    }
}

/// Chain states; `PreRunning`/`PostRunning` are skipped when the stage is
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    NotStarted,
    PreRunning,
    MainRunning,
    PostRunning,
    Done,
}

impl GroupState {
    fn running(stage: Stage) -> Self {
        match stage {
            Stage::Pre => GroupState::PreRunning,
            Stage::Main => GroupState::MainRunning,
            Stage::Post => GroupState::PostRunning,
        }
    }
}

/// Pure `pre -> main -> post` state machine.
///
/// Advances only on a clean exit (code 0, no signal); anything else ends the
/// chain with `aborted = true` and the remaining stages are never handed out.
#[derive(Debug, Clone)]
pub struct GroupChain {
    stages: Vec<Stage>,
    current: Option<usize>,
    state: GroupState,
    aborted: bool,
    result: Option<HandleOutcome>,
}

impl GroupChain {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            current: None,
            state: GroupState::NotStarted,
            aborted: false,
            result: None,
        }
    }

    pub fn state(&self) -> GroupState {
        self.state
    }

    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Outcome of the last stage that actually ran.
    pub fn result(&self) -> Option<HandleOutcome> {
        self.result
    }

    /// Begin the chain, returning the index of the first stage to run.
    pub fn start(&mut self) -> Option<usize> {
        if self.state != GroupState::NotStarted {
            return None;
        }
        self.move_to(0)
    }

    /// Record the outcome of the running stage and return the next stage
    /// index to run, or `None` once the chain is done.
    pub fn advance(&mut self, outcome: HandleOutcome) -> Option<usize> {
        let current = self.current?;

        if outcome != HandleOutcome::Skipped {
            self.result = Some(outcome);
        }

        if !outcome.is_success() {
            self.finish(true);
            return None;
        }

        self.move_to(current + 1)
    }

    /// Abort a chain that has not started yet.
    pub fn abort(&mut self) {
        if self.state == GroupState::NotStarted {
            self.finish(true);
        }
    }

    fn move_to(&mut self, index: usize) -> Option<usize> {
        match self.stages.get(index) {
            Some(stage) => {
                self.current = Some(index);
                self.state = GroupState::running(*stage);
                Some(index)
            }
            None => {
                self.finish(false);
                None
            }
        }
    }

    fn finish(&mut self, aborted: bool) {
        self.current = None;
        self.state = GroupState::Done;
        self.aborted = aborted;
    }
}

/// Final view of one Handle after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleReport {
    pub stage: Stage,
    pub command_line: String,
    pub state: HandleState,
    pub outcome: Option<HandleOutcome>,
}

/// Final view of one Group after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub index: usize,
    pub label: String,
    pub handles: Vec<HandleReport>,
    pub aborted: bool,
    pub result: Option<HandleOutcome>,
}

impl GroupReport {
    /// Exit code this Group contributes to aggregation, if it failed.
    pub fn failure_code(&self) -> Option<i32> {
        self.result.and_then(|outcome| outcome.failure_code())
    }

    pub fn handle(&self, stage: Stage) -> Option<&HandleReport> {
        self.handles.iter().find(|h| h.stage == stage)
    }

    /// True if the process for `stage` was actually spawned.
    pub fn ran(&self, stage: Stage) -> bool {
        self.handle(stage).is_some_and(|h| h.state == HandleState::Done)
    }
}

/// Drive one Group through its stages.
///
/// Cancellation on failure is raised by the failing Handle itself; the chain
/// only decides which stage runs next.
pub(crate) async fn run_group(ctx: &RunContext, group: &Group, prefix: Arc<[u8]>) -> GroupReport {
    let mut chain = GroupChain::new(group.stages());
    let mut handles: Vec<HandleReport> = group
        .handles
        .iter()
        .map(|h| HandleReport {
            stage: h.stage,
            command_line: h.command_line.clone(),
            state: HandleState::Pending,
            outcome: None,
        })
        .collect();

    debug!(group = %group.label, stages = ?group.stages(), "starting group");

    let mut next = chain.start();
    while let Some(i) = next {
        handles[i].state = HandleState::Running;
        let outcome = run_handle(ctx, &group.handles[i], &prefix).await;

        handles[i].outcome = Some(outcome);
        handles[i].state = match outcome {
            HandleOutcome::Skipped => HandleState::Pending,
            _ => HandleState::Done,
        };

        next = chain.advance(outcome);
    }

    debug!(group = %group.label, aborted = chain.aborted(), result = ?chain.result(), "group done");

    GroupReport {
        index: group.index,
        label: group.label.clone(),
        handles,
        aborted: chain.aborted(),
        result: chain.result(),
    }
}
