//! Semantic engine collaborator.
//!
//! The core knows nothing about parsing or validating graphs: it hands a
//! snapshot of a document's text to a `SemanticEngine` and later receives a
//! report. Engine work runs on a tokio runtime owned by the dispatcher; the
//! results come back over a std channel that the control thread drains,
//! exactly like the rest of the async plumbing.

use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::TabId;

/// What the user asked the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineAction {
    Validate,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

/// Input of one engine run; the text is a snapshot taken when the run began
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub job_id: u64,
    pub tab: TabId,
    pub action: EngineAction,
    pub text: String,
    /// Names of the rule flags enabled at dispatch time
    pub enabled_rules: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineReport {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Messages sent from engine tasks to the control thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    Finished {
        job_id: u64,
        tab: TabId,
        report: EngineReport,
    },
    Failed {
        job_id: u64,
        tab: TabId,
        error: String,
    },
}

/// The external engine
pub trait SemanticEngine: Send + Sync + 'static {
    fn run(&self, request: &EngineRequest) -> Result<EngineReport>;
}

/// Runs longer than this are reported as failed
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs engine requests off the control thread
pub struct EngineDispatcher {
    runtime: tokio::runtime::Runtime,
    engine: Arc<dyn SemanticEngine>,
    timeout: Duration,
    sender: mpsc::Sender<EngineMessage>,
    receiver: mpsc::Receiver<EngineMessage>,
    next_job_id: u64,
}

impl EngineDispatcher {
    pub fn new(engine: Arc<dyn SemanticEngine>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("graphpad-engine")
            .enable_all()
            .build()
            .context("Failed to create engine runtime")?;
        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            runtime,
            engine,
            timeout: DEFAULT_ENGINE_TIMEOUT,
            sender,
            receiver,
            next_job_id: 1,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Queue a run; returns its job id
    pub fn dispatch(
        &mut self,
        tab: TabId,
        action: EngineAction,
        text: String,
        enabled_rules: Vec<String>,
    ) -> u64 {
        let job_id = self.next_job_id;
        self.next_job_id += 1;

        let request = EngineRequest {
            job_id,
            tab,
            action,
            text,
            enabled_rules,
        };
        let engine = Arc::clone(&self.engine);
        let sender = self.sender.clone();
        tracing::debug!(job_id, %tab, ?action, "engine run dispatched");

        let timeout = self.timeout;
        self.runtime.spawn(async move {
            let task = tokio::task::spawn_blocking(move || engine.run(&request));

            // The blocking task cannot be interrupted; on timeout its result is
            // simply never delivered
            let message = match tokio::time::timeout(timeout, task).await {
                Ok(Ok(Ok(report))) => EngineMessage::Finished {
                    job_id,
                    tab,
                    report,
                },
                Ok(Ok(Err(e))) => EngineMessage::Failed {
                    job_id,
                    tab,
                    error: format!("{e:#}"),
                },
                Ok(Err(join_error)) => EngineMessage::Failed {
                    job_id,
                    tab,
                    error: join_error.to_string(),
                },
                Err(_) => {
                    tracing::warn!(job_id, %tab, "engine run timed out");
                    EngineMessage::Failed {
                        job_id,
                        tab,
                        error: format!("timed out after {}s", timeout.as_secs_f32()),
                    }
                }
            };
            let _ = sender.send(message);
        });

        job_id
    }

    /// Drain finished runs (non-blocking)
    pub fn try_recv_all(&self) -> Vec<EngineMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }
}

/// Minimal engine bundled with the binary: reports the document outline.
///
/// Real graph parsing and validation are supplied by an external engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineEngine;

impl SemanticEngine for OutlineEngine {
    fn run(&self, request: &EngineRequest) -> Result<EngineReport> {
        let prefixes: Vec<&str> = request
            .text
            .lines()
            .map(str::trim_start)
            .filter(|line| line.starts_with("@prefix") || line.starts_with("PREFIX"))
            .collect();
        let lines = request.text.lines().count();

        let mut output = format!("{lines} lines, {} prefix declarations", prefixes.len());
        for prefix in prefixes {
            output.push('\n');
            output.push_str(prefix);
        }
        if !request.enabled_rules.is_empty() {
            output.push_str("\nrules: ");
            output.push_str(&request.enabled_rules.join(", "));
        }
        Ok(EngineReport {
            output,
            diagnostics: Vec::new(),
        })
    }
}
