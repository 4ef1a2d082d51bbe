//! Suite/case orchestration.
//!
//! A suite owns an ordered list of cases and an optional pair of lifecycle
//! hooks. One run walks the state machine
//!
//! ```text
//! NotStarted -> SetupRunning -> SetupFailed            (terminal)
//!                            -> CasesRunning -> TeardownRunning -> Done
//! ```
//!
//! Setup failure aborts the run before any case and skips teardown. A case
//! failure is captured in the report and never stops later cases. Teardown
//! runs whenever setup succeeded, and its failure is reported without
//! retroactively failing cases.

use crate::environment::{EnvAccessor, ProcessEnv};
use crate::report::{CaseReport, SuiteReport};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Failure payload a case or lifecycle hook may return.
pub type CaseError = Box<dyn std::error::Error + Send + Sync>;

type CaseFn = Box<dyn Fn(CaseContext) -> BoxFuture<'static, Result<(), CaseError>> + Send + Sync>;

/// Execution context handed to each case.
#[derive(Clone)]
pub struct CaseContext {
    pub suite: String,
    pub case: String,
    /// Advisory deadline. The orchestrator imposes no timeout of its own;
    /// cases are expected to honor it.
    pub deadline: Option<Duration>,
    pub env: Arc<dyn EnvAccessor>,
}

/// Pluggable setup/teardown lifecycle for a suite.
#[async_trait]
pub trait SuiteHooks: Send + Sync {
    async fn before_all(&self) -> Result<(), CaseError> {
        Ok(())
    }

    async fn after_all(&self) -> Result<(), CaseError> {
        Ok(())
    }
}

pub struct TestCase {
    name: String,
    description: String,
    dependencies: Vec<String>,
    tags: HashSet<String>,
    func: CaseFn,
}

impl TestCase {
    pub fn new<F, Fut>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(CaseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CaseError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            dependencies: Vec::new(),
            tags: HashSet::new(),
            func: Box::new(move |context| Box::pin(func(context))),
        }
    }

    /// Names of cases this case builds on. Declared metadata only: the
    /// orchestrator reports dependencies but never reorders or gates
    /// execution on them.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn tags(&self) -> &HashSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of one suite run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuiteState {
    NotStarted,
    SetupRunning,
    SetupFailed,
    CasesRunning,
    TeardownRunning,
    Done,
}

impl fmt::Display for SuiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteState::NotStarted => write!(f, "not_started"),
            SuiteState::SetupRunning => write!(f, "setup_running"),
            SuiteState::SetupFailed => write!(f, "setup_failed"),
            SuiteState::CasesRunning => write!(f, "cases_running"),
            SuiteState::TeardownRunning => write!(f, "teardown_running"),
            SuiteState::Done => write!(f, "done"),
        }
    }
}

pub struct TestSuite {
    name: String,
    description: String,
    cases: Vec<TestCase>,
    hooks: Option<Arc<dyn SuiteHooks>>,
    env: Arc<dyn EnvAccessor>,
    default_deadline: Option<Duration>,
    state: SuiteState,
}

impl TestSuite {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            cases: Vec::new(),
            hooks: None,
            env: Arc::new(ProcessEnv),
            default_deadline: None,
            state: SuiteState::NotStarted,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn SuiteHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvAccessor>) -> Self {
        self.env = env;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }

    /// Append a case. Cases execute in registration order.
    pub fn register(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn state(&self) -> SuiteState {
        self.state
    }

    /// Run every registered case.
    pub async fn run(&mut self) -> SuiteReport {
        self.execute(None).await
    }

    /// Run only the cases carrying `tag`; the rest are reported as
    /// skipped. Lifecycle semantics are identical to [`Self::run`].
    pub async fn run_tagged(&mut self, tag: &str) -> SuiteReport {
        self.execute(Some(tag)).await
    }

    async fn execute(&mut self, tag: Option<&str>) -> SuiteReport {
        let started_at = Utc::now();
        info!(suite = %self.name, cases = self.cases.len(), "starting suite run");

        self.state = SuiteState::SetupRunning;
        if let Some(hooks) = self.hooks.clone() {
            if let Err(failure) = hooks.before_all().await {
                error!(
                    suite = %self.name,
                    error = %failure,
                    "setup failed; skipping cases and teardown"
                );
                self.state = SuiteState::SetupFailed;
                return SuiteReport {
                    suite: self.name.clone(),
                    state: self.state,
                    started_at,
                    finished_at: Utc::now(),
                    setup_error: Some(failure.to_string()),
                    teardown_error: None,
                    cases: Vec::new(),
                };
            }
        }

        self.state = SuiteState::CasesRunning;
        let mut case_reports = Vec::with_capacity(self.cases.len());
        for case in &self.cases {
            if let Some(tag) = tag {
                if !case.has_tag(tag) {
                    case_reports.push(CaseReport::skipped(case.name()));
                    continue;
                }
            }

            let context = CaseContext {
                suite: self.name.clone(),
                case: case.name().to_string(),
                deadline: self.default_deadline,
                env: Arc::clone(&self.env),
            };

            info!(suite = %self.name, case = case.name(), "running case");
            let clock = Instant::now();
            let outcome = (case.func)(context).await;
            let duration = clock.elapsed();

            match outcome {
                Ok(()) => {
                    info!(suite = %self.name, case = case.name(), ?duration, "case passed");
                    case_reports.push(CaseReport::passed(case.name(), duration));
                }
                Err(failure) => {
                    error!(
                        suite = %self.name,
                        case = case.name(),
                        error = %failure,
                        "case failed"
                    );
                    case_reports.push(CaseReport::failed(case.name(), failure.to_string(), duration));
                }
            }
        }

        self.state = SuiteState::TeardownRunning;
        let mut teardown_error = None;
        if let Some(hooks) = self.hooks.clone() {
            if let Err(failure) = hooks.after_all().await {
                warn!(suite = %self.name, error = %failure, "teardown failed");
                teardown_error = Some(failure.to_string());
            }
        }

        self.state = SuiteState::Done;
        let report = SuiteReport {
            suite: self.name.clone(),
            state: self.state,
            started_at,
            finished_at: Utc::now(),
            setup_error: None,
            teardown_error,
            cases: case_reports,
        };
        info!(suite = %self.name, passed = report.passed(), "suite run complete");
        report
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("cases", &self.cases.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
