pub mod config;
pub mod environment;
pub mod performance;
pub mod report;
pub mod suite;
pub mod tolerance;
pub mod workers;

pub use config::HarnessConfig;
pub use environment::{EnvAccessor, MemoryEnv, ProcessEnv, ScopedVar};
pub use performance::{DurationThreshold, PerformanceError, PerformanceGate, PerformanceResult};
pub use report::{CaseReport, CaseStatus, SuiteReport, ValidationReport};
pub use suite::{CaseContext, CaseError, SuiteHooks, SuiteState, TestCase, TestSuite};
pub use tolerance::{almost_equal, almost_equal_default, DEFAULT_EPSILON};
pub use workers::{run_workers, WorkerError, WorkerFailure};
