use async_trait::async_trait;
use evaluator::fixtures::{invalid_expressions, valid_cases};
use evaluator::{EvalError, Evaluator, MockEvaluator};
use harness::environment::{EnvAccessor, ProcessEnv, ScopedVar};
use harness::report::CaseStatus;
use harness::suite::{CaseError, SuiteHooks, SuiteState, TestCase, TestSuite};
use harness::workers::{run_workers, WorkerError};
use harness::{almost_equal_default, HarnessConfig, PerformanceGate};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// Stress test shape: fixed worker count, fixed per-worker workload.
const STRESS_WORKERS: usize = 10;
const STRESS_OPS: usize = 100;

const TEST_MODE_VAR: &str = "CALC_HARNESS_TEST_MODE";

#[derive(Default)]
struct RecordingHooks {
    log: Mutex<Vec<&'static str>>,
    fail_setup: bool,
}

#[async_trait]
impl SuiteHooks for RecordingHooks {
    async fn before_all(&self) -> Result<(), CaseError> {
        self.log.lock().unwrap().push("setup");
        if self.fail_setup {
            return Err("database fixture missing".into());
        }
        Ok(())
    }

    async fn after_all(&self) -> Result<(), CaseError> {
        self.log.lock().unwrap().push("teardown");
        Ok(())
    }
}

#[tokio::test]
async fn test_suite_lifecycle_ordering() {
    let hooks = Arc::new(RecordingHooks::default());
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut suite =
        TestSuite::new("lifecycle", "setup, cases, teardown").with_hooks(hooks.clone());
    for name in ["alpha", "beta"] {
        let order = Arc::clone(&order);
        suite.register(TestCase::new(name, "records execution", move |context| {
            let order = Arc::clone(&order);
            async move {
                order.lock().unwrap().push(context.case.clone());
                Ok(())
            }
        }));
    }

    let report = suite.run().await;

    assert!(report.passed());
    assert_eq!(report.state, SuiteState::Done);
    assert_eq!(*order.lock().unwrap(), vec!["alpha", "beta"]);
    assert_eq!(*hooks.log.lock().unwrap(), vec!["setup", "teardown"]);
}

#[tokio::test]
async fn test_setup_failure_aborts_run() {
    let hooks = Arc::new(RecordingHooks {
        fail_setup: true,
        ..Default::default()
    });
    let executed = Arc::new(AtomicUsize::new(0));

    let mut suite = TestSuite::new("aborted", "setup fails").with_hooks(hooks.clone());
    let counter = Arc::clone(&executed);
    suite.register(TestCase::new("never_runs", "must not execute", move |_context| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }));

    let report = suite.run().await;

    assert_eq!(report.state, SuiteState::SetupFailed);
    assert_eq!(executed.load(Ordering::SeqCst), 0);
    assert!(report.cases.is_empty());
    assert!(report
        .setup_error
        .as_deref()
        .unwrap()
        .contains("database fixture missing"));
    // Teardown must not run after a failed setup.
    assert_eq!(*hooks.log.lock().unwrap(), vec!["setup"]);
    assert!(!report.passed());
}

#[tokio::test]
async fn test_failing_case_does_not_suppress_others() {
    let executed = Arc::new(AtomicUsize::new(0));
    let mut suite = TestSuite::new("isolation", "five cases, one failing");

    for index in 0..5 {
        let counter = Arc::clone(&executed);
        suite.register(TestCase::new(
            format!("case_{index}"),
            "counts and maybe fails",
            move |_context| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if index == 2 {
                        return Err("case_2 is broken".into());
                    }
                    Ok(())
                }
            },
        ));
    }

    let report = suite.run().await;

    assert_eq!(executed.load(Ordering::SeqCst), 5);
    assert_eq!(report.cases.len(), 5);
    assert_eq!(report.counts(), (4, 1, 0));
    assert_eq!(report.failures()[0].name, "case_2");
    assert!(report.failures()[0]
        .error
        .as_deref()
        .unwrap()
        .contains("case_2 is broken"));
}

#[tokio::test]
async fn test_mock_and_tolerance_against_fixtures() {
    let mut mock = MockEvaluator::new();
    for (expression, expected) in valid_cases() {
        mock.set_result(*expression, *expected);
    }

    for (expression, expected) in valid_cases() {
        let value = mock.evaluate(expression).await.unwrap();
        assert!(
            almost_equal_default(value, *expected),
            "{expression} evaluated to {value}, expected {expected}"
        );
    }

    for expression in invalid_expressions() {
        assert!(
            mock.evaluate(expression).await.is_err(),
            "invalid expression {expression:?} unexpectedly evaluated"
        );
    }
}

#[tokio::test]
async fn test_performance_gate_accepts_mock_latencies() {
    let gate = PerformanceGate::with_default_thresholds();
    let mock = MockEvaluator::new();

    let clock = Instant::now();
    mock.evaluate("2 + 3").await.unwrap();
    // data_access has the widest budget; a canned lookup fits easily.
    gate.validate("data_access", clock.elapsed()).unwrap();

    assert!(gate
        .validate("nonexistent_op", Duration::ZERO)
        .is_err());
}

#[tokio::test]
async fn test_worker_stress_with_isolated_mocks() {
    let result = run_workers(STRESS_WORKERS, |index| async move {
        // Each worker owns its evaluator and scratch directory.
        let scratch = tempfile::tempdir().map_err(|e| format!("worker {index}: {e}"))?;
        let marker = scratch.path().join("worker.log");
        std::fs::write(&marker, index.to_string()).map_err(|e| format!("worker {index}: {e}"))?;

        let mut mock = MockEvaluator::new();
        mock.set_result("2 + 3", 5.0);
        mock.set_error(
            "10 / 0",
            EvalError::DivisionByZero {
                expression: "10 / 0".to_string(),
            },
        );

        for _ in 0..STRESS_OPS {
            let value = mock.evaluate("2 + 3").await?;
            if value != 5.0 {
                return Err(format!("worker {index} observed {value}").into());
            }
            if mock.evaluate("10 / 0").await.is_ok() {
                return Err(format!("worker {index} missed the canned error").into());
            }
        }

        let recorded = std::fs::read_to_string(&marker).map_err(|e| format!("worker {index}: {e}"))?;
        if recorded != index.to_string() {
            return Err(format!("worker {index} scratch dir was corrupted").into());
        }
        Ok(())
    })
    .await;

    assert!(result.is_ok(), "stress run failed: {result:?}");
}

#[tokio::test]
async fn test_workers_report_every_failure() {
    let result = run_workers(6, |index| async move {
        if index >= 4 {
            Err(format!("worker {index} exhausted its quota").into())
        } else {
            Ok(())
        }
    })
    .await;

    match result.unwrap_err() {
        WorkerError::WorkersFailed { failed, total, failures, .. } => {
            assert_eq!(failed, 2);
            assert_eq!(total, 6);
            let workers: Vec<usize> = failures.iter().map(|f| f.worker).collect();
            assert_eq!(workers, vec![4, 5]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn test_case_restores_test_mode_flag() {
    let mut suite = TestSuite::new("env", "scoped test-mode flag");
    suite.register(TestCase::new(
        "flips_test_mode",
        "sets the flag for its own duration",
        |context| async move {
            let _guard = ScopedVar::set(Arc::clone(&context.env), TEST_MODE_VAR, "enabled");
            if context.env.get(TEST_MODE_VAR).as_deref() != Some("enabled") {
                return Err("flag not visible inside the case".into());
            }
            // Fail on purpose; the guard must still restore on unwind of
            // the error path.
            Err("case failed after flipping the flag".into())
        },
    ));

    assert_eq!(ProcessEnv.get(TEST_MODE_VAR), None);
    let report = suite.run().await;
    assert_eq!(report.counts(), (0, 1, 0));
    assert_eq!(ProcessEnv.get(TEST_MODE_VAR), None);
}

#[tokio::test]
async fn test_tagged_run_reports_skips() {
    let mut suite = TestSuite::new("tagged", "tag filtering");
    suite.register(
        TestCase::new("fast_check", "tagged smoke", |_context| async { Ok(()) })
            .with_tags(["smoke"]),
    );
    suite.register(
        TestCase::new("slow_check", "untagged", |_context| async { Ok(()) }),
    );

    let report = suite.run_tagged("smoke").await;

    assert_eq!(report.counts(), (1, 0, 1));
    assert_eq!(report.cases[0].status, CaseStatus::Passed);
    assert_eq!(report.cases[1].status, CaseStatus::Skipped);
    assert!(report.passed());
}

#[tokio::test]
async fn test_summary_reflects_run_outcome() {
    let mut suite = TestSuite::new("summary", "summary envelope");
    suite.register(TestCase::new("passes", "fine", |_context| async { Ok(()) }));
    suite.register(TestCase::new("breaks", "not fine", |_context| async {
        Err("deliberate".into())
    }));

    let report = suite.run().await;
    let summary = report.summary();

    assert!(!summary.is_valid);
    assert!(summary.message.contains("summary"));
    assert_eq!(summary.details["passed"], serde_json::Value::from(1));
    assert_eq!(summary.details["failed"], serde_json::Value::from(1));
}

#[test]
fn test_config_bounds() {
    assert!(HarnessConfig::default().validate().is_ok());
    assert!(HarnessConfig::new().with_workers(0).validate().is_err());
    assert!(HarnessConfig::new().with_ops_per_worker(0).validate().is_err());
}

#[tokio::test]
async fn test_case_deadline_bounds_worker_fan_out() {
    let mut suite = TestSuite::new("deadline", "fan-out honors the case deadline")
        .with_default_deadline(Duration::from_millis(50));
    suite.register(TestCase::new(
        "stalls",
        "workers sleep past the deadline",
        |context| async move {
            let fan_out = run_workers(2, |_index| async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            });
            match context.deadline {
                Some(deadline) => tokio::time::timeout(deadline, fan_out)
                    .await
                    .map_err(|_| "fan-out exceeded the case deadline")??,
                None => fan_out.await?,
            }
            Ok(())
        },
    ));

    let report = suite.run().await;

    assert_eq!(report.counts(), (0, 1, 0));
    assert!(report.failures()[0]
        .error
        .as_deref()
        .unwrap()
        .contains("deadline"));
}
