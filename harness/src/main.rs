use clap::{Parser, Subcommand};
use evaluator::prelude::*;
use harness::{
    almost_equal, run_workers, HarnessConfig, PerformanceGate, TestCase, TestSuite,
};
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "calc-harness")]
#[command(about = "Integration-test harness for calculator services")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in calculator verification suite
    Run {
        /// Concurrent workers for the isolation stress case
        #[arg(long, default_value = "10")]
        workers: usize,
        /// Evaluations each worker performs
        #[arg(long, default_value = "100")]
        ops: usize,
        /// Only run cases carrying this tag
        #[arg(long)]
        tag: Option<String>,
        /// Emit the suite report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the built-in suite's cases
    List,
    /// Print the expression fixture categories
    Fixtures,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            workers,
            ops,
            tag,
            json,
        } => {
            let config = HarnessConfig::new()
                .with_workers(workers)
                .with_ops_per_worker(ops);
            config.validate()?;
            run_suite(&config, tag.as_deref(), json).await?;
        }
        Commands::List => {
            list_cases(&HarnessConfig::default());
        }
        Commands::Fixtures => {
            list_fixtures();
        }
    }

    Ok(())
}

async fn run_suite(
    config: &HarnessConfig,
    tag: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut suite = verification_suite(config);
    info!(suite = suite.name(), cases = suite.cases().len(), "running verification suite");

    let report = match tag {
        Some(tag) => suite.run_tagged(tag).await,
        None => suite.run().await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
        println!("{}", report.summary());
    }

    if report.passed() {
        Ok(())
    } else {
        Err(format!("suite '{}' did not pass", report.suite).into())
    }
}

fn list_cases(config: &HarnessConfig) {
    let suite = verification_suite(config);
    println!("{}: {}", suite.name(), suite.description());
    for case in suite.cases() {
        let mut tags: Vec<&str> = case.tags().iter().map(String::as_str).collect();
        tags.sort_unstable();
        println!("  - {} [{}]: {}", case.name(), tags.join(", "), case.description());
    }
}

fn list_fixtures() {
    println!("valid expressions:");
    for (expression, expected) in valid_cases() {
        println!("  {expression} = {expected}");
    }
    println!("invalid expressions:");
    for expression in invalid_expressions() {
        println!("  {expression:?}");
    }
    println!("complex expressions:");
    for expression in complex_expressions() {
        println!("  {expression}");
    }
}

/// The built-in verification suite: fixture arithmetic, error propagation,
/// tolerance boundaries, performance categories and worker isolation.
fn verification_suite(config: &HarnessConfig) -> TestSuite {
    let mut suite = TestSuite::new(
        "calculator-verification",
        "End-to-end checks of the calculator collaborator surface",
    )
    .with_default_deadline(config.default_deadline);

    let epsilon = config.epsilon;
    suite.register(
        TestCase::new(
            "arithmetic_fixtures",
            "Valid fixture expressions evaluate to their expected values",
            move |_context| async move {
                let mut mock = MockEvaluator::new();
                for (expression, expected) in valid_cases() {
                    mock.set_result(*expression, *expected);
                }
                for (expression, expected) in valid_cases() {
                    let value = mock.evaluate(expression).await?;
                    if !almost_equal(value, *expected, epsilon) {
                        return Err(format!(
                            "{expression} evaluated to {value}, expected {expected}"
                        )
                        .into());
                    }
                }
                Ok(())
            },
        )
        .with_tags(["arithmetic"]),
    );

    suite.register(
        TestCase::new(
            "error_propagation",
            "Canned, fallback and unknown-expression errors all surface",
            |_context| async move {
                let mut mock = MockEvaluator::new();
                mock.set_error(
                    "simulated",
                    EvalError::Simulated {
                        message: "configured failure".to_string(),
                    },
                );
                if mock.evaluate("simulated").await.is_ok() {
                    return Err("canned error did not surface".into());
                }
                for expression in invalid_expressions() {
                    if let Ok(value) = mock.evaluate(expression).await {
                        return Err(format!(
                            "invalid expression {expression:?} produced {value}"
                        )
                        .into());
                    }
                }
                Ok(())
            },
        )
        .with_tags(["errors"]),
    );

    suite.register(
        TestCase::new(
            "tolerance_boundaries",
            "Approximate equality accepts near-identical values and rejects drift",
            move |_context| async move {
                if !almost_equal(1.0, 1.0 + 5e-10, epsilon) {
                    return Err("tolerance rejected a value inside epsilon".into());
                }
                if almost_equal(1.0, 1.0001, epsilon) {
                    return Err("tolerance accepted a value far outside epsilon".into());
                }
                Ok(())
            },
        )
        .with_tags(["tolerance"])
        .with_dependencies(["arithmetic_fixtures"]),
    );

    suite.register(
        TestCase::new(
            "performance_categories",
            "Mock evaluations fit the stock duration thresholds",
            |_context| async move {
                let gate = PerformanceGate::with_default_thresholds();
                let mock = MockEvaluator::new();

                let clock = Instant::now();
                mock.evaluate("2 + 3").await?;
                gate.validate("data_access", clock.elapsed())?;

                let clock = Instant::now();
                let _ = mock.evaluate("10 / 0").await;
                gate.validate("error_handling", clock.elapsed())?;
                Ok(())
            },
        )
        .with_tags(["performance"]),
    );

    let workers = config.workers;
    let ops = config.ops_per_worker;
    suite.register(
        TestCase::new(
            "worker_isolation",
            "Isolated per-worker mocks complete a concurrent workload",
            move |context| async move {
                let fan_out = run_workers(workers, |index| async move {
                    let mut mock = MockEvaluator::new();
                    mock.set_result("2 + 3", 5.0);
                    for _ in 0..ops {
                        let value = mock.evaluate("2 + 3").await?;
                        if value != 5.0 {
                            return Err(format!("worker {index} observed {value}").into());
                        }
                    }
                    Ok(())
                });

                match context.deadline {
                    Some(deadline) => tokio::time::timeout(deadline, fan_out)
                        .await
                        .map_err(|_| "worker fan-out exceeded the case deadline")??,
                    None => fan_out.await?,
                }
                Ok(())
            },
        )
        .with_tags(["concurrency"]),
    );

    suite
}
