//! Acceptance suite entry point
//!
//! Runs the register/login scenarios against a live application.
//! Run with: cargo run --package authflow-e2e -- --base-url http://localhost:3000

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use authflow_e2e::chrome::ChromeSessionFactory;
use authflow_e2e::config::{normalize_base_url, BrowserOptions, BASE_URL_ENV, DEFAULT_BASE_URL};
use authflow_e2e::{fixtures, health, E2eResult, Scenario, SuiteConfig, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "authflow-e2e")]
#[command(about = "Browser acceptance tests for the registration and login flows")]
struct Args {
    /// Root address of the application under test
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Run only these scenarios (number, name or test_NN_name); repeatable
    #[arg(long = "only", value_name = "SCENARIO")]
    only: Vec<String>,

    /// Run the browser headless
    #[arg(long, env = "AUTHFLOW_HEADLESS", default_value = "true", action = clap::ArgAction::Set)]
    headless: bool,

    /// Path to the Chrome/Chromium binary
    #[arg(long, env = "AUTHFLOW_CHROME")]
    chrome: Option<PathBuf>,

    /// Launch Chrome with --no-sandbox
    #[arg(long, env = "AUTHFLOW_NO_SANDBOX")]
    no_sandbox: bool,

    /// Seconds to wait for a form field to appear
    #[arg(long, env = "AUTHFLOW_ELEMENT_TIMEOUT_SECS", default_value = "10")]
    element_timeout_secs: u64,

    /// Seconds to wait for the redirect or error banner after submitting
    #[arg(long, env = "AUTHFLOW_WAIT_TIMEOUT_SECS", default_value = "10")]
    wait_timeout_secs: u64,

    /// Polling interval for all waits, in milliseconds
    #[arg(long, env = "AUTHFLOW_POLL_INTERVAL_MS", default_value = "500")]
    poll_interval_ms: u64,

    /// Create the fixture accounts before running
    #[arg(long, env = "AUTHFLOW_SEED_FIXTURES")]
    seed_fixtures: bool,

    /// Skip the reachability check against the login page
    #[arg(long)]
    skip_preflight: bool,

    /// Seconds the reachability check may take
    #[arg(long, default_value = "30")]
    preflight_timeout_secs: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn suite_config(&self) -> SuiteConfig {
        SuiteConfig {
            base_url: normalize_base_url(&self.base_url),
            element_timeout: Duration::from_secs(self.element_timeout_secs),
            wait_timeout: Duration::from_secs(self.wait_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            browser: BrowserOptions {
                headless: self.headless,
                chrome_executable: self.chrome.clone(),
                no_sandbox: self.no_sandbox,
                ..Default::default()
            },
            seed_fixtures: self.seed_fixtures,
            preflight_timeout: Duration::from_secs(self.preflight_timeout_secs),
            output_dir: self.output.clone(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = args.suite_config();
    config.validate()?;

    let scenarios = if args.only.is_empty() {
        Scenario::all()
    } else {
        args.only
            .iter()
            .map(|q| Scenario::find(q))
            .collect::<E2eResult<Vec<_>>>()?
    };

    if !args.skip_preflight {
        health::wait_for_app(&config).await?;
    }

    let factory = ChromeSessionFactory::new(config.browser.clone());

    if scenarios.iter().any(Scenario::requires_fixture) {
        if config.seed_fixtures {
            fixtures::seed_fixtures(&factory, &config).await?;
        } else {
            fixtures::warn_unseeded();
        }
    }

    let runner = TestRunner::new(factory, config);
    let results = runner.run_selected(&scenarios).await;
    runner.write_results(&results)?;

    info!(
        "{} of {} scenario(s) passed",
        results.passed, results.total
    );
    Ok(results.all_passed())
}
