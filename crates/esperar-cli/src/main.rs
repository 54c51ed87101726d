//! `espera`: run the lobby UI test suite against a live WebDriver endpoint.
//!
//! Loads the suite configuration (JSON file plus flag overrides), installs
//! the suite logger, opens one browser session, and runs the player
//! scenarios sequentially. Exit code 0 means every test passed, 1 means at
//! least one failed, 2 means the run could not start or aborted.

use clap::Parser;
use esperar::flow;
use esperar::logging;
use esperar::prelude::*;
use esperar::SuiteSummary;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "espera",
    version,
    about = "Run the lobby UI test suite against a WebDriver endpoint"
)]
struct Args {
    /// Path to a JSON suite configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// WebDriver endpoint, e.g. a local chromedriver
    #[arg(long, value_name = "URL")]
    webdriver_url: Option<String>,

    /// Login page of the deployment under test
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Event to locate and join
    #[arg(long, value_name = "NAME")]
    event: Option<String>,

    /// Root directory for logs and screenshots
    #[arg(long, value_name = "DIR")]
    logs_root: Option<PathBuf>,

    /// Suite name used in the log file prefix
    #[arg(long, value_name = "NAME")]
    suite: Option<String>,

    /// Fail tests on any interaction error, not only on assertions
    #[arg(long)]
    fail_fast: bool,
}

fn load_config(args: &Args) -> esperar::Result<SuiteConfig> {
    let mut config = match &args.config {
        Some(path) => SuiteConfig::from_file(path)?,
        None => SuiteConfig::default(),
    };
    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(event) = &args.event {
        config.event_name = event.clone();
    }
    if let Some(logs_root) = &args.logs_root {
        config.logs_root = logs_root.clone();
    }
    if let Some(suite) = &args.suite {
        config.suite_name = suite.clone();
    }
    if args.fail_fast {
        config.failure_mode = FailureMode::FailFast;
    }
    Ok(config)
}

fn run_suite(config: SuiteConfig) -> esperar::Result<SuiteSummary> {
    let session = WebDriverSession::connect(&config.webdriver_url)?;
    let mut ctx = RunContext::new(config, session)?;

    let _ = ctx.run_test("positive_player_login", |session, run_dir, config| {
        let waits = Waits::new(session).with_evidence(run_dir);
        flow::login(
            session,
            &waits,
            &config.base_url,
            &config.credentials,
            &config.visible_options(),
        )?;
        let _ = flow::assert_welcome(session, &waits, &config.visible_options())?;
        let nav = config.navigator_config();
        let outcome = flow::interact_with_event(session, &nav, Some(run_dir))?;
        info!(?outcome, "event interaction completed");
        Ok(())
    });

    let _ = ctx.run_test("single_player_gallery_audit", |session, run_dir, config| {
        let waits = Waits::new(session).with_evidence(run_dir);
        let absence = WaitOptions::new()
            .with_timeout(5_000)
            .with_poll_interval(config.poll_interval_ms);
        flow::assert_library_button_absent(&waits, &absence)?;
        flow::assert_gallery_excludes(
            session,
            &waits,
            &config.visible_options(),
            flow::RESTRICTED_GALLERY_LINKS,
        )?;
        Ok(())
    });

    Ok(ctx.finish())
}

fn print_summary(summary: &SuiteSummary) {
    for report in &summary.reports {
        let verdict = if report.passed { "PASS" } else { "FAIL" };
        match &report.error {
            Some(err) => println!("{verdict} {} ({:.1?}): {err}", report.name, report.duration),
            None => println!("{verdict} {} ({:.1?})", report.name, report.duration),
        }
    }
    println!(
        "{}: {} passed, {} failed in {:.1?}",
        summary.suite_name,
        summary.passed_count(),
        summary.failed_count(),
        summary.duration
    );
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("espera: {err}");
            return ExitCode::from(2);
        }
    };

    let log_file = logging::suite_log_path(&config.logs_root, &config.suite_name);
    if let Err(err) = logging::init(&log_file) {
        eprintln!("espera: {err}");
        return ExitCode::from(2);
    }
    info!(
        suite = %config.suite_name,
        log_file = %log_file.display(),
        webdriver = %config.webdriver_url,
        "starting suite"
    );

    match run_suite(config) {
        Ok(summary) => {
            print_summary(&summary);
            if summary.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!(%err, "suite aborted");
            eprintln!("espera: suite aborted: {err}");
            ExitCode::from(2)
        }
    }
}
