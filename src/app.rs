// Declare modules
pub mod checker;
pub mod cli;
pub mod config;
pub mod error;
pub mod formatter;
pub mod host;
pub mod models;
pub mod scanner;
pub mod template;

use anyhow::{Context, Result};
use clap::Parser;
use std::thread;
use std::time::{Duration, SystemTime};

use self::checker::PathChecker;
use self::cli::Cli;
use self::config::resolve_config;
use self::formatter::OutputGenerator;
use self::host::StandardHost;

/// Builds the checker from config and prints its block, once or on every refresh.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();

    // 2. Resolve Configuration
    let config = resolve_config(&args)?;

    // 3. Build the checker on top of the standard host services
    let host = StandardHost::new(config.palette);
    let checker = PathChecker::new(config.module, host)
        .context(format!("Failed to start instance {:?}", config.instance))?;
    log::debug!(
        "Checking {:?} with format {:?}",
        checker.patterns(),
        checker.format()
    );

    loop {
        // 4. Poll
        let evaluation = checker.evaluate()?;
        log::debug!("{} path(s) matched: {:?}", evaluation.count, evaluation.text());

        // 5. Print to Stdout
        let line = if args.json {
            OutputGenerator::i3bar(&evaluation.output, &config.instance)?
        } else {
            OutputGenerator::plain(&evaluation.output)
        };
        println!("{}", line);

        if !args.watch {
            return Ok(());
        }

        // 6. Sleep until the result goes stale
        thread::sleep(watch_delay(evaluation.valid_until, SystemTime::now()));
    }
}

/// Shortest pause between two `--watch` polls.
const MIN_WATCH_INTERVAL: Duration = Duration::from_secs(1);

fn watch_delay(valid_until: SystemTime, now: SystemTime) -> Duration {
    valid_until
        .duration_since(now)
        .unwrap_or_default()
        .max(MIN_WATCH_INTERVAL)
}
