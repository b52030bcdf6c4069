//! Permissions validator CLI
//!
//! Runs one validation pass against a TOML fixture standing in for the
//! backend and prints each feature's result in catalog order.

use anyhow::{bail, Context, Result};
use clap::Parser;
use permval_app::{ChannelSink, ValidatorConfig, ValidatorEvent, ValidatorServices, ValidatorSession};
use permval_core::{DisplayMode, PrincipalId};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod fixture;
mod report;

use fixture::FixtureBackend;

#[derive(Parser)]
#[command(name = "permval")]
#[command(about = "Validate feature access for a profile, permission sets and permission set groups", long_about = None)]
struct Cli {
    /// Fixture file describing principals, features and grants
    #[arg(short, long)]
    fixture: PathBuf,

    /// Config file path
    #[arg(short, long, default_value = "permval.toml")]
    config: PathBuf,

    /// Display mode: `all` or `missing`
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<DisplayMode>,

    /// Profile to validate
    #[arg(long)]
    profile: Option<String>,

    /// Permission set to include (repeatable)
    #[arg(long = "permission-set")]
    permission_sets: Vec<String>,

    /// Permission set group to include (repeatable)
    #[arg(long = "permission-set-group")]
    permission_set_groups: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_mode(value: &str) -> Result<DisplayMode, String> {
    value.parse()
}

fn principal_ids(ids: Vec<String>) -> BTreeSet<PrincipalId> {
    ids.into_iter().map(PrincipalId::from).collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ValidatorConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if let Some(mode) = cli.mode {
        config.default_mode = mode;
    }

    let backend = Arc::new(FixtureBackend::load(&cli.fixture)?);
    let services = ValidatorServices {
        checker: backend.clone(),
        features: backend.clone(),
        principals: backend,
    };
    let (sink, mut events) = ChannelSink::new();
    let mut session = ValidatorSession::new(config, services, Arc::new(sink))?;

    let report = session.load_principals().await;
    if !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "some principal catalogs failed to load");
    }
    session.select_profile(cli.profile.map(PrincipalId::from))?;
    session.select_permission_sets(principal_ids(cli.permission_sets))?;
    session.select_permission_set_groups(principal_ids(cli.permission_set_groups))?;

    let run_id = match session.run().await {
        Ok(run_id) => run_id,
        Err(error) => {
            while let Ok(event) = events.try_recv() {
                if let ValidatorEvent::Toast(toast) = event {
                    eprintln!("{}", report::render_toast(&toast));
                }
            }
            return Err(error.into());
        }
    };

    while let Some(event) = events.recv().await {
        match event {
            ValidatorEvent::Toast(toast) => eprintln!("{}", report::render_toast(&toast)),
            ValidatorEvent::RunComplete { run_id: completed, .. } if completed == run_id => break,
            _ => {}
        }
    }
    while let Ok(event) = events.try_recv() {
        if let ValidatorEvent::Toast(toast) = event {
            eprintln!("{}", report::render_toast(&toast));
        }
    }

    let Some(snapshot) = session.snapshot() else {
        bail!("run {run_id} was superseded before it completed");
    };
    print!("{}", report::render_snapshot(&snapshot, session.mode_description()));
    Ok(())
}
