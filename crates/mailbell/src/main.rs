//! `mailbell` - polls IMAP mailboxes and announces unseen mail over GNTP.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mailbell_core::{Checker, GrowlNotifier, ImapPoller, Settings};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

use cli::Cli;

const QUIET_FILTER: &str = "warn,mailbell=info,mailbell_core=info";
const VERBOSE_FILTER: &str =
    "warn,mailbell=debug,mailbell_core=debug,mailbell_imap=debug,mailbell_gntp=debug";

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging = init_logging(cli.verbose);

    match run(&cli, &logging).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, logging: &FilterHandle) -> Result<()> {
    let settings = cli.load_settings()?;
    if settings.verbose && !cli.verbose {
        // [general] verbose only becomes known once the file is read.
        logging
            .reload(filter(true))
            .context("cannot raise log level")?;
    }

    info!(
        profile = %settings.profile,
        host = %settings.imap.host,
        period = ?settings.period,
        "starting mailbell"
    );

    checker(&settings)
        .run()
        .await
        .with_context(|| format!("checking profile {} failed", settings.profile))
}

fn checker(settings: &Settings) -> Checker<ImapPoller, GrowlNotifier> {
    Checker::new(
        ImapPoller::new(settings),
        GrowlNotifier::new(settings),
        settings.period,
    )
}

/// `RUST_LOG` wins over the verbosity switches.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { VERBOSE_FILTER } else { QUIET_FILTER })
    })
}

fn init_logging(verbose: bool) -> FilterHandle {
    let (filter, handle) = reload::Layer::new(filter(verbose));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    handle
}
