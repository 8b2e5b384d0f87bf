//! frpc-update: download the frpc release for this platform
//!
//! Flags are folded into the environment snapshot before the fetch reads it.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use frpc_cli::cli::UpdateArgs;
use frpc_cli::config;
use frpc_cli::fetch::{self, FetchOutcome, HINTS};

async fn real_main() -> Result<()> {
    let args = UpdateArgs::parse();
    let mut env = config::snapshot();
    args.apply(&mut env);

    info!("frpc-update: downloading binary...");
    match fetch::run(&env).await.context("frp-cli postinstall failed")? {
        FetchOutcome::Skipped => {}
        FetchOutcome::Installed(report) => {
            info!(
                "frpc-update: frp {} ready at {}",
                report.version,
                report.path.display()
            );
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            match record.level() {
                log::Level::Info => writeln!(buf, "{}", record.args()),
                level => writeln!(buf, "{}: {}", level, record.args()),
            }
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = real_main().await {
        eprintln!("{e:#}");
        eprintln!("{HINTS}");
        std::process::exit(1);
    }
}
