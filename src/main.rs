//! frpc launcher: runs the installed frpc for this platform

use std::ffi::OsString;

use frpc_cli::{config, launch};

fn main() {
    // Quiet by default so frpc owns the terminal
    env_logger::Builder::new()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "frpc: {}: {}", record.level(), record.args())
        })
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let env = config::snapshot();
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("frpc: failed to create async runtime: {e}");
            std::process::exit(1);
        }
    };

    let outcome = rt.block_on(launch::run(&env, args));
    drop(rt);

    match outcome {
        Ok(exit) => launch::exit_like(exit),
        Err(e) => {
            if let frpc_cli::Error::Spawn { path, .. } = &e {
                log::debug!("spawn target: {}", path.display());
            }
            eprintln!("frpc: {:#}", anyhow::Error::from(e));
            std::process::exit(1);
        }
    }
}
