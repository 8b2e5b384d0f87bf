//! Run the installed frpc for the current target
//!
//! The child inherits stdio and the process environment; the launcher only
//! adds `-s/--server` and `-t/--token` defaults and relays signals.

pub mod args;
pub mod signals;

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use log::debug;
use tokio::process::{Child, Command};

pub use args::{has_flag, with_env_defaults};
pub use signals::{exit_like, ChildExit};

use crate::artifacts::{make_executable, ArtifactStore};
use crate::config::{EnvMap, LaunchConfig};
use crate::error::{Error, Result};
use crate::platform::Target;

/// Spawn `binary` with inherited stdio
pub fn spawn(binary: &Path, args: &[OsString]) -> Result<Child> {
    Command::new(binary)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| Error::Spawn {
            path: binary.to_path_buf(),
            source,
        })
}

/// Launch the frpc artifact for the target described by `env`
pub async fn run<I>(env: &EnvMap, args: I) -> Result<ChildExit>
where
    I: IntoIterator<Item = OsString>,
{
    let config = LaunchConfig::from_env(env)?;
    let target = Target::detect(env)?;
    let binary = ArtifactStore::new(&config.artifact_dir).locate(target)?;

    if !target.os.is_windows()
        && let Err(e) = make_executable(&binary)
    {
        debug!("chmod {} failed: {e}", binary.display());
    }

    let args = with_env_defaults(
        args.into_iter().collect(),
        config.server.as_deref(),
        config.token.as_deref(),
    );
    debug!("exec {} {:?}", binary.display(), args);

    let relay = signals::relay_stream()?;
    let mut child = spawn(&binary, &args)?;
    signals::supervise(&mut child, relay).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::vars;

    fn env_for(dir: &Path, extra: &[(&str, &str)]) -> EnvMap {
        [
            (vars::NATIVE_DIR, dir.to_str().unwrap()),
            (vars::FORCE_PLATFORM, "linux"),
            (vars::FORCE_ARCH, "x64"),
        ]
        .into_iter()
        .chain(extra.iter().copied())
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    /// Write a shell script as the linux-x64 artifact
    fn install_script(dir: &Path, body: &str) {
        let path = dir.join("frpc-linux-x64");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        make_executable(&path).unwrap();
    }

    #[tokio::test]
    async fn propagates_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        install_script(tmp.path(), "exit 7");

        let exit = run(&env_for(tmp.path(), &[]), Vec::new()).await.unwrap();
        assert_eq!(exit, ChildExit::Code(7));
    }

    #[tokio::test]
    async fn forwards_arguments_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("argv.txt");
        install_script(
            tmp.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", out.display()),
        );

        let env = env_for(
            tmp.path(),
            &[(vars::SERVER, "example.com:7000"), (vars::TOKEN, "tok")],
        );
        let args = ["-p", "80", "-t", "mine"].map(OsString::from);
        let exit = run(&env, args).await.unwrap();

        assert_eq!(exit, ChildExit::Code(0));
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "-p\n80\n-t\nmine\n-s\nexample.com:7000\n"
        );
    }

    #[tokio::test]
    async fn missing_artifact_points_at_updater() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run(&env_for(tmp.path(), &[]), Vec::new()).await.unwrap_err();

        assert!(matches!(err, Error::ArtifactMissing { .. }));
        let message = err.to_string();
        assert!(message.contains("frpc-linux-x64"));
        assert!(message.contains("frpc-update"));
    }

    #[tokio::test]
    async fn unsupported_arch_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        install_script(tmp.path(), "exit 0");
        let env = env_for(tmp.path(), &[(vars::FORCE_ARCH, "ppc64")]);

        let err = run(&env, Vec::new()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedArch(a) if a == "ppc64"));
    }

    #[tokio::test]
    async fn unrunnable_artifact_is_a_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("frpc-linux-x64")).unwrap();
        let binary = tmp.path().join("frpc-linux-x64");

        let err = spawn(&binary, &[]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }
}
