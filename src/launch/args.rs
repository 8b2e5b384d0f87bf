//! Argument defaults injected from the environment

use std::ffi::{OsStr, OsString};

fn matches_flag(arg: &str, name: &str) -> bool {
    arg == name || arg.strip_prefix(name).is_some_and(|rest| rest.starts_with('='))
}

/// Whether `args` already carries `short` or `long`, bare or `=`-joined
pub fn has_flag<S: AsRef<OsStr>>(args: &[S], short: &str, long: &str) -> bool {
    args.iter()
        .filter_map(|a| a.as_ref().to_str())
        .any(|a| matches_flag(a, short) || matches_flag(a, long))
}

/// Append `-s <server>` and `-t <token>` unless the caller set them
pub fn with_env_defaults(
    mut args: Vec<OsString>,
    server: Option<&str>,
    token: Option<&str>,
) -> Vec<OsString> {
    if let Some(server) = server
        && !has_flag(&args, "-s", "--server")
    {
        args.push("-s".into());
        args.push(server.into());
    }
    if let Some(token) = token
        && !has_flag(&args, "-t", "--token")
    {
        args.push("-t".into());
        args.push(token.into());
    }
    args
}
