use clap::Parser;

use crate::config::{strip_v, vars, EnvMap};

/// Command-line arguments for frpc-update
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "frpc-update",
    about = "Download the frpc binary for this platform",
    disable_version_flag = true
)]
pub struct UpdateArgs {
    /// Install this frp release instead of the latest (leading `v` is ignored)
    #[arg(long, value_name = "SEMVER")]
    pub version: Option<String>,

    /// Download with curl instead of the built-in HTTP client
    #[arg(long)]
    pub use_curl: bool,

    /// Repository to fetch releases from
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,
}

impl UpdateArgs {
    /// Write the flags into the environment snapshot, overriding inherited values
    pub fn apply(&self, env: &mut EnvMap) {
        if let Some(version) = &self.version {
            env.insert(vars::VERSION.to_owned(), strip_v(version).to_owned());
        }
        if self.use_curl {
            env.insert(vars::USE_CURL.to_owned(), "1".to_owned());
        }
        if let Some(repo) = &self.repo {
            env.insert(vars::REPO.to_owned(), repo.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;

    #[test]
    fn explicit_version_beats_environment() {
        let args = UpdateArgs::try_parse_from(["frpc-update", "--version", "v1.2.3"]).unwrap();
        let mut env: EnvMap = [
            (vars::VERSION.to_owned(), "9.9.9".to_owned()),
            (vars::NATIVE_DIR.to_owned(), "/tmp/native".to_owned()),
        ]
        .into_iter()
        .collect();

        args.apply(&mut env);

        let config = FetchConfig::from_env(&env).unwrap();
        assert_eq!(config.version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn flags_translate_to_variables() {
        let args =
            UpdateArgs::try_parse_from(["frpc-update", "--use-curl", "--repo", "me/frp"]).unwrap();
        let mut env = EnvMap::new();
        args.apply(&mut env);

        assert_eq!(env.get(vars::USE_CURL).map(String::as_str), Some("1"));
        assert_eq!(env.get(vars::REPO).map(String::as_str), Some("me/frp"));
        assert!(!env.contains_key(vars::VERSION));
    }

    #[test]
    fn inherited_values_survive_without_flags() {
        let args = UpdateArgs::try_parse_from(["frpc-update"]).unwrap();
        let mut env: EnvMap = [(vars::VERSION.to_owned(), "0.50.0".to_owned())]
            .into_iter()
            .collect();
        args.apply(&mut env);
        assert_eq!(env.get(vars::VERSION).map(String::as_str), Some("0.50.0"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(UpdateArgs::try_parse_from(["frpc-update", "--nightly"]).is_err());
    }
}
