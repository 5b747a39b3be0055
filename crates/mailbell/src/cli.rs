//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mailbell_core::{Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "mailbell", version, about = "New messages notifier")]
pub struct Cli {
    /// Log protocol traffic and every notification sent
    #[arg(long, short)]
    pub verbose: bool,

    /// Settings file to read
    ///
    /// Defaults to settings.ini in the working directory, then to
    /// mailbell/settings.ini in the user configuration directory.
    #[arg(long, short)]
    #[arg(value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Profile section to use instead of [general] profile
    #[arg(long, short)]
    #[arg(value_name = "NAME")]
    pub profile: Option<String>,

    /// Login user, overriding the profile
    #[arg(long, short)]
    #[arg(value_name = "USER")]
    pub user: Option<String>,

    /// Login password, overriding the profile
    #[arg(long = "pass", short = 'x')]
    #[arg(value_name = "PASS")]
    pub password: Option<String>,
}

impl Cli {
    /// Values that take precedence over the settings file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            profile: self.profile.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            verbose: self.verbose,
        }
    }

    /// Finds and loads the settings file.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = Settings::resolve_path(self.settings.as_deref());
        Settings::load(&path, &self.overrides())
            .with_context(|| format!("cannot load settings from {}", path.display()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use mailbell_core::Error;
    use std::io::Write;

    const SETTINGS: &str = "[general]\nprofile = home\n\
                            [home]\nhost = imap.example.com\nuser = stored\npass = pw\n\
                            [work]\nhost = imap.example.org\nuser = worker\npass = pw\n";

    fn settings_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SETTINGS.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "mailbell", "-v", "-s", "a.ini", "-p", "work", "-u", "alice", "-x", "pw",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.settings, Some(PathBuf::from("a.ini")));
        assert_eq!(cli.profile.as_deref(), Some("work"));
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert_eq!(cli.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "mailbell",
            "--verbose",
            "--settings",
            "b.ini",
            "--profile",
            "home",
            "--user",
            "bob",
            "--pass",
            "secret",
        ])
        .unwrap();
        let overrides = cli.overrides();
        assert!(overrides.verbose);
        assert_eq!(overrides.profile.as_deref(), Some("home"));
        assert_eq!(overrides.user.as_deref(), Some("bob"));
        assert_eq!(overrides.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_no_flags() {
        let cli = Cli::try_parse_from(["mailbell"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(cli.settings, None);
        assert_eq!(cli.profile, None);
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["mailbell", "--poll"]).is_err());
    }

    #[test]
    fn test_user_override_wins() {
        let file = settings_file();
        let path = file.path().to_str().unwrap();
        let cli =
            Cli::try_parse_from(["mailbell", "-s", path, "-p", "work", "-u", "alice"]).unwrap();

        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.profile, "work");
        assert_eq!(settings.credentials.user(), "alice");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere.ini");
        let cli = Cli::try_parse_from(["mailbell", "-s", path.to_str().unwrap()]).unwrap();

        let err = cli.load_settings().unwrap_err();
        let cause = err.downcast_ref::<Error>().unwrap();
        assert!(matches!(cause, Error::ConfigNotFound(_)));
        assert!(cause.is_fatal());
        assert!(err.to_string().contains("nowhere.ini"));
    }

    #[test]
    fn test_unknown_profile_is_fatal() {
        let file = settings_file();
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["mailbell", "-s", path, "-p", "play"]).unwrap();

        let err = cli.load_settings().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ProfileNotFound(p)) if p == "play"
        ));
    }
}
