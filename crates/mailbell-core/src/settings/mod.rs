//! Settings file loading.
//!
//! The settings file is INI. A `[general]` section names the default
//! profile, `[default]` supplies fallback values for every profile, and two
//! exclusion sections list mailboxes to skip when no single mailbox is
//! configured. Section and key names are case-insensitive.

mod credentials;
mod value;

pub use credentials::Credentials;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, ParseOption};
use mailbell_imap::{MailboxAttribute, Security};
use tracing::debug;

use crate::error::{Error, Result};

/// File name looked up when no path is given.
pub const DEFAULT_FILE_NAME: &str = "settings.ini";
/// Poll interval when `period` is unset.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(300);
/// Network timeout when `timeout` is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Notification daemon host when `gntp_host` is unset.
pub const DEFAULT_GNTP_HOST: &str = "localhost";

const GENERAL: &str = "general";
const DEFAULTS: &str = "default";
const EXCLUDED_NAMES: &str = "excluded mailboxes / names";
const EXCLUDED_FLAGS: &str = "excluded mailboxes / flags";

/// Values from the command line that take precedence over the file.
#[derive(Clone, Default)]
pub struct Overrides {
    /// Profile to use instead of `[general] profile`.
    pub profile: Option<String>,
    /// Login user.
    pub user: Option<String>,
    /// Login password.
    pub password: Option<String>,
    /// Force verbose output.
    pub verbose: bool,
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("profile", &self.profile)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// IMAP server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
    /// Bound on each network operation.
    pub timeout: Duration,
}

impl ImapSettings {
    /// Builds the connection configuration for the IMAP client.
    #[must_use]
    pub fn config(&self) -> mailbell_imap::Config {
        mailbell_imap::Config::new(self.host.clone())
            .security(self.security)
            .port(self.port)
            .timeout(self.timeout)
    }
}

/// Mailboxes skipped when every mailbox is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// Decoded mailbox names.
    pub names: Vec<String>,
    /// LIST attributes, with or without the leading backslash.
    pub flags: Vec<String>,
}

impl Exclusions {
    /// Returns true if a mailbox with this name or any of these attributes
    /// is excluded.
    #[must_use]
    pub fn excludes(&self, name: &str, attributes: &[MailboxAttribute]) -> bool {
        self.names.iter().any(|excluded| excluded == name)
            || attributes
                .iter()
                .any(|attr| self.flags.iter().any(|flag| attr.matches(flag)))
    }
}

/// Where the notification icon comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// A local file, sent inline.
    File(PathBuf),
    /// Anything else, handed to the daemon as a URL.
    Url(String),
}

impl IconSource {
    fn from_setting(value: &str) -> Self {
        let path = Path::new(value);
        if path.is_file() {
            Self::File(path.to_path_buf())
        } else {
            Self::Url(value.to_string())
        }
    }
}

/// Notification daemon and presentation.
#[derive(Clone, PartialEq, Eq)]
pub struct NotifierSettings {
    /// Daemon host.
    pub host: String,
    /// Daemon port.
    pub port: u16,
    /// Daemon password.
    pub password: Option<String>,
    /// Application and notification icon.
    pub icon: Option<IconSource>,
    /// Keep notifications on screen until dismissed.
    pub sticky: bool,
    /// URL opened when a notification is clicked.
    pub url: Option<String>,
    /// Bound on each request.
    pub timeout: Duration,
}

impl fmt::Debug for NotifierSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("icon", &self.icon)
            .field("sticky", &self.sticky)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Resolved settings of the selected profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Profile name, also the application name shown by the daemon.
    pub profile: String,
    /// Verbose logging requested.
    pub verbose: bool,
    /// IMAP server.
    pub imap: ImapSettings,
    /// Login credentials.
    pub credentials: Credentials,
    /// Single mailbox to check; all mailboxes when `None`.
    pub mailbox: Option<String>,
    /// Mailboxes to skip when checking all of them.
    pub exclusions: Exclusions,
    /// Poll interval; `None` checks once.
    pub period: Option<Duration>,
    /// Notification daemon.
    pub notifier: NotifierSettings,
}

impl Settings {
    /// Picks the settings file to read.
    ///
    /// An explicit path is used as given. Otherwise `settings.ini` in the
    /// working directory, then in the user configuration directory. When
    /// neither exists the working-directory path is returned, so the
    /// resulting error names it.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        let local = PathBuf::from(DEFAULT_FILE_NAME);
        if local.is_file() {
            return local;
        }

        dirs::config_dir()
            .map(|dir| dir.join("mailbell").join(DEFAULT_FILE_NAME))
            .filter(|path| path.is_file())
            .unwrap_or(local)
    }

    /// Reads and resolves the settings file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist, and
    /// the other configuration errors if its content cannot be resolved.
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound(path.to_path_buf())
            } else {
                Error::ConfigUnreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let settings = Self::parse(&content, overrides)?;
        debug!(path = %path.display(), profile = %settings.profile, "settings loaded");
        Ok(settings)
    }

    /// Resolves settings from INI text.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not INI, no profile is
    /// selected or found, a required key is missing, or a value is invalid.
    pub fn parse(content: &str, overrides: &Overrides) -> Result<Self> {
        let ini = Ini::load_from_str_opt(
            content,
            ParseOption {
                enabled_quote: false,
                enabled_escape: false,
                ..ParseOption::default()
            },
        )
        .map_err(|e| Error::ConfigSyntax(e.to_string()))?;
        let sections = sections(&ini);

        let general = sections.get(GENERAL);
        let profile = overrides
            .profile
            .clone()
            .or_else(|| {
                general
                    .and_then(|g| g.get("profile"))
                    .filter(|p| !p.is_empty())
                    .cloned()
            })
            .ok_or(Error::NoProfileSelected)?;

        let lookup = Lookup {
            own: sections
                .get(&profile.to_lowercase())
                .ok_or_else(|| Error::ProfileNotFound(profile.clone()))?,
            defaults: sections.get(DEFAULTS),
        };

        let verbose = overrides.verbose
            || general
                .and_then(|g| g.get("verbose"))
                .map(|v| value::parse_bool("verbose", v))
                .transpose()?
                .unwrap_or(false);

        let security = lookup
            .get(&["security"])
            .map(|v| v.parse::<Security>().map_err(|_| Error::invalid("security", v)))
            .transpose()?
            .unwrap_or_default();

        let imap = ImapSettings {
            host: lookup.require(&["hostname", "host"])?.to_string(),
            port: lookup
                .get(&["port"])
                .map(|v| value::parse_port("port", v))
                .transpose()?
                .unwrap_or_else(|| security.default_port()),
            security,
            timeout: lookup.seconds("timeout", DEFAULT_TIMEOUT)?,
        };

        let user = match &overrides.user {
            Some(user) => user.clone(),
            None => lookup.require(&["user_id", "user"])?.to_string(),
        };
        let password = match &overrides.password {
            Some(password) => password.clone(),
            None => lookup.require(&["password", "pass"])?.to_string(),
        };

        let period = match lookup.get(&["period"]) {
            Some(v) => value::parse_period("period", v)?,
            None => Some(DEFAULT_PERIOD),
        };

        let notifier = NotifierSettings {
            host: lookup
                .get(&["gntp_host"])
                .unwrap_or(DEFAULT_GNTP_HOST)
                .to_string(),
            port: lookup
                .get(&["gntp_port"])
                .map(|v| value::parse_port("gntp_port", v))
                .transpose()?
                .unwrap_or(mailbell_gntp::DEFAULT_PORT),
            password: lookup.get(&["gntp_password"]).map(str::to_string),
            icon: lookup.get(&["icon"]).map(IconSource::from_setting),
            sticky: lookup
                .get(&["sticky"])
                .map(|v| value::parse_bool("sticky", v))
                .transpose()?
                .unwrap_or(false),
            url: lookup.get(&["url"]).map(str::to_string),
            timeout: imap.timeout,
        };

        Ok(Self {
            profile,
            verbose,
            imap,
            credentials: Credentials::new(user, password),
            mailbox: lookup.get(&["mailbox"]).map(str::to_string),
            exclusions: Exclusions {
                names: list_values(sections.get(EXCLUDED_NAMES)),
                flags: list_values(sections.get(EXCLUDED_FLAGS)),
            },
            period,
            notifier,
        })
    }
}

type Section = BTreeMap<String, String>;

/// Sections keyed by lowercase name, keys lowercased, values trimmed.
fn sections(ini: &Ini) -> BTreeMap<String, Section> {
    let mut out: BTreeMap<String, Section> = BTreeMap::new();
    for (name, props) in ini.iter() {
        let Some(name) = name else { continue };
        let section = out.entry(name.trim().to_lowercase()).or_default();
        for (key, value) in props.iter() {
            section.insert(key.trim().to_lowercase(), value.trim().to_string());
        }
    }
    out
}

fn list_values(section: Option<&Section>) -> Vec<String> {
    section
        .map(|s| s.values().filter(|v| !v.is_empty()).cloned().collect())
        .unwrap_or_default()
}

/// Key lookup in a profile section with `[default]` as fallback.
struct Lookup<'a> {
    own: &'a Section,
    defaults: Option<&'a Section>,
}

impl<'a> Lookup<'a> {
    /// First non-empty value under any of `keys`, profile before defaults.
    fn get(&self, keys: &[&str]) -> Option<&'a str> {
        std::iter::once(self.own)
            .chain(self.defaults)
            .flat_map(|section| keys.iter().filter_map(move |key| section.get(*key)))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }

    fn require(&self, keys: &[&str]) -> Result<&'a str> {
        self.get(keys).ok_or_else(|| {
            Error::MissingSetting(keys.first().copied().unwrap_or_default().to_string())
        })
    }

    fn seconds(&self, key: &str, default: Duration) -> Result<Duration> {
        self.get(&[key])
            .map_or(Ok(default), |v| value::parse_seconds(key, v))
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
    use std::io::Write;

    const SAMPLE: &str = "\
[general]
profile = gmail

[excluded mailboxes / names]
1 = [Gmail]/All Mail
2 = [Gmail]/Trash

[excluded mailboxes / flags]
1 = \\Junk

[default]
period = 120
sticky = yes

[gmail]
hostname = imap.gmail.com
user_id = someone@gmail.com
password = secret

[work]
host = mail.example.com
security = starttls
user = bob
pass = hunter2
mailbox = INBOX
period = no
timeout = 15
gntp_host = 192.168.1.20
gntp_port = 23054
gntp_password = growl
url = https://mail.example.com/
";

    fn overrides() -> Overrides {
        Overrides::default()
    }

    #[test]
    fn test_parse_general_profile() {
        let settings = Settings::parse(SAMPLE, &overrides()).unwrap();
        assert_eq!(settings.profile, "gmail");
        assert_eq!(settings.imap.host, "imap.gmail.com");
        assert_eq!(settings.imap.port, 993);
        assert_eq!(settings.imap.security, Security::Implicit);
        assert_eq!(settings.imap.timeout, DEFAULT_TIMEOUT);
        assert_eq!(settings.credentials.user(), "someone@gmail.com");
        assert_eq!(settings.credentials.password(), "secret");
        assert_eq!(settings.mailbox, None);
        assert_eq!(settings.period, Some(Duration::from_secs(120)));
        assert!(settings.notifier.sticky);
        assert_eq!(settings.notifier.host, "localhost");
        assert_eq!(settings.notifier.port, 23053);
        assert!(!settings.verbose);
    }

    #[test]
    fn test_parse_exclusions() {
        let settings = Settings::parse(SAMPLE, &overrides()).unwrap();
        assert_eq!(
            settings.exclusions.names,
            vec!["[Gmail]/All Mail", "[Gmail]/Trash"]
        );
        assert_eq!(settings.exclusions.flags, vec!["\\Junk"]);
    }

    #[test]
    fn test_parse_profile_override() {
        let overrides = Overrides {
            profile: Some("work".into()),
            ..Overrides::default()
        };
        let settings = Settings::parse(SAMPLE, &overrides).unwrap();
        assert_eq!(settings.profile, "work");
        assert_eq!(settings.imap.host, "mail.example.com");
        assert_eq!(settings.imap.security, Security::StartTls);
        assert_eq!(settings.imap.port, 143);
        assert_eq!(settings.imap.timeout, Duration::from_secs(15));
        assert_eq!(settings.credentials.user(), "bob");
        assert_eq!(settings.mailbox.as_deref(), Some("INBOX"));
        assert_eq!(settings.period, None);
        assert_eq!(settings.notifier.host, "192.168.1.20");
        assert_eq!(settings.notifier.port, 23054);
        assert_eq!(settings.notifier.password.as_deref(), Some("growl"));
        assert_eq!(settings.notifier.url.as_deref(), Some("https://mail.example.com/"));
        assert_eq!(settings.notifier.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_user_override_wins() {
        let overrides = Overrides {
            profile: Some("work".into()),
            user: Some("alice".into()),
            password: Some("from-cli".into()),
            verbose: true,
        };
        let settings = Settings::parse(SAMPLE, &overrides).unwrap();
        assert_eq!(settings.credentials.user(), "alice");
        assert_eq!(settings.credentials.password(), "from-cli");
        assert!(settings.verbose);
    }

    #[test]
    fn test_profile_not_found() {
        let overrides = Overrides {
            profile: Some("missing".into()),
            ..Overrides::default()
        };
        let err = Settings::parse(SAMPLE, &overrides).unwrap_err();
        assert!(matches!(err, Error::ProfileNotFound(ref p) if p == "missing"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_no_profile_selected() {
        let err = Settings::parse("[gmail]\nhost = x\n", &overrides()).unwrap_err();
        assert!(matches!(err, Error::NoProfileSelected));
    }

    #[test]
    fn test_missing_host() {
        let text = "[general]\nprofile = p\n[p]\nuser = a\npassword = b\n";
        let err = Settings::parse(text, &overrides()).unwrap_err();
        assert!(matches!(err, Error::MissingSetting(ref k) if k == "hostname"));
    }

    #[test]
    fn test_missing_password_satisfied_by_override() {
        let text = "[general]\nprofile = p\n[p]\nhost = h\nuser = a\n";
        assert!(matches!(
            Settings::parse(text, &overrides()).unwrap_err(),
            Error::MissingSetting(ref k) if k == "password"
        ));

        let overrides = Overrides {
            password: Some("pw".into()),
            ..Overrides::default()
        };
        assert!(Settings::parse(text, &overrides).is_ok());
    }

    #[test]
    fn test_invalid_port() {
        let text = "[general]\nprofile = p\n[p]\nhost = h\nuser = a\npass = b\nport = imap\n";
        let err = Settings::parse(text, &overrides()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSetting { ref key, ref value } if key == "port" && value == "imap"
        ));
    }

    #[test]
    fn test_invalid_security() {
        let text = "[general]\nprofile = p\n[p]\nhost = h\nuser = a\npass = b\nsecurity = maybe\n";
        assert!(matches!(
            Settings::parse(text, &overrides()).unwrap_err(),
            Error::InvalidSetting { ref key, .. } if key == "security"
        ));
    }

    #[test]
    fn test_case_insensitive_names() {
        let text = "[General]\nProfile = Home\n[HOME]\nHostName = h\nUser_ID = a\nPassword = b\n";
        let settings = Settings::parse(text, &overrides()).unwrap();
        assert_eq!(settings.profile, "Home");
        assert_eq!(settings.imap.host, "h");
    }

    #[test]
    fn test_default_section_fallback() {
        let text =
            "[general]\nprofile = p\n[default]\nhost = shared\nuser = a\npassword = b\n[p]\n";
        let settings = Settings::parse(text, &overrides()).unwrap();
        assert_eq!(settings.imap.host, "shared");
    }

    #[test]
    fn test_icon_url_and_file() {
        let text = "[general]\nprofile = p\n[p]\nhost = h\nuser = a\npass = b\n\
                    icon = http://example.com/i.png\n";
        let settings = Settings::parse(text, &overrides()).unwrap();
        assert_eq!(
            settings.notifier.icon,
            Some(IconSource::Url("http://example.com/i.png".into()))
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG").unwrap();
        let text = format!(
            "[general]\nprofile = p\n[p]\nhost = h\nuser = a\npass = b\nicon = {}\n",
            file.path().display()
        );
        let settings = Settings::parse(&text, &overrides()).unwrap();
        assert_eq!(
            settings.notifier.icon,
            Some(IconSource::File(file.path().to_path_buf()))
        );
    }

    #[test]
    fn test_debug_never_shows_passwords() {
        let overrides = Overrides {
            profile: Some("work".into()),
            ..Overrides::default()
        };
        let settings = Settings::parse(SAMPLE, &overrides).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("growl\""));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let settings = Settings::load(file.path(), &overrides()).unwrap();
        assert_eq!(settings.profile, "gmail");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.ini");
        let err = Settings::load(&path, &overrides()).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(ref p) if *p == path));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = Path::new("/tmp/custom.ini");
        assert_eq!(Settings::resolve_path(Some(path)), path);
    }

    #[test]
    fn test_exclusions_match() {
        let exclusions = Exclusions {
            names: vec!["[Gmail]/All Mail".into()],
            flags: vec!["junk".into()],
        };
        assert!(exclusions.excludes("[Gmail]/All Mail", &[]));
        assert!(exclusions.excludes("Spam", &[MailboxAttribute::Junk]));
        assert!(!exclusions.excludes("INBOX", &[MailboxAttribute::HasNoChildren]));
    }
}
