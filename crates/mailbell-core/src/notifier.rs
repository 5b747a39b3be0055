//! Notification dispatch over GNTP.

use std::future::Future;

use mailbell_gntp::{Icon, Notification, NotificationType, Registration, Resource};
use tracing::{debug, warn};

use crate::error::Result;
use crate::message::NotificationEvent;
use crate::settings::{IconSource, Settings};

/// Notification type registered with the daemon.
pub const NOTIFICATION_NAME: &str = "New email";
/// Priority of every new-mail notification.
pub const PRIORITY: i8 = 1;

/// Sink for notifications.
pub trait Notify {
    /// Announces the application and its notification type.
    fn register(&mut self) -> impl Future<Output = Result<()>>;

    /// Shows one notification.
    fn notify(&mut self, event: &NotificationEvent) -> impl Future<Output = Result<()>>;
}

/// Sends notifications to a Growl-compatible daemon.
#[derive(Debug, Clone)]
pub struct GrowlNotifier {
    client: mailbell_gntp::Client,
    application: String,
    icon: Option<Icon>,
    sticky: bool,
    url: Option<String>,
}

impl GrowlNotifier {
    /// Creates a notifier for the profile in `settings`.
    ///
    /// An icon file that cannot be read is logged and left out.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let notifier = &settings.notifier;

        let mut config = mailbell_gntp::Config::new(notifier.host.clone(), notifier.port)
            .timeout(notifier.timeout);
        if let Some(password) = &notifier.password {
            config = config.password(password.clone());
        }

        Self {
            client: mailbell_gntp::Client::new(config),
            application: settings.profile.clone(),
            icon: notifier.icon.as_ref().and_then(load_icon),
            sticky: notifier.sticky,
            url: notifier.url.clone(),
        }
    }

    fn registration(&self) -> Registration {
        let mut kind = NotificationType::new(NOTIFICATION_NAME).display_name(NOTIFICATION_NAME);
        let mut registration = Registration::new(self.application.clone());
        if let Some(icon) = &self.icon {
            kind = kind.icon(icon.clone());
            registration = registration.icon(icon.clone());
        }
        registration.notification(kind)
    }

    fn notification(&self, event: &NotificationEvent) -> Notification {
        let mut notification =
            Notification::new(self.application.clone(), NOTIFICATION_NAME, event.title.clone())
                .text(event.body.clone())
                .sticky(self.sticky)
                .priority(PRIORITY);
        if let Some(icon) = &self.icon {
            notification = notification.icon(icon.clone());
        }
        if let Some(url) = &self.url {
            notification = notification.callback_target(url.clone());
        }
        notification
    }
}

impl Notify for GrowlNotifier {
    async fn register(&mut self) -> Result<()> {
        self.client.register(self.registration()).await?;
        debug!(application = %self.application, "registered with notification daemon");
        Ok(())
    }

    async fn notify(&mut self, event: &NotificationEvent) -> Result<()> {
        self.client.notify(self.notification(event)).await?;
        Ok(())
    }
}

fn load_icon(source: &IconSource) -> Option<Icon> {
    match source {
        IconSource::Url(url) => Some(Icon::Url(url.clone())),
        IconSource::File(path) => match std::fs::read(path) {
            Ok(data) => Some(Icon::Resource(Resource::new(data))),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read icon, sending without");
                None
            }
        },
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
    use crate::error::Error;
    use crate::settings::Overrides;
    use std::io::Write;

    fn settings(extra: &str) -> Settings {
        let text = format!(
            "[general]\nprofile = work\n[work]\nhost = h\nuser = a\npass = b\n{extra}"
        );
        Settings::parse(&text, &Overrides::default()).unwrap()
    }

    fn event() -> NotificationEvent {
        NotificationEvent {
            title: "Alice <alice@example.com>".into(),
            body: "Lunch?".into(),
        }
    }

    #[test]
    fn test_registration_without_icon() {
        let notifier = GrowlNotifier::new(&settings(""));
        let registration = notifier.registration();
        assert_eq!(registration.application, "work");
        assert_eq!(registration.icon, None);
        assert_eq!(registration.notifications.len(), 1);
        assert_eq!(registration.notifications[0].name, NOTIFICATION_NAME);
        assert!(registration.notifications[0].enabled);
    }

    #[test]
    fn test_notification_fields() {
        let notifier = GrowlNotifier::new(&settings(
            "sticky = yes\nurl = https://mail.example.com/\nicon = http://example.com/i.png\n",
        ));
        let notification = notifier.notification(&event());
        assert_eq!(notification.application, "work");
        assert_eq!(notification.name, NOTIFICATION_NAME);
        assert_eq!(notification.title, "Alice <alice@example.com>");
        assert_eq!(notification.text.as_deref(), Some("Lunch?"));
        assert_eq!(notification.priority, 1);
        assert!(notification.sticky);
        assert_eq!(
            notification.callback_target.as_deref(),
            Some("https://mail.example.com/")
        );
        assert_eq!(
            notification.icon,
            Some(Icon::Url("http://example.com/i.png".into()))
        );
    }

    #[test]
    fn test_icon_file_becomes_resource() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"icon-bytes").unwrap();
        let notifier =
            GrowlNotifier::new(&settings(&format!("icon = {}\n", file.path().display())));

        let registration = notifier.registration();
        let Some(Icon::Resource(resource)) = registration.icon else {
            panic!("expected inline icon");
        };
        assert_eq!(resource.data(), b"icon-bytes");
    }

    #[test]
    fn test_unreadable_icon_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let icon = load_icon(&IconSource::File(dir.path().join("gone.png")));
        assert_eq!(icon, None);
    }

    #[tokio::test]
    async fn test_unreachable_daemon() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut notifier = GrowlNotifier::new(&settings(&format!(
            "gntp_host = 127.0.0.1\ngntp_port = {port}\ntimeout = 5\n"
        )));
        let err = notifier.notify(&event()).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)), "{err:?}");
    }
}
