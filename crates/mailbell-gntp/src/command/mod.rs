//! GNTP request builders.
//!
//! A request is an information line, a block of headers terminated by an
//! empty line, optional per-notification-type blocks (`REGISTER` only),
//! and binary resource blocks:
//!
//! ```text
//! GNTP/1.0 NOTIFY NONE
//! Application-Name: mailbell
//! Notification-Name: New email
//! Notification-Title: Alice
//!
//! ```

use crate::types::{Icon, KeyHash, Resource};

/// Protocol version sent on every information line.
pub const VERSION: &str = "GNTP/1.0";

/// A notification type declared at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationType {
    /// Name used in `NOTIFY` requests.
    pub name: String,
    /// Name shown in the daemon's settings.
    pub display_name: Option<String>,
    /// Whether the type is enabled by default.
    pub enabled: bool,
    /// Default icon for this type.
    pub icon: Option<Icon>,
}

impl NotificationType {
    /// Creates an enabled notification type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            enabled: true,
            icon: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the default icon.
    #[must_use]
    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }
}

/// `REGISTER` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Application name.
    pub application: String,
    /// Application icon.
    pub icon: Option<Icon>,
    /// Declared notification types.
    pub notifications: Vec<NotificationType>,
}

impl Registration {
    /// Creates a registration with no notification types.
    #[must_use]
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            icon: None,
            notifications: Vec::new(),
        }
    }

    /// Sets the application icon.
    #[must_use]
    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Declares a notification type.
    #[must_use]
    pub fn notification(mut self, notification: NotificationType) -> Self {
        self.notifications.push(notification);
        self
    }
}

/// `NOTIFY` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Registered application name.
    pub application: String,
    /// Registered notification type.
    pub name: String,
    /// Title line.
    pub title: String,
    /// Body text.
    pub text: Option<String>,
    /// Keep on screen until dismissed.
    pub sticky: bool,
    /// Priority between -2 and 2.
    pub priority: i8,
    /// Icon for this notification.
    pub icon: Option<Icon>,
    /// URL the daemon opens when the notification is clicked.
    pub callback_target: Option<String>,
}

impl Notification {
    /// Creates a notification with normal priority.
    #[must_use]
    pub fn new(
        application: impl Into<String>,
        name: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            name: name.into(),
            title: title.into(),
            text: None,
            sticky: false,
            priority: 0,
            icon: None,
            callback_target: None,
        }
    }

    /// Sets the body text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the sticky flag.
    #[must_use]
    pub const fn sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Sets the priority, clamped to -2..=2.
    #[must_use]
    pub fn priority(mut self, priority: i8) -> Self {
        self.priority = priority.clamp(-2, 2);
        self
    }

    /// Sets the icon.
    #[must_use]
    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Sets the callback target URL.
    #[must_use]
    pub fn callback_target(mut self, url: impl Into<String>) -> Self {
        self.callback_target = Some(url.into());
        self
    }
}

/// A GNTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Declare the application and its notification types.
    Register(Registration),
    /// Show one notification.
    Notify(Notification),
}

impl Request {
    /// Message type on the information line.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Register(_) => "REGISTER",
            Self::Notify(_) => "NOTIFY",
        }
    }

    /// Serializes the request to wire format.
    ///
    /// With a key hash, the information line carries it and the message is
    /// sent unencrypted (`NONE`).
    #[must_use]
    pub fn serialize(&self, key: Option<&KeyHash>) -> Vec<u8> {
        let mut writer = Writer::default();

        let info = key.map_or_else(
            || format!("{VERSION} {} NONE", self.message_type()),
            |key| format!("{VERSION} {} NONE {key}", self.message_type()),
        );
        writer.line(&info);

        match self {
            Self::Register(registration) => {
                writer.header("Application-Name", &registration.application);
                writer.icon("Application-Icon", registration.icon.as_ref());
                writer.header(
                    "Notifications-Count",
                    &registration.notifications.len().to_string(),
                );
                writer.line("");

                for notification in &registration.notifications {
                    writer.header("Notification-Name", &notification.name);
                    if let Some(display_name) = &notification.display_name {
                        writer.header("Notification-Display-Name", display_name);
                    }
                    writer.header("Notification-Enabled", bool_value(notification.enabled));
                    writer.icon("Notification-Icon", notification.icon.as_ref());
                    writer.line("");
                }
            }
            Self::Notify(notification) => {
                writer.header("Application-Name", &notification.application);
                writer.header("Notification-Name", &notification.name);
                writer.header("Notification-Title", &notification.title);
                if let Some(text) = &notification.text {
                    writer.header("Notification-Text", text);
                }
                writer.header("Notification-Sticky", bool_value(notification.sticky));
                writer.header("Notification-Priority", &notification.priority.to_string());
                writer.icon("Notification-Icon", notification.icon.as_ref());
                if let Some(url) = &notification.callback_target {
                    writer.header("Notification-Callback-Target", url);
                }
                writer.line("");
            }
        }

        writer.finish()
    }
}

const fn bool_value(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
    resources: Vec<Resource>,
}

impl Writer {
    fn line(&mut self, line: &str) {
        self.buf.extend_from_slice(line.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }

    /// Writes `name: value` with line breaks in the value flattened to spaces.
    fn header(&mut self, name: &str, value: &str) {
        let value: String = value
            .chars()
            .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
            .collect();
        self.line(&format!("{name}: {value}"));
    }

    fn icon(&mut self, name: &str, icon: Option<&Icon>) {
        let Some(icon) = icon else { return };
        self.header(name, &icon.header_value());
        if let Some(resource) = icon.resource()
            && !self.resources.iter().any(|r| r.id() == resource.id())
        {
            self.resources.push(resource.clone());
        }
    }

    fn finish(mut self) -> Vec<u8> {
        for resource in std::mem::take(&mut self.resources) {
            self.header("Identifier", resource.id());
            self.header("Length", &resource.data().len().to_string());
            self.line("");
            self.buf.extend_from_slice(resource.data());
            self.line("");
            self.line("");
        }
        self.buf
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

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_register_with_url_icon() {
        let request = Request::Register(
            Registration::new("work")
                .icon(Icon::Url("http://example.com/mail.png".into()))
                .notification(NotificationType::new("New email").display_name("New email")),
        );
        assert_eq!(
            text(&request.serialize(None)),
            "GNTP/1.0 REGISTER NONE\r\n\
             Application-Name: work\r\n\
             Application-Icon: http://example.com/mail.png\r\n\
             Notifications-Count: 1\r\n\
             \r\n\
             Notification-Name: New email\r\n\
             Notification-Display-Name: New email\r\n\
             Notification-Enabled: True\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_register_with_binary_icon() {
        let icon = Icon::Resource(Resource::new(b"icon-bytes".to_vec()));
        let request = Request::Register(
            Registration::new("work")
                .icon(icon.clone())
                .notification(NotificationType::new("New email").icon(icon)),
        );
        let id = "6cbd50037e50937c7aa9ad4a2de7770c8f5db9455c1be9e021bc236060dafa21";
        assert_eq!(
            text(&request.serialize(None)),
            format!(
                "GNTP/1.0 REGISTER NONE\r\n\
                 Application-Name: work\r\n\
                 Application-Icon: x-growl-resource://{id}\r\n\
                 Notifications-Count: 1\r\n\
                 \r\n\
                 Notification-Name: New email\r\n\
                 Notification-Enabled: True\r\n\
                 Notification-Icon: x-growl-resource://{id}\r\n\
                 \r\n\
                 Identifier: {id}\r\n\
                 Length: 10\r\n\
                 \r\n\
                 icon-bytes\r\n\
                 \r\n"
            )
        );
    }

    #[test]
    fn test_notify() {
        let request = Request::Notify(
            Notification::new("work", "New email", "Alice <alice@example.com>")
                .text("Lunch?")
                .sticky(true)
                .priority(1)
                .callback_target("https://mail.example.com/"),
        );
        assert_eq!(
            text(&request.serialize(None)),
            "GNTP/1.0 NOTIFY NONE\r\n\
             Application-Name: work\r\n\
             Notification-Name: New email\r\n\
             Notification-Title: Alice <alice@example.com>\r\n\
             Notification-Text: Lunch?\r\n\
             Notification-Sticky: True\r\n\
             Notification-Priority: 1\r\n\
             Notification-Callback-Target: https://mail.example.com/\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_notify_flattens_line_breaks() {
        let request = Request::Notify(
            Notification::new("work", "New email", "Mallory")
                .text("hi\r\nNotification-Sticky: True"),
        );
        let wire = text(&request.serialize(None));
        assert!(wire.contains("Notification-Text: hi  Notification-Sticky: True\r\n"));
        assert!(wire.contains("Notification-Sticky: False\r\n"));
    }

    #[test]
    fn test_info_line_with_key_hash() {
        let salt: Vec<u8> = (0u8..16).collect();
        let key = KeyHash::with_salt("secret", &salt);
        let request = Request::Notify(Notification::new("work", "New email", "x"));
        let wire = text(&request.serialize(Some(&key)));
        assert!(wire.starts_with(concat!(
            "GNTP/1.0 NOTIFY NONE ",
            "SHA256:DD78B72BBCE584A1301F4AA906E8746FF4757F43F6D3A63807D69B92FE577DC3",
            ".000102030405060708090A0B0C0D0E0F\r\n",
        )));
    }

    #[test]
    fn test_priority_is_clamped() {
        assert_eq!(Notification::new("a", "b", "c").priority(9).priority, 2);
        assert_eq!(Notification::new("a", "b", "c").priority(-9).priority, -2);
    }
}
