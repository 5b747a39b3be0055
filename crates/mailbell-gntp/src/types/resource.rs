//! Binary resources and icons.

use super::hex_lower;
use sha2::{Digest, Sha256};
use std::fmt;

/// Binary data sent after the headers and referenced by identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct Resource {
    id: String,
    data: Vec<u8>,
}

impl Resource {
    /// Wraps `data`; the identifier is the hex SHA-256 of the bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        let id = hex_lower(&Sha256::digest(&data));
        Self { id, data }
    }

    /// Returns the resource identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the header value pointing at this resource.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("x-growl-resource://{}", self.id)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Application or notification icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// Fetched by the daemon from a URL.
    Url(String),
    /// Sent inline as a binary resource.
    Resource(Resource),
}

impl Icon {
    /// Value to put in an `*-Icon` header.
    #[must_use]
    pub fn header_value(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Resource(resource) => resource.uri(),
        }
    }

    /// Returns the inline resource, if any.
    #[must_use]
    pub const fn resource(&self) -> Option<&Resource> {
        match self {
            Self::Url(_) => None,
            Self::Resource(resource) => Some(resource),
        }
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

    #[test]
    fn test_resource_id_is_sha256() {
        let resource = Resource::new(b"icon-bytes".to_vec());
        assert_eq!(
            resource.id(),
            "6cbd50037e50937c7aa9ad4a2de7770c8f5db9455c1be9e021bc236060dafa21"
        );
        assert_eq!(
            resource.uri(),
            "x-growl-resource://6cbd50037e50937c7aa9ad4a2de7770c8f5db9455c1be9e021bc236060dafa21"
        );
    }

    #[test]
    fn test_icon_header_value() {
        let url = Icon::Url("http://example.com/mail.png".into());
        assert_eq!(url.header_value(), "http://example.com/mail.png");
        assert!(url.resource().is_none());

        let inline = Icon::Resource(Resource::new(vec![1, 2, 3]));
        assert!(inline.header_value().starts_with("x-growl-resource://"));
        assert_eq!(inline.resource().unwrap().data(), &[1, 2, 3]);
    }

    #[test]
    fn test_resource_debug_hides_bytes() {
        let resource = Resource::new(vec![0; 4096]);
        let debug = format!("{resource:?}");
        assert!(debug.contains("len: 4096"));
        assert!(debug.len() < 200);
    }
}
