//! Master key request signing.
//!
//! Every request carries an `authorization` header derived from the verb,
//! resource type, resource link and `x-ms-date` of that request, signed with
//! HMAC-SHA256 under the account key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CosmosError;

type HmacSha256 = Hmac<Sha256>;

/// Resource types that appear in signed payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Database,
    Container,
    Document,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Database => "dbs",
            ResourceType::Container => "colls",
            ResourceType::Document => "docs",
        }
    }
}

/// Decoded account master key.
#[derive(Clone)]
pub struct MasterKeyCredential {
    mac: HmacSha256,
}

impl std::fmt::Debug for MasterKeyCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyCredential")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl MasterKeyCredential {
    /// Decode a base64 master key as shown in the account's key blade.
    pub fn from_base64(key: &str) -> Result<Self, CosmosError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CosmosError::InvalidKey("key is empty".to_string()));
        }
        let key = STANDARD
            .decode(key)
            .map_err(|e| CosmosError::InvalidKey(e.to_string()))?;
        let mac =
            HmacSha256::new_from_slice(&key).map_err(|e| CosmosError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Base64 signature over the canonical payload.
    pub fn sign(
        &self,
        verb: &str,
        resource_type: ResourceType,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.as_str(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Value for the `authorization` header, url-encoded.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: ResourceType,
        resource_link: &str,
        date: &str,
    ) -> String {
        let signature = self.sign(verb, resource_type, resource_link, date);
        let token = format!("type=master&ver=1.0&sig={signature}");
        url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
    }
}

/// `x-ms-date` header value (RFC 1123, always GMT).
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const KEY: &str = "dGVzdC1tYXN0ZXIta2V5LTAxMjM0NTY3ODlhYmNkZWY=";

    #[test]
    fn test_http_date() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(http_date(now), "Wed, 01 Jan 2025 00:00:00 GMT");
    }

    #[test]
    fn test_signature() {
        let credential = MasterKeyCredential::from_base64(KEY).unwrap();
        let signature = credential.sign(
            "POST",
            ResourceType::Document,
            "dbs/sessions-db/colls/sessions",
            "Wed, 01 Jan 2025 00:00:00 GMT",
        );
        assert_eq!(signature, "GilalXkcabh4nGbV7AAKQMk2aI/hmT66aFdWyZAkVFs=");
    }

    #[test]
    fn test_authorization_is_url_encoded() {
        let credential = MasterKeyCredential::from_base64(KEY).unwrap();
        let token = credential.authorization(
            "POST",
            ResourceType::Document,
            "dbs/sessions-db/colls/sessions",
            "Wed, 01 Jan 2025 00:00:00 GMT",
        );
        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3DGilalXkcabh4nGbV7AAKQMk2aI%2FhmT66aFdWyZAkVFs%3D"
        );
    }

    #[test]
    fn test_invalid_key() {
        assert!(matches!(
            MasterKeyCredential::from_base64(""),
            Err(CosmosError::InvalidKey(_))
        ));
        assert!(matches!(
            MasterKeyCredential::from_base64("not base64!"),
            Err(CosmosError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let credential = MasterKeyCredential::from_base64(KEY).unwrap();
        assert!(!format!("{credential:?}").contains(KEY));
    }
}
