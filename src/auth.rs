//! Authorization header derivation.
//!
//! An [`Auth`] descriptor is consumed once, when the client is built, and
//! yields at most one header entry. Missing credentials are skipped silently.

use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;

/// The header an [`Auth`] descriptor writes to unless told otherwise.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Describes how requests are authorized.
///
/// # Examples
///
/// ```
/// use fetchwrap::Auth;
///
/// let auth = Auth::basic("aladdin", "opensesame");
/// assert_eq!(
///     auth.header_entry(None),
///     Some(("Authorization".to_string(), "Basic YWxhZGRpbjpvcGVuc2VzYW1l".to_string()))
/// );
///
/// // A bearer descriptor with nothing to resolve produces no header at all.
/// assert_eq!(Auth::bearer_from_key("token").header_entry(None), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    /// `Bearer {token}`.
    Bearer {
        /// The token itself. Takes precedence over `key`.
        #[serde(default)]
        token: Option<String>,
        /// Header name override.
        #[serde(default)]
        header: Option<String>,
        /// Key to look the token up under in a [`CredentialStore`].
        #[serde(default)]
        key: Option<String>,
    },
    /// `Basic base64(login:password)`.
    Basic {
        login: String,
        password: String,
        /// Header name override.
        #[serde(default)]
        header: Option<String>,
    },
}

impl Auth {
    /// Bearer auth with an explicit token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Auth::Bearer {
            token: Some(token.into()),
            header: None,
            key: None,
        }
    }

    /// Bearer auth whose token is read from a [`CredentialStore`].
    pub fn bearer_from_key(key: impl Into<String>) -> Self {
        Auth::Bearer {
            token: None,
            header: None,
            key: Some(key.into()),
        }
    }

    /// Basic auth.
    pub fn basic(login: impl Into<String>, password: impl Into<String>) -> Self {
        Auth::Basic {
            login: login.into(),
            password: password.into(),
            header: None,
        }
    }

    /// Overrides the header name.
    pub fn with_header(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            Auth::Bearer { header, .. } | Auth::Basic { header, .. } => {
                *header = Some(name.into());
            }
        }
        self
    }

    /// Returns the header name this descriptor writes to.
    pub fn header_name(&self) -> &str {
        match self {
            Auth::Bearer { header, .. } | Auth::Basic { header, .. } => {
                header.as_deref().unwrap_or(DEFAULT_AUTH_HEADER)
            }
        }
    }

    /// Derives the header entry, if any.
    ///
    /// Bearer tokens resolve from `token`, then from `key` through `store`.
    /// Empty tokens, logins or passwords produce nothing.
    pub fn header_entry(&self, store: Option<&dyn CredentialStore>) -> Option<(String, String)> {
        let value = match self {
            Auth::Bearer { token, key, .. } => {
                let token = token
                    .clone()
                    .filter(|t| !t.is_empty())
                    .or_else(|| key.as_deref().and_then(|k| store?.get(k)))
                    .filter(|t| !t.is_empty())?;
                format!("Bearer {}", token)
            }
            Auth::Basic {
                login, password, ..
            } => {
                if login.is_empty() || password.is_empty() {
                    return None;
                }
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", login, password));
                format!("Basic {}", encoded)
            }
        };

        Some((self.header_name().to_string(), value))
    }
}

/// Key-value lookup for stored credentials.
///
/// Consulted only for bearer auth without an explicit token.
pub trait CredentialStore: Send + Sync {
    /// Returns the credential stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
}

impl CredentialStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl<F> CredentialStore for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_with_token() {
        let entry = Auth::bearer("abc").header_entry(None);
        assert_eq!(
            entry,
            Some(("Authorization".to_string(), "Bearer abc".to_string()))
        );
    }

    #[test]
    fn bearer_token_wins_over_key() {
        let store: HashMap<String, String> =
            HashMap::from([("session".to_string(), "from-store".to_string())]);
        let auth = Auth::Bearer {
            token: Some("explicit".to_string()),
            header: None,
            key: Some("session".to_string()),
        };

        let (_, value) = auth.header_entry(Some(&store)).unwrap();
        assert_eq!(value, "Bearer explicit");
    }

    #[test]
    fn bearer_resolves_key_through_store() {
        let store = |key: &str| (key == "session").then(|| "stored".to_string());
        let auth = Auth::bearer_from_key("session").with_header("X-Auth");

        assert_eq!(
            auth.header_entry(Some(&store)),
            Some(("X-Auth".to_string(), "Bearer stored".to_string()))
        );
    }

    #[test]
    fn bearer_without_resolvable_token_is_skipped() {
        let store: HashMap<String, String> = HashMap::new();
        assert_eq!(Auth::bearer_from_key("missing").header_entry(Some(&store)), None);
        assert_eq!(Auth::bearer("").header_entry(None), None);
    }

    #[test]
    fn basic_requires_login_and_password() {
        assert_eq!(Auth::basic("", "secret").header_entry(None), None);
        assert_eq!(Auth::basic("user", "").header_entry(None), None);

        let (name, value) = Auth::basic("user", "pass").header_entry(None).unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn deserializes_tagged() {
        let auth: Auth =
            serde_json::from_str(r#"{"type": "bearer", "key": "token", "header": "X-Token"}"#)
                .unwrap();
        assert_eq!(auth.header_name(), "X-Token");
        assert!(matches!(auth, Auth::Bearer { token: None, .. }));
    }
}
