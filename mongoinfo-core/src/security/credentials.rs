//! Credential container with automatic memory zeroing.

use mongodb::options::Credential;
use zeroize::{Zeroize, Zeroizing};

/// Login credentials that are zeroed from memory on drop.
///
/// # Example
///
/// ```rust
/// use mongoinfo_core::security::Credentials;
///
/// let creds = Credentials::new("admin".to_string(), Some("secret".to_string()))
///     .with_source("admin".to_string());
/// assert_eq!(creds.username(), "admin");
/// assert!(creds.has_password());
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    /// Account name, zeroized on drop
    pub username: Zeroizing<String>,
    /// Account password, zeroized on drop; `None` for passwordless mechanisms
    pub password: Zeroizing<Option<String>>,
    /// Authentication database; the driver default (`admin`) when unset
    pub source: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username())
            .field("has_password", &self.has_password())
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// Creates new credentials with automatic memory zeroing.
    pub fn new(username: String, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username),
            password: Zeroizing::new(password),
            source: None,
        }
    }

    /// Builder method to set the authentication database.
    pub fn with_source(mut self, source: String) -> Self {
        self.source = Some(source);
        self
    }

    /// Gets the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks if password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Converts into the driver's credential type.
    ///
    /// The returned value is owned by the driver's client options and is
    /// not zeroized.
    pub fn to_driver_credential(&self) -> Credential {
        let mut credential = Credential::default();
        credential.username = Some((*self.username).clone());
        credential.password = (*self.password).clone();
        credential.source = self.source.clone();
        credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = Credentials::new("testuser".to_string(), Some("testpass".to_string()));
        assert_eq!(creds.username(), "testuser");
        assert!(creds.has_password());
        assert!(creds.source.is_none());
    }

    #[test]
    fn test_credentials_no_password() {
        let creds = Credentials::new("testuser".to_string(), None);
        assert!(!creds.has_password());
    }

    #[test]
    fn test_debug_never_prints_password() {
        let creds = Credentials::new("root".to_string(), Some("hunter2".to_string()));
        let debug = format!("{:?}", creds);
        assert!(debug.contains("root"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_to_driver_credential() {
        let creds = Credentials::new("root".to_string(), Some("pw".to_string()))
            .with_source("admin".to_string());
        let credential = creds.to_driver_credential();

        assert_eq!(credential.username.as_deref(), Some("root"));
        assert_eq!(credential.password.as_deref(), Some("pw"));
        assert_eq!(credential.source.as_deref(), Some("admin"));
    }
}
