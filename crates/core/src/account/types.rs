use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account.
///
/// `password` holds the credential hash. Copies placed into a shared cache are
/// produced with [`Account::redacted`] so the hash never leaves the database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: String,
    pub image: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Returns a copy with the password scrubbed.
    pub fn redacted(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("bio", &self.bio)
            .field("image", &self.image)
            .field("disabled", &self.disabled)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for creating an account. The id and timestamps are assigned by storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: String,
    pub image: String,
}

impl NewAccount {
    /// Creates a new account input with empty profile fields.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            bio: String::new(),
            image: String::new(),
        }
    }

    /// Sets the profile bio.
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    /// Sets the profile image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("bio", &self.bio)
            .field("image", &self.image)
            .finish()
    }
}

/// Column-level patch for an account. Only `Some` fields are written.
///
/// `Some(String::new())` clears a field; `None` leaves it untouched.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl AccountPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns true when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.bio.is_none()
            && self.image.is_none()
    }
}

impl fmt::Debug for AccountPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountPatch")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("bio", &self.bio)
            .field("image", &self.image)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_account() -> Account {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        Account {
            id: 7,
            username: "u".to_string(),
            email: "u@x.com".to_string(),
            password: "hash".to_string(),
            bio: "bio".to_string(),
            image: String::new(),
            disabled: false,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_redacted_clears_only_password() {
        let account = sample_account();
        let redacted = account.redacted();

        assert_eq!(redacted.password, "");
        assert_eq!(redacted.id, account.id);
        assert_eq!(redacted.email, account.email);
        assert_eq!(redacted.bio, account.bio);
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", sample_account());
        assert!(!rendered.contains("hash"));
        assert!(rendered.contains("<redacted>"));

        let patch = AccountPatch::new().with_password("secret");
        assert!(!format!("{:?}", patch).contains("secret"));
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(AccountPatch::new().is_empty());
        assert!(!AccountPatch::new().with_bio("").is_empty());
    }

    #[test]
    fn test_new_account_builder() {
        let account = NewAccount::new("u", "u@x.com", "p")
            .with_bio("hello")
            .with_image("https://img");
        assert_eq!(account.username, "u");
        assert_eq!(account.bio, "hello");
        assert_eq!(account.image, "https://img");
    }
}
