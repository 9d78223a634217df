//! JSON encoding of cached values.
//!
//! Cache entries are plain JSON so they can be inspected with `redis-cli`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheError, Result};

/// Encodes a value to JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Decodes JSON bytes. A payload of the wrong shape is `InvalidValue`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| CacheError::InvalidValue(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::article::{Article, Author, Tag};
    use chrono::{TimeZone, Utc};

    fn fixed_timestamp() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_redacted_account_survives_cache() {
        let account = Account {
            id: 1,
            username: "u".to_string(),
            email: "u@x.com".to_string(),
            password: "hash".to_string(),
            bio: String::new(),
            image: String::new(),
            disabled: false,
            created_at: fixed_timestamp(),
            updated_at: fixed_timestamp(),
        };

        let bytes = encode(&account.redacted()).expect("encode should succeed");
        assert!(!String::from_utf8_lossy(&bytes).contains("hash"));

        let cached: Account = decode(&bytes).expect("decode should succeed");
        assert_eq!(cached.password, "");
        assert_eq!(cached.email, account.email);
    }

    #[test]
    fn test_article_with_tags_survives_cache() {
        let article = Article {
            id: 3,
            slug: "hello-world".to_string(),
            title: "Hello World".to_string(),
            body: "body".to_string(),
            author: Author::new(1, "u"),
            tags: vec![Tag {
                id: 9,
                name: "go".to_string(),
            }],
            created_at: fixed_timestamp(),
            updated_at: fixed_timestamp(),
            deleted_at_unix: 0,
        };

        let bytes = encode(&article).expect("encode should succeed");
        let cached: Article = decode(&bytes).expect("decode should succeed");
        assert_eq!(cached, article);
    }

    #[test]
    fn test_decode_malformed_bytes_is_invalid_value() {
        let result: Result<Article> = decode(b"not valid json");
        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
    }

    #[test]
    fn test_decode_wrong_shape_is_invalid_value() {
        let result: Result<Account> = decode(b"[1, 2, 3]");
        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
    }
}
