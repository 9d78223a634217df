mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    article_by_slug_key, namespaced_key, user_by_email_key, ARTICLE_BY_SLUG, USER_BY_EMAIL,
};
pub use serialization::{decode, encode};
pub use traits::Cache;
