/// Cache domain for accounts looked up by email.
pub const USER_BY_EMAIL: &str = "user-by-email";

/// Cache domain for articles looked up by slug.
pub const ARTICLE_BY_SLUG: &str = "article-by-slug";

/// Returns the cache key for an account.
pub fn user_by_email_key(email: &str) -> String {
    format!("{}.{}", USER_BY_EMAIL, email)
}

/// Returns the cache key for an article.
pub fn article_by_slug_key(slug: &str) -> String {
    format!("{}.{}", ARTICLE_BY_SLUG, slug)
}

/// Applies the global key prefix.
///
/// # Examples
///
/// ```
/// use inkpress_core::cache::{article_by_slug_key, namespaced_key};
///
/// let key = namespaced_key("article-", &article_by_slug_key("hello-world"));
/// assert_eq!(key, "article-article-by-slug.hello-world");
/// ```
pub fn namespaced_key(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_by_email_key() {
        assert_eq!(user_by_email_key("u@x.com"), "user-by-email.u@x.com");
    }

    #[test]
    fn test_article_by_slug_key() {
        assert_eq!(
            article_by_slug_key("hello-world"),
            "article-by-slug.hello-world"
        );
    }

    #[test]
    fn test_namespaced_key_with_empty_prefix() {
        assert_eq!(namespaced_key("", "user-by-email.a"), "user-by-email.a");
    }

    #[test]
    fn test_domains_do_not_collide() {
        assert_ne!(user_by_email_key("x"), article_by_slug_key("x"));
    }
}
