/// Derives a URL slug from an article title.
///
/// Non-ASCII text is transliterated first, then lowercase ASCII letters and
/// digits are kept and any other run of characters becomes a single `-`.
/// Leading and trailing separators are dropped. A title with nothing to
/// transliterate (only punctuation, say) yields an empty slug.
///
/// # Examples
///
/// ```
/// use inkpress_core::article::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("  Rust -- 2024!  "), "rust-2024");
/// assert_eq!(slugify("Café au lait"), "cafe-au-lait");
/// ```
pub fn slugify(title: &str) -> String {
    ::slug::slugify(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_simple_title() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("What's new?"), "what-s-new");
    }

    #[test]
    fn test_slugify_trims_edges() {
        assert_eq!(slugify("  --Title--  "), "title");
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("Top 10 Crates of 2024"), "top-10-crates-of-2024");
    }

    #[test]
    fn test_slugify_transliterates_non_ascii() {
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("Über Straße"), "uber-strasse");

        let japan = slugify("日本");
        let china = slugify("中国");
        assert!(!japan.is_empty());
        assert_ne!(japan, china);
    }

    #[test]
    fn test_slugify_punctuation_only_is_empty() {
        assert_eq!(slugify("!!! ???"), "");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Same Title"), slugify("Same Title"));
    }
}
