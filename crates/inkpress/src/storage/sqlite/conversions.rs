//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.

use chrono::{DateTime, Utc};
use inkpress_core::account::Account;
use inkpress_core::article::{Article, Author, Comment, Tag};
use rusqlite::Row;

/// Convert a SQLite row to an Account.
///
/// Expected columns: id, username, email, password, bio, image, disabled,
/// created_at, updated_at
pub fn row_to_account(row: &Row) -> rusqlite::Result<Account> {
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        bio: row.get(4)?,
        image: row.get(5)?,
        disabled: row.get(6)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Reads the author projection starting at column `start`.
///
/// Expected columns: id, username, bio, image
fn row_to_author(row: &Row, start: usize) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(start)?,
        username: row.get(start + 1)?,
        bio: row.get(start + 2)?,
        image: row.get(start + 3)?,
    })
}

/// Convert an article row joined with its author. Tags are loaded separately.
///
/// Expected columns: id, slug, title, body, created_at, updated_at,
/// deleted_at_unix, author id, username, bio, image
pub fn row_to_article(row: &Row) -> rusqlite::Result<Article> {
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(Article {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        author: row_to_author(row, 7)?,
        tags: Vec::new(),
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        deleted_at_unix: row.get(6)?,
    })
}

/// Expected columns: id, name
pub fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Convert a tag row tagged with its article id (batched tag loading).
///
/// Expected columns: article_id, id, name
pub fn row_to_article_tag(row: &Row) -> rusqlite::Result<(i64, Tag)> {
    Ok((
        row.get(0)?,
        Tag {
            id: row.get(1)?,
            name: row.get(2)?,
        },
    ))
}

/// Convert a comment row joined with its author.
///
/// Expected columns: id, body, slug, created_at, updated_at, deleted_at,
/// author id, username, bio, image
pub fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;

    Ok(Comment {
        id: row.get(0)?,
        body: row.get(1)?,
        slug: row.get(2)?,
        author: row_to_author(row, 6)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}

/// Parse DateTime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Format a DateTime for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rusqlite::Connection;

    #[test]
    fn test_format_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        assert_eq!(format_datetime(&dt), "2024-06-15T10:30:00+00:00");
    }

    #[test]
    fn test_parse_datetime_valid() {
        let dt = parse_datetime("2024-06-15T10:30:00+00:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_row_to_article_reads_author_projection() {
        let conn = Connection::open_in_memory().unwrap();
        let article = conn
            .query_row(
                "SELECT 3, 'hello-world', 'Hello World', 'body', \
                 '2024-06-15T10:30:00+00:00', '2024-06-15T10:30:00+00:00', 0, \
                 1, 'u', 'bio', 'img'",
                [],
                row_to_article,
            )
            .unwrap();

        assert_eq!(article.id, 3);
        assert_eq!(article.slug, "hello-world");
        assert_eq!(article.author.username, "u");
        assert_eq!(article.author.image, "img");
        assert!(article.tags.is_empty());
        assert!(article.is_active());
    }

    #[test]
    fn test_row_to_comment_with_null_deleted_at() {
        let conn = Connection::open_in_memory().unwrap();
        let comment = conn
            .query_row(
                "SELECT 5, 'nice', 'hello-world', \
                 '2024-06-15T10:30:00+00:00', '2024-06-15T10:30:00+00:00', NULL, \
                 2, 'v', '', ''",
                [],
                row_to_comment,
            )
            .unwrap();

        assert_eq!(comment.id, 5);
        assert_eq!(comment.author.id, 2);
        assert!(comment.deleted_at.is_none());
    }

    #[test]
    fn test_row_to_account_rejects_bad_timestamp() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.query_row(
            "SELECT 1, 'u', 'u@x.com', 'p', '', '', 0, 'bad', 'bad'",
            [],
            row_to_account,
        );

        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(..))
        ));
    }
}
