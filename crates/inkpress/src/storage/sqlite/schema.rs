//! SQLite schema definitions and SQL query constants.
//!
//! Pure data plus a few pure SQL builders for the statements whose shape
//! depends on the input (partial updates, filtered listings, `IN` lists).

use inkpress_core::article::ArticleCriteria;
use rusqlite::types::Value;

/// SQL statement to create all tables.
///
/// Slug uniqueness only covers active articles, so a slug can be reused once
/// its previous owner is tombstoned.
pub const CREATE_TABLES: &str = r#"
PRAGMA foreign_keys = ON;

-- Accounts table
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    bio TEXT NOT NULL DEFAULT '',
    image TEXT NOT NULL DEFAULT '',
    disabled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at_unix INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (author_id) REFERENCES accounts(id)
);

-- Tags table
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Article/tag association
CREATE TABLE IF NOT EXISTS article_tags (
    article_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (article_id, tag_id),
    FOREIGN KEY (article_id) REFERENCES articles(id),
    FOREIGN KEY (tag_id) REFERENCES tags(id)
);

-- Comments table
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    body TEXT NOT NULL,
    slug TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (author_id) REFERENCES accounts(id)
);

-- Indexes for efficient queries
CREATE UNIQUE INDEX IF NOT EXISTS idx_articles_active_slug
    ON articles(slug) WHERE deleted_at_unix = 0;
CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id);
CREATE INDEX IF NOT EXISTS idx_article_tags_tag_id ON article_tags(tag_id);
CREATE INDEX IF NOT EXISTS idx_comments_slug ON comments(slug);
"#;

// Account queries
pub const INSERT_ACCOUNT: &str = r#"
INSERT INTO accounts (username, email, password, bio, image, disabled, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const SELECT_ACCOUNT_BY_EMAIL: &str = r#"
SELECT id, username, email, password, bio, image, disabled, created_at, updated_at
FROM accounts
WHERE email = ?1
"#;

// Tag queries
pub const UPSERT_TAG: &str = r#"
INSERT INTO tags (name) VALUES (?1)
ON CONFLICT(name) DO NOTHING
"#;

pub const SELECT_TAG_BY_NAME: &str = r#"
SELECT id, name FROM tags WHERE name = ?1
"#;

pub const INSERT_ARTICLE_TAG: &str = r#"
INSERT INTO article_tags (article_id, tag_id) VALUES (?1, ?2)
"#;

pub const SELECT_TAGS_FOR_ARTICLE: &str = r#"
SELECT t.id, t.name
FROM tags t
JOIN article_tags ats ON ats.tag_id = t.id
WHERE ats.article_id = ?1
ORDER BY ats.rowid
"#;

pub const DELETE_ARTICLE_TAGS: &str = r#"
DELETE FROM article_tags WHERE article_id = ?1
"#;

// Article queries
pub const INSERT_ARTICLE: &str = r#"
INSERT INTO articles (slug, title, body, author_id, created_at, updated_at, deleted_at_unix)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
"#;

/// Article columns joined with the author projection, in `row_to_article` order.
const ARTICLE_COLUMNS: &str = "a.id, a.slug, a.title, a.body, a.created_at, a.updated_at, \
     a.deleted_at_unix, u.id, u.username, u.bio, u.image";

pub const SELECT_ARTICLE_BY_SLUG: &str = r#"
SELECT a.id, a.slug, a.title, a.body, a.created_at, a.updated_at, a.deleted_at_unix,
       u.id, u.username, u.bio, u.image
FROM articles a
JOIN accounts u ON u.id = a.author_id
WHERE a.slug = ?1 AND a.deleted_at_unix = 0
"#;

pub const COUNT_ACTIVE_ARTICLES_BY_SLUG: &str = r#"
SELECT COUNT(*) FROM articles WHERE slug = ?1 AND deleted_at_unix = 0
"#;

pub const SOFT_DELETE_ARTICLE: &str = r#"
UPDATE articles
SET deleted_at_unix = ?1, updated_at = ?2
WHERE slug = ?3 AND author_id = ?4 AND deleted_at_unix = 0
RETURNING id
"#;

// Comment queries
pub const INSERT_COMMENT: &str = r#"
INSERT INTO comments (body, slug, author_id, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_COMMENT_BY_ID: &str = r#"
SELECT c.id, c.body, c.slug, c.created_at, c.updated_at, c.deleted_at,
       u.id, u.username, u.bio, u.image
FROM comments c
JOIN accounts u ON u.id = c.author_id
WHERE c.id = ?1
"#;

pub const SELECT_COMMENTS_BY_SLUG: &str = r#"
SELECT c.id, c.body, c.slug, c.created_at, c.updated_at, c.deleted_at,
       u.id, u.username, u.bio, u.image
FROM comments c
JOIN accounts u ON u.id = c.author_id
WHERE c.slug = ?1 AND c.deleted_at IS NULL
ORDER BY c.id DESC
"#;

pub const SOFT_DELETE_COMMENT: &str = r#"
UPDATE comments
SET deleted_at = ?1
WHERE id = ?2 AND slug = ?3 AND author_id = ?4 AND deleted_at IS NULL
"#;

pub const SOFT_DELETE_COMMENTS: &str = r#"
UPDATE comments
SET deleted_at = ?1
WHERE slug = ?2 AND author_id = ?3 AND deleted_at IS NULL
"#;

/// Builds `UPDATE accounts SET ... WHERE email = ?N` for the given columns.
///
/// `updated_at` is always written and comes right after the patched columns;
/// the email is the last parameter.
pub fn update_account_sql(columns: &[&str]) -> String {
    let mut sets: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ?{}", column, i + 1))
        .collect();
    sets.push(format!("updated_at = ?{}", columns.len() + 1));

    format!(
        "UPDATE accounts SET {} WHERE email = ?{}",
        sets.join(", "),
        columns.len() + 2
    )
}

/// Comma-separated `?` placeholders for an `IN (...)` list.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `FROM ... WHERE ...` shared by the count and id phases of an article listing.
///
/// Joins are only added for the filters in use.
pub fn article_filter(criteria: &ArticleCriteria) -> (String, Vec<Value>) {
    let mut sql = String::from("FROM articles a");
    let mut conditions = vec!["a.deleted_at_unix = 0".to_string()];
    let mut params = Vec::new();

    if !criteria.tags.is_empty() {
        sql.push_str(
            " JOIN article_tags ats ON ats.article_id = a.id JOIN tags t ON t.id = ats.tag_id",
        );
        conditions.push(format!("t.name IN ({})", placeholders(criteria.tags.len())));
        params.extend(criteria.tags.iter().cloned().map(Value::Text));
    }

    if let Some(author) = &criteria.author {
        sql.push_str(" JOIN accounts au ON au.id = a.author_id");
        conditions.push("au.username = ?".to_string());
        params.push(Value::Text(author.clone()));
    }

    sql.push_str(" WHERE ");
    sql.push_str(&conditions.join(" AND "));
    (sql, params)
}

/// Phase one of a listing: total distinct matches.
pub fn count_articles_sql(filter: &str) -> String {
    format!("SELECT COUNT(DISTINCT a.id) {}", filter)
}

/// Phase one of a listing: the page of ids, newest first.
pub fn select_article_ids_sql(filter: &str) -> String {
    format!(
        "SELECT DISTINCT a.id {} ORDER BY a.id DESC LIMIT ? OFFSET ?",
        filter
    )
}

/// Phase two of a listing: full rows for a page of ids.
pub fn select_articles_by_ids_sql(count: usize) -> String {
    format!(
        "SELECT {} FROM articles a JOIN accounts u ON u.id = a.author_id \
         WHERE a.id IN ({}) ORDER BY a.id DESC",
        ARTICLE_COLUMNS,
        placeholders(count)
    )
}

/// Tags for a batch of article ids, in association order.
pub fn select_tags_by_article_ids_sql(count: usize) -> String {
    format!(
        "SELECT ats.article_id, t.id, t.name FROM article_tags ats \
         JOIN tags t ON t.id = ats.tag_id \
         WHERE ats.article_id IN ({}) ORDER BY ats.rowid",
        placeholders(count)
    )
}
