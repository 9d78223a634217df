use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slugify;

/// Default page size for article listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Public projection of an account, embedded into articles and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub bio: String,
    pub image: String,
}

impl Author {
    /// Creates an author reference with empty profile fields.
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            bio: String::new(),
            image: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A published article.
///
/// `deleted_at_unix` is the tombstone: `0` while active, the unix timestamp of
/// the soft delete afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author: Author,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at_unix: i64,
}

impl Article {
    pub fn is_active(&self) -> bool {
        self.deleted_at_unix == 0
    }

    /// Tag names in association order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Input for creating an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub body: String,
    pub author_id: i64,
    pub tags: Vec<String>,
}

impl NewArticle {
    /// Creates an article input; the slug is derived from the title.
    pub fn new(title: impl Into<String>, body: impl Into<String>, author_id: i64) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            body: body.into(),
            author_id,
            tags: Vec::new(),
        }
    }

    /// Sets the tag names. Duplicates are dropped, first occurrence wins.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if !names.contains(&tag) {
                names.push(tag);
            }
        }
        self.tags = names;
        self
    }

    /// Overrides the derived slug (useful for testing).
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }
}

/// A comment on an article, referenced by the article's slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub slug: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub body: String,
    pub author_id: i64,
}

impl NewComment {
    pub fn new(body: impl Into<String>, author_id: i64) -> Self {
        Self {
            body: body.into(),
            author_id,
        }
    }
}

/// Filter and pagination window for article listings.
///
/// Tag filters match articles carrying any of the given tags. The author
/// filter matches on username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleCriteria {
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub offset: u32,
    pub limit: u32,
}

impl Default for ArticleCriteria {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            author: None,
            offset: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ArticleCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}
