use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};

use inkpress_core::account::{Account, AccountPatch, NewAccount};
use inkpress_core::article::{Article, ArticleCriteria, Comment, NewArticle, NewComment, Tag};
use inkpress_core::storage::{
    AccountTx, ArticleRepository, ArticleTx, RepositoryError, Result, TxWork,
};

use super::account::{insert_account, select_account_by_email, update_account};
use super::conversions::{
    format_datetime, row_to_article, row_to_article_tag, row_to_comment, row_to_tag,
};
use super::error::for_entity;
use super::schema;
use super::SqliteRepository;

const ARTICLE: &str = "Article";
const COMMENT: &str = "Comment";
const TAG: &str = "Tag";

/// Finds a tag by name, creating it first if needed.
fn upsert_tag(conn: &Connection, name: &str) -> Result<Tag> {
    conn.execute(schema::UPSERT_TAG, [name])
        .map_err(for_entity(TAG, name))?;
    conn.query_row(schema::SELECT_TAG_BY_NAME, [name], row_to_tag)
        .map_err(for_entity(TAG, name))
}

fn select_tags(conn: &Connection, article_id: i64) -> Result<Vec<Tag>> {
    let id = article_id.to_string();
    let mut stmt = conn
        .prepare(schema::SELECT_TAGS_FOR_ARTICLE)
        .map_err(for_entity(TAG, &id))?;
    let rows = stmt
        .query_map([article_id], row_to_tag)
        .map_err(for_entity(TAG, &id))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(for_entity(TAG, &id))
}

/// Upserts tags, inserts the article and its associations, then reads it back.
///
/// Callers are responsible for running this inside a transaction.
pub(super) fn insert_article(conn: &Connection, article: &NewArticle) -> Result<Article> {
    if article.slug.is_empty() {
        return Err(RepositoryError::InvalidData(format!(
            "title {:?} yields an empty slug",
            article.title
        )));
    }

    let tags = article
        .tags
        .iter()
        .map(|name| upsert_tag(conn, name))
        .collect::<Result<Vec<_>>>()?;

    let now = format_datetime(&Utc::now());
    conn.execute(
        schema::INSERT_ARTICLE,
        params![
            article.slug,
            article.title,
            article.body,
            article.author_id,
            now,
            now
        ],
    )
    .map_err(for_entity(ARTICLE, &article.slug))?;
    let article_id = conn.last_insert_rowid();

    for tag in &tags {
        conn.execute(schema::INSERT_ARTICLE_TAG, params![article_id, tag.id])
            .map_err(for_entity(TAG, &tag.name))?;
    }

    select_article_by_slug(conn, &article.slug)
}

pub(super) fn select_article_by_slug(conn: &Connection, slug: &str) -> Result<Article> {
    let mut article = conn
        .query_row(schema::SELECT_ARTICLE_BY_SLUG, [slug], row_to_article)
        .map_err(for_entity(ARTICLE, slug))?;
    article.tags = select_tags(conn, article.id)?;
    Ok(article)
}

/// Two-phase listing: distinct ids under the filter, then full rows and tags.
pub(super) fn select_articles(
    conn: &Connection,
    criteria: &ArticleCriteria,
    tag_batch_size: usize,
) -> Result<(Vec<Article>, u64)> {
    let list_err = for_entity(ARTICLE, "list");
    let (filter, filter_params) = schema::article_filter(criteria);

    let total: i64 = conn
        .query_row(
            &schema::count_articles_sql(&filter),
            params_from_iter(filter_params.iter()),
            |row| row.get(0),
        )
        .map_err(&list_err)?;

    let mut id_params = filter_params;
    id_params.push(Value::Integer(i64::from(criteria.limit)));
    id_params.push(Value::Integer(i64::from(criteria.offset)));

    let ids: Vec<i64> = {
        let mut stmt = conn
            .prepare(&schema::select_article_ids_sql(&filter))
            .map_err(&list_err)?;
        let rows = stmt
            .query_map(params_from_iter(id_params.iter()), |row| row.get(0))
            .map_err(&list_err)?;
        rows.collect::<rusqlite::Result<_>>().map_err(&list_err)?
    };

    if ids.is_empty() {
        return Ok((Vec::new(), total as u64));
    }

    let mut articles: Vec<Article> = {
        let mut stmt = conn
            .prepare(&schema::select_articles_by_ids_sql(ids.len()))
            .map_err(&list_err)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), row_to_article)
            .map_err(&list_err)?;
        rows.collect::<rusqlite::Result<_>>().map_err(&list_err)?
    };

    let positions: HashMap<i64, usize> = articles
        .iter()
        .enumerate()
        .map(|(index, article)| (article.id, index))
        .collect();

    for batch in ids.chunks(tag_batch_size) {
        let mut stmt = conn
            .prepare(&schema::select_tags_by_article_ids_sql(batch.len()))
            .map_err(&list_err)?;
        let rows = stmt
            .query_map(params_from_iter(batch.iter()), row_to_article_tag)
            .map_err(&list_err)?;

        for row in rows {
            let (article_id, tag) = row.map_err(&list_err)?;
            if let Some(&index) = positions.get(&article_id) {
                articles[index].tags.push(tag);
            }
        }
    }

    Ok((articles, total as u64))
}

/// Tombstones the author's active article and drops its tag associations.
pub(super) fn soft_delete_article(conn: &Connection, author_id: i64, slug: &str) -> Result<()> {
    let now = Utc::now();

    let article_id: i64 = conn
        .query_row(
            schema::SOFT_DELETE_ARTICLE,
            params![now.timestamp(), format_datetime(&now), slug, author_id],
            |row| row.get(0),
        )
        .map_err(for_entity(ARTICLE, slug))?;

    conn.execute(schema::DELETE_ARTICLE_TAGS, [article_id])
        .map_err(for_entity(ARTICLE, slug))?;
    Ok(())
}

pub(super) fn insert_comment(conn: &Connection, slug: &str, comment: &NewComment) -> Result<Comment> {
    let active: i64 = conn
        .query_row(schema::COUNT_ACTIVE_ARTICLES_BY_SLUG, [slug], |row| row.get(0))
        .map_err(for_entity(ARTICLE, slug))?;
    if active == 0 {
        return Err(RepositoryError::not_found(ARTICLE, slug));
    }

    let now = format_datetime(&Utc::now());
    conn.execute(
        schema::INSERT_COMMENT,
        params![comment.body, slug, comment.author_id, now, now],
    )
    .map_err(for_entity(COMMENT, slug))?;
    let id = conn.last_insert_rowid();

    conn.query_row(schema::SELECT_COMMENT_BY_ID, [id], row_to_comment)
        .map_err(for_entity(COMMENT, &id.to_string()))
}

pub(super) fn select_comments(conn: &Connection, slug: &str) -> Result<Vec<Comment>> {
    let mut stmt = conn
        .prepare(schema::SELECT_COMMENTS_BY_SLUG)
        .map_err(for_entity(COMMENT, slug))?;
    let rows = stmt
        .query_map([slug], row_to_comment)
        .map_err(for_entity(COMMENT, slug))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(for_entity(COMMENT, slug))
}

pub(super) fn soft_delete_comment(
    conn: &Connection,
    author_id: i64,
    slug: &str,
    id: i64,
) -> Result<()> {
    let comment_id = id.to_string();
    let rows = conn
        .execute(
            schema::SOFT_DELETE_COMMENT,
            params![format_datetime(&Utc::now()), id, slug, author_id],
        )
        .map_err(for_entity(COMMENT, &comment_id))?;

    if rows == 0 {
        return Err(RepositoryError::not_found(COMMENT, comment_id));
    }
    Ok(())
}

pub(super) fn soft_delete_comments(conn: &Connection, author_id: i64, slug: &str) -> Result<u64> {
    let rows = conn
        .execute(
            schema::SOFT_DELETE_COMMENTS,
            params![format_datetime(&Utc::now()), slug, author_id],
        )
        .map_err(for_entity(COMMENT, slug))?;
    Ok(rows as u64)
}

/// Transaction-bound handle passed to units of work.
struct SqliteTx<'a> {
    conn: &'a Connection,
    tag_batch_size: usize,
}

impl AccountTx for SqliteTx<'_> {
    fn save_account(&self, account: NewAccount) -> Result<Account> {
        insert_account(self.conn, &account)
    }

    fn update_account(&self, email: &str, patch: AccountPatch) -> Result<()> {
        update_account(self.conn, email, &patch)
    }

    fn find_account_by_email(&self, email: &str) -> Result<Account> {
        select_account_by_email(self.conn, email)
    }
}

impl ArticleTx for SqliteTx<'_> {
    fn save_article(&self, article: NewArticle) -> Result<Article> {
        insert_article(self.conn, &article)
    }

    fn find_article_by_slug(&self, slug: &str) -> Result<Article> {
        select_article_by_slug(self.conn, slug)
    }

    fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)> {
        select_articles(self.conn, criteria, self.tag_batch_size)
    }

    fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()> {
        soft_delete_article(self.conn, author_id, slug)
    }

    fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment> {
        insert_comment(self.conn, slug, &comment)
    }

    fn find_comments(&self, slug: &str) -> Result<Vec<Comment>> {
        select_comments(self.conn, slug)
    }

    fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()> {
        soft_delete_comment(self.conn, author_id, slug, id)
    }

    fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        soft_delete_comments(self.conn, author_id, slug)
    }
}

// ============================================================================
// ArticleRepository implementation
// ============================================================================

#[async_trait]
impl ArticleRepository for SqliteRepository {
    async fn run_in_tx(&self, work: TxWork) -> Result<()> {
        let tag_batch_size = self.tag_batch_size;

        self.in_transaction("Transaction", move |conn| {
            work(&SqliteTx {
                conn,
                tag_batch_size,
            })
        })
        .await
        .map_err(|err| match err {
            RepositoryError::Transaction(_) | RepositoryError::TxRollbackFailed { .. } => err,
            cause => RepositoryError::TxAborted {
                cause: Box::new(cause),
            },
        })
    }

    async fn save_article(&self, article: NewArticle) -> Result<Article> {
        tracing::debug!(slug = %article.slug, tags = ?article.tags, "article.save_article");

        self.in_transaction(ARTICLE, move |conn| insert_article(conn, &article))
            .await
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Article> {
        tracing::debug!(%slug, "article.find_article_by_slug");
        let slug = slug.to_string();

        self.call(ARTICLE, move |conn| select_article_by_slug(conn, &slug))
            .await
    }

    async fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)> {
        tracing::debug!(?criteria, "article.find_articles");
        let criteria = criteria.clone();
        let tag_batch_size = self.tag_batch_size;

        self.call(ARTICLE, move |conn| {
            select_articles(conn, &criteria, tag_batch_size)
        })
        .await
    }

    async fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()> {
        tracing::debug!(author_id, %slug, "article.delete_article_by_slug");
        let slug = slug.to_string();

        self.in_transaction(ARTICLE, move |conn| {
            soft_delete_article(conn, author_id, &slug)
        })
        .await
    }

    async fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment> {
        tracing::debug!(%slug, author_id = comment.author_id, "article.save_comment");
        let slug = slug.to_string();

        self.call(COMMENT, move |conn| insert_comment(conn, &slug, &comment))
            .await
    }

    async fn find_comments(&self, slug: &str) -> Result<Vec<Comment>> {
        tracing::debug!(%slug, "article.find_comments");
        let slug = slug.to_string();

        self.call(COMMENT, move |conn| select_comments(conn, &slug))
            .await
    }

    async fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()> {
        tracing::debug!(author_id, %slug, id, "article.delete_comment_by_id");
        let slug = slug.to_string();

        self.call(COMMENT, move |conn| {
            soft_delete_comment(conn, author_id, &slug, id)
        })
        .await
    }

    async fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        tracing::debug!(author_id, %slug, "article.delete_comments");
        let slug = slug.to_string();

        self.call(COMMENT, move |conn| {
            soft_delete_comments(conn, author_id, &slug)
        })
        .await
    }

    async fn delete_article_with_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        tracing::debug!(author_id, %slug, "article.delete_article_with_comments");
        let slug = slug.to_string();

        // 1. Tombstone the article, 2. remove the comments, as one unit
        self.in_transaction(ARTICLE, move |conn| {
            soft_delete_article(conn, author_id, &slug)?;
            soft_delete_comments(conn, author_id, &slug)
        })
        .await
    }
}
