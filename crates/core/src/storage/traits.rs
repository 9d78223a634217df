use async_trait::async_trait;

use crate::account::{Account, AccountPatch, NewAccount};
use crate::article::{Article, ArticleCriteria, Comment, NewArticle, NewComment};

use super::Result;

/// Repository for account operations.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts a new account. Fails with `KeyConflict` on a duplicate email or username.
    async fn save(&self, account: NewAccount) -> Result<Account>;

    /// Applies the `Some` fields of `patch` to the account with `email`.
    async fn update(&self, email: &str, patch: AccountPatch) -> Result<()>;

    /// Gets an account by email.
    async fn find_by_email(&self, email: &str) -> Result<Account>;

    /// Gets an account by email straight from storage, skipping any cache.
    ///
    /// Used by authentication, where a stale or redacted copy is unacceptable.
    async fn find_by_email_bypass_cache(&self, email: &str) -> Result<Account> {
        self.find_by_email(email).await
    }
}

/// Account operations bound to an open transaction.
pub trait AccountTx {
    fn save_account(&self, account: NewAccount) -> Result<Account>;

    fn update_account(&self, email: &str, patch: AccountPatch) -> Result<()>;

    fn find_account_by_email(&self, email: &str) -> Result<Account>;
}

/// Transaction-scoped handle given to a unit of work.
///
/// Every call runs inside the open transaction, account operations included.
/// The handle only lives for the duration of the closure passed to
/// [`ArticleRepository::run_in_tx`].
pub trait ArticleTx: AccountTx {
    fn save_article(&self, article: NewArticle) -> Result<Article>;

    fn find_article_by_slug(&self, slug: &str) -> Result<Article>;

    fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)>;

    fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()>;

    fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment>;

    fn find_comments(&self, slug: &str) -> Result<Vec<Comment>>;

    fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()>;

    fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64>;
}

/// A unit of work. Returning `Err` rolls the transaction back.
pub type TxWork = Box<dyn FnOnce(&dyn ArticleTx) -> Result<()> + Send + 'static>;

/// Repository for article, tag and comment operations.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Runs `work` inside a single transaction: commit on `Ok`, rollback on `Err`.
    async fn run_in_tx(&self, work: TxWork) -> Result<()>;

    /// Upserts the article's tags and inserts it. Fails with `KeyConflict` when
    /// an active article already uses the slug.
    async fn save_article(&self, article: NewArticle) -> Result<Article>;

    /// Like [`save_article`](Self::save_article) but never populates a cache.
    async fn save_article_bypass_cache(&self, article: NewArticle) -> Result<Article> {
        self.save_article(article).await
    }

    /// Gets an active article, with author and tags, by slug.
    async fn find_article_by_slug(&self, slug: &str) -> Result<Article>;

    async fn find_article_by_slug_bypass_cache(&self, slug: &str) -> Result<Article> {
        self.find_article_by_slug(slug).await
    }

    /// Lists active articles newest first, with the total count before pagination.
    async fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)>;

    /// Soft-deletes an article owned by `author_id`.
    ///
    /// A slug owned by someone else is reported as `NotFound`.
    async fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()>;

    /// Adds a comment to an active article.
    async fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment>;

    /// Lists live comments for a slug, newest first.
    async fn find_comments(&self, slug: &str) -> Result<Vec<Comment>>;

    async fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()>;

    /// Deletes every comment by `author_id` on `slug`. Zero is not an error.
    async fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64>;

    /// Deletes an article and the author's comments on it atomically.
    ///
    /// Returns the number of comments removed.
    async fn delete_article_with_comments(&self, author_id: i64, slug: &str) -> Result<u64>;
}
