//! Cached article repository decorator.
//!
//! Only the by-slug point lookup is cached. Filtered lists and comments pass
//! straight through to the underlying repository.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use inkpress_core::account::{Account, AccountPatch, NewAccount};
use inkpress_core::article::{Article, ArticleCriteria, Comment, NewArticle, NewComment};
use inkpress_core::cache::{article_by_slug_key, user_by_email_key, Cache, ARTICLE_BY_SLUG};
use inkpress_core::metrics::{CacheRecorder, NoopRecorder};
use inkpress_core::storage::{
    AccountTx, ArticleRepository, ArticleTx, RepositoryError, Result, TxWork,
};

use crate::cache::CacheStore;

/// Cached article repository decorator.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedArticleRepository<R, C>
where
    R: ArticleRepository,
    C: Cache,
{
    repository: Arc<R>,
    store: CacheStore<C, RepositoryError>,
    recorder: Arc<dyn CacheRecorder>,
}

impl<R, C> CachedArticleRepository<R, C>
where
    R: ArticleRepository,
    C: Cache,
{
    /// Creates a new cached article repository.
    ///
    /// # Arguments
    ///
    /// * `repository` - The underlying repository to cache
    /// * `cache` - The cache implementation
    /// * `prefix` - Global key prefix
    /// * `ttl` - Time-to-live for cached articles
    pub fn new(repository: Arc<R>, cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            repository,
            store: CacheStore::new(cache, prefix, ttl),
            recorder: Arc::new(NoopRecorder),
        }
    }

    /// Reports lookup outcomes to `recorder`.
    pub fn with_recorder(mut self, recorder: Arc<dyn CacheRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Removes the cached article for `slug`, if present.
    ///
    /// Uses the same key the lookup path populates.
    async fn invalidate(&self, slug: &str) {
        self.invalidate_key(&article_by_slug_key(slug)).await;
    }

    async fn invalidate_key(&self, key: &str) {
        match self.store.exists(key).await {
            Ok(true) => {
                if let Err(err) = self.store.delete(key).await {
                    tracing::warn!(%key, error = %err, "Failed to invalidate cache entry");
                } else {
                    tracing::debug!(%key, "Invalidated cache entry");
                }
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(%key, error = %err, "Cache exists check failed on invalidation");
            }
        }
    }
}

// ============================================================================
// Unit-of-work tracking
// ============================================================================

/// Cache keys a unit of work made stale.
#[derive(Debug, Default)]
struct Touched {
    slugs: Vec<String>,
    emails: Vec<String>,
}

/// Forwards every call to the open transaction and records successful
/// writes that cached entries depend on.
struct TrackingTx<'a> {
    inner: &'a dyn ArticleTx,
    touched: &'a Mutex<Touched>,
}

impl TrackingTx<'_> {
    fn record(&self, f: impl FnOnce(&mut Touched)) {
        if let Ok(mut touched) = self.touched.lock() {
            f(&mut touched);
        }
    }
}

impl AccountTx for TrackingTx<'_> {
    fn save_account(&self, account: NewAccount) -> Result<Account> {
        self.inner.save_account(account)
    }

    fn update_account(&self, email: &str, patch: AccountPatch) -> Result<()> {
        self.inner.update_account(email, patch)?;
        self.record(|t| t.emails.push(email.to_string()));
        Ok(())
    }

    fn find_account_by_email(&self, email: &str) -> Result<Account> {
        self.inner.find_account_by_email(email)
    }
}

impl ArticleTx for TrackingTx<'_> {
    fn save_article(&self, article: NewArticle) -> Result<Article> {
        self.inner.save_article(article)
    }

    fn find_article_by_slug(&self, slug: &str) -> Result<Article> {
        self.inner.find_article_by_slug(slug)
    }

    fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)> {
        self.inner.find_articles(criteria)
    }

    fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()> {
        self.inner.delete_article_by_slug(author_id, slug)?;
        self.record(|t| t.slugs.push(slug.to_string()));
        Ok(())
    }

    fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment> {
        self.inner.save_comment(slug, comment)
    }

    fn find_comments(&self, slug: &str) -> Result<Vec<Comment>> {
        self.inner.find_comments(slug)
    }

    fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()> {
        self.inner.delete_comment_by_id(author_id, slug, id)
    }

    fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        self.inner.delete_comments(author_id, slug)
    }
}

#[async_trait]
impl<R, C> ArticleRepository for CachedArticleRepository<R, C>
where
    R: ArticleRepository + 'static,
    C: Cache + 'static,
{
    async fn run_in_tx(&self, work: TxWork) -> Result<()> {
        let touched = Arc::new(Mutex::new(Touched::default()));
        let tracked = Arc::clone(&touched);

        // 1. Run the work against a handle that remembers stale keys
        self.repository
            .run_in_tx(Box::new(move |tx: &dyn ArticleTx| {
                work(&TrackingTx {
                    inner: tx,
                    touched: &tracked,
                })
            }))
            .await?;

        // 2. Invalidate only after the commit; a rollback leaves the cache valid
        let touched = touched
            .lock()
            .map(|mut t| std::mem::take(&mut *t))
            .unwrap_or_default();
        for slug in &touched.slugs {
            self.invalidate(slug).await;
        }
        for email in &touched.emails {
            self.invalidate_key(&user_by_email_key(email)).await;
        }
        Ok(())
    }

    async fn save_article(&self, article: NewArticle) -> Result<Article> {
        let saved = self.repository.save_article(article).await?;

        let key = article_by_slug_key(&saved.slug);
        if let Err(err) = self.store.set(&key, &saved).await {
            tracing::warn!(slug = %saved.slug, error = %err, "Failed to cache article");
        }
        Ok(saved)
    }

    async fn save_article_bypass_cache(&self, article: NewArticle) -> Result<Article> {
        self.repository.save_article_bypass_cache(article).await
    }

    async fn find_article_by_slug(&self, slug: &str) -> Result<Article> {
        let repository = &self.repository;
        let fetched = self
            .store
            .fetch(&article_by_slug_key(slug), || async move {
                repository.find_article_by_slug(slug).await
            })
            .await?;

        self.recorder.record_cache(ARTICLE_BY_SLUG, fetched.hit);
        Ok(fetched.value)
    }

    async fn find_article_by_slug_bypass_cache(&self, slug: &str) -> Result<Article> {
        self.repository.find_article_by_slug_bypass_cache(slug).await
    }

    async fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)> {
        self.repository.find_articles(criteria).await
    }

    async fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()> {
        self.repository.delete_article_by_slug(author_id, slug).await?;
        self.invalidate(slug).await;
        Ok(())
    }

    async fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment> {
        self.repository.save_comment(slug, comment).await
    }

    async fn find_comments(&self, slug: &str) -> Result<Vec<Comment>> {
        self.repository.find_comments(slug).await
    }

    async fn delete_comment_by_id(&self, author_id: i64, slug: &str, id: i64) -> Result<()> {
        self.repository
            .delete_comment_by_id(author_id, slug, id)
            .await
    }

    async fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        self.repository.delete_comments(author_id, slug).await
    }

    async fn delete_article_with_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
        let deleted = self
            .repository
            .delete_article_with_comments(author_id, slug)
            .await?;
        self.invalidate(slug).await;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use futures_util::future::join_all;
    use inkpress_core::article::{Author, Tag};
    use tokio::sync::RwLock;

    use crate::storage::cached::testing::{MockCache, MockRecorder};
    use crate::storage::cached::CachedAccountRepository;
    use crate::storage::SqliteRepository;
    use inkpress_core::storage::AccountRepository;

    const PREFIX: &str = "article-";

    /// Mock repository for testing.
    struct MockArticleRepository {
        articles: RwLock<HashMap<String, Article>>,
        comments: RwLock<Vec<Comment>>,
        find_calls: AtomicUsize,
        list_calls: AtomicUsize,
        tx_calls: AtomicUsize,
        next_id: AtomicUsize,
    }

    impl MockArticleRepository {
        fn new() -> Self {
            Self {
                articles: RwLock::new(HashMap::new()),
                comments: RwLock::new(Vec::new()),
                find_calls: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                tx_calls: AtomicUsize::new(0),
                next_id: AtomicUsize::new(1),
            }
        }

        fn find_calls(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }

        fn next_id(&self) -> i64 {
            self.next_id.fetch_add(1, Ordering::SeqCst) as i64
        }
    }

    #[async_trait]
    impl ArticleRepository for MockArticleRepository {
        async fn run_in_tx(&self, _work: TxWork) -> Result<()> {
            self.tx_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn save_article(&self, article: NewArticle) -> Result<Article> {
            let mut articles = self.articles.write().await;
            if articles.contains_key(&article.slug) {
                return Err(RepositoryError::key_conflict("article", &article.slug));
            }
            let now = Utc::now();
            let saved = Article {
                id: self.next_id(),
                slug: article.slug.clone(),
                title: article.title,
                body: article.body,
                author: Author::new(article.author_id, "author"),
                tags: article
                    .tags
                    .into_iter()
                    .enumerate()
                    .map(|(i, name)| Tag { id: i as i64 + 1, name })
                    .collect(),
                created_at: now,
                updated_at: now,
                deleted_at_unix: 0,
            };
            articles.insert(article.slug, saved.clone());
            Ok(saved)
        }

        async fn find_article_by_slug(&self, slug: &str) -> Result<Article> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.articles
                .read()
                .await
                .get(slug)
                .cloned()
                .ok_or_else(|| RepositoryError::not_found("article", slug))
        }

        async fn find_articles(&self, criteria: &ArticleCriteria) -> Result<(Vec<Article>, u64)> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let articles: Vec<Article> = self.articles.read().await.values().cloned().collect();
            let total = articles.len() as u64;
            Ok((
                articles.into_iter().take(criteria.limit as usize).collect(),
                total,
            ))
        }

        async fn delete_article_by_slug(&self, author_id: i64, slug: &str) -> Result<()> {
            let mut articles = self.articles.write().await;
            match articles.get(slug) {
                Some(article) if article.author.id == author_id => {
                    articles.remove(slug);
                    Ok(())
                }
                _ => Err(RepositoryError::not_found("article", slug)),
            }
        }

        async fn save_comment(&self, slug: &str, comment: NewComment) -> Result<Comment> {
            let now = Utc::now();
            let saved = Comment {
                id: self.next_id(),
                body: comment.body,
                slug: slug.to_string(),
                author: Author::new(comment.author_id, "author"),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            self.comments.write().await.push(saved.clone());
            Ok(saved)
        }

        async fn find_comments(&self, slug: &str) -> Result<Vec<Comment>> {
            Ok(self
                .comments
                .read()
                .await
                .iter()
                .filter(|c| c.slug == slug)
                .cloned()
                .collect())
        }

        async fn delete_comment_by_id(&self, _author_id: i64, _slug: &str, id: i64) -> Result<()> {
            self.comments.write().await.retain(|c| c.id != id);
            Ok(())
        }

        async fn delete_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
            let mut comments = self.comments.write().await;
            let before = comments.len();
            comments.retain(|c| !(c.slug == slug && c.author.id == author_id));
            Ok((before - comments.len()) as u64)
        }

        async fn delete_article_with_comments(&self, author_id: i64, slug: &str) -> Result<u64> {
            self.delete_article_by_slug(author_id, slug).await?;
            self.delete_comments(author_id, slug).await
        }
    }

    fn cached() -> (
        Arc<MockArticleRepository>,
        Arc<MockCache>,
        Arc<MockRecorder>,
        CachedArticleRepository<MockArticleRepository, MockCache>,
    ) {
        let repo = Arc::new(MockArticleRepository::new());
        let cache = Arc::new(MockCache::new());
        let recorder = Arc::new(MockRecorder::default());
        let cached =
            CachedArticleRepository::new(repo.clone(), cache.clone(), PREFIX, Duration::from_secs(60))
                .with_recorder(recorder.clone());
        (repo, cache, recorder, cached)
    }

    fn cache_key(slug: &str) -> String {
        format!("{PREFIX}article-by-slug.{slug}")
    }

    #[tokio::test]
    async fn test_save_article_populates_cache() {
        let (repo, cache, recorder, cached) = cached();

        let saved = cached
            .save_article(NewArticle::new("Hello World", "body", 1).with_tags(["rust"]))
            .await
            .unwrap();
        assert_eq!(saved.slug, "hello-world");
        assert!(cache.contains(&cache_key("hello-world")).await);

        let found = cached.find_article_by_slug("hello-world").await.unwrap();
        assert_eq!(found, saved);
        assert_eq!(repo.find_calls(), 0);
        assert_eq!(recorder.events(), vec![(ARTICLE_BY_SLUG.to_string(), true)]);
    }

    #[tokio::test]
    async fn test_save_article_bypass_does_not_populate_cache() {
        let (_repo, cache, _recorder, cached) = cached();

        cached
            .save_article_bypass_cache(NewArticle::new("Quiet", "body", 1))
            .await
            .unwrap();

        assert!(!cache.contains(&cache_key("quiet")).await);
    }

    #[tokio::test]
    async fn test_concurrent_find_article_reads_repository_once() {
        let (repo, _cache, recorder, cached) = cached();
        repo.save_article(NewArticle::new("Hot Topic", "body", 1))
            .await
            .unwrap();

        let results = join_all((0..6).map(|_| cached.find_article_by_slug("hot-topic"))).await;

        assert_eq!(repo.find_calls(), 1);
        assert!(results.iter().all(|r| r.as_ref().unwrap().slug == "hot-topic"));
        assert_eq!(recorder.events().len(), 6);
    }

    #[tokio::test]
    async fn test_find_missing_article_is_not_cached() {
        let (repo, cache, _recorder, cached) = cached();

        assert!(cached
            .find_article_by_slug("nope")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(cached
            .find_article_by_slug("nope")
            .await
            .unwrap_err()
            .is_not_found());

        assert_eq!(repo.find_calls(), 2);
        assert!(!cache.contains(&cache_key("nope")).await);
    }

    #[tokio::test]
    async fn test_delete_invalidates_namespaced_key() {
        let (repo, cache, _recorder, cached) = cached();
        cached
            .save_article(NewArticle::new("Gone Soon", "body", 7))
            .await
            .unwrap();
        assert!(cache.contains(&cache_key("gone-soon")).await);

        cached.delete_article_by_slug(7, "gone-soon").await.unwrap();

        assert!(!cache.contains(&cache_key("gone-soon")).await);
        assert_eq!(cache.delete_calls.load(Ordering::SeqCst), 1);
        assert!(cached
            .find_article_by_slug("gone-soon")
            .await
            .unwrap_err()
            .is_not_found());
        assert_eq!(repo.find_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_entry_skips_cache_delete() {
        let (repo, cache, _recorder, cached) = cached();
        repo.save_article(NewArticle::new("Uncached", "body", 7))
            .await
            .unwrap();

        cached.delete_article_by_slug(7, "uncached").await.unwrap();

        assert_eq!(cache.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_cache_entry() {
        let (_repo, cache, _recorder, cached) = cached();
        cached
            .save_article(NewArticle::new("Not Yours", "body", 7))
            .await
            .unwrap();

        let err = cached
            .delete_article_by_slug(8, "not-yours")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(cache.contains(&cache_key("not-yours")).await);
    }

    #[tokio::test]
    async fn test_delete_with_comments_invalidates_and_counts() {
        let (_repo, cache, _recorder, cached) = cached();
        cached
            .save_article(NewArticle::new("Thread", "body", 3))
            .await
            .unwrap();
        cached
            .save_comment("thread", NewComment::new("first", 3))
            .await
            .unwrap();
        cached
            .save_comment("thread", NewComment::new("second", 3))
            .await
            .unwrap();
        cached
            .save_comment("thread", NewComment::new("other", 4))
            .await
            .unwrap();

        let deleted = cached
            .delete_article_with_comments(3, "thread")
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert!(!cache.contains(&cache_key("thread")).await);
        assert_eq!(cached.find_comments("thread").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_tx_pass_through() {
        let (repo, cache, recorder, cached) = cached();
        repo.save_article(NewArticle::new("One", "body", 1))
            .await
            .unwrap();

        let (articles, total) = cached
            .find_articles(&ArticleCriteria::new().with_limit(10))
            .await
            .unwrap();
        cached
            .run_in_tx(Box::new(|_tx: &dyn ArticleTx| Ok(())))
            .await
            .unwrap();

        assert_eq!((articles.len(), total), (1, 1));
        assert_eq!(repo.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.tx_calls.load(Ordering::SeqCst), 1);
        assert!(cache.data.read().await.is_empty());
        assert!(recorder.events().is_empty());
    }

    // ========================================================================
    // Units of work over SQLite
    // ========================================================================

    struct SqliteFixture {
        sqlite: Arc<SqliteRepository>,
        cache: Arc<MockCache>,
        articles: CachedArticleRepository<SqliteRepository, MockCache>,
        accounts: CachedAccountRepository<SqliteRepository, MockCache>,
        author_id: i64,
    }

    async fn sqlite_fixture() -> SqliteFixture {
        let sqlite = Arc::new(SqliteRepository::new_in_memory().await.unwrap());
        let cache = Arc::new(MockCache::new());
        let ttl = Duration::from_secs(60);
        let articles = CachedArticleRepository::new(sqlite.clone(), cache.clone(), PREFIX, ttl);
        let accounts = CachedAccountRepository::new(sqlite.clone(), cache.clone(), PREFIX, ttl);
        let author = accounts
            .save(NewAccount::new("writer", "writer@example.com", "hash"))
            .await
            .unwrap();
        SqliteFixture {
            sqlite,
            cache,
            articles,
            accounts,
            author_id: author.id,
        }
    }

    #[tokio::test]
    async fn test_delete_inside_unit_of_work_invalidates_after_commit() {
        let fx = sqlite_fixture().await;
        let author_id = fx.author_id;
        fx.articles
            .save_article(NewArticle::new("Hello World", "body", author_id))
            .await
            .unwrap();
        fx.articles
            .save_comment("hello-world", NewComment::new("nice", author_id))
            .await
            .unwrap();
        fx.articles.find_article_by_slug("hello-world").await.unwrap();
        assert!(fx.cache.contains(&cache_key("hello-world")).await);

        fx.articles
            .run_in_tx(Box::new(move |tx: &dyn ArticleTx| {
                tx.delete_article_by_slug(author_id, "hello-world")?;
                tx.delete_comments(author_id, "hello-world")?;
                Ok(())
            }))
            .await
            .unwrap();

        assert!(!fx.cache.contains(&cache_key("hello-world")).await);
        assert!(fx
            .sqlite
            .find_article_by_slug("hello-world")
            .await
            .unwrap_err()
            .is_not_found());
        assert!(fx
            .articles
            .find_article_by_slug("hello-world")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_rolled_back_unit_of_work_keeps_cache_entry() {
        let fx = sqlite_fixture().await;
        let author_id = fx.author_id;
        fx.articles
            .save_article(NewArticle::new("Still Here", "body", author_id))
            .await
            .unwrap();

        let err = fx
            .articles
            .run_in_tx(Box::new(move |tx: &dyn ArticleTx| {
                tx.delete_article_by_slug(author_id, "still-here")?;
                tx.delete_article_by_slug(author_id, "missing")
            }))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(fx.cache.contains(&cache_key("still-here")).await);
        let found = fx.articles.find_article_by_slug("still-here").await.unwrap();
        assert_eq!(found.slug, "still-here");
        assert!(fx.sqlite.find_article_by_slug("still-here").await.is_ok());
    }

    #[tokio::test]
    async fn test_account_update_inside_unit_of_work_drops_cached_account() {
        let fx = sqlite_fixture().await;
        let user_key = format!("{PREFIX}user-by-email.writer@example.com");
        assert!(fx.cache.contains(&user_key).await);

        fx.articles
            .run_in_tx(Box::new(|tx: &dyn ArticleTx| {
                tx.update_account("writer@example.com", AccountPatch::new().with_bio("edited"))
            }))
            .await
            .unwrap();

        assert!(!fx.cache.contains(&user_key).await);
        let account = fx.accounts.find_by_email("writer@example.com").await.unwrap();
        assert_eq!(account.bio, "edited");
        assert_eq!(account.password, "");
    }
}
