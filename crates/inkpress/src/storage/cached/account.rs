//! Cached account repository decorator.
//!
//! Wraps an `AccountRepository` with cache-aside lookups by email. Cached
//! copies always carry an empty password.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use inkpress_core::account::{Account, AccountPatch, NewAccount};
use inkpress_core::cache::{user_by_email_key, Cache, USER_BY_EMAIL};
use inkpress_core::metrics::{CacheRecorder, NoopRecorder};
use inkpress_core::storage::{AccountRepository, RepositoryError, Result};

use crate::cache::CacheStore;

/// Cached account repository decorator.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `C` - The cache implementation
pub struct CachedAccountRepository<R, C>
where
    R: AccountRepository,
    C: Cache,
{
    repository: Arc<R>,
    store: CacheStore<C, RepositoryError>,
    recorder: Arc<dyn CacheRecorder>,
}

impl<R, C> CachedAccountRepository<R, C>
where
    R: AccountRepository,
    C: Cache,
{
    /// Creates a new cached account repository.
    ///
    /// # Arguments
    ///
    /// * `repository` - The underlying repository to cache
    /// * `cache` - The cache implementation
    /// * `prefix` - Global key prefix
    /// * `ttl` - Time-to-live for cached accounts
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

    async fn cache_account(&self, account: &Account) {
        let key = user_by_email_key(&account.email);
        if let Err(err) = self.store.set(&key, &account.redacted()).await {
            tracing::warn!(account_id = account.id, error = %err, "Failed to cache account");
        }
    }
}

#[async_trait]
impl<R, C> AccountRepository for CachedAccountRepository<R, C>
where
    R: AccountRepository + 'static,
    C: Cache + 'static,
{
    async fn save(&self, account: NewAccount) -> Result<Account> {
        let saved = self.repository.save(account).await?;
        self.cache_account(&saved).await;
        tracing::debug!(account_id = saved.id, "Saved account and warmed cache");
        Ok(saved)
    }

    async fn update(&self, email: &str, patch: AccountPatch) -> Result<()> {
        self.repository.update(email, patch).await?;

        let key = user_by_email_key(email);
        match self.store.exists(&key).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(err) => {
                tracing::warn!(error = %err, "Cache exists check failed after account update");
                return Ok(());
            }
        }

        // Refresh from the canonical row rather than patching the cached copy
        match self.repository.find_by_email(email).await {
            Ok(fresh) => self.cache_account(&fresh).await,
            Err(err) => {
                tracing::warn!(error = %err, "Account re-read failed, dropping cached copy");
                if let Err(err) = self.store.delete(&key).await {
                    tracing::warn!(error = %err, "Failed to invalidate cached account");
                }
            }
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Account> {
        let repository = &self.repository;
        let fetched = self
            .store
            .fetch(&user_by_email_key(email), || async move {
                let account = repository.find_by_email(email).await?;
                Ok(account.redacted())
            })
            .await?;

        self.recorder.record_cache(USER_BY_EMAIL, fetched.hit);
        Ok(fetched.value)
    }

    async fn find_by_email_bypass_cache(&self, email: &str) -> Result<Account> {
        self.repository.find_by_email_bypass_cache(email).await
    }
}
