use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection};

use inkpress_core::account::{Account, AccountPatch, NewAccount};
use inkpress_core::storage::{AccountRepository, RepositoryError, Result};

use super::conversions::{format_datetime, row_to_account};
use super::error::for_entity;
use super::schema;
use super::SqliteRepository;

const ACCOUNT: &str = "Account";

pub(super) fn insert_account(conn: &Connection, account: &NewAccount) -> Result<Account> {
    let now = format_datetime(&Utc::now());

    conn.execute(
        schema::INSERT_ACCOUNT,
        params![
            account.username,
            account.email,
            account.password,
            account.bio,
            account.image,
            false,
            now,
            now,
        ],
    )
    .map_err(for_entity(ACCOUNT, &account.email))?;

    select_account_by_email(conn, &account.email)
}

pub(super) fn update_account(conn: &Connection, email: &str, patch: &AccountPatch) -> Result<()> {
    let fields = [
        ("username", &patch.username),
        ("password", &patch.password),
        ("bio", &patch.bio),
        ("image", &patch.image),
    ];

    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            columns.push(column);
            values.push(value.clone());
        }
    }
    values.push(format_datetime(&Utc::now()));
    values.push(email.to_string());

    let rows = conn
        .execute(
            &schema::update_account_sql(&columns),
            params_from_iter(values.iter()),
        )
        .map_err(for_entity(ACCOUNT, email))?;

    if rows == 0 {
        return Err(RepositoryError::not_found(ACCOUNT, email));
    }
    Ok(())
}

pub(super) fn select_account_by_email(conn: &Connection, email: &str) -> Result<Account> {
    conn.query_row(schema::SELECT_ACCOUNT_BY_EMAIL, [email], row_to_account)
        .map_err(for_entity(ACCOUNT, email))
}

// ============================================================================
// AccountRepository implementation
// ============================================================================

#[async_trait]
impl AccountRepository for SqliteRepository {
    async fn save(&self, account: NewAccount) -> Result<Account> {
        tracing::debug!(email = %account.email, username = %account.username, "account.save");

        self.call(ACCOUNT, move |conn| insert_account(conn, &account))
            .await
    }

    async fn update(&self, email: &str, patch: AccountPatch) -> Result<()> {
        tracing::debug!(%email, "account.update");
        let email = email.to_string();

        self.call(ACCOUNT, move |conn| update_account(conn, &email, &patch))
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Account> {
        tracing::debug!(%email, "account.find_by_email");
        let email = email.to_string();

        self.call(ACCOUNT, move |conn| select_account_by_email(conn, &email))
            .await
    }
}
