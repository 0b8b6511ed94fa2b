//! Credential entity repository.

use async_trait::async_trait;
use jiff_sqlx::{Timestamp as SqlxTimestamp, ToSqlx};
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as};

use crate::credentials::types::{CredentialEntity, CredentialType, NewCredentialEntity};

const INSERT_ENTITY_SQL: &str = include_str!("sql/insert_credential_entity.sql");
const FIND_BY_CLIENT_ID_SQL: &str = include_str!("sql/find_entity_by_client_id.sql");
const DELETE_BY_CLIENT_ID_SQL: &str = include_str!("sql/delete_entity_by_client_id.sql");

/// Relational persistence for credential entities, keyed by client id.
#[automock]
#[async_trait]
pub trait CredentialEntityRepository: Send + Sync {
    /// Persist a new entity row and return the stored record.
    async fn insert(&self, entity: &NewCredentialEntity) -> Result<CredentialEntity, sqlx::Error>;

    /// Look up an entity by its client id.
    async fn find_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<CredentialEntity>, sqlx::Error>;

    /// Remove the entity row for a client id.
    async fn delete_by_client_id(&self, client_id: &str) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed credential entity repository.
#[derive(Debug, Clone)]
pub struct PgCredentialEntityRepository {
    pool: PgPool,
}

impl PgCredentialEntityRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialEntityRepository for PgCredentialEntityRepository {
    async fn insert(&self, entity: &NewCredentialEntity) -> Result<CredentialEntity, sqlx::Error> {
        query_as::<Postgres, CredentialEntity>(INSERT_ENTITY_SQL)
            .bind(&entity.client_id)
            .bind(&entity.owner_id)
            .bind(entity.credential_type.name())
            .bind(
                entity
                    .client_secret_expired_at
                    .map(jiff::Timestamp::to_sqlx),
            )
            .fetch_one(&self.pool)
            .await
    }

    async fn find_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<CredentialEntity>, sqlx::Error> {
        query_as::<Postgres, CredentialEntity>(FIND_BY_CLIENT_ID_SQL)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_by_client_id(&self, client_id: &str) -> Result<(), sqlx::Error> {
        query(DELETE_BY_CLIENT_ID_SQL)
            .bind(client_id)
            .execute(&self.pool)
            .await
            .map(|_| ())
    }
}

impl<'r> FromRow<'r, PgRow> for CredentialEntity {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let type_name: String = row.try_get("credential_type")?;

        let credential_type = CredentialType::from_name(&type_name).ok_or_else(|| {
            sqlx::Error::Decode(format!("unknown credential type `{type_name}`").into())
        })?;

        Ok(Self {
            client_id: row.try_get("client_id")?,
            owner_id: row.try_get("owner_id")?,
            credential_type,
            issued_at: row.try_get::<SqlxTimestamp, _>("issued_at")?.to_jiff(),
            client_secret_expired_at: row
                .try_get::<Option<SqlxTimestamp>, _>("client_secret_expired_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
