//! PostgreSQL-backed knowledge store with connection pooling

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::{Document, DomainError, KnowledgeStore, ManualQa, TenantId};

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/chatlane".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_min_connections(mut self, min_connections: u32) -> Self {
        self.min_connections = min_connections;
        self
    }
}

/// Knowledge store persisting documents and manual Q&A pairs in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresKnowledgeStore {
    pool: PgPool,
}

impl PostgresKnowledgeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to PostgreSQL using the provided configuration
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ensures the document and manual Q&A tables exist
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                file_name TEXT NOT NULL,
                raw_text TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_tenant_id
                ON documents (tenant_id)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS manual_qa (
                id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_manual_qa_tenant_id
                ON manual_qa (tenant_id)
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create schema: {}", e)))?;
        }

        Ok(())
    }

    fn document_from_row(row: &sqlx::postgres::PgRow) -> Result<Document, DomainError> {
        let tenant_raw: String = row.get("tenant_id");
        let tenant_id = TenantId::new(tenant_raw)
            .map_err(|e| DomainError::storage(format!("Invalid tenant id in row: {}", e)))?;

        Ok(Document {
            id: row.get::<Uuid, _>("id"),
            tenant_id,
            file_name: row.get("file_name"),
            raw_text: row.get("raw_text"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }

    fn manual_qa_from_row(row: &sqlx::postgres::PgRow) -> Result<ManualQa, DomainError> {
        let tenant_raw: String = row.get("tenant_id");
        let tenant_id = TenantId::new(tenant_raw)
            .map_err(|e| DomainError::storage(format!("Invalid tenant id in row: {}", e)))?;

        Ok(ManualQa {
            id: row.get::<Uuid, _>("id"),
            tenant_id,
            question: row.get("question"),
            answer: row.get("answer"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        })
    }
}

#[async_trait]
impl KnowledgeStore for PostgresKnowledgeStore {
    async fn insert_document(&self, document: Document) -> Result<Document, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, tenant_id, file_name, raw_text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(document.id)
        .bind(document.tenant_id.as_str())
        .bind(&document.file_name)
        .bind(&document.raw_text)
        .bind(document.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert document: {}", e)))?;

        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, file_name, raw_text, created_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get document: {}", e)))?;

        match row {
            Some(row) => Ok(Some(Self::document_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_documents(&self, tenant_id: &TenantId) -> Result<Vec<Document>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, file_name, raw_text, created_at
            FROM documents
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list documents: {}", e)))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in &rows {
            documents.push(Self::document_from_row(row)?);
        }

        Ok(documents)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete document: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_manual_qa(&self, qa: ManualQa) -> Result<ManualQa, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO manual_qa (id, tenant_id, question, answer, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(qa.id)
        .bind(qa.tenant_id.as_str())
        .bind(&qa.question)
        .bind(&qa.answer)
        .bind(qa.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert manual QA: {}", e)))?;

        Ok(qa)
    }

    async fn get_manual_qa(&self, id: Uuid) -> Result<Option<ManualQa>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, question, answer, created_at
            FROM manual_qa
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get manual QA: {}", e)))?;

        match row {
            Some(row) => Ok(Some(Self::manual_qa_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_manual_qa(&self, tenant_id: &TenantId) -> Result<Vec<ManualQa>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, question, answer, created_at
            FROM manual_qa
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list manual QA: {}", e)))?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            pairs.push(Self::manual_qa_from_row(row)?);
        }

        Ok(pairs)
    }

    async fn delete_manual_qa(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM manual_qa WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete manual QA: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }
}
