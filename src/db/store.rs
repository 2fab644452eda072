use crate::db::{adapter, queries};
use crate::error::{AppError, AppResult};
use crate::models::{Company, Invoice, Payment};
use crate::service::normalizer::rut_key;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};

/// Read capabilities the recommendation engine needs from the document store.
/// Identifiers are matched by canonical RUT key, so formatting differences
/// between the docs batches and the cartola do not split a debtor.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn invoices_for(&self, rut: &str) -> AppResult<Vec<Invoice>> {
        self.invoices_for_many(&[rut.to_string()]).await
    }

    async fn invoices_for_many(&self, ruts: &[String]) -> AppResult<Vec<Invoice>>;

    async fn payments_for(&self, rut: &str, paid_only: bool) -> AppResult<Vec<Payment>> {
        self.payments_for_many(&[rut.to_string()], paid_only).await
    }

    async fn payments_for_many(&self, ruts: &[String], paid_only: bool) -> AppResult<Vec<Payment>>;

    async fn company(&self, rut: &str) -> AppResult<Option<Company>>;

    async fn companies_in_segment(&self, sector: &str, bracket: &str) -> AppResult<Vec<Company>>;

    /// Category label from the reference classification table
    async fn reference_category(&self, rut: &str) -> AppResult<Option<String>>;
}

/// PostgreSQL-backed store: JSONB collections `docs`, `pagos`, `empresas`
/// plus the `clasificacion_entidades` reference table.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        let start = Instant::now();
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => {
                tracing::debug!("✓ {} completed in {:?}", operation, start.elapsed());
                Ok(value)
            }
            Ok(Err(e)) => {
                tracing::error!("✗ {} failed after {:?}: {:?}", operation, start.elapsed(), e);
                Err(AppError::Database(e))
            }
            Err(_) => {
                tracing::error!("✗ {} timed out (>{}s)", operation, self.query_timeout.as_secs());
                Err(AppError::StoreTimeout {
                    operation,
                    secs: self.query_timeout.as_secs(),
                })
            }
        }
    }
}

fn rut_keys(ruts: &[String]) -> Vec<String> {
    ruts.iter()
        .map(|r| rut_key(r))
        .filter(|k| !k.is_empty())
        .collect()
}

/// Adapt documents, logging the ones that cannot be attributed to a debtor.
fn adapt_all<T>(docs: Vec<Value>, kind: &str, adapt: fn(&Value) -> Option<T>) -> Vec<T> {
    let total = docs.len();
    let adapted: Vec<T> = docs.iter().filter_map(adapt).collect();
    if adapted.len() < total {
        tracing::warn!("Skipped {} unreadable {} documents", total - adapted.len(), kind);
    }
    adapted
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn invoices_for_many(&self, ruts: &[String]) -> AppResult<Vec<Invoice>> {
        let keys = rut_keys(ruts);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let docs = self
            .timed("fetch_invoices", queries::fetch_invoice_documents(&self.pool, &keys))
            .await?;
        Ok(adapt_all(docs, "invoice", adapter::invoice_from_document))
    }

    async fn payments_for_many(&self, ruts: &[String], paid_only: bool) -> AppResult<Vec<Payment>> {
        let keys = rut_keys(ruts);
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let docs = self
            .timed(
                "fetch_payments",
                queries::fetch_payment_documents(&self.pool, &keys, paid_only),
            )
            .await?;
        Ok(adapt_all(docs, "payment", adapter::payment_from_document))
    }

    async fn company(&self, rut: &str) -> AppResult<Option<Company>> {
        let key = rut_key(rut);
        if key.is_empty() {
            return Ok(None);
        }
        let doc = self
            .timed("fetch_company", queries::fetch_company_document(&self.pool, &key))
            .await?;
        Ok(doc.as_ref().and_then(adapter::company_from_document))
    }

    async fn companies_in_segment(&self, sector: &str, bracket: &str) -> AppResult<Vec<Company>> {
        let docs = self
            .timed(
                "fetch_segment",
                queries::fetch_segment_documents(&self.pool, sector.trim(), bracket.trim()),
            )
            .await?;
        Ok(adapt_all(docs, "company", adapter::company_from_document))
    }

    async fn reference_category(&self, rut: &str) -> AppResult<Option<String>> {
        let key = rut_key(rut);
        if key.is_empty() {
            return Ok(None);
        }
        self.timed(
            "fetch_reference_category",
            queries::fetch_reference_category(&self.pool, &key),
        )
        .await
    }
}
