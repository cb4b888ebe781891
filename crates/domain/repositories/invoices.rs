use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::invoices::{InsertInvoiceEntity, InvoiceEntity},
    value_objects::invoices::InvoiceFilter,
};

#[async_trait]
#[automock]
pub trait InvoiceRepository {
    async fn create(&self, invoice: InsertInvoiceEntity) -> Result<InvoiceEntity>;

    async fn find_by_id(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>>;

    /// Newest first, one page as described by the filter.
    async fn list(&self, filter: InvoiceFilter) -> Result<Vec<InvoiceEntity>>;

    async fn find_by_external_id(&self, external_id: Uuid) -> Result<Option<InvoiceEntity>>;

    /// Returns `false` when the invoice was no longer pending.
    async fn mark_paid_if_pending(&self, invoice_id: Uuid, paid_at: DateTime<Utc>)
    -> Result<bool>;
}
