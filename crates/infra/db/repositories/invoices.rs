use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{OptionalExtension, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::invoices},
};
use domain::{
    entities::invoices::{InsertInvoiceEntity, InvoiceEntity},
    repositories::invoices::InvoiceRepository,
    value_objects::{enums::invoice_statuses::InvoiceStatus, invoices::InvoiceFilter},
};

pub struct InvoicePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl InvoicePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl InvoiceRepository for InvoicePostgres {
    async fn create(&self, invoice: InsertInvoiceEntity) -> Result<InvoiceEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let created = insert_into(invoices::table)
            .values(&invoice)
            .returning(InvoiceEntity::as_returning())
            .get_result::<InvoiceEntity>(&mut conn)?;

        Ok(created)
    }

    async fn find_by_id(&self, invoice_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let invoice = invoices::table
            .filter(invoices::id.eq(invoice_id))
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(invoice)
    }

    async fn list(&self, filter: InvoiceFilter) -> Result<Vec<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = invoices::table.into_boxed();
        if let Some(member_id) = filter.member_id {
            query = query.filter(invoices::member_id.eq(member_id));
        }
        if let Some(subscription_id) = filter.subscription_id {
            query = query.filter(invoices::subscription_id.eq(subscription_id));
        }
        if let Some(branch_id) = filter.branch_id {
            query = query.filter(invoices::branch_id.eq(branch_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::status.eq(status.to_string()));
        }
        if let Some(from) = filter.created_from {
            query = query.filter(invoices::created_at.ge(from));
        }
        if let Some(until) = filter.created_until {
            query = query.filter(invoices::created_at.le(until));
        }

        let page = query
            .order((invoices::created_at.desc(), invoices::id.desc()))
            .offset(filter.offset)
            .limit(filter.limit)
            .select(InvoiceEntity::as_select())
            .load::<InvoiceEntity>(&mut conn)?;

        Ok(page)
    }

    async fn find_by_external_id(&self, external_id: Uuid) -> Result<Option<InvoiceEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let invoice = invoices::table
            .filter(invoices::external_id.eq(external_id))
            .select(InvoiceEntity::as_select())
            .first::<InvoiceEntity>(&mut conn)
            .optional()?;

        Ok(invoice)
    }

    async fn mark_paid_if_pending(
        &self,
        invoice_id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(
            invoices::table
                .filter(invoices::id.eq(invoice_id))
                .filter(invoices::status.eq(InvoiceStatus::Pending.to_string())),
        )
        .set((
            invoices::status.eq(InvoiceStatus::Paid.to_string()),
            invoices::paid_at.eq(Some(paid_at)),
        ))
        .execute(&mut conn)?;

        Ok(affected == 1)
    }
}
