use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::invoices;

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = invoices)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub member_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub external_id: Uuid,
    pub amount_minor: i64,
    pub tax_amount_minor: i64,
    pub status: String,
    pub due_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = invoices)]
pub struct InsertInvoiceEntity {
    pub member_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub external_id: Uuid,
    pub amount_minor: i64,
    pub tax_amount_minor: i64,
    pub status: String,
    pub due_at: Option<DateTime<Utc>>,
}
