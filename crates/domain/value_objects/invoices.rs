use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::invoices::InvoiceEntity, value_objects::enums::invoice_statuses::InvoiceStatus,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query-string filter for invoice listings. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub member_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// A [`ListInvoicesQuery`] with paging resolved and the date window ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFilter {
    pub member_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
    pub offset: i64,
    pub limit: i64,
}

impl From<ListInvoicesQuery> for InvoiceFilter {
    fn from(query: ListInvoicesQuery) -> Self {
        let page = query.page.filter(|page| *page >= 1).unwrap_or(1);
        let limit = query
            .limit
            .filter(|limit| *limit >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let (created_from, created_until) = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) if end < start => (Some(end), Some(start)),
            window => window,
        };

        Self {
            member_id: query.member_id,
            subscription_id: query.subscription_id,
            branch_id: query.branch_id,
            status: query.status,
            created_from,
            created_until,
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDto {
    pub id: Uuid,
    pub member_id: Uuid,
    pub subscription_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub external_id: Uuid,
    pub amount_minor: i64,
    pub tax_amount_minor: i64,
    pub status: InvoiceStatus,
    pub due_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InvoiceEntity> for InvoiceDto {
    fn from(value: InvoiceEntity) -> Self {
        Self {
            id: value.id,
            member_id: value.member_id,
            subscription_id: value.subscription_id,
            branch_id: value.branch_id,
            external_id: value.external_id,
            amount_minor: value.amount_minor,
            tax_amount_minor: value.tax_amount_minor,
            status: InvoiceStatus::from_str(&value.status),
            due_at: value.due_at,
            paid_at: value.paid_at,
            created_at: value.created_at,
        }
    }
}
