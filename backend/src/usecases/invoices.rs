use std::sync::Arc;

use crates::domain::{
    repositories::invoices::InvoiceRepository,
    value_objects::invoices::{InvoiceDto, InvoiceFilter, ListInvoicesQuery},
};
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("invoice not found")]
    InvoiceNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InvoiceError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            InvoiceError::InvoiceNotFound => StatusCode::NOT_FOUND,
            InvoiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type InvoiceResult<T> = std::result::Result<T, InvoiceError>;

/// Read-only access to billing records for front-desk staff.
pub struct InvoiceUseCase<I>
where
    I: InvoiceRepository + Send + Sync + 'static,
{
    invoice_repo: Arc<I>,
}

impl<I> InvoiceUseCase<I>
where
    I: InvoiceRepository + Send + Sync + 'static,
{
    pub fn new(invoice_repo: Arc<I>) -> Self {
        Self { invoice_repo }
    }

    pub async fn get_invoice(&self, invoice_id: Uuid) -> InvoiceResult<InvoiceDto> {
        let invoice = self
            .invoice_repo
            .find_by_id(invoice_id)
            .await
            .map_err(|err| {
                error!(%invoice_id, db_error = ?err, "invoices: failed to load invoice");
                InvoiceError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%invoice_id, "invoices: invoice not found");
                InvoiceError::InvoiceNotFound
            })?;

        Ok(invoice.into())
    }

    pub async fn list_invoices(&self, query: ListInvoicesQuery) -> InvoiceResult<Vec<InvoiceDto>> {
        let filter = InvoiceFilter::from(query);
        debug!(?filter, "invoices: listing");

        let invoices = self.invoice_repo.list(filter).await.map_err(|err| {
            error!(db_error = ?err, "invoices: failed to list invoices");
            InvoiceError::Internal(err)
        })?;

        Ok(invoices.into_iter().map(InvoiceDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::fixtures::sample_invoice;
    use crates::domain::{
        repositories::invoices::MockInvoiceRepository,
        value_objects::enums::invoice_statuses::InvoiceStatus,
    };

    #[tokio::test]
    async fn get_invoice_maps_stored_status() {
        let invoice_id = Uuid::new_v4();
        let mut invoices = MockInvoiceRepository::new();
        invoices.expect_find_by_id().returning(|id| {
            let invoice =
                sample_invoice(id, Uuid::new_v4(), Uuid::new_v4(), None, InvoiceStatus::Paid);
            Box::pin(async move { Ok(Some(invoice)) })
        });

        let usecase = InvoiceUseCase::new(Arc::new(invoices));
        let invoice = usecase.get_invoice(invoice_id).await.unwrap();

        assert_eq!(invoice.id, invoice_id);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn missing_invoice_is_not_found() {
        let mut invoices = MockInvoiceRepository::new();
        invoices
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = InvoiceUseCase::new(Arc::new(invoices));
        let err = usecase.get_invoice(Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, InvoiceError::InvoiceNotFound));
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_passes_resolved_page_to_store() {
        let member_id = Uuid::new_v4();
        let mut invoices = MockInvoiceRepository::new();
        invoices
            .expect_list()
            .withf(move |filter| {
                filter.member_id == Some(member_id)
                    && filter.status == Some(InvoiceStatus::Pending)
                    && filter.offset == 20
                    && filter.limit == 10
            })
            .times(1)
            .returning(move |_| {
                let page = vec![sample_invoice(
                    Uuid::new_v4(),
                    Uuid::new_v4(),
                    member_id,
                    None,
                    InvoiceStatus::Pending,
                )];
                Box::pin(async move { Ok(page) })
            });

        let usecase = InvoiceUseCase::new(Arc::new(invoices));
        let page = usecase
            .list_invoices(ListInvoicesQuery {
                page: Some(3),
                member_id: Some(member_id),
                status: Some(InvoiceStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].member_id, member_id);
    }
}
