use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use crates::domain::{
    repositories::invoices::InvoiceRepository, value_objects::invoices::ListInvoicesQuery,
};
use uuid::Uuid;

use crate::{
    auth::{RequireRole, Staff},
    axum_http::error_responses::AppError,
    usecases::invoices::InvoiceUseCase,
};

pub fn routes<I>(usecase: Arc<InvoiceUseCase<I>>) -> Router
where
    I: InvoiceRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_invoices::<I>))
        .route("/:invoice_id", get(get_invoice::<I>))
        .with_state(usecase)
}

pub async fn list_invoices<I>(
    State(usecase): State<Arc<InvoiceUseCase<I>>>,
    _staff: RequireRole<Staff>,
    Query(query): Query<ListInvoicesQuery>,
) -> impl IntoResponse
where
    I: InvoiceRepository + Send + Sync + 'static,
{
    match usecase.list_invoices(query).await {
        Ok(invoices) => Json(invoices).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}

pub async fn get_invoice<I>(
    State(usecase): State<Arc<InvoiceUseCase<I>>>,
    _staff: RequireRole<Staff>,
    Path(invoice_id): Path<Uuid>,
) -> impl IntoResponse
where
    I: InvoiceRepository + Send + Sync + 'static,
{
    match usecase.get_invoice(invoice_id).await {
        Ok(invoice) => Json(invoice).into_response(),
        Err(err) => AppError::from(err).into_response(),
    }
}
