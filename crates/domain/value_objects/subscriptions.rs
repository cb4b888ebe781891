use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::payment_types::PaymentType;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriptionModel {
    pub member_id: Uuid,
    pub plan_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub payment_type: Option<PaymentType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenewSubscriptionModel {
    pub plan_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutStartedDto {
    pub subscription_id: Uuid,
    pub invoice_id: Uuid,
    pub checkout_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenewedSubscriptionDto {
    pub previous_subscription_id: Uuid,
    pub subscription_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpirySweepDto {
    pub expired: usize,
}
