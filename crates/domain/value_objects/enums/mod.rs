pub mod invoice_statuses;
pub mod member_statuses;
pub mod payment_types;
pub mod subscription_statuses;
pub mod visit_intents;
