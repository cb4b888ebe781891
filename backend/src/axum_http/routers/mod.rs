pub mod auth;
pub mod check_ins;
pub mod internal;
pub mod invoices;
pub mod members;
pub mod plans;
pub mod subscriptions;
pub mod webhooks;
