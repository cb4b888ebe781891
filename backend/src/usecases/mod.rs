pub mod auth;
pub mod check_ins;
pub mod checkout_completion;
pub mod gateways;
pub mod invoices;
pub mod members;
pub mod plan_cache;
pub mod plans;
pub mod subscriptions;

#[cfg(test)]
pub(crate) mod fixtures;
