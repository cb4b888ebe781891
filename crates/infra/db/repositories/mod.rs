pub mod check_ins;
pub mod invoices;
pub mod members;
pub mod plans;
pub mod subscriptions;
pub mod users;
