pub mod check_ins;
pub mod enums;
pub mod invoices;
pub mod members;
pub mod payments;
pub mod plans;
pub mod subscriptions;
