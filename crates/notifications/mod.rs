pub mod dispatcher;
pub mod resend_client;
