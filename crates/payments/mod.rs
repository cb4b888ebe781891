pub mod polar_client;
pub mod webhook_signature;
