use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Carried through checkout metadata and read back when the payment completes.
/// `New` means the purchaser has no credentials yet and gets them provisioned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    New,
    Renewal,
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            PaymentType::New => "new",
            PaymentType::Renewal => "renewal",
        };
        write!(f, "{}", value)
    }
}

impl PaymentType {
    pub const METADATA_KEY: &'static str = "payment_type";

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "new" => Some(PaymentType::New),
            "renewal" => Some(PaymentType::Renewal),
            _ => None,
        }
    }
}
