use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Void,
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Failed => "failed",
            InvoiceStatus::Void => "void",
        };
        write!(f, "{}", status)
    }
}

impl InvoiceStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "pending" => InvoiceStatus::Pending,
            "paid" => InvoiceStatus::Paid,
            "failed" => InvoiceStatus::Failed,
            _ => InvoiceStatus::Void,
        }
    }
}
