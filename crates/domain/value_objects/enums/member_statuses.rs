use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    #[default]
    Lead,
    Active,
    Expired,
    Frozen,
}

impl Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            MemberStatus::Lead => "lead",
            MemberStatus::Active => "active",
            MemberStatus::Expired => "expired",
            MemberStatus::Frozen => "frozen",
        };
        write!(f, "{}", status)
    }
}

impl MemberStatus {
    pub fn from_str(value: &str) -> Self {
        match value {
            "active" => MemberStatus::Active,
            "expired" => MemberStatus::Expired,
            "frozen" => MemberStatus::Frozen,
            _ => MemberStatus::Lead,
        }
    }
}
