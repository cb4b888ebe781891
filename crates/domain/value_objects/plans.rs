use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::plans::PlanEntity;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePlanModel {
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub duration_days: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePlanModel {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_minor: Option<i64>,
    pub duration_days: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_minor: i64,
    pub duration_days: i32,
    pub is_active: bool,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            organization_id: value.organization_id,
            name: value.name,
            description: value.description,
            price_minor: value.price_minor,
            duration_days: value.duration_days,
            is_active: value.is_active,
        }
    }
}
