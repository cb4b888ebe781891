use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::subscriptions::CheckoutStartedDto;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMemberModel {
    pub organization_id: Uuid,
    pub home_branch_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub plan_id: Uuid,
    pub join_date: NaiveDate,
    /// `None` lets the email decide: an unknown address gets a new account.
    pub create_new_user: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedMemberDto {
    pub member_id: Uuid,
    pub user_id: Uuid,
    pub checkout: CheckoutStartedDto,
}
