use chrono::{DateTime, NaiveDate, Utc};
use crates::domain::{
    entities::{
        check_ins::CheckInEntity, invoices::InvoiceEntity, members::MemberEntity,
        plans::PlanEntity, subscriptions::SubscriptionEntity, users::UserEntity,
    },
    value_objects::enums::{
        invoice_statuses::InvoiceStatus, member_statuses::MemberStatus,
        subscription_statuses::SubscriptionStatus,
    },
};
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_plan(id: Uuid, price_minor: i64) -> PlanEntity {
    let now = Utc::now();
    PlanEntity {
        id,
        organization_id: Uuid::new_v4(),
        name: "Monthly".to_string(),
        description: Some("Unlimited access".to_string()),
        price_minor,
        duration_days: 30,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_member(id: Uuid, user_id: Option<Uuid>, home_branch_id: Option<Uuid>) -> MemberEntity {
    let now = Utc::now();
    MemberEntity {
        id,
        user_id,
        organization_id: Uuid::new_v4(),
        home_branch_id,
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        status: MemberStatus::Lead.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_user(id: Uuid, email: &str, password_hash: Option<String>) -> UserEntity {
    let now = Utc::now();
    UserEntity {
        id,
        email: email.to_string(),
        password_hash,
        role: "member".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_subscription(
    id: Uuid,
    member_id: Uuid,
    plan_id: Option<Uuid>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: SubscriptionStatus,
) -> SubscriptionEntity {
    let now = Utc::now();
    SubscriptionEntity {
        id,
        member_id,
        plan_id,
        branch_id: None,
        start_date,
        end_date,
        status: status.to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_invoice(
    id: Uuid,
    external_id: Uuid,
    member_id: Uuid,
    subscription_id: Option<Uuid>,
    status: InvoiceStatus,
) -> InvoiceEntity {
    InvoiceEntity {
        id,
        member_id,
        subscription_id,
        branch_id: None,
        external_id,
        amount_minor: 2000,
        tax_amount_minor: 0,
        status: status.to_string(),
        due_at: None,
        paid_at: None,
        created_at: Utc::now(),
    }
}

pub fn sample_visit(
    id: Uuid,
    member_id: Uuid,
    branch_id: Uuid,
    check_in_time: DateTime<Utc>,
    check_out_time: Option<DateTime<Utc>>,
) -> CheckInEntity {
    CheckInEntity {
        id,
        member_id,
        subscription_id: Uuid::new_v4(),
        branch_id,
        check_in_time,
        check_out_time,
        method: "qr".to_string(),
    }
}
