use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use crates::domain::{
    entities::check_ins::{CheckInEntity, InsertCheckInEntity},
    repositories::{
        check_ins::CheckInRepository, members::MemberRepository,
        subscriptions::SubscriptionRepository,
    },
    value_objects::{
        check_ins::{
            AttendanceDayDto, QrTokenDto, ScanOutcome, VisitDto, VisitState,
            VisitTransitionError, attendance_by_day,
        },
        enums::visit_intents::VisitIntent,
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::tokens::{QrClaims, TokenError, TokenIssuer};

const QR_METHOD: &str = "qr";
const MAX_ATTENDANCE_DAYS: i64 = 366;

#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("QR code is invalid or expired")]
    InvalidQr,
    #[error("member not found")]
    MemberNotFound,
    #[error("member has no active subscription")]
    NoActiveSubscription,
    #[error("member has no home branch")]
    NoHomeBranch,
    #[error("member already has an open visit")]
    VisitAlreadyOpen,
    #[error("member has no open visit to check out")]
    NoOpenSession,
    #[error("invalid date range: {0}")]
    InvalidRange(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CheckInError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            CheckInError::InvalidQr => StatusCode::UNAUTHORIZED,
            CheckInError::MemberNotFound => StatusCode::NOT_FOUND,
            CheckInError::NoHomeBranch | CheckInError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            CheckInError::NoActiveSubscription
            | CheckInError::VisitAlreadyOpen
            | CheckInError::NoOpenSession => StatusCode::CONFLICT,
            CheckInError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type CheckInResult<T> = std::result::Result<T, CheckInError>;

pub struct CheckInUseCase<C, S, M>
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    check_in_repo: Arc<C>,
    subscription_repo: Arc<S>,
    member_repo: Arc<M>,
    token_issuer: Arc<TokenIssuer>,
}

impl<C, S, M> CheckInUseCase<C, S, M>
where
    C: CheckInRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    M: MemberRepository + Send + Sync + 'static,
{
    pub fn new(
        check_in_repo: Arc<C>,
        subscription_repo: Arc<S>,
        member_repo: Arc<M>,
        token_issuer: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            check_in_repo,
            subscription_repo,
            member_repo,
            token_issuer,
        }
    }

    /// The intent is fixed at issue time: an open visit yields a check-out code.
    pub async fn issue_qr_token(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> CheckInResult<QrTokenDto> {
        let member = self
            .member_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "check_ins: failed to load member");
                CheckInError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, "check_ins: no member for user");
                CheckInError::MemberNotFound
            })?;

        let open_visit = self.find_open_visit(member.id).await?;
        let state = open_visit.as_ref().map(|visit| visit.state());
        let intent = VisitState::next_intent(state.as_ref());

        let issued = self
            .token_issuer
            .issue_qr(user_id, member.id, intent, now)?;

        info!(%user_id, member_id = %member.id, %intent, "check_ins: QR token issued");

        Ok(QrTokenDto {
            token: issued.token,
            intent,
            expires_at: issued.expires_at,
        })
    }

    pub async fn scan(&self, token: &str, now: DateTime<Utc>) -> CheckInResult<ScanOutcome> {
        let claims = self.token_issuer.validate_qr(token).map_err(|err| {
            match err {
                TokenError::Expired => warn!("check_ins: scanned QR token expired"),
                TokenError::Invalid => warn!("check_ins: scanned QR token invalid"),
            }
            CheckInError::InvalidQr
        })?;

        match claims.intent {
            VisitIntent::CheckIn => self.check_in(claims, now).await,
            VisitIntent::CheckOut => self.check_out(claims, now).await,
        }
    }

    pub async fn branch_sessions(&self, branch_id: Uuid) -> CheckInResult<Vec<VisitDto>> {
        let visits = self
            .check_in_repo
            .list_by_branch(branch_id)
            .await
            .map_err(|err| {
                error!(%branch_id, db_error = ?err, "check_ins: failed to list branch visits");
                CheckInError::Internal(err)
            })?;

        Ok(visits.into_iter().map(VisitDto::from).collect())
    }

    pub async fn visitor_count(&self, branch_id: Uuid) -> CheckInResult<i64> {
        self.check_in_repo
            .count_open_by_branch(branch_id)
            .await
            .map_err(|err| {
                error!(%branch_id, db_error = ?err, "check_ins: failed to count visitors");
                CheckInError::Internal(err)
            })
    }

    pub async fn attendance(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CheckInResult<Vec<AttendanceDayDto>> {
        if to < from {
            return Err(CheckInError::InvalidRange(
                "end date precedes start date".to_string(),
            ));
        }
        if (to - from).num_days() >= MAX_ATTENDANCE_DAYS {
            return Err(CheckInError::InvalidRange(format!(
                "at most {MAX_ATTENDANCE_DAYS} days per request"
            )));
        }

        let member = self
            .member_repo
            .find_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "check_ins: failed to load member");
                CheckInError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, "check_ins: no member for user");
                CheckInError::MemberNotFound
            })?;

        let until = to
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CheckInError::InvalidRange("end date out of range".to_string()))?;
        let visits = self
            .check_in_repo
            .list_by_member_between(
                member.id,
                from.and_time(chrono::NaiveTime::MIN).and_utc(),
                until.and_time(chrono::NaiveTime::MIN).and_utc(),
            )
            .await
            .map_err(|err| {
                error!(member_id = %member.id, db_error = ?err, "check_ins: failed to list member visits");
                CheckInError::Internal(err)
            })?;

        Ok(attendance_by_day(&visits, from, to))
    }

    async fn check_in(&self, claims: QrClaims, now: DateTime<Utc>) -> CheckInResult<ScanOutcome> {
        let member_id = claims.mid;

        let subscription = self
            .subscription_repo
            .find_active_by_member_id(member_id, now.date_naive())
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "check_ins: failed to load active subscription");
                CheckInError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%member_id, "check_ins: check-in without active subscription");
                CheckInError::NoActiveSubscription
            })?;

        let member = self
            .member_repo
            .find_by_id(member_id)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "check_ins: failed to load member");
                CheckInError::Internal(err)
            })?
            .ok_or(CheckInError::MemberNotFound)?;

        if member.user_id != Some(claims.uid) {
            warn!(%member_id, user_id = %claims.uid, "check_ins: QR subject does not own member");
            return Err(CheckInError::InvalidQr);
        }

        let branch_id = member.home_branch_id.ok_or_else(|| {
            warn!(%member_id, "check_ins: member has no home branch");
            CheckInError::NoHomeBranch
        })?;

        if self.find_open_visit(member_id).await?.is_some() {
            warn!(%member_id, "check_ins: check-in while a visit is open");
            return Err(CheckInError::VisitAlreadyOpen);
        }

        let visit = self
            .check_in_repo
            .open_visit(InsertCheckInEntity {
                member_id,
                subscription_id: subscription.id,
                branch_id,
                check_in_time: now,
                method: QR_METHOD.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "check_ins: failed to open visit");
                CheckInError::Internal(err)
            })?
            // A concurrent scan won the open-visit slot.
            .ok_or(CheckInError::VisitAlreadyOpen)?;

        info!(%member_id, %branch_id, check_in_id = %visit.id, "check_ins: member checked in");

        Ok(ScanOutcome::CheckedIn {
            check_in_id: visit.id,
            member_id,
            branch_id,
            checked_in_at: visit.check_in_time,
        })
    }

    async fn check_out(&self, claims: QrClaims, now: DateTime<Utc>) -> CheckInResult<ScanOutcome> {
        let member_id = claims.mid;

        let visit = self.find_open_visit(member_id).await?.ok_or_else(|| {
            warn!(%member_id, "check_ins: check-out without open visit");
            CheckInError::NoOpenSession
        })?;

        visit
            .state()
            .close(visit.check_in_time, now)
            .map_err(|err| match err {
                VisitTransitionError::AlreadyClosed => CheckInError::NoOpenSession,
                VisitTransitionError::CheckOutBeforeCheckIn => {
                    error!(%member_id, check_in_id = %visit.id, "check_ins: clock went backwards");
                    CheckInError::Internal(err.into())
                }
            })?;

        let closed = self
            .check_in_repo
            .close_visit(visit.id, now)
            .await
            .map_err(|err| {
                error!(check_in_id = %visit.id, db_error = ?err, "check_ins: failed to close visit");
                CheckInError::Internal(err)
            })?;
        if !closed {
            warn!(%member_id, check_in_id = %visit.id, "check_ins: visit closed concurrently");
            return Err(CheckInError::NoOpenSession);
        }

        info!(%member_id, check_in_id = %visit.id, "check_ins: member checked out");

        Ok(ScanOutcome::CheckedOut {
            check_in_id: visit.id,
            member_id,
            checked_out_at: now,
        })
    }

    async fn find_open_visit(
        &self,
        member_id: Uuid,
    ) -> CheckInResult<Option<CheckInEntity>> {
        self.check_in_repo
            .find_open_by_member_id(member_id)
            .await
            .map_err(|err| {
                error!(%member_id, db_error = ?err, "check_ins: failed to load open visit");
                CheckInError::Internal(err)
            })
    }
}
