use std::sync::Arc;

use anyhow::anyhow;
use crates::domain::{
    entities::plans::{InsertPlanEntity, PlanEntity, UpdatePlanEntity},
    repositories::plans::PlanRepository,
    value_objects::{
        payments::{ProductChanges, ProductDraft},
        plans::{CreatePlanModel, UpdatePlanModel},
    },
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::{gateways::PaymentGateway, plan_cache::PlanCache};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    #[error("payment provider request failed")]
    PaymentProvider(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanError::PlanNotFound => StatusCode::NOT_FOUND,
            PlanError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
            PlanError::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            PlanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Cached plan reads plus plan lifecycle mirrored to the provider's product catalogue.
pub struct PlanUseCase<P, G>
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    plan_repo: Arc<P>,
    payment_gateway: Arc<G>,
    cache: Arc<PlanCache>,
}

impl<P, G> PlanUseCase<P, G>
where
    P: PlanRepository + Send + Sync + 'static,
    G: PaymentGateway + 'static,
{
    pub fn new(plan_repo: Arc<P>, payment_gateway: Arc<G>, cache: Arc<PlanCache>) -> Self {
        Self {
            plan_repo,
            payment_gateway,
            cache,
        }
    }

    pub async fn get_plan(&self, plan_id: Uuid) -> PlanResult<PlanEntity> {
        if let Some(plan) = self.cache.get(plan_id) {
            debug!(%plan_id, "plans: cache hit");
            return Ok(plan);
        }

        debug!(%plan_id, "plans: cache miss, loading from store");
        let plan = self.load_plan(plan_id).await?;
        self.cache.put(plan.clone());

        Ok(plan)
    }

    pub async fn create_plan(&self, model: CreatePlanModel) -> PlanResult<PlanEntity> {
        validate_name(&model.name)?;
        validate_price(model.price_minor)?;
        validate_duration(model.duration_days)?;

        info!(
            organization_id = %model.organization_id,
            name = %model.name,
            price_minor = model.price_minor,
            "plans: creating provider product"
        );

        let product_id = self
            .payment_gateway
            .create_product(ProductDraft {
                name: model.name.clone(),
                description: model.description.clone(),
                price_minor: model.price_minor,
            })
            .await
            .map_err(|err| {
                error!(error = ?err, "plans: provider product creation failed");
                PlanError::PaymentProvider(err)
            })?;

        let plan_id = Uuid::parse_str(&product_id).map_err(|err| {
            error!(%product_id, error = ?err, "plans: provider returned non-uuid product id");
            PlanError::Internal(anyhow!("provider product id is not a uuid: {}", product_id))
        })?;

        let plan = self
            .plan_repo
            .create(InsertPlanEntity {
                id: plan_id,
                organization_id: model.organization_id,
                name: model.name,
                description: model.description,
                price_minor: model.price_minor,
                duration_days: model.duration_days,
                is_active: true,
            })
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to persist plan");
                PlanError::Internal(err)
            })?;

        self.cache.put(plan.clone());
        info!(%plan_id, "plans: plan created");

        Ok(plan)
    }

    pub async fn update_plan(&self, plan_id: Uuid, model: UpdatePlanModel) -> PlanResult<PlanEntity> {
        if let Some(name) = model.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(price_minor) = model.price_minor {
            validate_price(price_minor)?;
        }
        if let Some(duration_days) = model.duration_days {
            validate_duration(duration_days)?;
        }

        self.load_plan(plan_id).await?;

        let product_changes = ProductChanges {
            name: model.name.clone(),
            description: model.description.clone(),
            price_minor: model.price_minor,
        };
        if !product_changes.is_empty() {
            self.payment_gateway
                .update_product(plan_id.to_string(), product_changes)
                .await
                .map_err(|err| {
                    error!(%plan_id, error = ?err, "plans: provider product update failed");
                    PlanError::PaymentProvider(err)
                })?;
        }

        let updated = self
            .plan_repo
            .update(
                plan_id,
                UpdatePlanEntity {
                    name: model.name,
                    description: model.description,
                    price_minor: model.price_minor,
                    duration_days: model.duration_days,
                    updated_at: None,
                },
            )
            .await;

        self.cache.invalidate(plan_id);

        let updated = updated
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to update plan");
                PlanError::Internal(err)
            })?
            .ok_or(PlanError::PlanNotFound)?;

        info!(%plan_id, "plans: plan updated");
        Ok(updated)
    }

    pub async fn archive_plan(&self, plan_id: Uuid) -> PlanResult<()> {
        self.load_plan(plan_id).await?;

        self.payment_gateway
            .archive_product(plan_id.to_string())
            .await
            .map_err(|err| {
                error!(%plan_id, error = ?err, "plans: provider product archive failed");
                PlanError::PaymentProvider(err)
            })?;

        let deactivated = self.plan_repo.deactivate(plan_id).await;

        self.cache.invalidate(plan_id);

        let deactivated = deactivated.map_err(|err| {
            error!(%plan_id, db_error = ?err, "plans: failed to deactivate plan");
            PlanError::Internal(err)
        })?;
        if !deactivated {
            warn!(%plan_id, "plans: plan was already inactive");
        }

        info!(%plan_id, "plans: plan archived");
        Ok(())
    }

    async fn load_plan(&self, plan_id: Uuid) -> PlanResult<PlanEntity> {
        self.plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "plans: failed to load plan");
                PlanError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%plan_id, "plans: plan not found");
                PlanError::PlanNotFound
            })
    }
}

fn validate_name(name: &str) -> PlanResult<()> {
    if name.trim().is_empty() {
        return Err(PlanError::InvalidPlan("name is required".to_string()));
    }
    Ok(())
}

fn validate_price(price_minor: i64) -> PlanResult<()> {
    if price_minor < 0 {
        return Err(PlanError::InvalidPlan("price must not be negative".to_string()));
    }
    Ok(())
}

fn validate_duration(duration_days: i32) -> PlanResult<()> {
    if duration_days <= 0 {
        return Err(PlanError::InvalidPlan(
            "duration_days must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::{fixtures::sample_plan, gateways::MockPaymentGateway};
    use crates::domain::repositories::plans::MockPlanRepository;
    use mockall::predicate::eq;

    fn usecase(
        plan_repo: MockPlanRepository,
        gateway: MockPaymentGateway,
        cache: Arc<PlanCache>,
    ) -> PlanUseCase<MockPlanRepository, MockPaymentGateway> {
        PlanUseCase::new(Arc::new(plan_repo), Arc::new(gateway), cache)
    }

    #[tokio::test]
    async fn get_within_ttl_does_not_touch_store() {
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, 2000);

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .times(1)
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = usecase(
            plan_repo,
            MockPaymentGateway::new(),
            Arc::new(PlanCache::default()),
        );

        let first = usecase.get_plan(plan_id).await.unwrap();
        let second = usecase.get_plan(plan_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invalidate_forces_reload_from_store() {
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, 2000);
        let cache = Arc::new(PlanCache::default());

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(plan_id))
            .times(2)
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let usecase = usecase(plan_repo, MockPaymentGateway::new(), Arc::clone(&cache));

        usecase.get_plan(plan_id).await.unwrap();
        cache.invalidate(plan_id);
        usecase.get_plan(plan_id).await.unwrap();
        assert!(cache.get(plan_id).is_some());
    }

    #[tokio::test]
    async fn missing_plan_is_not_found() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = usecase(
            plan_repo,
            MockPaymentGateway::new(),
            Arc::new(PlanCache::default()),
        );

        let err = usecase.get_plan(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PlanError::PlanNotFound));
    }

    #[tokio::test]
    async fn update_invalidates_cached_snapshot() {
        let plan_id = Uuid::new_v4();
        let original = sample_plan(plan_id, 2000);
        let mut repriced = original.clone();
        repriced.price_minor = 2500;
        let cache = Arc::new(PlanCache::default());
        cache.put(original.clone());

        let mut plan_repo = MockPlanRepository::new();
        let current = original.clone();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = current.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });
        let updated = repriced.clone();
        plan_repo
            .expect_update()
            .withf(move |id, changes| *id == plan_id && changes.price_minor == Some(2500))
            .times(1)
            .returning(move |_, _| {
                let plan = updated.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_update_product()
            .withf(move |product_id, changes| {
                *product_id == plan_id.to_string() && changes.price_minor == Some(2500)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let usecase = usecase(plan_repo, gateway, Arc::clone(&cache));

        let result = usecase
            .update_plan(
                plan_id,
                UpdatePlanModel {
                    price_minor: Some(2500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.price_minor, 2500);
        assert!(cache.get(plan_id).is_none());
    }

    #[tokio::test]
    async fn duration_only_update_skips_provider() {
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, 2000);

        let mut plan_repo = MockPlanRepository::new();
        let current = plan.clone();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = current.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });
        plan_repo.expect_update().returning(move |_, _| {
            let mut plan = plan.clone();
            plan.duration_days = 90;
            Box::pin(async move { Ok(Some(plan)) })
        });

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_update_product().never();

        let usecase = usecase(plan_repo, gateway, Arc::new(PlanCache::default()));
        let result = usecase
            .update_plan(
                plan_id,
                UpdatePlanModel {
                    duration_days: Some(90),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.duration_days, 90);
    }

    #[tokio::test]
    async fn archive_invalidates_and_deactivates() {
        let plan_id = Uuid::new_v4();
        let plan = sample_plan(plan_id, 2000);
        let cache = Arc::new(PlanCache::default());
        cache.put(plan.clone());

        let mut plan_repo = MockPlanRepository::new();
        plan_repo.expect_find_by_id().returning(move |_| {
            let plan = plan.clone();
            Box::pin(async move { Ok(Some(plan)) })
        });
        plan_repo
            .expect_deactivate()
            .with(eq(plan_id))
            .times(1)
            .returning(|_| Box::pin(async { Ok(true) }));

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_archive_product()
            .with(eq(plan_id.to_string()))
            .times(1)
            .returning(|_| Ok(()));

        let usecase = usecase(plan_repo, gateway, Arc::clone(&cache));
        usecase.archive_plan(plan_id).await.unwrap();

        assert!(cache.get(plan_id).is_none());
    }

    #[tokio::test]
    async fn create_uses_product_id_as_plan_id() {
        let product_id = Uuid::new_v4();
        let organization_id = Uuid::new_v4();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_product()
            .withf(|draft| draft.price_minor == 2000 && draft.name == "Monthly")
            .times(1)
            .returning(move |_| Ok(product_id.to_string()));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_create()
            .withf(move |plan| plan.id == product_id && plan.duration_days == 30)
            .times(1)
            .returning(move |plan| {
                let mut created = sample_plan(plan.id, plan.price_minor);
                created.organization_id = plan.organization_id;
                Box::pin(async move { Ok(created) })
            });

        let cache = Arc::new(PlanCache::default());
        let usecase = usecase(plan_repo, gateway, Arc::clone(&cache));

        let plan = usecase
            .create_plan(CreatePlanModel {
                organization_id,
                name: "Monthly".to_string(),
                description: None,
                price_minor: 2000,
                duration_days: 30,
            })
            .await
            .unwrap();

        assert_eq!(plan.id, product_id);
        assert_eq!(cache.get(product_id), Some(plan));
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_before_provider_call() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_product().never();

        let usecase = usecase(
            MockPlanRepository::new(),
            gateway,
            Arc::new(PlanCache::default()),
        );

        let err = usecase
            .create_plan(CreatePlanModel {
                organization_id: Uuid::new_v4(),
                name: "Broken".to_string(),
                description: None,
                price_minor: -1,
                duration_days: 30,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidPlan(_)));

        let err = usecase
            .create_plan(CreatePlanModel {
                organization_id: Uuid::new_v4(),
                name: "Broken".to_string(),
                description: None,
                price_minor: 100,
                duration_days: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidPlan(_)));
    }
}
