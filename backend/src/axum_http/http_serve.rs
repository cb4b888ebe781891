use crate::{
    auth::tokens::TokenIssuer,
    axum_http::{default_routers, routers},
    background_worker::expiry_sweep::spawn_expiry_sweep,
    config::config_model::DotEnvyConfig,
    usecases::{
        auth::AuthUseCase, check_ins::CheckInUseCase,
        checkout_completion::CheckoutCompletionUseCase, invoices::InvoiceUseCase,
        members::MemberUseCase,
        plan_cache::PlanCache, plans::PlanUseCase,
        subscriptions::{ExpirySweeper, SubscriptionUseCase},
    },
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            check_ins::CheckInPostgres, invoices::InvoicePostgres, members::MemberPostgres,
            plans::PlanPostgres, subscriptions::SubscriptionPostgres, users::UserPostgres,
        },
    },
    notifications::{dispatcher::NotificationDispatcher, resend_client::ResendClient},
    payments::polar_client::PolarClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let token_issuer = Arc::new(TokenIssuer::new(&config.auth.jwt_secret));
    let plan_cache = Arc::new(PlanCache::new(Duration::from_secs(
        config.plan_cache.ttl_seconds,
    )));

    let polar_client = Arc::new(PolarClient::new(
        config.polar.access_token.clone(),
        &config.polar.webhook_secret,
        config.polar.environment,
        config.polar.organization_id.clone(),
    )?);
    let resend_client = ResendClient::new(
        config.email.resend_api_key.clone(),
        &config.email.from_address,
        config.email.from_name.as_deref(),
    );
    let notifications = Arc::new(NotificationDispatcher::spawn(Arc::new(resend_client)));

    let plan_repo = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let invoice_repo = Arc::new(InvoicePostgres::new(Arc::clone(&db_pool)));
    let member_repo = Arc::new(MemberPostgres::new(Arc::clone(&db_pool)));
    let user_repo = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let check_in_repo = Arc::new(CheckInPostgres::new(Arc::clone(&db_pool)));

    let plan_usecase = Arc::new(PlanUseCase::new(
        Arc::clone(&plan_repo),
        Arc::clone(&polar_client),
        plan_cache,
    ));
    let subscription_usecase = Arc::new(SubscriptionUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&invoice_repo),
        Arc::clone(&member_repo),
        Arc::clone(&user_repo),
        Arc::clone(&plan_usecase),
        Arc::clone(&polar_client),
        Arc::clone(&notifications),
        config.app.login_url(),
    ));
    let checkout_completion_usecase = Arc::new(CheckoutCompletionUseCase::new(
        Arc::clone(&invoice_repo),
        Arc::clone(&subscription_repo),
        Arc::clone(&member_repo),
        Arc::clone(&user_repo),
        Arc::clone(&polar_client),
        Arc::clone(&notifications),
        config.app.login_url(),
    ));
    let check_in_usecase = Arc::new(CheckInUseCase::new(
        check_in_repo,
        Arc::clone(&subscription_repo),
        Arc::clone(&member_repo),
        Arc::clone(&token_issuer),
    ));
    let member_usecase = Arc::new(MemberUseCase::new(
        Arc::clone(&member_repo),
        Arc::clone(&user_repo),
        Arc::clone(&subscription_usecase),
    ));
    let invoice_usecase = Arc::new(InvoiceUseCase::new(Arc::clone(&invoice_repo)));
    let auth_usecase = Arc::new(AuthUseCase::new(user_repo, Arc::clone(&token_issuer)));

    let sweeper: Arc<dyn ExpirySweeper> = subscription_usecase.clone();
    let _expiry_sweep = spawn_expiry_sweep(
        Arc::clone(&sweeper),
        Duration::from_secs(config.expiry_sweep.interval_seconds),
    );

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1/auth", routers::auth::routes(auth_usecase))
        .nest(
            "/api/v1/members",
            routers::members::routes(member_usecase, Arc::clone(&check_in_usecase)),
        )
        .nest(
            "/api/v1/check-ins",
            routers::check_ins::routes(check_in_usecase),
        )
        .nest(
            "/api/v1/subscriptions",
            routers::subscriptions::routes(subscription_usecase),
        )
        .nest("/api/v1/plans", routers::plans::routes(plan_usecase))
        .nest(
            "/api/v1/invoices",
            routers::invoices::routes(invoice_usecase),
        )
        .nest(
            "/api/v1/webhooks",
            routers::webhooks::routes(checkout_completion_usecase),
        )
        .nest(
            "/internal/v1",
            routers::internal::routes(config.expiry_sweep.internal_token.clone(), sweeper),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(token_issuer))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = ?err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = ?err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
