use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visamart_api::{
    app,
    state::{AppState, AuthConfig},
};
use visamart_booking::{BookingCoordinator, BookingLifecycle, BookingRepository, ReadTracker};
use visamart_offer::{OfferManager, OfferRepository};
use visamart_store::{DbClient, PostgresBookingRepository, PostgresOfferRepository};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "visamart_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = visamart_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting VisaMart marketplace on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let offers: Arc<dyn OfferRepository> = Arc::new(PostgresOfferRepository::new(db.pool.clone()));
    let bookings: Arc<dyn BookingRepository> =
        Arc::new(PostgresBookingRepository::new(db.pool.clone()));

    let offer_manager = Arc::new(OfferManager::new(offers.clone()));
    let coordinator = Arc::new(BookingCoordinator::new(
        offers.clone(),
        bookings.clone(),
        config.business_rules.booking_reference_prefix.clone(),
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(bookings.clone()));
    let reader = Arc::new(ReadTracker::new(bookings.clone()));

    let app_state = AppState {
        offers,
        bookings,
        offer_manager,
        coordinator,
        lifecycle,
        reader,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
