use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod error;
pub mod middleware;
pub mod offers;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Every route requires an authenticated agency; there is no public
    // surface on this service.
    let marketplace = Router::new()
        .route("/offers", get(offers::list_market).post(offers::create_offer))
        .route("/offers/mine", get(offers::list_mine))
        .route(
            "/offers/{id}",
            get(offers::get_offer)
                .put(offers::update_offer)
                .delete(offers::delete_offer),
        )
        .route("/offers/{id}/status", post(offers::set_offer_status))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::place_booking),
        )
        .route("/bookings/read", post(bookings::mark_read))
        .route("/bookings/unread", get(bookings::unread_counts))
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/reject", post(bookings::reject_booking))
        .route("/bookings/{id}/approve", post(bookings::approve_booking))
        .route("/bookings/{id}/process", post(bookings::process_booking))
        .route("/bookings/{id}/deliver", post(bookings::deliver_booking))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::agency_auth_middleware,
        ));

    Router::new()
        .nest("/v1/marketplace", marketplace)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
