use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{auth, driver, passenger, rides};
use crate::middleware::auth::{auth_middleware, require_driver, require_passenger};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Create role-specific governor layers
    let driver_governor = create_role_governor(RateLimitedRole::Driver);
    let passenger_governor = create_role_governor(RateLimitedRole::Passenger);
    let earnings_governor = create_role_governor(RateLimitedRole::Driver);
    // Create IP-based governor for public routes
    let public_governor = create_public_governor();

    // Public routes (rate limited per IP)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor);

    // Passenger-only ride routes
    // Rate limit: 100 requests per minute
    let passenger_ride_routes = Router::new()
        .route("/user-rides", get(passenger::user_rides))
        .route("/offers", get(passenger::list_offers))
        .route("/offers/{id}/join", post(passenger::join_offer))
        .route(
            "/join-requests/{id}/cancel",
            patch(passenger::cancel_join_request),
        )
        .layer(passenger_governor)
        .layer(middleware::from_fn(require_passenger));

    // Driver-only ride routes
    // Rate limit: 500 requests per minute (drivers poll active rides)
    let driver_ride_routes = Router::new()
        .route("/driver-rides", get(driver::driver_rides))
        .route("/available", get(driver::available_rides))
        .route("/{id}/accept", patch(driver::accept_ride))
        .route("/{id}/driver-arrived", patch(driver::driver_arrived))
        .route("/{id}/start", patch(driver::start_ride))
        .route("/{id}/complete", patch(driver::complete_ride))
        .route(
            "/join-requests/{id}/accept",
            patch(driver::accept_join_request),
        )
        .route(
            "/join-requests/{id}/reject",
            patch(driver::reject_join_request),
        )
        .layer(driver_governor)
        .layer(middleware::from_fn(require_driver));

    // Routes shared by both parties of a ride (ownership checked in handlers)
    let shared_ride_routes = Router::new()
        .route("/", post(rides::create_ride))
        .route("/{id}", get(rides::get_ride))
        .route("/{id}/cancel", patch(rides::cancel_ride))
        .route("/{id}/rate", post(rides::rate_ride));

    let ride_routes = passenger_ride_routes
        .merge(driver_ride_routes)
        .merge(shared_ride_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Driver account routes (requires auth + driver role)
    let driver_routes = Router::new()
        .route("/earnings", get(driver::earnings))
        .layer(earnings_governor)
        .layer(middleware::from_fn(require_driver))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/rides", ride_routes)
        .nest("/api/driver", driver_routes)
        .with_state(state)
}
