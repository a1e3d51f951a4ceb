use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::join_request::{self, JoinRequestStatus};
use crate::entities::ride::{self, RideKind, RideStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::handlers::rides::{load_ride, JoinRequestResponse, RideResponse};
use crate::lifecycle;
use crate::utils::jwt::Claims;
use crate::AppState;

/// List rides created by the logged-in passenger
pub async fn user_rides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<RideResponse>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::RiderId.eq(claims.sub))
        .order_by_desc(ride::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rides.into_iter().map(RideResponse::from_model).collect()))
}

#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub id: Uuid,
    pub driver_name: String,
    pub pickup_address: String,
    pub destination_address: String,
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub estimated_fare: f64,
    pub vehicle_model: Option<String>,
    pub vehicle_color: Option<String>,
    pub license_plate: Option<String>,
    pub status: RideStatus,
}

/// List open ride offers a passenger can ask to join
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<OfferResponse>>> {
    let now = Utc::now();
    let offers = ride::Entity::find()
        .filter(ride::Column::Kind.eq(RideKind::Offer))
        .filter(ride::Column::Status.is_in([RideStatus::Requested, RideStatus::Accepted]))
        .filter(ride::Column::AvailableSeats.gt(0))
        .filter(ride::Column::RiderId.ne(claims.sub))
        .order_by_asc(ride::Column::DepartureTime)
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<OfferResponse> = offers
        .into_iter()
        .filter(|o| {
            // Skip offers that already departed
            o.departure_time
                .map(|t| t.with_timezone(&Utc) > now)
                .unwrap_or(false)
        })
        .map(|o| {
            let driver = users.iter().find(|u| u.id == o.rider_id);
            OfferResponse {
                id: o.id,
                driver_name: driver.map(|u| u.name.clone()).unwrap_or_default(),
                pickup_address: o.pickup_address,
                destination_address: o.destination_address,
                departure_time: o.departure_time.map(|t| t.with_timezone(&Utc)),
                total_seats: o.total_seats,
                available_seats: o.available_seats,
                estimated_fare: o.estimated_fare,
                vehicle_model: o.vehicle_model,
                vehicle_color: o.vehicle_color,
                license_plate: o.license_plate,
                status: o.status,
            }
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct JoinRideRequest {
    pub seats: i32,
}

/// Ask to join a ride offer
pub async fn join_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
    Json(payload): Json<JoinRideRequest>,
) -> AppResult<Json<JoinRequestResponse>> {
    let ride = load_ride(&state.db, ride_id).await?;

    if ride.kind != RideKind::Offer {
        return Err(AppError::BadRequest(
            "Ride is not a joinable offer".to_string(),
        ));
    }

    if ride.rider_id == claims.sub {
        return Err(AppError::BadRequest(
            "You cannot join your own ride offer".to_string(),
        ));
    }

    if !ride.status.is_joinable() {
        return Err(AppError::Conflict(
            "Ride is no longer accepting join requests".to_string(),
        ));
    }

    if let Some(departure) = ride.departure_time {
        if departure.with_timezone(&Utc) < Utc::now() {
            return Err(AppError::Conflict("Ride has already departed".to_string()));
        }
    }

    lifecycle::check_requested_seats(payload.seats, ride.available_seats)?;

    // One active request per passenger per ride
    let existing = join_request::Entity::find()
        .filter(join_request::Column::RideId.eq(ride.id))
        .filter(join_request::Column::PassengerId.eq(claims.sub))
        .filter(join_request::Column::Status.is_in([
            JoinRequestStatus::Pending,
            JoinRequestStatus::Accepted,
        ]))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "You already have a request for this ride".to_string(),
        ));
    }

    let new_request = join_request::ActiveModel {
        id: Set(Uuid::new_v4()),
        ride_id: Set(ride.id),
        passenger_id: Set(claims.sub),
        seats: Set(payload.seats),
        status: Set(JoinRequestStatus::Pending),
        ..Default::default()
    };

    let request = new_request.insert(&state.db).await?;

    tracing::info!(ride_id = %ride.id, request_id = %request.id, "Join request created");

    let passenger = user::Entity::find_by_id(claims.sub).one(&state.db).await?;

    Ok(Json(JoinRequestResponse {
        id: request.id,
        ride_id: request.ride_id,
        passenger_id: request.passenger_id,
        passenger_name: passenger.map(|u| u.name).unwrap_or_default(),
        seats: request.seats,
        status: request.status,
        requested_at: request.created_at.with_timezone(&Utc),
    }))
}

/// Withdraw a join request. Seats are restored only when the request had
/// already been accepted.
pub async fn cancel_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let request = join_request::Entity::find_by_id(request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;

    if request.passenger_id != claims.sub {
        return Err(AppError::Forbidden(
            "You can only cancel your own join requests".to_string(),
        ));
    }

    lifecycle::ensure_join_transition(request.status, JoinRequestStatus::Cancelled)?;

    let was_accepted = request.status == JoinRequestStatus::Accepted;

    let txn = state.db.begin().await?;

    let update = join_request::Entity::update_many()
        .set(join_request::ActiveModel {
            status: Set(JoinRequestStatus::Cancelled),
            ..Default::default()
        })
        .filter(join_request::Column::Id.eq(request.id))
        .filter(join_request::Column::Status.eq(request.status))
        .exec(&txn)
        .await?;

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Join request was already handled".to_string(),
        ));
    }

    if was_accepted {
        ride::Entity::update_many()
            .col_expr(
                ride::Column::AvailableSeats,
                Expr::col(ride::Column::AvailableSeats).add(request.seats),
            )
            .filter(ride::Column::Id.eq(request.ride_id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    tracing::info!(request_id = %request.id, "Join request cancelled");

    let ride = load_ride(&state.db, request.ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}
