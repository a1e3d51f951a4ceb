use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::join_request::{self, JoinRequestStatus};
use crate::entities::ride::{self, RideKind, RideStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};
use crate::handlers::rides::{load_ride, RideResponse};
use crate::lifecycle;
use crate::utils::jwt::Claims;
use crate::AppState;

/// List rides where the logged-in driver is the assigned driver
pub async fn driver_rides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<RideResponse>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DriverId.eq(claims.sub))
        .order_by_desc(ride::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(rides.into_iter().map(RideResponse::from_model).collect()))
}

#[derive(Debug, Serialize)]
pub struct AvailableRideResponse {
    pub id: Uuid,
    pub passenger_name: String,
    pub pickup_address: String,
    pub destination_address: String,
    pub seats: i32,
    pub estimated_fare: f64,
    pub requested_at: DateTime<Utc>,
}

/// List unassigned on-demand ride requests a driver can accept
pub async fn available_rides(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AvailableRideResponse>>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::Kind.eq(RideKind::OnDemand))
        .filter(ride::Column::Status.eq(RideStatus::Requested))
        .filter(ride::Column::DriverId.is_null())
        .order_by_asc(ride::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<AvailableRideResponse> = rides
        .into_iter()
        .map(|r| {
            let passenger = users.iter().find(|u| u.id == r.rider_id);
            AvailableRideResponse {
                id: r.id,
                passenger_name: passenger.map(|u| u.name.clone()).unwrap_or_default(),
                pickup_address: r.pickup_address,
                destination_address: r.destination_address,
                seats: r.total_seats,
                estimated_fare: r.estimated_fare,
                requested_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(responses))
}

/// Accept a ride: claims an unassigned on-demand request, or confirms the
/// caller's own offer
pub async fn accept_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let ride = load_ride(&state.db, ride_id).await?;

    lifecycle::ensure_ride_transition(ride.status, RideStatus::Accepted)?;

    let update = match ride.kind {
        RideKind::OnDemand => {
            if ride.driver_id == Some(claims.sub) {
                return Err(AppError::Conflict(
                    "You have already accepted this ride".to_string(),
                ));
            }
            if ride.driver_id.is_some() {
                return Err(AppError::Conflict(
                    "Ride already has a driver".to_string(),
                ));
            }

            // First driver to claim the ride wins
            ride::Entity::update_many()
                .set(ride::ActiveModel {
                    status: Set(RideStatus::Accepted),
                    driver_id: Set(Some(claims.sub)),
                    ..Default::default()
                })
                .filter(ride::Column::Id.eq(ride.id))
                .filter(ride::Column::Status.eq(RideStatus::Requested))
                .filter(ride::Column::DriverId.is_null())
                .exec(&state.db)
                .await?
        }
        RideKind::Offer => {
            if ride.rider_id != claims.sub {
                return Err(AppError::Forbidden(
                    "Only the offer owner can confirm it".to_string(),
                ));
            }

            ride::Entity::update_many()
                .set(ride::ActiveModel {
                    status: Set(RideStatus::Accepted),
                    ..Default::default()
                })
                .filter(ride::Column::Id.eq(ride.id))
                .filter(ride::Column::Status.eq(RideStatus::Requested))
                .exec(&state.db)
                .await?
        }
    };

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Ride is no longer available".to_string(),
        ));
    }

    tracing::info!(ride_id = %ride.id, driver_id = %claims.sub, "Ride accepted");

    let ride = load_ride(&state.db, ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

/// Advance a ride one lifecycle step on behalf of its assigned driver.
/// The status column is only touched when it still holds the expected
/// predecessor, so a resubmitted step reports a conflict.
async fn advance_ride(
    state: &AppState,
    claims: &Claims,
    ride_id: Uuid,
    target: RideStatus,
) -> AppResult<ride::Model> {
    let ride = load_ride(&state.db, ride_id).await?;

    if ride.driver_id != Some(claims.sub) {
        return Err(AppError::Forbidden(
            "You are not the driver for this ride".to_string(),
        ));
    }

    lifecycle::ensure_ride_transition(ride.status, target)?;

    let expected = target
        .required_predecessor()
        .ok_or_else(|| AppError::Internal(format!("{} is not a forward step", target.as_str())))?;

    let mut changes = ride::ActiveModel {
        status: Set(target),
        ..Default::default()
    };
    if target == RideStatus::Completed {
        // Fare is settled at completion; fall back to the estimate
        changes.actual_fare = Set(Some(ride.actual_fare.unwrap_or(ride.estimated_fare)));
    }

    let update = ride::Entity::update_many()
        .set(changes)
        .filter(ride::Column::Id.eq(ride.id))
        .filter(ride::Column::Status.eq(expected))
        .exec(&state.db)
        .await?;

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Ride was updated concurrently".to_string(),
        ));
    }

    tracing::info!(ride_id = %ride.id, status = target.as_str(), "Ride advanced");

    load_ride(&state.db, ride_id).await
}

/// Mark the driver as arrived at the pickup point
pub async fn driver_arrived(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let ride = advance_ride(&state, &claims, ride_id, RideStatus::Arrived).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

/// Start the ride
pub async fn start_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let ride = advance_ride(&state, &claims, ride_id, RideStatus::InProgress).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

/// Complete the ride and settle the fare
pub async fn complete_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let ride = advance_ride(&state, &claims, ride_id, RideStatus::Completed).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

/// Accept a join request: the seat decrement and the status flip happen in
/// one transaction, both as conditional updates
pub async fn accept_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let request = join_request::Entity::find_by_id(request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;

    let ride = load_ride(&state.db, request.ride_id).await?;

    if ride.rider_id != claims.sub {
        return Err(AppError::Forbidden(
            "Only the ride owner can accept join requests".to_string(),
        ));
    }

    if !ride.status.is_joinable() {
        return Err(AppError::Conflict(
            "Ride is no longer accepting passengers".to_string(),
        ));
    }

    lifecycle::ensure_join_transition(request.status, JoinRequestStatus::Accepted)?;

    let txn = state.db.begin().await?;

    // Atomic check-and-decrement: overselling is impossible even under
    // concurrent accepts
    let seats_update = ride::Entity::update_many()
        .col_expr(
            ride::Column::AvailableSeats,
            Expr::col(ride::Column::AvailableSeats).sub(request.seats),
        )
        .filter(ride::Column::Id.eq(ride.id))
        .filter(ride::Column::AvailableSeats.gte(request.seats))
        .exec(&txn)
        .await?;

    if seats_update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Not enough seats available".to_string(),
        ));
    }

    let status_update = join_request::Entity::update_many()
        .set(join_request::ActiveModel {
            status: Set(JoinRequestStatus::Accepted),
            ..Default::default()
        })
        .filter(join_request::Column::Id.eq(request.id))
        .filter(join_request::Column::Status.eq(JoinRequestStatus::Pending))
        .exec(&txn)
        .await?;

    if status_update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Join request was already handled".to_string(),
        ));
    }

    txn.commit().await?;

    tracing::info!(request_id = %request.id, ride_id = %ride.id, "Join request accepted");

    let ride = load_ride(&state.db, request.ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

/// Reject a join request; seats are untouched
pub async fn reject_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<RideResponse>> {
    let request = join_request::Entity::find_by_id(request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Join request not found".to_string()))?;

    let ride = load_ride(&state.db, request.ride_id).await?;

    if ride.rider_id != claims.sub {
        return Err(AppError::Forbidden(
            "Only the ride owner can reject join requests".to_string(),
        ));
    }

    lifecycle::ensure_join_transition(request.status, JoinRequestStatus::Rejected)?;

    let update = join_request::Entity::update_many()
        .set(join_request::ActiveModel {
            status: Set(JoinRequestStatus::Rejected),
            ..Default::default()
        })
        .filter(join_request::Column::Id.eq(request.id))
        .filter(join_request::Column::Status.eq(JoinRequestStatus::Pending))
        .exec(&state.db)
        .await?;

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Join request was already handled".to_string(),
        ));
    }

    tracing::info!(request_id = %request.id, ride_id = %ride.id, "Join request rejected");

    let ride = load_ride(&state.db, request.ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

#[derive(Debug, Serialize)]
pub struct EarningsResponse {
    pub completed_rides: usize,
    pub total_earnings: f64,
}

/// Earnings summary over the driver's completed rides
pub async fn earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<EarningsResponse>> {
    let rides = ride::Entity::find()
        .filter(ride::Column::DriverId.eq(claims.sub))
        .filter(ride::Column::Status.eq(RideStatus::Completed))
        .all(&state.db)
        .await?;

    let total: f64 = rides
        .iter()
        .map(|r| r.actual_fare.unwrap_or(r.estimated_fare))
        .sum();

    Ok(Json(EarningsResponse {
        completed_rides: rides.len(),
        total_earnings: total,
    }))
}
