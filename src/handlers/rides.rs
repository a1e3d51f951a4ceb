use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::join_request::{self, JoinRequestStatus};
use crate::entities::ride::{self, RideKind, RideStatus};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::lifecycle;
use crate::utils::fare::{estimate_fare, FareBreakdown};
use crate::utils::geo::haversine_distance;
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocationInput {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct VehicleInput {
    pub model: String,
    pub color: String,
    pub license_plate: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub kind: RideKind,
    pub pickup: LocationInput,
    pub destination: LocationInput,
    pub departure_time: Option<DateTime<Utc>>,
    pub seats: Option<i32>,
    pub vehicle: Option<VehicleInput>,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub model: String,
    pub color: String,
    pub license_plate: String,
}

#[derive(Debug, Serialize)]
pub struct FareResponse {
    pub estimated_fare: f64,
    pub actual_fare: Option<f64>,
    pub breakdown: FareBreakdown,
}

#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub id: Uuid,
    pub kind: RideKind,
    pub status: RideStatus,
    pub status_label: &'static str,
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: LocationResponse,
    pub destination: LocationResponse,
    pub departure_time: Option<DateTime<Utc>>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub vehicle: Option<VehicleResponse>,
    pub fare: FareResponse,
    pub rating: Option<i32>,
    pub cancel_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl RideResponse {
    pub fn from_model(ride: ride::Model) -> Self {
        let vehicle = match (ride.vehicle_model, ride.vehicle_color, ride.license_plate) {
            (Some(model), Some(color), Some(license_plate)) => Some(VehicleResponse {
                model,
                color,
                license_plate,
            }),
            _ => None,
        };

        Self {
            id: ride.id,
            kind: ride.kind,
            status: ride.status,
            status_label: ride.status.display_label(),
            rider_id: ride.rider_id,
            driver_id: ride.driver_id,
            pickup: LocationResponse {
                address: ride.pickup_address,
                lat: ride.pickup_lat,
                lng: ride.pickup_lng,
            },
            destination: LocationResponse {
                address: ride.destination_address,
                lat: ride.destination_lat,
                lng: ride.destination_lng,
            },
            departure_time: ride.departure_time.map(|t| t.with_timezone(&Utc)),
            total_seats: ride.total_seats,
            available_seats: ride.available_seats,
            vehicle,
            fare: FareResponse {
                estimated_fare: ride.estimated_fare,
                actual_fare: ride.actual_fare,
                breakdown: FareBreakdown {
                    base: ride.fare_base,
                    distance: ride.fare_distance,
                    time: ride.fare_time,
                    tax: ride.fare_tax,
                    total: ride.estimated_fare,
                },
            },
            rating: ride.rating,
            cancel_reason: ride.cancel_reason,
            requested_at: ride.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JoinRequestResponse {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub passenger_id: Uuid,
    pub passenger_name: String,
    pub seats: i32,
    pub status: JoinRequestStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RideDetailResponse {
    pub ride: RideResponse,
    pub join_requests: Vec<JoinRequestResponse>,
}

pub(crate) async fn load_ride(db: &DatabaseConnection, id: Uuid) -> AppResult<ride::Model> {
    ride::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))
}

/// Create a ride: passengers request on-demand trips, drivers publish
/// joinable offers.
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRideRequest>,
) -> AppResult<Json<RideResponse>> {
    if payload.pickup.address.trim().is_empty() || payload.destination.address.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Pickup and destination addresses are required".to_string(),
        ));
    }

    if let Some(departure) = payload.departure_time {
        if departure < Utc::now() {
            return Err(AppError::BadRequest(
                "Departure time must be in the future".to_string(),
            ));
        }
    }

    let (total_seats, available_seats, vehicle, driver_id) = match payload.kind {
        RideKind::OnDemand => {
            if claims.role != UserRole::Passenger {
                return Err(AppError::Forbidden(
                    "Only passengers can request rides".to_string(),
                ));
            }

            let seats = payload.seats.unwrap_or(1);
            if seats < 1 {
                return Err(AppError::BadRequest(
                    "Must request at least 1 seat".to_string(),
                ));
            }

            (seats, 0, None, None)
        }
        RideKind::Offer => {
            if claims.role != UserRole::Driver {
                return Err(AppError::Forbidden(
                    "Only drivers can publish ride offers".to_string(),
                ));
            }

            if payload.departure_time.is_none() {
                return Err(AppError::BadRequest(
                    "Ride offers require a departure time".to_string(),
                ));
            }

            let seats = payload.seats.ok_or_else(|| {
                AppError::BadRequest("Ride offers require a seat count".to_string())
            })?;
            if seats < 1 {
                return Err(AppError::BadRequest(
                    "Ride offers require at least 1 seat".to_string(),
                ));
            }

            let vehicle = payload.vehicle.ok_or_else(|| {
                AppError::BadRequest("Ride offers require vehicle details".to_string())
            })?;
            if vehicle.model.trim().is_empty() || vehicle.license_plate.trim().is_empty() {
                return Err(AppError::BadRequest(
                    "Vehicle model and license plate are required".to_string(),
                ));
            }

            (seats, seats, Some(vehicle), Some(claims.sub))
        }
    };

    let distance_km = haversine_distance(
        payload.pickup.lat,
        payload.pickup.lng,
        payload.destination.lat,
        payload.destination.lng,
    );
    let fare = estimate_fare(&state.config.fare_rates, distance_km);

    let new_ride = ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(payload.kind),
        status: Set(RideStatus::Requested),
        rider_id: Set(claims.sub),
        driver_id: Set(driver_id),
        pickup_address: Set(payload.pickup.address),
        pickup_lat: Set(payload.pickup.lat),
        pickup_lng: Set(payload.pickup.lng),
        destination_address: Set(payload.destination.address),
        destination_lat: Set(payload.destination.lat),
        destination_lng: Set(payload.destination.lng),
        departure_time: Set(payload.departure_time.map(Into::into)),
        total_seats: Set(total_seats),
        available_seats: Set(available_seats),
        vehicle_model: Set(vehicle.as_ref().map(|v| v.model.clone())),
        vehicle_color: Set(vehicle.as_ref().map(|v| v.color.clone())),
        license_plate: Set(vehicle.as_ref().map(|v| v.license_plate.clone())),
        estimated_fare: Set(fare.total),
        fare_base: Set(fare.base),
        fare_distance: Set(fare.distance),
        fare_time: Set(fare.time),
        fare_tax: Set(fare.tax),
        actual_fare: Set(None),
        rating: Set(None),
        cancel_reason: Set(None),
        ..Default::default()
    };

    let ride = new_ride.insert(&state.db).await?;

    tracing::info!(ride_id = %ride.id, kind = ?ride.kind, "Ride created");

    Ok(Json(RideResponse::from_model(ride)))
}

/// Get ride details, including the join requests the caller may see
pub async fn get_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideDetailResponse>> {
    let ride = load_ride(&state.db, ride_id).await?;

    let is_rider = ride.rider_id == claims.sub;
    let is_driver = ride.driver_id == Some(claims.sub);

    // On-demand rides are private to the two parties; offers are published
    if ride.kind == RideKind::OnDemand && !is_rider && !is_driver {
        return Err(AppError::Forbidden(
            "You are not part of this ride".to_string(),
        ));
    }

    let requests = join_request::Entity::find()
        .filter(join_request::Column::RideId.eq(ride.id))
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    // The offer owner sees every request; everyone else only their own
    let join_requests: Vec<JoinRequestResponse> = requests
        .into_iter()
        .filter(|r| is_rider || r.passenger_id == claims.sub)
        .map(|r| {
            let passenger = users.iter().find(|u| u.id == r.passenger_id);
            JoinRequestResponse {
                id: r.id,
                ride_id: r.ride_id,
                passenger_id: r.passenger_id,
                passenger_name: passenger.map(|u| u.name.clone()).unwrap_or_default(),
                seats: r.seats,
                status: r.status,
                requested_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(RideDetailResponse {
        ride: RideResponse::from_model(ride),
        join_requests,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CancelRideRequest {
    pub reason: String,
}

/// Cancel a ride. Allowed for the requester and the assigned driver from
/// any non-terminal state.
pub async fn cancel_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
    Json(payload): Json<CancelRideRequest>,
) -> AppResult<Json<RideResponse>> {
    let reason = payload.reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::BadRequest(
            "Cancellation reason is required".to_string(),
        ));
    }

    let ride = load_ride(&state.db, ride_id).await?;

    if ride.rider_id != claims.sub && ride.driver_id != Some(claims.sub) {
        return Err(AppError::Forbidden(
            "You are not part of this ride".to_string(),
        ));
    }

    lifecycle::ensure_ride_transition(ride.status, RideStatus::Cancelled)?;

    // Conditional update: a ride that reached a terminal state in the
    // meantime must not be cancelled twice
    let update = ride::Entity::update_many()
        .set(ride::ActiveModel {
            status: Set(RideStatus::Cancelled),
            cancel_reason: Set(Some(reason)),
            ..Default::default()
        })
        .filter(ride::Column::Id.eq(ride.id))
        .filter(ride::Column::Status.is_in([
            RideStatus::Requested,
            RideStatus::Accepted,
            RideStatus::Arrived,
            RideStatus::InProgress,
        ]))
        .exec(&state.db)
        .await?;

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Ride is already completed or cancelled".to_string(),
        ));
    }

    tracing::info!(ride_id = %ride.id, "Ride cancelled");

    let ride = load_ride(&state.db, ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}

#[derive(Debug, Deserialize)]
pub struct RateRideRequest {
    pub rating: i32,
}

/// Rate a completed ride (requester only, once)
pub async fn rate_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
    Json(payload): Json<RateRideRequest>,
) -> AppResult<Json<RideResponse>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let ride = load_ride(&state.db, ride_id).await?;

    if ride.rider_id != claims.sub {
        return Err(AppError::Forbidden(
            "Only the ride requester can rate it".to_string(),
        ));
    }

    if ride.status != RideStatus::Completed {
        return Err(AppError::Conflict(
            "Only completed rides can be rated".to_string(),
        ));
    }

    let update = ride::Entity::update_many()
        .set(ride::ActiveModel {
            rating: Set(Some(payload.rating)),
            ..Default::default()
        })
        .filter(ride::Column::Id.eq(ride.id))
        .filter(ride::Column::Status.eq(RideStatus::Completed))
        .filter(ride::Column::Rating.is_null())
        .exec(&state.db)
        .await?;

    if update.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Ride has already been rated".to_string(),
        ));
    }

    let ride = load_ride(&state.db, ride_id).await?;
    Ok(Json(RideResponse::from_model(ride)))
}
