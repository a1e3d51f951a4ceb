use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the ride was requested on demand by a passenger or published
/// ahead of time by a driver as a joinable offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ride_kind")]
#[serde(rename_all = "snake_case")]
pub enum RideKind {
    #[sea_orm(string_value = "on_demand")]
    OnDemand,
    #[sea_orm(string_value = "offer")]
    Offer,
}

/// Canonical ride lifecycle. This is the only status vocabulary stored or
/// exchanged; display labels are derived in `lifecycle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ride_status")]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[sea_orm(string_value = "requested")]
    Requested,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "arrived")]
    Arrived,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ride")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: RideKind,
    pub status: RideStatus,
    /// The creating user: the passenger for on-demand rides, the driver
    /// for offers.
    pub rider_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_address: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub destination_address: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub departure_time: Option<DateTimeWithTimeZone>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub vehicle_model: Option<String>,
    pub vehicle_color: Option<String>,
    pub license_plate: Option<String>,
    pub estimated_fare: f64,
    pub fare_base: f64,
    pub fare_distance: f64,
    pub fare_time: f64,
    pub fare_tax: f64,
    pub actual_fare: Option<f64>,
    pub rating: Option<i32>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RiderId",
        to = "super::user::Column::Id"
    )]
    Rider,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::DriverId",
        to = "super::user::Column::Id"
    )]
    Driver,
    #[sea_orm(has_many = "super::join_request::Entity")]
    JoinRequests,
}

impl Related<super::join_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JoinRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
