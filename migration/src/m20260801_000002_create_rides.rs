use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(RideKind::Enum)
                    .values([RideKind::OnDemand, RideKind::Offer])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(RideStatus::Enum)
                    .values([
                        RideStatus::Requested,
                        RideStatus::Accepted,
                        RideStatus::Arrived,
                        RideStatus::InProgress,
                        RideStatus::Completed,
                        RideStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    .col(ColumnDef::new(Ride::Kind).custom(RideKind::Enum).not_null())
                    .col(
                        ColumnDef::new(Ride::Status)
                            .custom(RideStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid(Ride::RiderId).not_null())
                    .col(uuid_null(Ride::DriverId))
                    .col(string(Ride::PickupAddress).not_null())
                    .col(double(Ride::PickupLat).not_null())
                    .col(double(Ride::PickupLng).not_null())
                    .col(string(Ride::DestinationAddress).not_null())
                    .col(double(Ride::DestinationLat).not_null())
                    .col(double(Ride::DestinationLng).not_null())
                    .col(timestamp_with_time_zone_null(Ride::DepartureTime))
                    .col(integer(Ride::TotalSeats).not_null())
                    .col(integer(Ride::AvailableSeats).not_null())
                    .col(string_null(Ride::VehicleModel))
                    .col(string_null(Ride::VehicleColor))
                    .col(string_null(Ride::LicensePlate))
                    .col(double(Ride::EstimatedFare).not_null())
                    .col(double(Ride::FareBase).not_null())
                    .col(double(Ride::FareDistance).not_null())
                    .col(double(Ride::FareTime).not_null())
                    .col(double(Ride::FareTax).not_null())
                    .col(double_null(Ride::ActualFare))
                    .col(integer_null(Ride::Rating))
                    .col(string_null(Ride::CancelReason))
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_rider")
                            .from(Ride::Table, Ride::RiderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RideStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RideKind::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    Kind,
    Status,
    RiderId,
    DriverId,
    PickupAddress,
    PickupLat,
    PickupLng,
    DestinationAddress,
    DestinationLat,
    DestinationLng,
    DepartureTime,
    TotalSeats,
    AvailableSeats,
    VehicleModel,
    VehicleColor,
    LicensePlate,
    EstimatedFare,
    FareBase,
    FareDistance,
    FareTime,
    FareTax,
    ActualFare,
    Rating,
    CancelReason,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum RideKind {
    #[sea_orm(iden = "ride_kind")]
    Enum,
    #[sea_orm(iden = "on_demand")]
    OnDemand,
    #[sea_orm(iden = "offer")]
    Offer,
}

#[derive(DeriveIden)]
pub enum RideStatus {
    #[sea_orm(iden = "ride_status")]
    Enum,
    #[sea_orm(iden = "requested")]
    Requested,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "arrived")]
    Arrived,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
