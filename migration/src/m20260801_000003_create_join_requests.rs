use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use super::m20260801_000001_create_users::User;
use super::m20260801_000002_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(JoinRequestStatus::Enum)
                    .values([
                        JoinRequestStatus::Pending,
                        JoinRequestStatus::Accepted,
                        JoinRequestStatus::Rejected,
                        JoinRequestStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JoinRequest::Table)
                    .if_not_exists()
                    .col(uuid(JoinRequest::Id).primary_key())
                    .col(uuid(JoinRequest::RideId).not_null())
                    .col(uuid(JoinRequest::PassengerId).not_null())
                    .col(integer(JoinRequest::Seats).not_null())
                    .col(
                        ColumnDef::new(JoinRequest::Status)
                            .custom(JoinRequestStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(JoinRequest::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_ride")
                            .from(JoinRequest::Table, JoinRequest::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_join_request_passenger")
                            .from(JoinRequest::Table, JoinRequest::PassengerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JoinRequest::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(JoinRequestStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum JoinRequest {
    Table,
    Id,
    RideId,
    PassengerId,
    Seats,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum JoinRequestStatus {
    #[sea_orm(iden = "join_request_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "rejected")]
    Rejected,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
