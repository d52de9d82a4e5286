use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// A tracked hardware asset. `available_resource_count` is denormalized and
/// kept in the range `0..=total_resource_count` by the allocation service.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub resource_type_id: Uuid,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub serial_number: Option<String>,
    pub asset_tag: Option<String>,
    pub vendor_name: Option<String>,
    pub purchase_cost: Option<Decimal>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_expiry_date: Option<DateTime<Utc>>,
    pub last_service_date: Option<DateTime<Utc>>,
    pub total_resource_count: i32,
    pub available_resource_count: i32,
    pub status: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource_type::Entity",
        from = "Column::ResourceTypeId",
        to = "super::resource_type::Column::Id"
    )]
    ResourceType,
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
}

impl Related<super::resource_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceType.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}

/// Lifecycle status of a resource record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum ResourceStatus {
    Available,
    Allocated,
    #[strum(serialize = "Under Repair")]
    UnderRepair,
    Retired,
}

impl ResourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Allocated => "Allocated",
            Self::UnderRepair => "Under Repair",
            Self::Retired => "Retired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ResourceStatus::Available,
            ResourceStatus::Allocated,
            ResourceStatus::UnderRepair,
            ResourceStatus::Retired,
        ] {
            assert_eq!(ResourceStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ResourceStatus::from_str("Broken").is_err());
    }
}
