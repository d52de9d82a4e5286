use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// One assignment event linking an employee to a resource.
///
/// Created with status `Allocated`; mutated exactly once when the unit is
/// closed out (`Returned`, `Lost` or `Damage`), otherwise immutable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub resource_id: Uuid,
    pub employee_id: Uuid,
    pub allocated_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource::Entity",
        from = "Column::ResourceId",
        to = "super::resource::Column::Id"
    )]
    Resource,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::resource::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Resource.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
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

/// Lifecycle status of an allocation record.
///
/// Only `Allocated` and `Returned` participate in availability counting;
/// `Lost` and `Damage` are terminal close-out statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum AllocationStatus {
    Allocated,
    Returned,
    Lost,
    Damage,
}

impl AllocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allocated => "Allocated",
            Self::Returned => "Returned",
            Self::Lost => "Lost",
            Self::Damage => "Damage",
        }
    }

    /// Whether this status closes out an open allocation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Allocated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn only_allocated_is_open() {
        assert!(!AllocationStatus::Allocated.is_terminal());
        assert!(AllocationStatus::Returned.is_terminal());
        assert!(AllocationStatus::Lost.is_terminal());
        assert!(AllocationStatus::Damage.is_terminal());
    }

    #[test]
    fn status_parses_from_wire_strings() {
        assert_eq!(
            AllocationStatus::from_str("Returned").unwrap(),
            AllocationStatus::Returned
        );
        assert!(AllocationStatus::from_str("returned").is_err());
    }
}
