use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// An employee who can receive device allocations and log in.
///
/// `password_hash` is nullable: it is set lazily the first time the employee
/// authenticates with the derived first-login password.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    /// Date of birth as `YYYY-MM-DD`; feeds the first-login password scheme.
    pub birthday: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocation::Entity")]
    Allocations,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EmployeeRole {
    Admin,
    Employee,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Employee => "employee",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_parses_lowercase_names_only() {
        assert_eq!(EmployeeRole::from_str("admin").unwrap(), EmployeeRole::Admin);
        assert_eq!(
            EmployeeRole::from_str("employee").unwrap(),
            EmployeeRole::Employee
        );
        assert!(EmployeeRole::from_str("Admin").is_err());
        assert!(EmployeeRole::from_str("root").is_err());
    }
}
