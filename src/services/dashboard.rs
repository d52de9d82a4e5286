use crate::{
    entities::{allocation, allocation::AllocationStatus, employee, resource},
    errors::ServiceError,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Aggregate counts shown on the admin dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_employees: u64,
    pub total_resources: u64,
    /// Units tracked across all resources.
    pub total_units: i64,
    /// Units currently on the shelf.
    pub available_units: i64,
    /// Units currently in employees' hands.
    pub allocated_units: i64,
    pub open_allocations: u64,
}

/// Read-only aggregation over the other aggregates
#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let total_employees = employee::Entity::find()
            .filter(employee::Column::IsDeleted.eq(false))
            .count(&*self.db)
            .await?;

        let total_resources = resource::Entity::find()
            .filter(resource::Column::IsDeleted.eq(false))
            .count(&*self.db)
            .await?;

        let sums: Option<(Option<i64>, Option<i64>)> = resource::Entity::find()
            .select_only()
            .column_as(resource::Column::TotalResourceCount.sum(), "total_units")
            .column_as(
                resource::Column::AvailableResourceCount.sum(),
                "available_units",
            )
            .filter(resource::Column::IsDeleted.eq(false))
            .into_tuple()
            .one(&*self.db)
            .await?;

        let (total_units, available_units) = match sums {
            Some((total, available)) => (total.unwrap_or(0), available.unwrap_or(0)),
            None => (0, 0),
        };

        let open_allocations = allocation::Entity::find()
            .filter(allocation::Column::Status.eq(AllocationStatus::Allocated.as_str()))
            .count(&*self.db)
            .await?;

        Ok(DashboardSummary {
            total_employees,
            total_resources,
            total_units,
            available_units,
            allocated_units: total_units - available_units,
            open_allocations,
        })
    }
}
