use crate::{
    entities::{
        allocation,
        allocation::AllocationStatus,
        employee, resource,
        resource::ResourceStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Request body for assigning a unit to an employee.
///
/// Wire format is camelCase to match the established client contract.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllocationRequest {
    pub resource_id: Uuid,
    pub employee_id: Uuid,
    /// Defaults to now when omitted.
    pub assigned_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Request body for closing out an allocation.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CloseAllocationRequest {
    /// Defaults to now when omitted.
    pub return_date: Option<DateTime<Utc>>,
    /// `Returned` (default), `Lost` or `Damage`.
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// An allocation row with the employee and resource names resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationDetail {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub allocated_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query filters for the allocation listings
#[derive(Debug, Default, Clone)]
pub struct AllocationFilter {
    pub resource_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Service for the allocate / return workflow
#[derive(Clone)]
pub struct AllocationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AllocationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Assigns one unit of a resource to an employee.
    ///
    /// Availability is taken with a single conditional decrement so two
    /// concurrent requests can never both consume the last unit.
    #[instrument(skip(self, request), fields(resource_id = %request.resource_id, employee_id = %request.employee_id))]
    pub async fn create_allocation(
        &self,
        request: CreateAllocationRequest,
    ) -> Result<AllocationDetail, ServiceError> {
        let employee = employee::Entity::find_by_id(request.employee_id)
            .filter(employee::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Employee {} not found", request.employee_id))
            })?;

        let resource = resource::Entity::find_by_id(request.resource_id)
            .filter(resource::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Resource {} not found", request.resource_id))
            })?;

        let txn = self.db.begin().await?;

        let taken = resource::Entity::update_many()
            .col_expr(
                resource::Column::AvailableResourceCount,
                Expr::col(resource::Column::AvailableResourceCount).sub(1),
            )
            .col_expr(
                resource::Column::Status,
                Expr::value(ResourceStatus::Allocated.as_str()),
            )
            .col_expr(resource::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(resource::Column::Id.eq(request.resource_id))
            .filter(resource::Column::IsDeleted.eq(false))
            .filter(resource::Column::AvailableResourceCount.gt(0))
            .exec(&txn)
            .await?;

        if taken.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(
                "No available units to allocate".to_string(),
            ));
        }

        let allocated_date = request.assigned_date.unwrap_or_else(Utc::now);
        let active = allocation::ActiveModel {
            id: Set(Uuid::new_v4()),
            resource_id: Set(request.resource_id),
            employee_id: Set(request.employee_id),
            allocated_date: Set(allocated_date),
            return_date: Set(None),
            status: Set(AllocationStatus::Allocated.as_str().to_string()),
            notes: Set(request.notes),
            ..Default::default()
        };

        let model = active.insert(&txn).await.map_err(|e| {
            error!(error = %e, "Failed to insert allocation");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await?;

        info!(allocation_id = %model.id, "Allocation created");
        self.event_sender
            .send_or_log(Event::AllocationCreated {
                allocation_id: model.id,
                resource_id: model.resource_id,
                employee_id: model.employee_id,
            })
            .await;

        Ok(to_detail(model, &resource.name, &employee.name))
    }

    /// Closes an open allocation as `Returned`, `Lost` or `Damage`.
    ///
    /// A returned unit replenishes availability; lost and damaged units are
    /// written off by shrinking the tracked unit count instead.
    #[instrument(skip(self, request), fields(allocation_id = %id))]
    pub async fn close_allocation(
        &self,
        id: Uuid,
        request: CloseAllocationRequest,
    ) -> Result<allocation::Model, ServiceError> {
        let close_status = match request.status.as_deref() {
            None => AllocationStatus::Returned,
            Some(raw) => {
                let parsed = AllocationStatus::from_str(raw).map_err(|_| {
                    ServiceError::InvalidInput(format!("Unknown allocation status: {}", raw))
                })?;
                if !parsed.is_terminal() {
                    return Err(ServiceError::InvalidInput(
                        "Close-out status must be Returned, Lost or Damage".to_string(),
                    ));
                }
                parsed
            }
        };

        let existing = allocation::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Allocation {} not found", id)))?;

        let resource_id = existing.resource_id;
        let return_date = request.return_date.unwrap_or_else(Utc::now);
        let txn = self.db.begin().await?;

        // The close itself is conditional on the allocation still being open,
        // mirroring the conditional decrement on allocate. Two concurrent
        // closes cannot both pass this guard, so the counters below are
        // touched exactly once per allocation.
        let mut update = allocation::Entity::update_many()
            .col_expr(
                allocation::Column::Status,
                Expr::value(close_status.as_str()),
            )
            .col_expr(allocation::Column::ReturnDate, Expr::value(return_date))
            .col_expr(allocation::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(notes) = request.notes.filter(|n| !n.trim().is_empty()) {
            update = update.col_expr(allocation::Column::Notes, Expr::value(notes));
        }
        let closed = update
            .filter(allocation::Column::Id.eq(id))
            .filter(allocation::Column::Status.eq(AllocationStatus::Allocated.as_str()))
            .exec(&txn)
            .await?;

        if closed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::Conflict(format!(
                "Allocation is already closed ({})",
                existing.status
            )));
        }

        match close_status {
            AllocationStatus::Returned => {
                let replenished = resource::Entity::update_many()
                    .col_expr(
                        resource::Column::AvailableResourceCount,
                        Expr::col(resource::Column::AvailableResourceCount).add(1),
                    )
                    .col_expr(
                        resource::Column::Status,
                        Expr::value(ResourceStatus::Available.as_str()),
                    )
                    .col_expr(resource::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(resource::Column::Id.eq(resource_id))
                    .filter(
                        Expr::col(resource::Column::AvailableResourceCount)
                            .lt(Expr::col(resource::Column::TotalResourceCount)),
                    )
                    .exec(&txn)
                    .await?;

                if replenished.rows_affected == 0 {
                    warn!(resource_id = %resource_id, "Return did not replenish availability; counts already at capacity");
                }
            }
            AllocationStatus::Lost | AllocationStatus::Damage => {
                // The unit is written off: shrink the tracked count so the
                // availability invariant keeps describing real stock.
                let written_off = resource::Entity::update_many()
                    .col_expr(
                        resource::Column::TotalResourceCount,
                        Expr::col(resource::Column::TotalResourceCount).sub(1),
                    )
                    .col_expr(resource::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(resource::Column::Id.eq(resource_id))
                    .filter(resource::Column::TotalResourceCount.gt(0))
                    .exec(&txn)
                    .await?;

                if written_off.rows_affected == 0 {
                    warn!(resource_id = %resource_id, "Write-off found no units to remove");
                }
            }
            AllocationStatus::Allocated => unreachable!("terminal status checked above"),
        }

        let model = allocation::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError("Allocation row missing after close".to_string())
            })?;

        txn.commit().await?;

        info!(allocation_id = %model.id, status = %model.status, "Allocation closed");
        self.event_sender
            .send_or_log(Event::AllocationClosed {
                allocation_id: model.id,
                resource_id,
                status: model.status.clone(),
            })
            .await;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_allocation(&self, id: Uuid) -> Result<AllocationDetail, ServiceError> {
        let model = allocation::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Allocation {} not found", id)))?;

        let mut details = self.resolve_names(vec![model]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Allocation detail lookup failed".into()))
    }

    /// Lists allocations newest-first with resolved names.
    #[instrument(skip(self))]
    pub async fn list_allocations(
        &self,
        filter: AllocationFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<AllocationDetail>, u64), ServiceError> {
        let mut query = allocation::Entity::find()
            .order_by_desc(allocation::Column::AllocatedDate);

        if let Some(resource_id) = filter.resource_id {
            query = query.filter(allocation::Column::ResourceId.eq(resource_id));
        }
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(allocation::Column::EmployeeId.eq(employee_id));
        }
        if let Some(status) = filter.status.filter(|s| !s.is_empty()) {
            query = query.filter(allocation::Column::Status.eq(status));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        let details = self.resolve_names(items).await?;
        Ok((details, total))
    }

    /// Newest allocations for the dashboard.
    #[instrument(skip(self))]
    pub async fn recent_allocations(
        &self,
        limit: u64,
    ) -> Result<Vec<AllocationDetail>, ServiceError> {
        let items = allocation::Entity::find()
            .order_by_desc(allocation::Column::AllocatedDate)
            .limit(limit)
            .all(&*self.db)
            .await?;

        self.resolve_names(items).await
    }

    /// Number of allocations currently open.
    pub async fn open_allocation_count(&self) -> Result<u64, ServiceError> {
        let count = allocation::Entity::find()
            .filter(allocation::Column::Status.eq(AllocationStatus::Allocated.as_str()))
            .count(&*self.db)
            .await?;
        Ok(count)
    }

    /// Batch-resolves employee and resource names for a page of allocations.
    async fn resolve_names(
        &self,
        items: Vec<allocation::Model>,
    ) -> Result<Vec<AllocationDetail>, ServiceError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let resource_ids: Vec<Uuid> = items.iter().map(|a| a.resource_id).collect();
        let employee_ids: Vec<Uuid> = items.iter().map(|a| a.employee_id).collect();

        let resources: HashMap<Uuid, String> = resource::Entity::find()
            .filter(resource::Column::Id.is_in(resource_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let employees: HashMap<Uuid, String> = employee::Entity::find()
            .filter(employee::Column::Id.is_in(employee_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();

        Ok(items
            .into_iter()
            .map(|a| {
                let resource_name = resources
                    .get(&a.resource_id)
                    .cloned()
                    .unwrap_or_else(|| "(removed)".to_string());
                let employee_name = employees
                    .get(&a.employee_id)
                    .cloned()
                    .unwrap_or_else(|| "(removed)".to_string());
                to_detail(a, &resource_name, &employee_name)
            })
            .collect())
    }
}

fn to_detail(model: allocation::Model, resource_name: &str, employee_name: &str) -> AllocationDetail {
    AllocationDetail {
        id: model.id,
        resource_id: model.resource_id,
        resource_name: resource_name.to_string(),
        employee_id: model.employee_id,
        employee_name: employee_name.to_string(),
        allocated_date: model.allocated_date,
        return_date: model.return_date,
        status: model.status,
        notes: model.notes,
        created_at: model.created_at,
    }
}
