use crate::{
    entities::{resource, resource::ResourceStatus, resource_type},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
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
    /// Number of identical units tracked under this record; defaults to 1.
    #[validate(range(min = 0, message = "Unit count cannot be negative"))]
    pub total_resource_count: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateResourceRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub resource_type_id: Option<Uuid>,
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
    #[validate(range(min = 0, message = "Unit count cannot be negative"))]
    pub total_resource_count: Option<i32>,
    pub status: Option<String>,
}

/// Query filters for resource listing
#[derive(Debug, Default, Clone)]
pub struct ResourceFilter {
    /// Matches against name, brand, model, serial number and asset tag.
    pub search: Option<String>,
    pub status: Option<String>,
    pub resource_type_id: Option<Uuid>,
    /// One of `name`, `status`, `created_at` (default). Anything else is
    /// rejected rather than passed through to the query.
    pub sort_by: Option<String>,
}

/// Service for managing tracked hardware resources
#[derive(Clone)]
pub struct ResourceService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ResourceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_resource(
        &self,
        request: CreateResourceRequest,
    ) -> Result<resource::Model, ServiceError> {
        request.validate()?;

        let type_exists = resource_type::Entity::find_by_id(request.resource_type_id)
            .count(&*self.db)
            .await?;
        if type_exists == 0 {
            return Err(ServiceError::InvalidInput(format!(
                "Unknown resource type: {}",
                request.resource_type_id
            )));
        }

        self.ensure_identifiers_unique(
            request.serial_number.as_deref(),
            request.asset_tag.as_deref(),
            None,
        )
        .await?;

        let total = request.total_resource_count.unwrap_or(1);

        let active = resource::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            resource_type_id: Set(request.resource_type_id),
            description: Set(request.description),
            brand: Set(request.brand),
            model_name: Set(request.model_name),
            serial_number: Set(request.serial_number),
            asset_tag: Set(request.asset_tag),
            vendor_name: Set(request.vendor_name),
            purchase_cost: Set(request.purchase_cost),
            purchase_date: Set(request.purchase_date),
            warranty_expiry_date: Set(request.warranty_expiry_date),
            last_service_date: Set(request.last_service_date),
            total_resource_count: Set(total),
            available_resource_count: Set(total),
            status: Set(ResourceStatus::Available.as_str().to_string()),
            is_deleted: Set(false),
            ..Default::default()
        };

        let model = active.insert(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to insert resource");
            ServiceError::DatabaseError(e)
        })?;

        info!(resource_id = %model.id, "Resource created");
        self.event_sender
            .send_or_log(Event::ResourceCreated(model.id))
            .await;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_resource(&self, id: Uuid) -> Result<resource::Model, ServiceError> {
        resource::Entity::find_by_id(id)
            .filter(resource::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Resource {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_resources(
        &self,
        filter: ResourceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<resource::Model>, u64), ServiceError> {
        let mut query = resource::Entity::find().filter(resource::Column::IsDeleted.eq(false));

        query = match filter.sort_by.as_deref() {
            None | Some("") | Some("created_at") => {
                query.order_by_desc(resource::Column::CreatedAt)
            }
            Some("name") => query.order_by_asc(resource::Column::Name),
            Some("status") => query.order_by_asc(resource::Column::Status),
            Some(other) => {
                return Err(ServiceError::InvalidInput(format!(
                    "Unsupported sort column: {}",
                    other
                )))
            }
        };

        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(contains_ci(resource::Column::Name, &pattern))
                    .add(contains_ci(resource::Column::Brand, &pattern))
                    .add(contains_ci(resource::Column::ModelName, &pattern))
                    .add(contains_ci(resource::Column::SerialNumber, &pattern))
                    .add(contains_ci(resource::Column::AssetTag, &pattern)),
            );
        }
        if let Some(status) = filter.status.filter(|s| !s.is_empty()) {
            query = query.filter(resource::Column::Status.eq(status));
        }
        if let Some(type_id) = filter.resource_type_id {
            query = query.filter(resource::Column::ResourceTypeId.eq(type_id));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_resource(
        &self,
        id: Uuid,
        request: UpdateResourceRequest,
    ) -> Result<resource::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_resource(id).await?;

        let serial_changed = request
            .serial_number
            .as_deref()
            .filter(|s| !s.is_empty() && Some(*s) != existing.serial_number.as_deref());
        let tag_changed = request
            .asset_tag
            .as_deref()
            .filter(|s| !s.is_empty() && Some(*s) != existing.asset_tag.as_deref());
        if serial_changed.is_some() || tag_changed.is_some() {
            self.ensure_identifiers_unique(serial_changed, tag_changed, Some(id))
                .await?;
        }

        if let Some(type_id) = request.resource_type_id {
            let type_exists = resource_type::Entity::find_by_id(type_id)
                .count(&*self.db)
                .await?;
            if type_exists == 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "Unknown resource type: {}",
                    type_id
                )));
            }
        }

        // Count fields move together so `available <= total` stays true.
        let (new_total, new_available) = match request.total_resource_count {
            Some(total) => {
                let delta = total - existing.total_resource_count;
                let available = existing.available_resource_count + delta;
                if available < 0 {
                    return Err(ServiceError::Conflict(
                        "Cannot reduce unit count below outstanding allocations".to_string(),
                    ));
                }
                (Some(total), Some(available))
            }
            None => (None, None),
        };

        let mut active: resource::ActiveModel = existing.into();

        if let Some(name) = non_empty(request.name) {
            active.name = Set(name);
        }
        if let Some(type_id) = request.resource_type_id {
            active.resource_type_id = Set(type_id);
        }
        if let Some(description) = non_empty(request.description) {
            active.description = Set(Some(description));
        }
        if let Some(brand) = non_empty(request.brand) {
            active.brand = Set(Some(brand));
        }
        if let Some(model_name) = non_empty(request.model_name) {
            active.model_name = Set(Some(model_name));
        }
        if let Some(serial) = non_empty(request.serial_number) {
            active.serial_number = Set(Some(serial));
        }
        if let Some(tag) = non_empty(request.asset_tag) {
            active.asset_tag = Set(Some(tag));
        }
        if let Some(vendor) = non_empty(request.vendor_name) {
            active.vendor_name = Set(Some(vendor));
        }
        if let Some(cost) = request.purchase_cost {
            active.purchase_cost = Set(Some(cost));
        }
        if let Some(date) = request.purchase_date {
            active.purchase_date = Set(Some(date));
        }
        if let Some(date) = request.warranty_expiry_date {
            active.warranty_expiry_date = Set(Some(date));
        }
        if let Some(date) = request.last_service_date {
            active.last_service_date = Set(Some(date));
        }
        if let Some(total) = new_total {
            active.total_resource_count = Set(total);
        }
        if let Some(available) = new_available {
            active.available_resource_count = Set(available);
        }
        if let Some(status) = non_empty(request.status) {
            let parsed = ResourceStatus::from_str(&status)
                .map_err(|_| ServiceError::InvalidInput(format!("Unknown status: {}", status)))?;
            active.status = Set(parsed.as_str().to_string());
        }

        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ResourceUpdated(model.id))
            .await;

        Ok(model)
    }

    /// Soft-deletes a resource; refuses while any unit is still allocated.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_resource(id).await?;

        if existing.available_resource_count < existing.total_resource_count {
            return Err(ServiceError::Conflict(
                "Resource has outstanding allocations".to_string(),
            ));
        }

        let mut active: resource::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.update(&*self.db).await?;

        info!(resource_id = %id, "Resource deleted");
        self.event_sender
            .send_or_log(Event::ResourceDeleted(id))
            .await;

        Ok(())
    }

    async fn ensure_identifiers_unique(
        &self,
        serial_number: Option<&str>,
        asset_tag: Option<&str>,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut condition = Condition::any();
        if let Some(serial) = serial_number.filter(|s| !s.is_empty()) {
            condition = condition.add(resource::Column::SerialNumber.eq(serial));
        }
        if let Some(tag) = asset_tag.filter(|s| !s.is_empty()) {
            condition = condition.add(resource::Column::AssetTag.eq(tag));
        }
        if condition.is_empty() {
            return Ok(());
        }

        let mut query = resource::Entity::find()
            .filter(resource::Column::IsDeleted.eq(false))
            .filter(condition);
        if let Some(id) = exclude {
            query = query.filter(resource::Column::Id.ne(id));
        }

        let count = query.count(&*self.db).await?;
        if count > 0 {
            return Err(ServiceError::Conflict(
                "A resource with the same serial number or asset tag already exists".to_string(),
            ));
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// LIKE is case-sensitive on Postgres, so compare lowered values.
fn contains_ci(col: resource::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}
