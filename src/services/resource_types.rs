use crate::{
    entities::{resource, resource_type},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateResourceTypeRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateResourceTypeRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Service for managing resource types (device categories)
#[derive(Clone)]
pub struct ResourceTypeService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ResourceTypeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_resource_type(
        &self,
        request: CreateResourceTypeRequest,
    ) -> Result<resource_type::Model, ServiceError> {
        request.validate()?;

        let active = resource_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            ..Default::default()
        };

        let model = active.insert(&*self.db).await?;

        info!(resource_type_id = %model.id, "Resource type created");
        self.event_sender
            .send_or_log(Event::ResourceTypeCreated(model.id))
            .await;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_resource_type(&self, id: Uuid) -> Result<resource_type::Model, ServiceError> {
        resource_type::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Resource type {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_resource_types(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<resource_type::Model>, u64), ServiceError> {
        let paginator = resource_type::Entity::find()
            .order_by_asc(resource_type::Column::Name)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn update_resource_type(
        &self,
        id: Uuid,
        request: UpdateResourceTypeRequest,
    ) -> Result<resource_type::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_resource_type(id).await?;
        let mut active: resource_type::ActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }

        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ResourceTypeUpdated(model.id))
            .await;

        Ok(model)
    }

    /// Deletes a resource type; fails while any resource still references it.
    #[instrument(skip(self))]
    pub async fn delete_resource_type(&self, id: Uuid) -> Result<(), ServiceError> {
        self.get_resource_type(id).await?;

        let referencing = resource::Entity::find()
            .filter(resource::Column::ResourceTypeId.eq(id))
            .filter(resource::Column::IsDeleted.eq(false))
            .count(&*self.db)
            .await?;

        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Resource type is referenced by {} resource(s)",
                referencing
            )));
        }

        let result = resource_type::Entity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, resource_type_id = %id, "Failed to delete resource type");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Resource type {} not found",
                id
            )));
        }

        info!(resource_type_id = %id, "Resource type deleted");
        self.event_sender
            .send_or_log(Event::ResourceTypeDeleted(id))
            .await;

        Ok(())
    }
}
