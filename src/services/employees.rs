use crate::{
    auth::hash_password,
    entities::employee::{self, EmployeeRole},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
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
pub struct CreateEmployeeRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Optional explicit password; when absent the account uses the
    /// derived first-login password on its first authentication.
    pub password: Option<String>,
    /// `admin` or `employee`; defaults to `employee`.
    pub role: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    #[validate(length(min = 3, message = "Employee code must be at least 3 characters"))]
    pub employee_code: String,
    #[validate(length(min = 4, message = "Phone must be at least 4 characters"))]
    pub phone: String,
    /// Date of birth, `YYYY-MM-DD`.
    #[validate(length(min = 4, message = "Birthday must include the year"))]
    pub birthday: String,
    pub hire_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub role: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub status: Option<String>,
    pub employee_code: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
}

/// Query filters for employee listing
#[derive(Debug, Default, Clone)]
pub struct EmployeeFilter {
    /// Matches against name, email and employee code.
    pub search: Option<String>,
    pub department: Option<String>,
}

/// Service for managing employees
#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl EmployeeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_employee(
        &self,
        request: CreateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;

        let role = match request.role.as_deref() {
            None => EmployeeRole::Employee,
            Some(raw) => EmployeeRole::from_str(raw)
                .map_err(|_| ServiceError::InvalidInput(format!("Unknown role: {}", raw)))?,
        };

        self.ensure_email_unique(&request.email, None).await?;

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(
                hash_password(password).map_err(|e| ServiceError::HashError(e.to_string()))?,
            ),
            None => None,
        };

        let active = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            password_hash: Set(password_hash),
            role: Set(role.as_str().to_string()),
            position: Set(request.position),
            department: Set(request.department),
            status: Set(request.status),
            employee_code: Set(Some(request.employee_code)),
            phone: Set(Some(request.phone)),
            birthday: Set(Some(request.birthday)),
            hire_date: Set(request.hire_date),
            is_deleted: Set(false),
            ..Default::default()
        };

        let model = active.insert(&*self.db).await.map_err(|e| {
            error!(error = %e, "Failed to insert employee");
            ServiceError::DatabaseError(e)
        })?;

        info!(employee_id = %model.id, "Employee created");
        self.event_sender
            .send_or_log(Event::EmployeeCreated(model.id))
            .await;

        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn get_employee(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        employee::Entity::find_by_id(id)
            .filter(employee::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Employee {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_employees(
        &self,
        filter: EmployeeFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<employee::Model>, u64), ServiceError> {
        let mut query = employee::Entity::find()
            .filter(employee::Column::IsDeleted.eq(false))
            .order_by_desc(employee::Column::CreatedAt);

        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(contains_ci(employee::Column::Name, &pattern))
                    .add(contains_ci(employee::Column::Email, &pattern))
                    .add(contains_ci(employee::Column::EmployeeCode, &pattern)),
            );
        }
        if let Some(department) = filter.department.filter(|s| !s.is_empty()) {
            query = query.filter(employee::Column::Department.eq(department));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((items, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_employee(
        &self,
        id: Uuid,
        request: UpdateEmployeeRequest,
    ) -> Result<employee::Model, ServiceError> {
        request.validate()?;

        let existing = self.get_employee(id).await?;

        if let Some(email) = request.email.as_deref() {
            if email != existing.email {
                self.ensure_email_unique(email, Some(id)).await?;
            }
        }

        let mut active: employee::ActiveModel = existing.into();

        if let Some(name) = non_empty(request.name) {
            active.name = Set(name);
        }
        if let Some(email) = non_empty(request.email) {
            active.email = Set(email);
        }
        if let Some(role) = non_empty(request.role) {
            let parsed = EmployeeRole::from_str(&role)
                .map_err(|_| ServiceError::InvalidInput(format!("Unknown role: {}", role)))?;
            active.role = Set(parsed.as_str().to_string());
        }
        if let Some(position) = non_empty(request.position) {
            active.position = Set(Some(position));
        }
        if let Some(department) = non_empty(request.department) {
            active.department = Set(Some(department));
        }
        if let Some(status) = non_empty(request.status) {
            active.status = Set(Some(status));
        }
        if let Some(code) = non_empty(request.employee_code) {
            active.employee_code = Set(Some(code));
        }
        if let Some(phone) = non_empty(request.phone) {
            active.phone = Set(Some(phone));
        }
        if let Some(birthday) = non_empty(request.birthday) {
            active.birthday = Set(Some(birthday));
        }
        if let Some(hire_date) = request.hire_date {
            active.hire_date = Set(Some(hire_date));
        }

        let model = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::EmployeeUpdated(model.id))
            .await;

        Ok(model)
    }

    /// Removes an employee record entirely.
    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = employee::Entity::delete_by_id(id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Employee {} not found", id)));
        }

        info!(employee_id = %id, "Employee deleted");
        self.event_sender
            .send_or_log(Event::EmployeeDeleted(id))
            .await;

        Ok(())
    }

    async fn ensure_email_unique(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = employee::Entity::find().filter(employee::Column::Email.eq(email));
        if let Some(id) = exclude {
            query = query.filter(employee::Column::Id.ne(id));
        }

        let count = query.count(&*self.db).await?;
        if count > 0 {
            return Err(ServiceError::Conflict(format!(
                "An employee with email {} already exists",
                email
            )));
        }

        Ok(())
    }
}

/// Treats `Some("")` the same as absent so partial updates can skip fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// LIKE is case-sensitive on Postgres, so compare lowered values.
fn contains_ci(col: employee::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_treated_as_absent() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("".to_string())), None);
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some("ops".to_string())), Some("ops".to_string()));
    }

    #[test]
    fn create_request_requires_first_login_fields() {
        let request = CreateEmployeeRequest {
            name: "Sam Lee".to_string(),
            email: "sam@example.com".to_string(),
            password: None,
            role: None,
            position: None,
            department: None,
            status: None,
            employee_code: "01".to_string(),
            phone: "1234567".to_string(),
            birthday: "1993-04-11".to_string(),
            hire_date: None,
        };
        // Code below the 3-character minimum fails validation.
        assert!(request.validate().is_err());
    }
}
