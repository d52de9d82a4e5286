pub mod allocations;
pub mod dashboard;
pub mod employees;
pub mod resource_types;
pub mod resources;

use crate::events::EventSender;
use crate::services;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Service container shared through the application state.
#[derive(Clone)]
pub struct AppServices {
    pub allocations: Arc<services::AllocationService>,
    pub dashboard: Arc<services::DashboardService>,
    pub employees: Arc<services::EmployeeService>,
    pub resource_types: Arc<services::ResourceTypeService>,
    pub resources: Arc<services::ResourceService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            allocations: Arc::new(services::AllocationService::new(
                db.clone(),
                event_sender.clone(),
            )),
            dashboard: Arc::new(services::DashboardService::new(db.clone())),
            employees: Arc::new(services::EmployeeService::new(
                db.clone(),
                event_sender.clone(),
            )),
            resource_types: Arc::new(services::ResourceTypeService::new(
                db.clone(),
                event_sender.clone(),
            )),
            resources: Arc::new(services::ResourceService::new(db, event_sender)),
        }
    }
}
