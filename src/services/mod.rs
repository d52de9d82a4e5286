pub mod allocations;
pub mod dashboard;
pub mod employees;
pub mod resource_types;
pub mod resources;

pub use allocations::AllocationService;
pub use dashboard::DashboardService;
pub use employees::EmployeeService;
pub use resource_types::ResourceTypeService;
pub use resources::ResourceService;
