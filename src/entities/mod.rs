pub mod allocation;
pub mod employee;
pub mod resource;
pub mod resource_type;

pub use allocation::Entity as Allocation;
pub use employee::Entity as Employee;
pub use resource::Entity as Resource;
pub use resource_type::Entity as ResourceType;
