pub mod audit_logs;
pub mod menus;
pub mod orders;
pub mod payment_logs;
pub mod planning_entries;
pub mod recipes;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use menus::Entity as Menus;
pub use orders::Entity as Orders;
pub use payment_logs::Entity as PaymentLogs;
pub use planning_entries::Entity as PlanningEntries;
pub use recipes::Entity as Recipes;
pub use users::Entity as Users;
