pub mod articles;
pub mod audit_logs;
pub mod product_categories;
pub mod product_images;
pub mod products;
pub mod stores;
pub mod users;

pub use articles::Entity as Articles;
pub use audit_logs::Entity as AuditLogs;
pub use product_categories::Entity as ProductCategories;
pub use product_images::Entity as ProductImages;
pub use products::Entity as Products;
pub use stores::Entity as Stores;
pub use users::Entity as Users;
