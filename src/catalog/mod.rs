//! Product catalog persistence and image reconciliation.

pub mod reconcile;
pub mod repository;

pub use reconcile::{ImageReconciler, ReconcileRequest, Reconciliation, VerificationReport};
pub use repository::{CatalogStore, NewProductImage, SeaOrmCatalog};
