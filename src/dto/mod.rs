pub mod articles;
pub mod auth;
pub mod form;
pub mod products;
pub mod stores;
