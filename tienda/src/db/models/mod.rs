//! Database-side request and response models.

pub mod products;
pub mod users;
