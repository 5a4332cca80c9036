//! API request/response models.

pub mod products;
pub mod users;
