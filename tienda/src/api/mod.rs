//! HTTP surface: handlers, request/response models, and flash messaging.

pub mod flash;
pub mod handlers;
pub mod models;
