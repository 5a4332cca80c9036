//! Authentication and authorization: password hashing, session tokens, the
//! account service, and the role guard with its request extractors.

pub mod current_user;
pub mod guard;
pub mod password;
pub mod service;
pub mod session;
