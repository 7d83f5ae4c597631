pub mod auth;
pub mod error;
pub mod middleware;
pub mod queries;
pub mod routes;
pub mod service;
pub mod session;
pub mod views;

pub use routes::router;
