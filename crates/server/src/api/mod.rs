pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;
pub mod users;

pub use routes::create_router;
