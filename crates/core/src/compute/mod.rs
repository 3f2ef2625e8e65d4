//! External compute collaborator.
//!
//! The subtitle generation itself runs in an external function; this module
//! only knows how to call it.

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::ComputeConfig;
pub use error::ComputeError;
pub use http::HttpComputeClient;
pub use traits::ComputeService;
pub use types::{ComputeRequest, ComputeResponse};
