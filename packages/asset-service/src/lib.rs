pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rpc;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use error::{AppError, Code, Status};
pub use rpc::{AssetService, EntityService};
pub use state::AppState;
pub use store::EntityKind;
