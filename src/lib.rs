//! Admin data SDK: configuration-driven CRUD over a Convex document backend.

pub mod backend;
pub mod config;
pub mod error;
pub mod query;
pub mod response;
pub mod settings;
pub mod state;
pub mod service;
pub mod handlers;
pub mod routes;

pub use backend::{Backend, ConvexHttpClient, MemoryBackend};
pub use config::{Registry, Resource, ResourceConfig};
pub use error::{AdapterError, BackendError, ConfigError, ErrorKind};
pub use query::{FilterOperator, FilterParams, ListResult, Pagination, SortOrder, SortParams};
pub use response::{success_many, success_one};
pub use settings::{BackendSettings, Settings};
pub use state::AppState;
pub use routes::{admin_router, common_routes, resource_routes};
pub use service::{AsResource, DataAdapter, Patch};
