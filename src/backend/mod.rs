//! Backend document store seam. The adapter only ever calls named queries and mutations.

mod convex;
mod memory;

pub use convex::ConvexHttpClient;
pub use memory::{CallKind, MemoryBackend, RecordedCall};

use crate::error::BackendError;
use serde_json::{Map, Value};

/// A document-database client exposing named query and mutation functions.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Run a read-only function.
    async fn query(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError>;

    /// Run a write function.
    async fn mutation(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError>;
}
