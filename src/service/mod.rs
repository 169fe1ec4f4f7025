//! DataAdapter: generic CRUD over configured backend functions.

mod adapter;
pub mod validation;
pub use adapter::{AsResource, DataAdapter};
pub use validation::{Patch, PatchValue};
