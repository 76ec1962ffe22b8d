pub mod client;
pub mod config;
pub mod encoder;
pub mod http;
pub mod log;
pub mod models;

pub use crate::client::{CatalogClient, FindObjects, Resource};
pub use crate::config::ClientConfig;
pub use crate::encoder::{EncodeError, FlatFields, encode};
pub use crate::http::{ApiMethod, CatalogError, FailureKind, RequestExecutor};
pub use crate::models::{CatalogObject, EntityId, Expand, ParentRef, PropertyValue};
