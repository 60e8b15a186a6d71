pub mod builder;
pub mod document;
pub mod host;

pub use builder::{InventoryBuilder, InventoryError};
pub use document::InventoryDocument;
pub use host::HostConfig;
