//! Records and the per-type operations that load and persist them

pub mod kind;
pub mod property;
pub mod record;
pub mod repository;

pub use kind::ResourceType;
pub use property::{ModificationMetadata, Property, PropertyCache, PropertyOption};
pub use record::{Record, RecordId};
pub use repository::ResourceRepository;
