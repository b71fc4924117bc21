//! # Enhancements
//!
//! Optional conveniences layered on the wrapped SDK surface:
//!
//! - [`PagedQuery`]: incremental, skip-based loading of a query's results
//!   into an accumulated collection.
//! - [`ClassRegistry`]: named object classes with generated
//!   `get<Field>`/`set<Field>` accessors.
//!
//! Both are installed by the service layer when enhancements are enabled.

pub mod classes;
pub mod error;
pub mod pagination;

pub use classes::{ClassDescriptor, ClassMethod, ClassRegistry, ClassSpec, ObjectClass};
pub use error::{EnhanceError, Result};
pub use pagination::{PagedQuery, DEFAULT_LIMIT};
