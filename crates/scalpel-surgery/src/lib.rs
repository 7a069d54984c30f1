//! Surgical extraction and patching (C7): exactly one `extract()` and
//! one `patch()` entry point, resolving the open question in spec.md §9
//! about duplicate surgery API shapes.

pub mod error;
pub mod extract;
pub mod locate;
pub mod patch;

pub use error::SurgeryError;
pub use extract::{extract, Extracted};
pub use patch::{patch, PatchOptions, PatchOutcome};
