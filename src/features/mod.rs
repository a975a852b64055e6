//! Feature engineering
//!
//! Turns cleaned game-log and pitch-level history into the model-ready
//! feature table, with strict point-in-time correctness.

pub mod assembler;
pub mod dates;
pub mod rates;
pub mod roles;
pub mod table;
pub mod window;

pub use assembler::{FeatureAssembler, FeatureRow, HistoryContext};
pub use dates::DateNormalizer;
pub use roles::Role;
pub use table::{FeatureTable, FeatureTableBuilder};
pub use window::{Dated, QueryFilter, Window};
