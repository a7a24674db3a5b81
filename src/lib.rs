//! batch molecular-descriptor pipeline: for each SMILES in an input CSV,
//! chain obabel (format conversion), MOPAC (semi-empirical geometry
//! optimization), and alvaDesc (descriptor calculation), then aggregate
//! the per-molecule descriptor JSONs into one output table.

pub mod aggregate;
pub mod artifact;
pub mod config;
pub mod descriptor;
pub mod driver;
pub mod error;
pub mod mopac;
pub mod pipeline;
pub mod table;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use tools::{Toolchain, Tools};
