//! Compile ADMX/ADML policy definitions into a browsable tree and edit the
//! Registry.pol files stored under a sysvol tree

pub mod core;
pub mod datastore;
pub mod error;
mod filesystem;
mod policies;
mod registry;
mod resolver;
pub mod structs;
mod utils;
