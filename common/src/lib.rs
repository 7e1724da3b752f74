pub mod policy;
pub mod registry;
