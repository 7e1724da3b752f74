pub(crate) mod aggregate;
pub(crate) mod cache;
mod cycles;
pub(crate) mod elements;
pub(crate) mod error;
mod index;
pub(crate) mod locale;
pub(crate) mod parser;
mod supported;
pub(crate) mod tables;
mod tree;
