pub(crate) mod error;
pub(crate) mod find;
pub(crate) mod keys;
mod literal;
pub(crate) mod path;
pub(crate) mod write;
