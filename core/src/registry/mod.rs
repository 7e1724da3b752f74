pub(crate) mod error;
pub(crate) mod pol;
pub(crate) mod store;
pub(crate) mod types;
pub(crate) mod value;
