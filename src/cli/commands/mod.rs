pub mod migrate;
pub mod roles;
pub mod token;
