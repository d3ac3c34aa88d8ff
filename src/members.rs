pub mod directory;
pub mod domain;
pub mod factory;
