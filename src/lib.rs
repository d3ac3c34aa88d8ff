pub mod core {
    pub mod clock;
    pub mod command;
    pub mod controller;
    pub mod domain;
    pub mod events;
    pub mod library;
    pub mod repository;
}

pub mod utils {
    pub mod date;
    pub mod ddb;
    pub mod logs;
}

pub mod gateway;
pub mod items;
pub mod loans;
pub mod members;
pub mod reservations;
pub mod store;
pub mod sweep;

#[cfg(test)]
pub(crate) mod testing;
