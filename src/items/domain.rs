use crate::core::domain::Identifiable;
use crate::core::library::{ItemKind, ItemStatus};

pub mod model;

// Item is a physical lendable unit; its status is only ever derived by the circulation core.
pub trait Item: Identifiable {
    fn kind(&self) -> ItemKind;
    fn status(&self) -> ItemStatus;
}
