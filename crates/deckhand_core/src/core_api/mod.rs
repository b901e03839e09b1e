mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    CompanionReport, ConvertDirection, ConvertReport, DeleteReport, DeletedSlot, DuplicateReport,
    GroupClone, RemapEntry, RenameReport, ShiftReport, Snapshot,
};

pub use crate::mappings::slots::{Slot, SlotKind};
pub use crate::verb::BindingVerb;
