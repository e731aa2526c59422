pub mod bio_check;
pub mod notices;
pub mod punishment;
pub mod undo;

pub use bio_check::check_group_message;
pub use punishment::{BioCheck, PunishmentEngine, PunishmentOutcome};
