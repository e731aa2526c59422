pub mod settings;

pub use settings::{
    ALLOWED_WARNING_THRESHOLDS, DEFAULT_WARNING_THRESHOLD, EscalationMode, GroupSettings,
    PunishmentKind,
};
