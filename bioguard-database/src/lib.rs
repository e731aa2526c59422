pub mod cache;
pub mod database;
pub mod impls;
pub mod memory;
pub mod model;
pub mod store;

pub use cache::CacheService;
pub use database::{Database, MIGRATOR};
pub use memory::MemoryStore;
pub use model::{
    ALLOWED_WARNING_THRESHOLDS, DEFAULT_WARNING_THRESHOLD, EscalationMode, GroupSettings,
    PunishmentKind,
};
pub use store::{BotStore, Registry, SettingsStore, WarningStore};
