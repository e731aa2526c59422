use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WARNING_THRESHOLD: u32 = 3;

/// Thresholds offered by the config menu and accepted on write.
pub const ALLOWED_WARNING_THRESHOLDS: [u32; 3] = [3, 4, 5];

/// Whether violations accumulate warnings or are punished immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMode {
    #[default]
    Warn,
    Direct,
}

impl EscalationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "warn",
            Self::Direct => "direct",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "warn" => Some(Self::Warn),
            "direct" => Some(Self::Direct),
            _ => None,
        }
    }
}

/// Action taken once the threshold is reached (or immediately in direct mode).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentKind {
    #[default]
    Mute,
    Ban,
    Delete,
}

impl PunishmentKind {
    pub const ALL: [PunishmentKind; 3] = [Self::Mute, Self::Ban, Self::Delete];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mute => "mute",
            Self::Ban => "ban",
            Self::Delete => "delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "mute" => Some(Self::Mute),
            "ban" => Some(Self::Ban),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Mute => "Mute",
            Self::Ban => "Ban",
            Self::Delete => "Delete",
        }
    }
}

impl fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub escalation_mode: EscalationMode,
    pub warning_threshold: u32,
    pub punishment_kind: PunishmentKind,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            escalation_mode: EscalationMode::Warn,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            punishment_kind: PunishmentKind::Mute,
        }
    }
}

impl GroupSettings {
    /// Reject settings the config menu could never have produced.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !ALLOWED_WARNING_THRESHOLDS.contains(&self.warning_threshold) {
            anyhow::bail!(
                "warning_threshold {} is not one of {:?}",
                self.warning_threshold,
                ALLOWED_WARNING_THRESHOLDS
            );
        }

        Ok(())
    }

    /// Build settings from stored column values, falling back per field the
    /// way a partially written row should be read.
    pub fn from_columns(mode: &str, threshold: i32, punishment: &str) -> Self {
        let defaults = Self::default();
        Self {
            escalation_mode: EscalationMode::parse(mode).unwrap_or(defaults.escalation_mode),
            warning_threshold: u32::try_from(threshold)
                .ok()
                .filter(|value| *value > 0)
                .unwrap_or(defaults.warning_threshold),
            punishment_kind: PunishmentKind::parse(punishment).unwrap_or(defaults.punishment_kind),
        }
    }
}
