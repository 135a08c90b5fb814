//! Error taxonomy
//!
//! Only asset loading is fatal. Settings errors are recovered by rewriting
//! defaults, and action errors never leave a tick.

use std::path::PathBuf;

use thiserror::Error;

/// A required asset could not be loaded (fatal at startup)
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("missing {kind} asset: {path}")]
    Missing { kind: &'static str, path: PathBuf },
    #[error("asset directory {path} is unreadable: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The settings file is unreadable or invalid (recovered with defaults)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("settings field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// A player action that was refused; state is left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("not enough energy")]
    InsufficientEnergy,
    #[error("weapon is cooling down")]
    CooldownActive,
    #[error("grid cell {0:?} is occupied")]
    CellOccupied((i32, i32)),
    #[error("grid cell {0:?} is outside the room")]
    OutOfRoom((i32, i32)),
    #[error("active weapon is not a placeable")]
    NotAPlaceable,
    #[error("weapon not owned")]
    NotOwned,
    #[error("not enough money: need {need}, have {have}")]
    InsufficientMoney { need: u32, have: u32 },
    #[error("item effect rejected")]
    EffectRejected,
    #[error("no offer in slot {0}")]
    NoSuchOffer(usize),
    #[error("shop is closed")]
    ShopClosed,
}
