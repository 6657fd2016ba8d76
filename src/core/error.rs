use thiserror::Error;

use crate::core::types::EntityId;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity id already alive: {0}")]
    DuplicateEntity(EntityId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, WorldError>;

/// Why a craft could not start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CraftRejection {
    #[error("not enough {material}: need {required}, have {available}")]
    InsufficientMaterials {
        material: String,
        required: u32,
        available: u32,
    },

    #[error("recipe is locked: {0}")]
    RecipeLocked(String),

    #[error("a craft is already in progress")]
    JobAlreadyActive,

    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),
}

/// Why an NPC refused to talk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionRefusal {
    #[error("{0} is resting")]
    Resting(String),

    #[error("unknown npc: {0}")]
    UnknownNpc(String),
}

/// Why a gift was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GiftRefusal {
    #[error("unknown npc: {0}")]
    UnknownNpc(String),

    #[error("{0} does not accept gifts")]
    NotAccepted(String),

    #[error("no {0} in inventory")]
    MissingItem(String),
}

/// Why a purchase failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeRefusal {
    #[error("unknown npc: {0}")]
    UnknownNpc(String),

    #[error("{0} has no shop")]
    NoShop(String),

    #[error("{0} is not for sale here")]
    NotStocked(String),

    #[error("need {price} {currency}, have {available}")]
    InsufficientFunds {
        currency: String,
        price: u32,
        available: u32,
    },

    #[error("no merchant is visiting")]
    NoMerchant,
}

/// Why quest progress was not recorded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestRejection {
    #[error("unknown quest: {0}")]
    UnknownQuest(String),

    #[error("quest is locked: {0}")]
    Locked(String),

    #[error("quest {quest} has no objective {index}")]
    ObjectiveOutOfRange { quest: String, index: usize },
}

/// Report a broken simulation invariant.
///
/// Development builds stop right here. Release builds log and return, and
/// the caller skips the offending effect so the render loop keeps running.
pub fn invariant_violation(what: &str) {
    tracing::error!("invariant violation: {}", what);
    debug_assert!(false, "invariant violation: {}", what);
}
