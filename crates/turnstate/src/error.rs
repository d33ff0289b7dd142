//! Setup-time errors.
//!
//! Every variant is fatal and non-recoverable: the dispatch graph either
//! builds completely or the process must treat setup as failed. There is
//! deliberately no runtime dispatch error type: the default filler removes
//! the "missing implementation" case before dispatch ever runs.

use turnstate_core::{DeriveError, ShapeError};

/// Fatal errors surfaced while building the dispatch graph.
#[derive(Clone, Debug, thiserror::Error)]
pub enum SetupError {
    /// `setup` ran a second time in the same process.
    #[error("turnstate setup already ran in this process")]
    AlreadyInitialized,

    /// The same owner type or owner name was registered more than once,
    /// possibly from different modules.
    #[error("owner type '{name}' is registered more than once")]
    DuplicateOwner { name: &'static str },

    /// An owner names a parent that no module registered.
    #[error("owner '{owner}' extends unregistered owner '{parent}'")]
    UnknownParent {
        owner: &'static str,
        parent: &'static str,
    },

    /// The owner parent chain loops back on itself.
    #[error("owner inheritance cycle through '{owner}'")]
    OwnerCycle { owner: &'static str },

    /// Neither the owner nor any ancestor declares a table slot, so no
    /// method-table shape exists anywhere in the chain.
    #[error("no method-table shape declared anywhere in the ancestor chain of '{owner}'")]
    MissingTableShape { owner: &'static str },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    /// A state name is declared twice on one owner, or shadows a state
    /// inherited from an ancestor owner.
    #[error("owner '{owner}' declares state '{state}' more than once")]
    DuplicateState {
        owner: &'static str,
        state: &'static str,
    },

    /// Two states visible on one owner collapse to the same short name, which
    /// would make handler-name matching order-dependent.
    #[error("states '{first}' and '{second}' on owner '{owner}' share the short name '{short}'")]
    StateShortNameClash {
        owner: &'static str,
        first: &'static str,
        second: &'static str,
        short: &'static str,
    },

    /// A state derives a state that is not visible on its owner.
    #[error("state '{state}' on owner '{owner}' derives unknown state '{parent}'")]
    UnknownStateParent {
        owner: &'static str,
        state: &'static str,
        parent: &'static str,
    },

    /// The state parent chain loops back on itself.
    #[error("state inheritance cycle through '{state}' on owner '{owner}'")]
    StateCycle {
        owner: &'static str,
        state: &'static str,
    },

    /// A handler matched a slot by name but its signature is incompatible.
    #[error(
        "handler '{handler}' on owner '{owner}' does not match slot '{slot}' of state '{state}': {reason}"
    )]
    SignatureMismatch {
        owner: &'static str,
        handler: &'static str,
        state: &'static str,
        slot: &'static str,
        reason: String,
    },

    /// A handler's self capability is neither the owner nor one of its
    /// ancestors.
    #[error(
        "handler '{handler}' on owner '{owner}' targets capability '{capability}', which is not in the owner's ancestor chain"
    )]
    ForeignCapability {
        owner: &'static str,
        handler: &'static str,
        capability: &'static str,
    },

    /// More than one unconsumed handler matches the same (state, slot)
    /// target.
    #[error(
        "slot '{slot}' of state '{state}' on owner '{owner}' matches multiple handlers: {}",
        .handlers.join(", ")
    )]
    AmbiguousHandler {
        owner: &'static str,
        state: &'static str,
        slot: &'static str,
        handlers: Vec<String>,
    },

    /// Handlers that no (state, slot) pair consumed: a naming mistake or a
    /// reference to a renamed state. Enumerated in one error so every orphan
    /// surfaces at once.
    #[error(
        "orphaned handler methods on owner '{owner}': {}",
        .handlers.join(", ")
    )]
    OrphanedHandlers {
        owner: &'static str,
        handlers: Vec<String>,
    },
}
