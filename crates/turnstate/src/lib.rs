//! Ahead-of-time state-machine dispatch tables for deterministic turn-based
//! games.
//!
//! An owner type declares a fixed set of states; each state may override a
//! subset of named behavior slots. `turnstate` resolves, once at process
//! start, which handler backs every (owner, state, slot) combination across
//! multi-level inheritance of both the owner lineage and the state lineage,
//! and publishes the result as an immutable registry with a deterministic
//! global order. Two processes registering the same declarations enumerate
//! their states identically, regardless of module order, which is what lets
//! the flat sequence serve as a network-stable enumeration key.
//!
//! # Registration
//!
//! Instead of scanning compiled modules reflectively, owners register
//! declaratively: a [`Module`] bundles [`OwnerDef`]s, each carrying the
//! generation's slot contribution, its state declarations, and its handler
//! closures. Handlers follow the `<verb>_<StateShort>_<SlotName>` naming
//! convention (`IdleState` shortens to `Idle`), and a handler's self
//! parameter may target any ancestor capability of its owner; the framework
//! captures the narrowing conversion when the handler is constructed.
//!
//! ```
//! use turnstate::{Module, OwnerDef, StateDef, StateMarker, ValueKind, handler0, setup};
//! use turnstate_core::impl_state_owner;
//!
//! struct Sentry {
//!     charge: i64,
//! }
//! impl_state_owner!(Sentry, "Sentry");
//!
//! struct IdleState;
//! impl StateMarker for IdleState {
//!     const NAME: &'static str = "IdleState";
//! }
//!
//! let module = Module::new("units").owner(
//!     OwnerDef::new::<Sentry>()
//!         .slot("OnEnter", [], ValueKind::Unit)
//!         .slot("Tick", [], ValueKind::Int)
//!         .state(StateDef::concrete::<IdleState>().symbol("idle"))
//!         .handler(handler0::<Sentry, i64, _>("charge_Idle_Tick", |sentry| {
//!             sentry.charge += 1;
//!             sentry.charge
//!         })),
//! );
//!
//! let registry = setup(vec![module]).unwrap();
//! let mut sentry = Sentry { charge: 0 };
//! let idle = registry.state_of::<IdleState>(&sentry).unwrap().clone();
//! assert_eq!(idle.slot("Tick").unwrap().call_int(&mut sentry, &[]), Some(1));
//! ```
//!
//! # Guarantees after setup
//!
//! - Every slot of every table is callable; unclaimed slots run a canonical
//!   zero-returning no-op (no presence checks at dispatch sites).
//! - The most-derived handler wins, even through references typed as an
//!   ancestor capability.
//! - The graph is immutable and safe for unsynchronized concurrent reads.
//!
//! All setup failures (orphaned handlers, signature mismatches, malformed
//! type graphs, double initialization) are fatal [`SetupError`]s raised
//! before the registry exists.

mod bind;
pub mod error;
mod graph;
pub mod handler;
pub mod module;
pub mod registry;

pub use error::SetupError;
pub use handler::{HandlerDef, handler0, handler1, handler2};
pub use module::{Module, OwnerDef, StateDef, StateKind};
pub use registry::{
    Registry, StateInstance, all_states_for, registry, setup, state_by_symbol, state_for,
    state_of, try_registry,
};

// Re-export the substrate so applications depend on one crate.
pub use turnstate_core::{
    BoundSlot, DeriveError, FromValue, IntoValue, MethodTable, OwnerType, ShapeError, Signature,
    SlotDecl, SlotFn, SlotOrigin, StateMarker, StateOwner, TableShape, Value, ValueKind,
    impl_state_owner, owner_part_mut, state_short_name,
};
