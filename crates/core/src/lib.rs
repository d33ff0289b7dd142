//! Pure method-table substrate for ahead-of-time state dispatch.
//!
//! `turnstate-core` defines the data model the registry layer assembles at
//! process start: the value universe slots speak ([`Value`]), the owner
//! capability chain ([`StateOwner`]), table shapes ([`TableShape`]), and table
//! values in their build-time ([`RawTable`]) and dispatch-time
//! ([`MethodTable`]) forms. Everything here is deterministic and free of
//! global state; the one-shot setup pass and the registry live in the
//! `turnstate` crate.

pub mod owner;
pub mod shape;
pub mod table;
pub mod value;

pub use owner::{OwnerType, StateMarker, StateOwner, owner_part_mut, state_short_name};
pub use shape::{ShapeError, Signature, SlotDecl, TableShape};
pub use table::{BoundSlot, DeriveError, MethodTable, RawTable, SlotFn, SlotOrigin};
pub use value::{FromValue, IntoValue, Value, ValueKind};
