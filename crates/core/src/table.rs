//! Method-table values: raw (build-time) and finalized (dispatch-time).
//!
//! A [`RawTable`] is the unset-preserving form the setup pass works on: slots
//! hold `Option`s so that derivation can copy an ancestor's value forward
//! without losing the distinction between "bound by a handler" and "still
//! open". [`RawTable::finalize`] is the default filler: it produces a
//! [`MethodTable`] in which every slot is callable, substituting the canonical
//! zero-returning no-op for anything left open. Dispatch therefore never
//! checks for presence.

use std::fmt;
use std::sync::Arc;

use crate::owner::StateOwner;
use crate::shape::{Signature, TableShape};
use crate::value::Value;

/// Erased slot callable. The first argument is the owner instance; the slice
/// carries the declared parameters in order.
pub type SlotFn = Arc<dyn Fn(&mut dyn StateOwner, &[Value]) -> Value + Send + Sync>;

/// Where a finalized slot implementation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotOrigin {
    /// Canonical zero-returning no-op substituted by the default filler.
    Default,
    /// A handler method bound by the named owner generation.
    Handler {
        owner: &'static str,
        name: &'static str,
    },
}

impl SlotOrigin {
    /// Returns true for the default-filler no-op.
    pub fn is_default(&self) -> bool {
        matches!(self, SlotOrigin::Default)
    }
}

#[derive(Clone)]
struct RawSlot {
    func: SlotFn,
    owner: &'static str,
    handler: &'static str,
}

/// Errors raised while deriving one table value from another.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeriveError {
    #[error(
        "table shape of '{target}' is not a structural extension of the shape of '{ancestor}'"
    )]
    NotDescendant {
        ancestor: &'static str,
        target: &'static str,
    },
}

/// Build-time table value: one optional binding per shape slot.
#[derive(Clone)]
pub struct RawTable {
    shape: Arc<TableShape>,
    slots: Vec<Option<RawSlot>>,
}

impl RawTable {
    /// Fresh value with every slot unset.
    pub fn empty(shape: Arc<TableShape>) -> Self {
        let slots = vec![None; shape.len()];
        Self { shape, slots }
    }

    pub fn shape(&self) -> &Arc<TableShape> {
        &self.shape
    }

    /// Copies this value forward into `target`'s shape, slot for slot.
    ///
    /// Bound and unset slots are both carried verbatim; slots `target` adds
    /// beyond this value's shape start unset. Fails if `target` is not a
    /// structural extension of this value's shape.
    pub fn derive(&self, target: Arc<TableShape>) -> Result<RawTable, DeriveError> {
        if !target.extends(&self.shape) {
            return Err(DeriveError::NotDescendant {
                ancestor: self.shape.owner(),
                target: target.owner(),
            });
        }
        let mut slots = self.slots.clone();
        slots.resize(target.len(), None);
        Ok(RawTable { shape: target, slots })
    }

    /// Binds `func` into the slot at `index`, replacing any earlier binding.
    /// Overwriting is what makes the most-derived handler win after a
    /// derivation copy.
    pub fn bind(&mut self, index: usize, func: SlotFn, owner: &'static str, handler: &'static str) {
        self.slots[index] = Some(RawSlot {
            func,
            owner,
            handler,
        });
    }

    /// Whether the slot at `index` has a binding.
    pub fn is_bound(&self, index: usize) -> bool {
        self.slots[index].is_some()
    }

    /// Default filler: produces the dispatch-ready table, substituting the
    /// canonical no-op for every slot still unset.
    pub fn finalize(&self) -> MethodTable {
        let slots = self
            .shape
            .slots()
            .iter()
            .zip(self.slots.iter())
            .map(|(decl, raw)| match raw {
                Some(raw) => BoundSlot {
                    name: decl.name,
                    sig: decl.sig.clone(),
                    origin: SlotOrigin::Handler {
                        owner: raw.owner,
                        name: raw.handler,
                    },
                    func: Arc::clone(&raw.func),
                },
                None => BoundSlot {
                    name: decl.name,
                    sig: decl.sig.clone(),
                    origin: SlotOrigin::Default,
                    func: default_slot(decl.sig.ret),
                },
            })
            .collect();
        MethodTable {
            shape: Arc::clone(&self.shape),
            slots,
        }
    }
}

impl fmt::Debug for RawTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (decl, slot) in self.shape.slots().iter().zip(self.slots.iter()) {
            match slot {
                Some(raw) => map.entry(&decl.name, &format_args!("{}::{}", raw.owner, raw.handler)),
                None => map.entry(&decl.name, &format_args!("<unset>")),
            };
        }
        map.finish()
    }
}

fn default_slot(ret: crate::value::ValueKind) -> SlotFn {
    Arc::new(move |_owner, _args| Value::zero(ret))
}

/// One fully-resolved, callable slot of a finalized table.
#[derive(Clone)]
pub struct BoundSlot {
    name: &'static str,
    sig: Signature,
    origin: SlotOrigin,
    func: SlotFn,
}

impl BoundSlot {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn sig(&self) -> &Signature {
        &self.sig
    }

    pub fn origin(&self) -> SlotOrigin {
        self.origin
    }

    /// Invokes the slot. `args` must match the declared signature; the
    /// contract is checked in debug builds only because setup already
    /// validated every binding.
    pub fn call(&self, owner: &mut dyn StateOwner, args: &[Value]) -> Value {
        debug_assert_eq!(
            args.len(),
            self.sig.arity(),
            "slot '{}' expects {} argument(s)",
            self.name,
            self.sig.arity()
        );
        debug_assert!(
            args.iter()
                .zip(self.sig.params.iter())
                .all(|(arg, kind)| arg.kind() == *kind),
            "slot '{}' argument kinds do not match its signature",
            self.name
        );
        (self.func)(owner, args)
    }

    /// Calls an integer-returning slot; `None` if the slot returns another
    /// kind.
    pub fn call_int(&self, owner: &mut dyn StateOwner, args: &[Value]) -> Option<i64> {
        self.call(owner, args).as_int()
    }

    /// Calls a boolean-returning slot; `None` if the slot returns another
    /// kind.
    pub fn call_bool(&self, owner: &mut dyn StateOwner, args: &[Value]) -> Option<bool> {
        self.call(owner, args).as_bool()
    }
}

impl fmt::Debug for BoundSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSlot")
            .field("name", &self.name)
            .field("sig", &self.sig)
            .field("origin", &self.origin)
            .finish()
    }
}

/// A fully-resolved method table: every slot of the shape is callable.
#[derive(Clone)]
pub struct MethodTable {
    shape: Arc<TableShape>,
    slots: Vec<BoundSlot>,
}

impl MethodTable {
    pub fn shape(&self) -> &Arc<TableShape> {
        &self.shape
    }

    /// Looks up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&BoundSlot> {
        self.shape
            .slot_index(name)
            .map(|index| &self.slots[index])
    }

    pub fn slots(&self) -> &[BoundSlot] {
        &self.slots
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("owner", &self.shape.owner())
            .field("slots", &self.slots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_state_owner;
    use crate::shape::SlotDecl;
    use crate::value::ValueKind;

    struct Counter {
        ticks: i64,
    }

    impl_state_owner!(Counter, "Counter");

    fn shape() -> Arc<TableShape> {
        Arc::new(
            TableShape::root(
                "Counter",
                vec![
                    SlotDecl::new("OnEnter", [], ValueKind::Unit),
                    SlotDecl::new("Tick", [], ValueKind::Int),
                ],
            )
            .unwrap(),
        )
    }

    fn tick_fn() -> SlotFn {
        Arc::new(|owner, _args| {
            let counter = owner.as_any_mut().downcast_mut::<Counter>().unwrap();
            counter.ticks += 1;
            Value::Int(counter.ticks)
        })
    }

    #[test]
    fn finalize_fills_unset_slots_with_zero_noops() {
        let raw = RawTable::empty(shape());
        let table = raw.finalize();
        let mut counter = Counter { ticks: 0 };

        let enter = table.slot("OnEnter").unwrap();
        assert!(enter.origin().is_default());
        assert_eq!(enter.call(&mut counter, &[]), Value::Unit);

        let tick = table.slot("Tick").unwrap();
        assert_eq!(tick.call_int(&mut counter, &[]), Some(0));
        // The default performs no observable effect.
        assert_eq!(counter.ticks, 0);
    }

    #[test]
    fn bound_slot_keeps_its_origin_through_finalize() {
        let mut raw = RawTable::empty(shape());
        raw.bind(1, tick_fn(), "Counter", "run_Idle_Tick");
        let table = raw.finalize();

        let tick = table.slot("Tick").unwrap();
        assert_eq!(
            tick.origin(),
            SlotOrigin::Handler {
                owner: "Counter",
                name: "run_Idle_Tick",
            }
        );
        let mut counter = Counter { ticks: 0 };
        assert_eq!(tick.call_int(&mut counter, &[]), Some(1));
        assert_eq!(counter.ticks, 1);
    }

    #[test]
    fn derive_copies_bound_and_unset_slots() {
        let base_shape = shape();
        let derived_shape = Arc::new(
            base_shape
                .extend("Elite", vec![SlotDecl::new("OnExit", [], ValueKind::Unit)])
                .unwrap(),
        );

        let mut raw = RawTable::empty(base_shape);
        raw.bind(1, tick_fn(), "Counter", "run_Idle_Tick");

        let derived = raw.derive(derived_shape).unwrap();
        assert!(!derived.is_bound(0));
        assert!(derived.is_bound(1));
        assert!(!derived.is_bound(2));
    }

    #[test]
    fn derive_rejects_foreign_shape() {
        let raw = RawTable::empty(shape());
        let foreign = Arc::new(
            TableShape::root("Turret", vec![SlotDecl::new("Aim", [], ValueKind::Bool)]).unwrap(),
        );
        let err = raw.derive(foreign).unwrap_err();
        assert_eq!(
            err,
            DeriveError::NotDescendant {
                ancestor: "Counter",
                target: "Turret",
            }
        );
    }

    #[test]
    fn rebinding_overwrites_the_inherited_slot() {
        let mut raw = RawTable::empty(shape());
        raw.bind(1, tick_fn(), "Counter", "run_Idle_Tick");
        raw.bind(
            1,
            Arc::new(|_owner, _args| Value::Int(42)),
            "Elite",
            "boost_Idle_Tick",
        );

        let table = raw.finalize();
        let mut counter = Counter { ticks: 0 };
        assert_eq!(table.slot("Tick").unwrap().call_int(&mut counter, &[]), Some(42));
        assert_eq!(counter.ticks, 0);
    }
}
