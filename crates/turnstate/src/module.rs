//! Declarative registration: modules, owner definitions, state declarations.
//!
//! Registration replaces the reflective module scan of classic stateful-method
//! frameworks: each owner generation registers its table-slot contribution,
//! its nested state declarations, and its handler closures, and `setup`
//! assembles the dispatch graph from these definitions. A [`Module`] is just
//! a named bundle of owner definitions, typically one per source module of
//! the hosting application.

use std::any::TypeId;

use turnstate_core::{OwnerType, SlotDecl, StateMarker, ValueKind};

use crate::handler::HandlerDef;

/// Whether a state is a shared template or an instantiable state.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StateKind {
    /// Template only: gets a method table for descendants to derive from,
    /// but never a state instance.
    Abstract,
    /// Instantiable: produces exactly one state instance per owning owner
    /// type.
    Concrete,
}

impl StateKind {
    /// Returns true for instantiable states.
    pub fn is_concrete(&self) -> bool {
        matches!(self, StateKind::Concrete)
    }
}

/// Declaration of one state on one owner generation.
#[derive(Clone, Debug)]
pub struct StateDef {
    pub(crate) name: &'static str,
    pub(crate) marker: TypeId,
    pub(crate) kind: StateKind,
    pub(crate) parent: Option<&'static str>,
    pub(crate) symbol: Option<&'static str>,
}

impl StateDef {
    /// Declares the state marked by `S`.
    pub fn new<S: StateMarker>(kind: StateKind) -> Self {
        Self {
            name: S::NAME,
            marker: TypeId::of::<S>(),
            kind,
            parent: None,
            symbol: None,
        }
    }

    /// Shorthand for `new::<S>(StateKind::Concrete)`.
    pub fn concrete<S: StateMarker>() -> Self {
        Self::new::<S>(StateKind::Concrete)
    }

    /// Shorthand for `new::<S>(StateKind::Abstract)`.
    pub fn template<S: StateMarker>() -> Self {
        Self::new::<S>(StateKind::Abstract)
    }

    /// Declares that this state derives `P`, which must be visible on the
    /// same owner (declared there or inherited from an ancestor owner).
    #[must_use]
    pub fn derives<P: StateMarker>(mut self) -> Self {
        self.parent = Some(P::NAME);
        self
    }

    /// Attaches a symbolic name, making the state findable through
    /// symbol lookup on the registry.
    #[must_use]
    pub fn symbol(mut self, symbol: &'static str) -> Self {
        self.symbol = Some(symbol);
        self
    }
}

/// Registration of one owner generation.
#[derive(Clone, Debug)]
pub struct OwnerDef {
    pub(crate) name: &'static str,
    pub(crate) ty: TypeId,
    pub(crate) parent: Option<(TypeId, &'static str)>,
    pub(crate) slots: Vec<SlotDecl>,
    pub(crate) states: Vec<StateDef>,
    pub(crate) handlers: Vec<HandlerDef>,
}

impl OwnerDef {
    /// Starts the registration of owner type `O`.
    pub fn new<O: OwnerType>() -> Self {
        Self {
            name: O::NAME,
            ty: TypeId::of::<O>(),
            parent: None,
            slots: Vec::new(),
            states: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Declares the owner's parent generation. The owner struct must embed
    /// the parent part and expose it through `StateOwner::base_mut`.
    #[must_use]
    pub fn extends<P: OwnerType>(mut self) -> Self {
        self.parent = Some((TypeId::of::<P>(), P::NAME));
        self
    }

    /// Appends a slot to this generation's table-shape contribution.
    #[must_use]
    pub fn slot(
        mut self,
        name: &'static str,
        params: impl Into<Vec<ValueKind>>,
        ret: ValueKind,
    ) -> Self {
        self.slots.push(SlotDecl::new(name, params, ret));
        self
    }

    /// Declares a state on this generation.
    #[must_use]
    pub fn state(mut self, state: StateDef) -> Self {
        self.states.push(state);
        self
    }

    /// Registers a handler method on this generation.
    #[must_use]
    pub fn handler(mut self, handler: HandlerDef) -> Self {
        self.handlers.push(handler);
        self
    }
}

/// A named bundle of owner definitions, the unit `setup` consumes.
#[derive(Clone, Debug, Default)]
pub struct Module {
    name: &'static str,
    pub(crate) owners: Vec<OwnerDef>,
}

impl Module {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            owners: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adds an owner registration to this module.
    #[must_use]
    pub fn owner(mut self, owner: OwnerDef) -> Self {
        self.owners.push(owner);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler0;
    use turnstate_core::impl_state_owner;

    struct Scout {
        fatigue: i64,
    }

    impl_state_owner!(Scout, "Scout");

    struct IdleState;

    impl StateMarker for IdleState {
        const NAME: &'static str = "IdleState";
    }

    struct RestState;

    impl StateMarker for RestState {
        const NAME: &'static str = "RestState";
    }

    #[test]
    fn owner_def_collects_declarations() {
        let def = OwnerDef::new::<Scout>()
            .slot("OnEnter", [], ValueKind::Unit)
            .slot("Tick", [], ValueKind::Int)
            .state(StateDef::concrete::<IdleState>().symbol("idle"))
            .state(StateDef::concrete::<RestState>().derives::<IdleState>())
            .handler(handler0::<Scout, i64, _>("count_Idle_Tick", |scout| {
                scout.fatigue
            }));

        assert_eq!(def.name, "Scout");
        assert_eq!(def.slots.len(), 2);
        assert_eq!(def.states.len(), 2);
        assert_eq!(def.states[0].symbol, Some("idle"));
        assert_eq!(def.states[1].parent, Some("IdleState"));
        assert_eq!(def.handlers.len(), 1);
    }

    #[test]
    fn state_kind_names_are_snake_case() {
        assert_eq!(StateKind::Abstract.to_string(), "abstract");
        assert!(StateKind::Concrete.is_concrete());
    }
}
