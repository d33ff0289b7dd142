//! The immutable, deterministically ordered state-instance registry.
//!
//! Two read views exist over the same underlying instances: one flat sequence
//! of every concrete state in the process, ordered purely by
//! (owner name, state name), and one per-owner sequence ordered by state
//! name. Both orderings are functions of names only, so independent
//! processes registering the same declarations enumerate identically: the
//! precondition for using the flat sequence as a network-stable enumeration
//! key.
//!
//! The registry is constructed once ([`setup`]) and never mutated; every
//! query is lock-free and allocation-free.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::debug;
use turnstate_core::{BoundSlot, MethodTable, OwnerType, StateMarker, StateOwner};

use crate::error::SetupError;
use crate::graph::build_graph;
use crate::module::Module;

/// One concrete state resolved for one owning owner type.
pub struct StateInstance {
    owner_name: &'static str,
    name: &'static str,
    marker: TypeId,
    symbol: Option<&'static str>,
    table: MethodTable,
}

impl StateInstance {
    /// Name of the owner type this instance belongs to.
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `TypeId` of the state marker this instance was declared with.
    pub fn marker(&self) -> TypeId {
        self.marker
    }

    /// Symbolic name attached at declaration, if any.
    pub fn symbol(&self) -> Option<&'static str> {
        self.symbol
    }

    /// The fully-resolved method table; every slot is callable.
    pub fn table(&self) -> &MethodTable {
        &self.table
    }

    /// Shorthand for `table().slot(name)`.
    pub fn slot(&self, name: &str) -> Option<&BoundSlot> {
        self.table.slot(name)
    }
}

impl fmt::Debug for StateInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateInstance")
            .field("owner", &self.owner_name)
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .finish()
    }
}

struct OwnerEntry {
    name: &'static str,
    /// Concrete instances owned by this type, sorted by state name.
    instances: Vec<Arc<StateInstance>>,
    by_marker: HashMap<TypeId, Arc<StateInstance>>,
    /// Every resolved table on this owner, abstract states included.
    tables: BTreeMap<&'static str, MethodTable>,
}

/// Read-only index of every state instance in the process.
pub struct Registry {
    all: Vec<Arc<StateInstance>>,
    owners: HashMap<TypeId, OwnerEntry>,
}

impl Registry {
    /// Builds a registry from the given modules. Pure: no global state is
    /// touched, which is what tests use. Applications normally go through
    /// [`setup`] instead.
    pub fn build(modules: Vec<Module>) -> Result<Self, SetupError> {
        let graph = build_graph(modules)?;

        let mut all = Vec::new();
        let mut owners = HashMap::new();
        for owner in graph.owners {
            let mut entry = OwnerEntry {
                name: owner.name,
                instances: Vec::new(),
                by_marker: HashMap::new(),
                tables: BTreeMap::new(),
            };
            for state in owner.states {
                entry.tables.insert(state.name, state.table.clone());
                if !state.kind.is_concrete() {
                    continue;
                }
                let instance = Arc::new(StateInstance {
                    owner_name: owner.name,
                    name: state.name,
                    marker: state.marker,
                    symbol: state.symbol,
                    table: state.table,
                });
                entry.by_marker.insert(state.marker, Arc::clone(&instance));
                entry.instances.push(Arc::clone(&instance));
                all.push(instance);
            }
            owners.insert(owner.ty, entry);
        }

        // Graph owners arrive sorted by name and states sorted within each
        // owner; sort again so the flat ordering is self-evidently a pure
        // function of the name pair.
        all.sort_by_key(|instance| (instance.owner_name, instance.name));
        debug!(
            target: "turnstate::registry",
            owners = owners.len(),
            instances = all.len(),
            "registry built"
        );
        Ok(Self { all, owners })
    }

    /// Every concrete state instance, ordered by (owner name, state name).
    pub fn all(&self) -> &[Arc<StateInstance>] {
        &self.all
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Resolves the instance of state `S` owned by the caller's exact
    /// runtime type. `None` if that type never contributed such a state,
    /// which is a programmer error.
    pub fn state_of<S: StateMarker>(&self, owner: &dyn StateOwner) -> Option<&Arc<StateInstance>> {
        self.owners
            .get(&owner.as_any().type_id())?
            .by_marker
            .get(&TypeId::of::<S>())
    }

    /// Static form of [`Registry::state_of`] for contexts without an
    /// instance.
    pub fn state_for<O: OwnerType, S: StateMarker>(&self) -> Option<&Arc<StateInstance>> {
        self.owners
            .get(&TypeId::of::<O>())?
            .by_marker
            .get(&TypeId::of::<S>())
    }

    /// The ordered sequence of instances owned by the caller's exact runtime
    /// type. Empty for unregistered types.
    pub fn states_for(&self, owner: &dyn StateOwner) -> &[Arc<StateInstance>] {
        self.owners
            .get(&owner.as_any().type_id())
            .map(|entry| entry.instances.as_slice())
            .unwrap_or_default()
    }

    /// The ordered sequence of instances owned by `O`.
    pub fn states_for_type<O: OwnerType>(&self) -> &[Arc<StateInstance>] {
        self.owners
            .get(&TypeId::of::<O>())
            .map(|entry| entry.instances.as_slice())
            .unwrap_or_default()
    }

    /// Linear scan of the caller's owned instances for one carrying the
    /// symbol. `None` when no instance matches.
    pub fn state_by_symbol(
        &self,
        owner: &dyn StateOwner,
        symbol: &str,
    ) -> Option<&Arc<StateInstance>> {
        self.states_for(owner)
            .iter()
            .find(|instance| instance.symbol == Some(symbol))
    }

    /// Resolved method table for any state visible on `O`, abstract states
    /// included. Instances only expose concrete states; this is the window
    /// onto template tables.
    pub fn table_for<O: OwnerType>(&self, state: &str) -> Option<&MethodTable> {
        self.owners.get(&TypeId::of::<O>())?.tables.get(state)
    }

    /// Registered name of the owner type that `owner` is an instance of.
    pub fn owner_name_of(&self, owner: &dyn StateOwner) -> Option<&'static str> {
        self.owners
            .get(&owner.as_any().type_id())
            .map(|entry| entry.name)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("owners", &self.owners.len())
            .field("instances", &self.all)
            .finish()
    }
}

static SETUP_CLAIMED: AtomicBool = AtomicBool::new(false);
static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// One-shot global setup. Builds the registry from `modules` and publishes
/// it for the remainder of the process.
///
/// A second invocation is a programmer error and fails with
/// [`SetupError::AlreadyInitialized`], never silently ignored. If the build
/// itself fails the claim is deliberately not released: setup errors are
/// fatal and the process is expected to stop.
pub fn setup(modules: Vec<Module>) -> Result<&'static Registry, SetupError> {
    if SETUP_CLAIMED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(SetupError::AlreadyInitialized);
    }
    let registry = Registry::build(modules)?;
    Ok(REGISTRY.get_or_init(|| registry))
}

/// The global registry, if [`setup`] has completed.
pub fn try_registry() -> Option<&'static Registry> {
    REGISTRY.get()
}

/// The global registry.
///
/// # Panics
///
/// Panics if [`setup`] has not completed; dispatch before setup is a
/// programmer error.
pub fn registry() -> &'static Registry {
    match REGISTRY.get() {
        Some(registry) => registry,
        None => panic!("turnstate::setup() has not completed"),
    }
}

/// Per-instance state lookup against the global registry; see
/// [`Registry::state_of`].
pub fn state_of<S: StateMarker>(owner: &dyn StateOwner) -> Option<&'static Arc<StateInstance>> {
    registry().state_of::<S>(owner)
}

/// Static state lookup against the global registry; see
/// [`Registry::state_for`].
pub fn state_for<O: OwnerType, S: StateMarker>() -> Option<&'static Arc<StateInstance>> {
    registry().state_for::<O, S>()
}

/// Ordered owned-instance sequence from the global registry; see
/// [`Registry::states_for`].
pub fn all_states_for(owner: &dyn StateOwner) -> &'static [Arc<StateInstance>] {
    registry().states_for(owner)
}

/// Symbol lookup against the global registry; see
/// [`Registry::state_by_symbol`].
pub fn state_by_symbol(
    owner: &dyn StateOwner,
    symbol: &str,
) -> Option<&'static Arc<StateInstance>> {
    registry().state_by_symbol(owner, symbol)
}
