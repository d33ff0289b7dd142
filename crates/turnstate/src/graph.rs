//! Type graph construction: ancestor-first owner processing.
//!
//! The builder flattens the registered modules into an owner index, then
//! processes each owner with its ancestors guaranteed first (memoized
//! recursion). Per owner the sequence is: resolve the table shape, carry the
//! ancestor's states forward (deriving their raw tables into the widened
//! shape), add the generation's own states parent-before-child, bind the
//! generation's handlers, validate that none were orphaned, and finalize
//! every table through the default filler. Raw tables are kept alongside the
//! finalized ones so descendant owners derive from the unset-preserving form.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;
use turnstate_core::{MethodTable, RawTable, TableShape, state_short_name};

use crate::bind::{PooledHandler, bind_state, check_all_consumed};
use crate::error::SetupError;
use crate::module::{Module, OwnerDef, StateDef, StateKind};

/// One state resolved at one owner generation: the unset-preserving raw table
/// (derivation source for descendants) and the finalized dispatch table.
#[derive(Debug)]
pub(crate) struct BuiltState {
    pub name: &'static str,
    pub marker: TypeId,
    pub kind: StateKind,
    pub symbol: Option<&'static str>,
    pub raw: RawTable,
    pub table: MethodTable,
}

/// A fully processed owner generation.
#[derive(Debug)]
pub(crate) struct BuiltOwner {
    pub name: &'static str,
    pub ty: TypeId,
    pub shape: Arc<TableShape>,
    /// The owner's type plus every ancestor type; capability-check domain.
    pub chain: HashSet<TypeId>,
    /// States visible on this owner (inherited and own), sorted by name.
    pub states: Vec<BuiltState>,
}

/// The complete, validated dispatch graph, owners sorted by name.
#[derive(Debug)]
pub(crate) struct TypeGraph {
    pub owners: Vec<BuiltOwner>,
}

/// Builds the graph from the registered modules. Any failure is fatal; the
/// partially built graph is discarded.
pub(crate) fn build_graph(modules: Vec<Module>) -> Result<TypeGraph, SetupError> {
    let mut defs: HashMap<TypeId, OwnerDef> = HashMap::new();
    let mut names: HashSet<&'static str> = HashSet::new();

    for module in modules {
        let module_name = module.name();
        for owner in module.owners {
            debug!(
                target: "turnstate::setup",
                module = module_name,
                owner = owner.name,
                states = owner.states.len(),
                handlers = owner.handlers.len(),
                "registered owner"
            );
            if !names.insert(owner.name) || defs.contains_key(&owner.ty) {
                return Err(SetupError::DuplicateOwner { name: owner.name });
            }
            defs.insert(owner.ty, owner);
        }
    }

    // Global ordering is a pure function of owner names: process in name
    // order so the output never depends on module enumeration order.
    let mut order: Vec<(&'static str, TypeId)> =
        defs.values().map(|def| (def.name, def.ty)).collect();
    order.sort_by_key(|(name, _)| *name);

    let mut built: HashMap<TypeId, BuiltOwner> = HashMap::new();
    let mut visiting: HashSet<TypeId> = HashSet::new();
    for &(_, ty) in &order {
        build_owner(ty, &defs, &mut built, &mut visiting)?;
    }

    let owners = order
        .iter()
        .filter_map(|(_, ty)| built.remove(ty))
        .collect();
    Ok(TypeGraph { owners })
}

fn build_owner(
    ty: TypeId,
    defs: &HashMap<TypeId, OwnerDef>,
    built: &mut HashMap<TypeId, BuiltOwner>,
    visiting: &mut HashSet<TypeId>,
) -> Result<(), SetupError> {
    if built.contains_key(&ty) {
        return Ok(());
    }
    let def = &defs[&ty];
    if !visiting.insert(ty) {
        return Err(SetupError::OwnerCycle { owner: def.name });
    }

    if let Some((parent_ty, parent_name)) = def.parent {
        if !defs.contains_key(&parent_ty) {
            return Err(SetupError::UnknownParent {
                owner: def.name,
                parent: parent_name,
            });
        }
        build_owner(parent_ty, defs, built, visiting)?;
    }

    // Shape of this generation: the ancestor's slots plus this owner's
    // contribution, relabeled to this owner.
    let parent = def.parent.map(|(parent_ty, _)| &built[&parent_ty]);
    let shape = Arc::new(match parent {
        Some(parent) => parent.shape.extend(def.name, def.slots.clone())?,
        None => TableShape::root(def.name, def.slots.clone())?,
    });
    if shape.is_empty() {
        return Err(SetupError::MissingTableShape { owner: def.name });
    }

    let mut chain: HashSet<TypeId> = parent.map(|p| p.chain.clone()).unwrap_or_default();
    chain.insert(ty);

    let mut pool: Vec<PooledHandler> = def
        .handlers
        .iter()
        .cloned()
        .map(PooledHandler::new)
        .collect();

    // Carry the ancestor's states forward, widened to this generation's
    // shape, then rebind: handlers declared here override inherited slots.
    let mut states: Vec<BuiltState> = Vec::new();
    let mut index_of: HashMap<&'static str, usize> = HashMap::new();
    let mut bound = 0;
    if let Some(parent) = parent {
        for carried in &parent.states {
            let mut raw = carried.raw.derive(Arc::clone(&shape))?;
            bound += bind_state(def.name, &chain, carried.name, &mut raw, &mut pool)?;
            index_of.insert(carried.name, states.len());
            states.push(BuiltState {
                name: carried.name,
                marker: carried.marker,
                kind: carried.kind,
                symbol: carried.symbol,
                table: raw.finalize(),
                raw,
            });
        }
    }

    // Own declarations must not collide with each other or shadow an
    // inherited state.
    let mut seen: HashSet<&'static str> = HashSet::new();
    for state in &def.states {
        if !seen.insert(state.name) || index_of.contains_key(state.name) {
            return Err(SetupError::DuplicateState {
                owner: def.name,
                state: state.name,
            });
        }
    }

    // Own declarations, parent state before child.
    let own: HashMap<&'static str, &StateDef> =
        def.states.iter().map(|state| (state.name, state)).collect();
    let mut resolving: HashSet<&'static str> = HashSet::new();
    for state in &def.states {
        bound += resolve_state(
            def.name,
            &chain,
            &shape,
            state,
            &own,
            &mut states,
            &mut index_of,
            &mut resolving,
            &mut pool,
        )?;
    }

    // Short names drive handler matching; a clash would make binding
    // order-dependent.
    for (index, state) in states.iter().enumerate() {
        for earlier in &states[..index] {
            if state_short_name(state.name) == state_short_name(earlier.name) {
                return Err(SetupError::StateShortNameClash {
                    owner: def.name,
                    first: earlier.name,
                    second: state.name,
                    short: state_short_name(state.name),
                });
            }
        }
    }

    check_all_consumed(def.name, &pool)?;

    states.sort_by_key(|state| state.name);
    debug!(
        target: "turnstate::setup",
        owner = def.name,
        slots = shape.len(),
        states = states.len(),
        handlers_bound = bound,
        "owner resolved"
    );

    visiting.remove(&ty);
    built.insert(
        ty,
        BuiltOwner {
            name: def.name,
            ty,
            shape,
            chain,
            states,
        },
    );
    Ok(())
}

/// Resolves one of the owner's own state declarations, recursing into its
/// parent declaration first. Memoized through `index_of`.
#[allow(clippy::too_many_arguments)]
fn resolve_state(
    owner: &'static str,
    chain: &HashSet<TypeId>,
    shape: &Arc<TableShape>,
    state: &StateDef,
    own: &HashMap<&'static str, &StateDef>,
    states: &mut Vec<BuiltState>,
    index_of: &mut HashMap<&'static str, usize>,
    resolving: &mut HashSet<&'static str>,
    pool: &mut Vec<PooledHandler>,
) -> Result<usize, SetupError> {
    if index_of.contains_key(state.name) {
        return Ok(0);
    }
    if !resolving.insert(state.name) {
        return Err(SetupError::StateCycle {
            owner,
            state: state.name,
        });
    }

    let mut bound = 0;
    let mut raw = match state.parent {
        Some(parent_name) => {
            if let Some(parent_def) = own.get(parent_name) {
                bound += resolve_state(
                    owner, chain, shape, parent_def, own, states, index_of, resolving, pool,
                )?;
            }
            let Some(&parent_index) = index_of.get(parent_name) else {
                return Err(SetupError::UnknownStateParent {
                    owner,
                    state: state.name,
                    parent: parent_name,
                });
            };
            states[parent_index].raw.clone()
        }
        None => RawTable::empty(Arc::clone(shape)),
    };

    bound += bind_state(owner, chain, state.name, &mut raw, pool)?;
    index_of.insert(state.name, states.len());
    states.push(BuiltState {
        name: state.name,
        marker: state.marker,
        kind: state.kind,
        symbol: state.symbol,
        table: raw.finalize(),
        raw,
    });

    resolving.remove(state.name);
    Ok(bound)
}
