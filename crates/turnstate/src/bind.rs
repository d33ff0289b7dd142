//! Handler binding and the post-bind consistency check.
//!
//! For every slot of a state's table the binder computes the expected handler
//! name suffix `_{StateShort}_{SlotName}` and searches the owner's unconsumed
//! handler pool for a `<verb>_` prefixed match. A single match is validated
//! (signature, self capability) and bound; two or more matches are fatal.
//! Binding overwrites whatever the derivation copy carried, which is how the
//! most-derived handler wins.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;
use turnstate_core::{RawTable, state_short_name};

use crate::error::SetupError;
use crate::handler::HandlerDef;

/// A registered handler plus its consumption flag. Every handler must be
/// consumed by exactly one (state, slot) target before its owner passes
/// validation.
pub(crate) struct PooledHandler {
    pub def: HandlerDef,
    pub consumed: bool,
}

impl PooledHandler {
    pub fn new(def: HandlerDef) -> Self {
        Self {
            def,
            consumed: false,
        }
    }
}

/// Whether `handler` targets the given state/slot pair under the
/// `<verb>_<StateShort>_<SlotName>` convention. The verb is free-form but
/// must be non-empty.
fn matches_target(handler: &str, short: &str, slot: &str) -> bool {
    let Some(stem) = handler.strip_suffix(slot) else {
        return false;
    };
    let Some(stem) = stem.strip_suffix('_') else {
        return false;
    };
    let Some(verb) = stem.strip_suffix(short) else {
        return false;
    };
    verb.strip_suffix('_').is_some_and(|verb| !verb.is_empty())
}

/// Binds every matching unconsumed handler into `raw` for one state.
///
/// `chain` is the owner's type plus all ancestor types; a handler whose self
/// capability falls outside it is a fatal error. Returns the number of slots
/// bound.
pub(crate) fn bind_state(
    owner: &'static str,
    chain: &HashSet<TypeId>,
    state: &'static str,
    raw: &mut RawTable,
    pool: &mut [PooledHandler],
) -> Result<usize, SetupError> {
    let shape = Arc::clone(raw.shape());
    let short = state_short_name(state);
    let mut bound = 0;

    for (index, decl) in shape.slots().iter().enumerate() {
        let matches: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                !entry.consumed && matches_target(entry.def.name(), short, decl.name)
            })
            .map(|(pool_index, _)| pool_index)
            .collect();

        let pool_index = match matches.as_slice() {
            [] => continue,
            [single] => *single,
            many => {
                return Err(SetupError::AmbiguousHandler {
                    owner,
                    state,
                    slot: decl.name,
                    handlers: many
                        .iter()
                        .map(|&i| pool[i].def.name().to_owned())
                        .collect(),
                });
            }
        };

        let entry = &pool[pool_index];
        let handler = entry.def.name();
        let capability = entry.def.capability_name();

        if !chain.contains(&entry.def.capability()) {
            return Err(SetupError::ForeignCapability {
                owner,
                handler,
                capability: entry.def.capability_name(),
            });
        }

        let sig = entry.def.sig();
        if sig.ret != decl.sig.ret {
            return Err(SetupError::SignatureMismatch {
                owner,
                handler,
                state,
                slot: decl.name,
                reason: format!(
                    "return kind '{}' vs slot's '{}'",
                    sig.ret, decl.sig.ret
                ),
            });
        }
        if sig.arity() != decl.sig.arity() {
            return Err(SetupError::SignatureMismatch {
                owner,
                handler,
                state,
                slot: decl.name,
                reason: format!(
                    "{} parameter(s) vs slot's {}",
                    sig.arity(),
                    decl.sig.arity()
                ),
            });
        }
        for (position, (have, want)) in
            sig.params.iter().zip(decl.sig.params.iter()).enumerate()
        {
            if have != want {
                return Err(SetupError::SignatureMismatch {
                    owner,
                    handler,
                    state,
                    slot: decl.name,
                    reason: format!(
                        "parameter {position} kind '{have}' vs slot's '{want}'"
                    ),
                });
            }
        }

        let func = Arc::clone(entry.def.func());
        raw.bind(index, func, owner, handler);
        pool[pool_index].consumed = true;
        bound += 1;
        trace!(
            target: "turnstate::setup",
            owner,
            state,
            slot = decl.name,
            handler,
            capability,
            "bound handler"
        );
    }

    Ok(bound)
}

/// Consistency check: every handler the owner registered must have been
/// consumed. Orphans are enumerated in a single fatal error.
pub(crate) fn check_all_consumed(
    owner: &'static str,
    pool: &[PooledHandler],
) -> Result<(), SetupError> {
    let orphans: Vec<String> = pool
        .iter()
        .filter(|entry| !entry.consumed)
        .map(|entry| entry.def.name().to_owned())
        .collect();
    if orphans.is_empty() {
        Ok(())
    } else {
        Err(SetupError::OrphanedHandlers {
            owner,
            handlers: orphans,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_matching_requires_a_verb() {
        assert!(matches_target("run_Idle_Tick", "Idle", "Tick"));
        assert!(matches_target("charge_up_Idle_Tick", "Idle", "Tick"));
        assert!(!matches_target("_Idle_Tick", "Idle", "Tick"));
        assert!(!matches_target("Idle_Tick", "Idle", "Tick"));
    }

    #[test]
    fn target_matching_is_exact_on_state_and_slot() {
        assert!(!matches_target("run_Idle_Tick", "Idle", "OnEnter"));
        assert!(!matches_target("run_Patrol_Tick", "Idle", "Tick"));
        // Segment boundaries matter: "ColdIdle" is not "Idle".
        assert!(!matches_target("run_ColdIdle_Tick", "Idle", "Tick"));
    }
}
