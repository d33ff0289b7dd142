//! Owner capability traits and the ancestor-chain projection.
//!
//! An owner type hosts a state machine. Rust has no class inheritance, so the
//! single-inheritance chain the dispatch rules depend on is encoded
//! structurally: a derived owner embeds its ancestor part as a field and
//! exposes it through [`StateOwner::base_mut`]. Handlers written against an
//! ancestor capability reach that part through [`owner_part_mut`], which is the
//! narrowing conversion captured by handler closures at construction time.

use std::any::Any;

/// Capability implemented by every type that hosts a state machine.
///
/// `as_any` exposes the exact runtime type for registry lookup; `base_mut`
/// projects to the embedded ancestor part, if this generation has one.
/// Implement by hand or through [`impl_state_owner!`](crate::impl_state_owner).
pub trait StateOwner: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Projection to the embedded ancestor part. Root owner types return
    /// `None`.
    fn base_mut(&mut self) -> Option<&mut dyn StateOwner> {
        None
    }
}

/// Compile-time identity of an owner generation.
///
/// `NAME` is the global ordering key for registry enumeration and must be
/// unique across every registered owner type.
pub trait OwnerType: StateOwner + Sized {
    const NAME: &'static str;
}

/// Marker for one state of an owner's machine.
///
/// Markers are zero-sized label types; the declaring owner and the
/// abstract/concrete split live in the registration, not on the marker.
pub trait StateMarker: 'static {
    const NAME: &'static str;
}

/// Short form of a state name: a trailing `State` suffix is stripped, so
/// `IdleState` becomes `Idle`. Names that are exactly `State` stay unchanged.
pub fn state_short_name(name: &str) -> &str {
    match name.strip_suffix("State") {
        Some(short) if !short.is_empty() => short,
        _ => name,
    }
}

/// Walks the owner's base chain until the part of exact type `A` is found.
///
/// The first probe is the owner itself, so an owner-typed handler resolves
/// without touching the chain. Returns `None` if no generation of the chain
/// is an `A`, which only happens when an instance of an unrelated owner type
/// is pushed through a foreign table, a programmer error surfaced by the
/// caller.
pub fn owner_part_mut<A: Any>(owner: &mut dyn StateOwner) -> Option<&mut A> {
    if owner.as_any().is::<A>() {
        return owner.as_any_mut().downcast_mut::<A>();
    }
    owner.base_mut().and_then(|base| owner_part_mut::<A>(base))
}

/// Implements [`StateOwner`] and [`OwnerType`] for an owner struct.
///
/// Root owners name only the type and its registry name; derived owners also
/// name the field embedding the ancestor part:
///
/// ```
/// use turnstate_core::impl_state_owner;
///
/// struct Unit {
///     hp: i64,
/// }
///
/// struct Grunt {
///     base: Unit,
/// }
///
/// impl_state_owner!(Unit, "Unit");
/// impl_state_owner!(Grunt, "Grunt", base = base);
/// ```
#[macro_export]
macro_rules! impl_state_owner {
    ($ty:ty, $name:literal) => {
        impl $crate::StateOwner for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }

        impl $crate::OwnerType for $ty {
            const NAME: &'static str = $name;
        }
    };
    ($ty:ty, $name:literal, base = $field:ident) => {
        impl $crate::StateOwner for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn base_mut(&mut self) -> Option<&mut dyn $crate::StateOwner> {
                Some(&mut self.$field)
            }
        }

        impl $crate::OwnerType for $ty {
            const NAME: &'static str = $name;
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Root {
        tag: i64,
    }

    struct Mid {
        base: Root,
    }

    struct Leaf {
        base: Mid,
    }

    impl_state_owner!(Root, "Root");
    impl_state_owner!(Mid, "Mid", base = base);
    impl_state_owner!(Leaf, "Leaf", base = base);

    #[test]
    fn short_name_strips_state_suffix() {
        assert_eq!(state_short_name("IdleState"), "Idle");
        assert_eq!(state_short_name("ChargeAttackState"), "ChargeAttack");
    }

    #[test]
    fn short_name_keeps_bare_names() {
        assert_eq!(state_short_name("Idle"), "Idle");
        assert_eq!(state_short_name("State"), "State");
    }

    #[test]
    fn exact_type_resolves_without_walking() {
        let mut leaf = Leaf {
            base: Mid {
                base: Root { tag: 3 },
            },
        };
        assert!(owner_part_mut::<Leaf>(&mut leaf).is_some());
    }

    #[test]
    fn ancestor_part_found_through_two_levels() {
        let mut leaf = Leaf {
            base: Mid {
                base: Root { tag: 7 },
            },
        };
        let root = owner_part_mut::<Root>(&mut leaf).unwrap();
        assert_eq!(root.tag, 7);
        root.tag = 9;
        assert_eq!(leaf.base.base.tag, 9);
    }

    #[test]
    fn unrelated_type_is_not_found() {
        struct Stranger;
        impl_state_owner!(Stranger, "Stranger");

        let mut leaf = Leaf {
            base: Mid {
                base: Root { tag: 0 },
            },
        };
        assert!(owner_part_mut::<Stranger>(&mut leaf).is_none());
    }
}
