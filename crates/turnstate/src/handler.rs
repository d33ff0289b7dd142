//! Handler definitions and their typed constructors.
//!
//! A handler is a closure a specific owner generation registers for one
//! (state, slot) target, named `<verb>_<StateShort>_<SlotName>`. The
//! constructors here erase the typed closure into a [`SlotFn`] and record the
//! value-level [`Signature`] plus the self capability the closure was written
//! against. The capability may be an ancestor of the registering owner; the
//! narrowing conversion ([`owner_part_mut`]) is captured inside the closure at
//! construction, so the binder only has to validate that the capability sits
//! on the owner's ancestor chain.

use std::any::TypeId;
use std::sync::Arc;

use turnstate_core::{
    FromValue, IntoValue, OwnerType, Signature, SlotFn, Value, owner_part_mut,
};

/// A named handler closure registered on one owner generation.
#[derive(Clone)]
pub struct HandlerDef {
    name: &'static str,
    capability: TypeId,
    capability_name: &'static str,
    sig: Signature,
    func: SlotFn,
}

impl HandlerDef {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact type of the self capability the closure expects.
    pub fn capability(&self) -> TypeId {
        self.capability
    }

    pub fn capability_name(&self) -> &'static str {
        self.capability_name
    }

    pub fn sig(&self) -> &Signature {
        &self.sig
    }

    pub(crate) fn func(&self) -> &SlotFn {
        &self.func
    }
}

impl std::fmt::Debug for HandlerDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDef")
            .field("name", &self.name)
            .field("capability", &self.capability_name)
            .field("sig", &self.sig)
            .finish()
    }
}

fn narrow<'a, A: OwnerType>(
    owner: &'a mut dyn turnstate_core::StateOwner,
) -> &'a mut A {
    match owner_part_mut::<A>(owner) {
        Some(part) => part,
        // Reaching this means an instance of an unrelated owner type was
        // pushed through a foreign table, which setup can never produce.
        None => panic!("slot invoked with an owner that does not embed '{}'", A::NAME),
    }
}

fn decode<P: FromValue>(slot_name: &str, index: usize, value: &Value) -> P {
    match P::from_value(value) {
        Some(param) => param,
        None => panic!(
            "handler '{slot_name}' argument {index} is not of kind '{}'",
            P::KIND
        ),
    }
}

/// Handler taking only the self capability.
pub fn handler0<A, R, F>(name: &'static str, f: F) -> HandlerDef
where
    A: OwnerType,
    R: IntoValue,
    F: Fn(&mut A) -> R + Send + Sync + 'static,
{
    let func: SlotFn = Arc::new(move |owner, _args| f(narrow::<A>(owner)).into_value());
    HandlerDef {
        name,
        capability: TypeId::of::<A>(),
        capability_name: A::NAME,
        sig: Signature::new([], R::KIND),
        func,
    }
}

/// Handler taking the self capability and one parameter.
pub fn handler1<A, P0, R, F>(name: &'static str, f: F) -> HandlerDef
where
    A: OwnerType,
    P0: FromValue,
    R: IntoValue,
    F: Fn(&mut A, P0) -> R + Send + Sync + 'static,
{
    let func: SlotFn = Arc::new(move |owner, args| {
        let p0 = decode::<P0>(name, 0, &args[0]);
        f(narrow::<A>(owner), p0).into_value()
    });
    HandlerDef {
        name,
        capability: TypeId::of::<A>(),
        capability_name: A::NAME,
        sig: Signature::new([P0::KIND], R::KIND),
        func,
    }
}

/// Handler taking the self capability and two parameters.
pub fn handler2<A, P0, P1, R, F>(name: &'static str, f: F) -> HandlerDef
where
    A: OwnerType,
    P0: FromValue,
    P1: FromValue,
    R: IntoValue,
    F: Fn(&mut A, P0, P1) -> R + Send + Sync + 'static,
{
    let func: SlotFn = Arc::new(move |owner, args| {
        let p0 = decode::<P0>(name, 0, &args[0]);
        let p1 = decode::<P1>(name, 1, &args[1]);
        f(narrow::<A>(owner), p0, p1).into_value()
    });
    HandlerDef {
        name,
        capability: TypeId::of::<A>(),
        capability_name: A::NAME,
        sig: Signature::new([P0::KIND, P1::KIND], R::KIND),
        func,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnstate_core::{ValueKind, impl_state_owner};

    struct Sentry {
        charge: i64,
    }

    impl_state_owner!(Sentry, "Sentry");

    #[test]
    fn constructor_records_signature_and_capability() {
        let def = handler1::<Sentry, i64, bool, _>("check_Idle_Armed", |sentry, floor| {
            sentry.charge >= floor
        });

        assert_eq!(def.name(), "check_Idle_Armed");
        assert_eq!(def.capability(), std::any::TypeId::of::<Sentry>());
        assert_eq!(def.capability_name(), "Sentry");
        assert_eq!(def.sig().params, vec![ValueKind::Int]);
        assert_eq!(def.sig().ret, ValueKind::Bool);
    }

    #[test]
    fn erased_closure_decodes_arguments() {
        let def = handler1::<Sentry, i64, bool, _>("check_Idle_Armed", |sentry, floor| {
            sentry.charge >= floor
        });

        let mut sentry = Sentry { charge: 5 };
        let result = (def.func())(&mut sentry, &[Value::Int(3)]);
        assert_eq!(result, Value::Bool(true));
        let result = (def.func())(&mut sentry, &[Value::Int(9)]);
        assert_eq!(result, Value::Bool(false));
    }

    #[test]
    fn unit_handlers_mutate_through_self() {
        let def = handler0::<Sentry, (), _>("drain_Idle_OnEnter", |sentry| {
            sentry.charge = 0;
        });

        let mut sentry = Sentry { charge: 5 };
        assert_eq!((def.func())(&mut sentry, &[]), Value::Unit);
        assert_eq!(sentry.charge, 0);
    }
}
