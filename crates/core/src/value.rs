//! Value universe for method-table slots.
//!
//! Slots pass and return [`Value`]s so that tables of different owner types can
//! share one erased callable representation. The universe is deliberately
//! integer-only: dispatch results feed deterministic, network-verified
//! simulation, so floating point is excluded.
//!
//! Every [`ValueKind`] has a canonical zero form ([`Value::zero`]); the default
//! filler substitutes it for slots no handler claimed, which is what removes
//! presence checks from dispatch call sites.

/// Discriminant of a [`Value`], used in slot and handler signatures.
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
pub enum ValueKind {
    /// No value; the slot is invoked for its effect only.
    Unit,
    /// Boolean flag.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// Symbolic name. The empty symbol is the absent/reference-less form.
    Sym,
    /// Ordered aggregate of values. The empty list is the zero form.
    List,
}

/// A value flowing through a method-table slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Sym(String),
    List(Vec<Value>),
}

impl Value {
    /// Returns the kind discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Unit => ValueKind::Unit,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Sym(_) => ValueKind::Sym,
            Value::List(_) => ValueKind::List,
        }
    }

    /// Canonical zero form for a kind: `()`, `false`, `0`, the empty symbol,
    /// or the empty list.
    pub fn zero(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Unit => Value::Unit,
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Sym => Value::Sym(String::new()),
            ValueKind::List => Value::List(Vec::new()),
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the symbol payload, if this is a `Sym`.
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Value::Sym(sym) => Some(sym),
            _ => None,
        }
    }

    /// Returns the list payload, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Conversion from a typed handler return into a [`Value`].
///
/// The associated `KIND` lets handler constructors record the value-level
/// signature without being handed one explicitly.
pub trait IntoValue {
    const KIND: ValueKind;

    fn into_value(self) -> Value;
}

/// Conversion from a slot argument [`Value`] into a typed handler parameter.
pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

impl IntoValue for () {
    const KIND: ValueKind = ValueKind::Unit;

    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl IntoValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for String {
    const KIND: ValueKind = ValueKind::Sym;

    fn into_value(self) -> Value {
        Value::Sym(self)
    }
}

impl IntoValue for &str {
    const KIND: ValueKind = ValueKind::Sym;

    fn into_value(self) -> Value {
        Value::Sym(self.to_owned())
    }
}

impl IntoValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn into_value(self) -> Value {
        Value::List(self)
    }
}

impl FromValue for () {
    const KIND: ValueKind = ValueKind::Unit;

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Unit => Some(()),
            _ => None,
        }
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Sym;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_sym().map(str::to_owned)
    }
}

impl FromValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().map(<[Value]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_forms_match_their_kind() {
        for kind in [
            ValueKind::Unit,
            ValueKind::Bool,
            ValueKind::Int,
            ValueKind::Sym,
            ValueKind::List,
        ] {
            assert_eq!(Value::zero(kind).kind(), kind);
        }
    }

    #[test]
    fn zero_forms_are_canonical() {
        assert_eq!(Value::zero(ValueKind::Bool), Value::Bool(false));
        assert_eq!(Value::zero(ValueKind::Int), Value::Int(0));
        assert_eq!(Value::zero(ValueKind::Sym), Value::Sym(String::new()));
        assert_eq!(Value::zero(ValueKind::List), Value::List(Vec::new()));
    }

    #[test]
    fn typed_round_trip_through_value() {
        assert_eq!(i64::from_value(&17i64.into_value()), Some(17));
        assert_eq!(bool::from_value(&true.into_value()), Some(true));
        assert_eq!(
            String::from_value(&"idle".into_value()),
            Some("idle".to_owned())
        );
    }

    #[test]
    fn mismatched_kind_converts_to_none() {
        assert_eq!(i64::from_value(&Value::Bool(true)), None);
        assert_eq!(bool::from_value(&Value::Unit), None);
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(ValueKind::Unit.to_string(), "unit");
        assert_eq!(ValueKind::List.to_string(), "list");
    }
}
