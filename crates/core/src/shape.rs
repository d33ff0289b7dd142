//! Method-table shapes: the slot schema of an owner lineage.
//!
//! A shape is the ordered list of slot declarations visible at one owner
//! generation. A derived generation may append slots but can never remove or
//! redeclare inherited ones, so every shape is a structural extension of its
//! ancestor's shape. The shape carries the owner generation that produced it,
//! which is how a generic ancestor schema specializes per concrete owner.

use crate::value::ValueKind;

/// Value-level signature of a slot or handler.
///
/// The implicit self/capability parameter is excluded on both sides, so a
/// handler matches a slot when the parameter lists are equal element-wise and
/// the return kinds are identical.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// Parameter kinds, excluding self.
    pub params: Vec<ValueKind>,
    /// Return kind.
    pub ret: ValueKind,
}

impl Signature {
    pub fn new(params: impl Into<Vec<ValueKind>>, ret: ValueKind) -> Self {
        Self {
            params: params.into(),
            ret,
        }
    }

    /// Number of parameters, excluding self.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// One named, typed hook within a method table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotDecl {
    pub name: &'static str,
    pub sig: Signature,
}

impl SlotDecl {
    pub fn new(name: &'static str, params: impl Into<Vec<ValueKind>>, ret: ValueKind) -> Self {
        Self {
            name,
            sig: Signature::new(params, ret),
        }
    }
}

/// Errors raised while assembling a table shape.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("owner '{owner}' declares slot '{slot}' more than once")]
    DuplicateSlot {
        owner: &'static str,
        slot: &'static str,
    },
}

/// The slot schema visible at one owner generation.
///
/// Slots inherited from ancestors come first, in ancestor order; slots added
/// by this generation follow. Indices are therefore stable across the whole
/// lineage, which is what lets table values be copied forward verbatim.
#[derive(Clone, Debug)]
pub struct TableShape {
    owner: &'static str,
    slots: Vec<SlotDecl>,
}

impl TableShape {
    /// Shape of a root owner generation.
    pub fn root(owner: &'static str, slots: Vec<SlotDecl>) -> Result<Self, ShapeError> {
        let shape = Self { owner, slots };
        shape.check_unique()?;
        Ok(shape)
    }

    /// Shape of a derived generation: the ancestor's slots plus `added`.
    pub fn extend(&self, owner: &'static str, added: Vec<SlotDecl>) -> Result<Self, ShapeError> {
        let mut slots = self.slots.clone();
        slots.extend(added);
        let shape = Self { owner, slots };
        shape.check_unique()?;
        Ok(shape)
    }

    /// Owner generation this shape belongs to.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn slots(&self) -> &[SlotDecl] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the named slot, if declared anywhere in the lineage.
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name == name)
    }

    /// Whether this shape is a structural extension of `ancestor`: every
    /// ancestor slot appears at the same index with the same name and
    /// signature. A shape extends itself.
    pub fn extends(&self, ancestor: &TableShape) -> bool {
        self.slots.len() >= ancestor.slots.len()
            && self
                .slots
                .iter()
                .zip(ancestor.slots.iter())
                .all(|(own, theirs)| own == theirs)
    }

    fn check_unique(&self) -> Result<(), ShapeError> {
        for (index, slot) in self.slots.iter().enumerate() {
            if self.slots[..index].iter().any(|seen| seen.name == slot.name) {
                return Err(ShapeError::DuplicateSlot {
                    owner: self.owner,
                    slot: slot.name,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_shape() -> TableShape {
        TableShape::root(
            "Unit",
            vec![
                SlotDecl::new("OnEnter", [], ValueKind::Unit),
                SlotDecl::new("Tick", [], ValueKind::Int),
            ],
        )
        .unwrap()
    }

    #[test]
    fn extension_keeps_ancestor_indices() {
        let base = base_shape();
        let derived = base
            .extend("Grunt", vec![SlotDecl::new("OnExit", [], ValueKind::Unit)])
            .unwrap();

        assert_eq!(derived.slot_index("OnEnter"), Some(0));
        assert_eq!(derived.slot_index("Tick"), Some(1));
        assert_eq!(derived.slot_index("OnExit"), Some(2));
        assert_eq!(derived.owner(), "Grunt");
    }

    #[test]
    fn derived_shape_extends_ancestor() {
        let base = base_shape();
        let derived = base
            .extend("Grunt", vec![SlotDecl::new("OnExit", [], ValueKind::Unit)])
            .unwrap();

        assert!(derived.extends(&base));
        assert!(derived.extends(&derived));
        assert!(!base.extends(&derived));
    }

    #[test]
    fn relabeled_shape_still_extends() {
        let base = base_shape();
        let relabeled = base.extend("Grunt", Vec::new()).unwrap();
        assert!(relabeled.extends(&base));
        assert!(base.extends(&relabeled));
    }

    #[test]
    fn duplicate_slot_in_root_is_rejected() {
        let err = TableShape::root(
            "Unit",
            vec![
                SlotDecl::new("Tick", [], ValueKind::Int),
                SlotDecl::new("Tick", [], ValueKind::Int),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::DuplicateSlot {
                owner: "Unit",
                slot: "Tick",
            }
        );
    }

    #[test]
    fn duplicate_slot_across_generations_is_rejected() {
        let base = base_shape();
        let err = base
            .extend("Grunt", vec![SlotDecl::new("Tick", [], ValueKind::Int)])
            .unwrap_err();
        assert!(matches!(err, ShapeError::DuplicateSlot { slot: "Tick", .. }));
    }

    #[test]
    fn unrelated_shapes_do_not_extend() {
        let base = base_shape();
        let other = TableShape::root(
            "Turret",
            vec![SlotDecl::new("Aim", [], ValueKind::Bool)],
        )
        .unwrap();
        assert!(!other.extends(&base));
    }
}
