//! Stamps: the type and nullness facts attached to every node.

use crate::constant::TypeRef;

/// What the optimizer knows about the value a node produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Stamp {
    /// The node produces no value (control-only nodes, stores).
    Void,
    /// A primitive integer.
    Int,
    /// A reference.
    Object {
        /// Declared or proven class, `None` for "any object".
        ty: Option<TypeRef>,
        /// `ty` is the exact runtime class, not just an upper bound.
        exact: bool,
        /// The reference is proven non-null.
        non_null: bool,
        /// The reference is proven null.
        always_null: bool,
    },
}

impl Stamp {
    /// A reference of unknown class that may be null.
    pub const fn object() -> Self {
        Stamp::Object {
            ty: None,
            exact: false,
            non_null: false,
            always_null: false,
        }
    }

    /// A possibly-null reference whose class is `ty` or a subclass.
    pub const fn declared(ty: TypeRef) -> Self {
        Stamp::Object {
            ty: Some(ty),
            exact: false,
            non_null: false,
            always_null: false,
        }
    }

    /// A non-null reference of exactly class `ty`.
    pub const fn exact_non_null(ty: TypeRef) -> Self {
        Stamp::Object {
            ty: Some(ty),
            exact: true,
            non_null: true,
            always_null: false,
        }
    }

    /// The stamp of the null constant.
    pub const fn null() -> Self {
        Stamp::Object {
            ty: None,
            exact: false,
            non_null: false,
            always_null: true,
        }
    }

    /// Combine two stamps that describe the same value, keeping every fact
    /// either one proves.
    #[must_use]
    pub fn improve(self, other: Self) -> Self {
        match (self, other) {
            (
                Stamp::Object {
                    ty,
                    exact,
                    non_null,
                    always_null,
                },
                Stamp::Object {
                    ty: other_ty,
                    exact: other_exact,
                    non_null: other_non_null,
                    always_null: other_always_null,
                },
            ) => Stamp::Object {
                ty: if exact { ty } else { other_ty.or(ty) },
                exact: exact || other_exact,
                non_null: non_null || other_non_null,
                always_null: always_null || other_always_null,
            },
            _ => self,
        }
    }

    /// Returns `true` if a reference with this stamp may be null.
    ///
    /// Non-reference stamps are never null.
    #[inline]
    pub fn may_be_null(self) -> bool {
        match self {
            Stamp::Object { non_null, .. } => !non_null,
            Stamp::Void | Stamp::Int => false,
        }
    }

    /// The exact runtime class, if known.
    #[inline]
    pub fn exact_type(self) -> Option<TypeRef> {
        match self {
            Stamp::Object {
                ty: Some(ty),
                exact: true,
                ..
            } => Some(ty),
            _ => None,
        }
    }

    /// This stamp with the non-null fact added.
    #[must_use]
    pub fn as_non_null(self) -> Self {
        match self {
            Stamp::Object { ty, exact, .. } => Stamp::Object {
                ty,
                exact,
                non_null: true,
                always_null: false,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_may_be_null() {
        assert!(Stamp::object().may_be_null());
        assert!(Stamp::null().may_be_null());
        assert!(!Stamp::exact_non_null(TypeRef::new(1)).may_be_null());
        assert!(!Stamp::Int.may_be_null());
    }

    #[test]
    fn exact_type_requires_exactness() {
        let ty = TypeRef::new(4);
        assert_eq!(Stamp::exact_non_null(ty).exact_type(), Some(ty));
        assert_eq!(Stamp::declared(ty).exact_type(), None);
        assert_eq!(Stamp::object().exact_type(), None);
    }

    #[test]
    fn as_non_null_keeps_type() {
        let ty = TypeRef::new(2);
        let s = Stamp::declared(ty).as_non_null();
        assert!(!s.may_be_null());
        assert_eq!(
            s,
            Stamp::Object {
                ty: Some(ty),
                exact: false,
                non_null: true,
                always_null: false,
            }
        );
        assert_eq!(Stamp::Int.as_non_null(), Stamp::Int);
    }

    #[test]
    fn improve_keeps_the_stronger_facts() {
        let ty = TypeRef::new(3);
        let exact = Stamp::exact_non_null(ty);
        assert_eq!(Stamp::object().improve(exact), exact);
        assert_eq!(exact.improve(Stamp::object()), exact);
        assert_eq!(
            Stamp::declared(ty).improve(Stamp::object().as_non_null()),
            Stamp::declared(ty).as_non_null()
        );
        assert_eq!(Stamp::Int.improve(Stamp::Int), Stamp::Int);
    }
}
