use std::fmt::{Display, Formatter};
use std::ops::BitOr;

/// Whether the slots of a field may be null. Written to the wire as `Field.nullable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Nullability {
    /// Every slot holds a value.
    #[default]
    NonNullable,
    /// Slots may be null, as recorded by the validity bitmap.
    Nullable,
}

impl Nullability {
    /// Shorthand for `self == Nullability::Nullable`.
    #[inline]
    pub fn is_nullable(self) -> bool {
        self == Self::Nullable
    }
}

impl BitOr for Nullability {
    type Output = Nullability;

    fn bitor(self, rhs: Self) -> Self::Output {
        if self.is_nullable() || rhs.is_nullable() {
            Self::Nullable
        } else {
            Self::NonNullable
        }
    }
}

impl From<bool> for Nullability {
    fn from(nullable: bool) -> Self {
        if nullable {
            Self::Nullable
        } else {
            Self::NonNullable
        }
    }
}

impl From<Nullability> for bool {
    fn from(value: Nullability) -> Self {
        value.is_nullable()
    }
}

/// Renders nullable fields with a trailing `?`, as in `utf8?`.
impl Display for Nullability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonNullable => Ok(()),
            Self::Nullable => write!(f, "?"),
        }
    }
}
