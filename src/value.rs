//! Tri-state attribute values.
//!
//! Terraform-style configuration distinguishes three states for every
//! attribute: a known concrete value, a value that is not yet known (it will
//! only resolve during apply, e.g. an id computed by a create), and an
//! explicit null. [`Attr`] models the three states as a tagged enum instead
//! of overloading `Option` or sentinel values.
//!
//! Validators treat [`Attr::Unknown`] and [`Attr::Null`] as "skip": the value
//! is re-validated once fully resolved.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A configuration value that is known, unknown, or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr<T> {
    /// A concrete, fully resolved value.
    Known(T),
    /// The value will only resolve during apply.
    Unknown,
    /// The value is explicitly absent.
    Null,
}

impl<T> Attr<T> {
    /// Returns the known value, if there is one.
    pub fn known(&self) -> Option<&T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Consumes the attr and returns the known value, if there is one.
    pub fn into_known(self) -> Option<T> {
        match self {
            Attr::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value is known.
    pub fn is_known(&self) -> bool {
        matches!(self, Attr::Known(_))
    }

    /// Whether the value is unknown (unresolved until apply).
    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    /// Whether the value is explicitly null.
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    /// Map the known value, preserving the unknown/null states.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attr<U> {
        match self {
            Attr::Known(v) => Attr::Known(f(v)),
            Attr::Unknown => Attr::Unknown,
            Attr::Null => Attr::Null,
        }
    }

    /// Borrow the known value, preserving the unknown/null states.
    pub fn as_ref(&self) -> Attr<&T> {
        match self {
            Attr::Known(v) => Attr::Known(v),
            Attr::Unknown => Attr::Unknown,
            Attr::Null => Attr::Null,
        }
    }
}

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T> From<Option<T>> for Attr<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => Attr::Known(v),
            None => Attr::Null,
        }
    }
}

// Known values serialize as the value itself; unknown and null both serialize
// as JSON null. Unknown never round-trips through JSON: it only arises
// programmatically at plan time.
impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Known(v) => v.serialize(serializer),
            Attr::Unknown | Attr::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}
