//! Type-safe SAI object ID wrappers.
//!
//! A port OID and a switch OID are both `u64` on the wire; the phantom kind
//! parameter keeps them from being swapped at call sites.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

/// Raw SAI object ID type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

/// Marker trait for SAI object kinds.
pub trait SaiObjectKind: Send + Sync + 'static {
    fn type_name() -> &'static str;
}

/// A SAI object ID tagged with the kind of object it names.
///
/// ```
/// use sonic_sai::PortOid;
///
/// let port = PortOid::from_raw(0x1000000000001).unwrap();
/// assert!(port.is_valid());
/// assert!(PortOid::from_raw(0).is_none());
/// ```
#[derive(Clone, Copy)]
pub struct SaiObjectId<T: SaiObjectKind> {
    raw: RawSaiObjectId,
    _marker: PhantomData<T>,
}

impl<T: SaiObjectKind> SaiObjectId<T> {
    /// SAI_NULL_OBJECT_ID.
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    /// Returns `None` for the null object ID.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self {
                raw,
                _marker: PhantomData,
            })
        }
    }

    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    pub const fn is_valid(&self) -> bool {
        self.raw != 0
    }
}

impl<T: SaiObjectKind> fmt::Debug for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:016x})", T::type_name(), self.raw)
    }
}

impl<T: SaiObjectKind> fmt::Display for SaiObjectId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.raw)
    }
}

impl<T: SaiObjectKind> PartialEq for SaiObjectId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T: SaiObjectKind> Eq for SaiObjectId<T> {}

impl<T: SaiObjectKind> Hash for SaiObjectId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T: SaiObjectKind> Default for SaiObjectId<T> {
    fn default() -> Self {
        Self::NULL
    }
}

macro_rules! define_object_kind {
    ($name:ident, $type_name:literal, $oid_alias:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl SaiObjectKind for $name {
            fn type_name() -> &'static str {
                $type_name
            }
        }

        pub type $oid_alias = SaiObjectId<$name>;
    };
}

define_object_kind!(SwitchKind, "Switch", SwitchOid);
define_object_kind!(PortKind, "Port", PortOid);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_null_oid() {
        assert!(PortOid::from_raw(0).is_none());
        assert!(PortOid::NULL.is_null());
        assert_eq!(PortOid::default(), PortOid::NULL);
    }

    #[test]
    fn test_oid_formatting() {
        let port = PortOid::from_raw(0x1000000000001).unwrap();
        assert_eq!(format!("{:?}", port), "Port(0x0001000000000001)");
        assert_eq!(port.to_string(), "0x0001000000000001");

        let switch = SwitchOid::from_raw(0x21000000000000).unwrap();
        assert!(format!("{:?}", switch).starts_with("Switch("));
    }
}
