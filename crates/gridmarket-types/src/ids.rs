//! Type-safe identifier wrappers around `u64`.
//!
//! Every market participant has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. IDs are assigned externally (the
//! `id` field of the input records) and stay stable for the whole run.
//! They are unique per kind only: consumer 0 and distributor 0 may coexist.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner `u64` value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a consumer (a household buying energy).
    ConsumerId
}

define_id! {
    /// Unique identifier for a distributor (reseller of energy under contract).
    DistributorId
}

define_id! {
    /// Unique identifier for a producer (power plant selling to distributors).
    ProducerId
}
