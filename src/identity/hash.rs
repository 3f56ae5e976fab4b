// Keccak-256 hashing and fixed-width hash identifiers

use sha3::{Digest, Keccak256};

/// Keccak-256 digest of the input
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 digest over several slices, hashed as one concatenation
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Declares a 32-byte identifier newtype with the usual accessors,
/// hex display and serde support.
macro_rules! hash32 {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $name([u8; 32]);

        impl $name {
            /// Create from raw bytes
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Get raw bytes
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Convert to bytes
            pub fn to_bytes(&self) -> [u8; 32] {
                self.0
            }

            /// Parse from a hex string, with or without a `0x` prefix
            pub fn from_hex(s: &str) -> Result<Self, $crate::identity::AddressError> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(raw)
                    .map_err(|e| $crate::identity::AddressError::InvalidHex(e.to_string()))?;
                let array: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
                    $crate::identity::AddressError::InvalidLength {
                        expected: 32,
                        got: bytes.len(),
                    }
                })?;
                Ok(Self(array))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", $label, hex::encode(&self.0[..8]))
            }
        }
    };
}

pub(crate) use hash32;
