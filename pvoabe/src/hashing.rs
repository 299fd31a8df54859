use digest::Digest;
use sha2::Sha256;

use crate::curve::CurveScalar;
use crate::traits::SerializableToArray;

/// Hashes a sequence of byte strings and group elements into a scalar.
///
/// Every hash is prefixed with a length-delimited domain separation tag,
/// so digests produced for different purposes never collide.
pub(crate) struct ScalarDigest(Sha256);

impl ScalarDigest {
    pub fn new_with_dst(dst: &[u8]) -> Self {
        Self(Sha256::new())
            .chain_bytes((dst.len() as u32).to_be_bytes())
            .chain_bytes(dst)
    }

    pub fn chain_bytes(self, bytes: impl AsRef<[u8]>) -> Self {
        Self(self.0.chain(bytes))
    }

    /// Absorbs a variable-length byte string, prefixed with its length.
    pub fn chain_bytes_with_len(self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        self.chain_bytes((bytes.len() as u64).to_be_bytes())
            .chain_bytes(bytes)
    }

    pub fn chain_element<T: SerializableToArray>(self, element: &T) -> Self {
        self.chain_bytes(element.to_array())
    }

    pub fn finalize(self) -> CurveScalar {
        CurveScalar::from_digest(&self.0.finalize())
    }
}
