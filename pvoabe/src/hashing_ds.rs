//! This module contains hashing sequences with included domain separation tags
//! shared between different parts of the code.

use crate::curve::CurveScalar;
use crate::hashing::ScalarDigest;
use crate::traits::SerializableToArray;

/// The Fiat-Shamir challenge of a DLEQ proof over the bases `u`, `v`,
/// the images `y1`, `y2`, the commitments `a`, `b` and a caller-supplied `context`.
pub(crate) fn hash_dleq_challenge<U, V>(
    u: &U,
    v: &V,
    y1: &U,
    y2: &V,
    a: &U,
    b: &V,
    context: &[u8],
) -> CurveScalar
where
    U: SerializableToArray,
    V: SerializableToArray,
{
    ScalarDigest::new_with_dst(b"DLEQ_CHALLENGE")
        .chain_element(u)
        .chain_element(v)
        .chain_element(y1)
        .chain_element(y2)
        .chain_element(a)
        .chain_element(b)
        .chain_bytes_with_len(context)
        .finalize()
}

pub(crate) fn hash_identity(identity: &str) -> CurveScalar {
    ScalarDigest::new_with_dst(b"IDENTITY_TO_SCALAR")
        .chain_bytes(identity.as_bytes())
        .finalize()
}

/// Starts the ciphertext challenge; the caller absorbs the ciphertext fields.
pub(crate) fn ciphertext_challenge_digest() -> ScalarDigest {
    ScalarDigest::new_with_dst(b"CIPHERTEXT_CHALLENGE")
}
