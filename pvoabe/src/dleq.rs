//! Non-interactive proof that two group elements share one discrete logarithm.

use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use typenum::Sum;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::curve::{CurveScalar, G1Point, G2Point, GroupElement, GtElement, ScalarError};
use crate::hashing_ds::hash_dleq_challenge;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A proof of knowledge of `x` such that `y1 = u^x` and `y2 = v^x`,
/// where `u, y1` belong to the group `U` and `v, y2` to the group `V`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DleqProof<U: GroupElement, V: GroupElement> {
    pub(crate) challenge: CurveScalar,
    pub(crate) response: CurveScalar,
    pub(crate) commitment_u: U,
    pub(crate) commitment_v: V,
}

impl<U: GroupElement, V: GroupElement> DleqProof<U, V> {
    /// Proves that `y1 = u^x` and `y2 = v^x`, using the given RNG for the commitment.
    pub fn prove_with_rng(
        rng: &mut (impl CryptoRng + RngCore),
        x: &CurveScalar,
        u: &U,
        y1: &U,
        v: &V,
        y2: &V,
    ) -> Result<Self, ScalarError> {
        Self::prove_in_context_with_rng(rng, x, u, y1, v, y2, &[])
    }

    /// Proves that `y1 = u^x` and `y2 = v^x`, using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn prove(x: &CurveScalar, u: &U, y1: &U, v: &V, y2: &V) -> Result<Self, ScalarError> {
        Self::prove_with_rng(&mut OsRng, x, u, y1, v, y2)
    }

    /// Like [`prove_with_rng`](`Self::prove_with_rng`), but the challenge also absorbs `context`,
    /// so the proof only verifies against the same context bytes.
    pub fn prove_in_context_with_rng(
        rng: &mut (impl CryptoRng + RngCore),
        x: &CurveScalar,
        u: &U,
        y1: &U,
        v: &V,
        y2: &V,
        context: &[u8],
    ) -> Result<Self, ScalarError> {
        let r = SecretBox::new(CurveScalar::try_random(rng)?);
        let commitment_u = u.pow(r.as_secret());
        let commitment_v = v.pow(r.as_secret());

        let challenge =
            hash_dleq_challenge(u, v, y1, y2, &commitment_u, &commitment_v, context);
        let response = r.as_secret() - &(&challenge * x);

        Ok(Self {
            challenge,
            response,
            commitment_u,
            commitment_v,
        })
    }

    /// Checks the proof against the bases `u`, `v` and the claimed images `y1`, `y2`.
    ///
    /// Both commitments must be reproduced as `u^t·y1^c` and `v^t·y2^c`,
    /// and the challenge must be the hash of those commitments.
    pub fn verify(&self, u: &U, y1: &U, v: &V, y2: &V) -> bool {
        self.verify_in_context(u, y1, v, y2, &[])
    }

    /// Checks a proof made with [`prove_in_context_with_rng`](`Self::prove_in_context_with_rng`).
    pub fn verify_in_context(&self, u: &U, y1: &U, v: &V, y2: &V, context: &[u8]) -> bool {
        let expected_u = u.pow(&self.response).combine(&y1.pow(&self.challenge));
        let expected_v = v.pow(&self.response).combine(&y2.pow(&self.challenge));

        if !expected_u.canonical_eq(&self.commitment_u)
            || !expected_v.canonical_eq(&self.commitment_v)
        {
            return false;
        }

        let challenge = hash_dleq_challenge(
            u,
            v,
            y1,
            y2,
            &self.commitment_u,
            &self.commitment_v,
            context,
        );
        challenge == self.challenge
    }
}

type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;

/// Fixed-size encoding of a proof instantiated over two concrete groups:
/// challenge, response, then the two commitments.
macro_rules! impl_dleq_proof_array {
    ($u:ty, $v:ty) => {
        impl RepresentableAsArray for DleqProof<$u, $v> {
            type Size = Sum<
                Sum<Sum<ScalarSize, ScalarSize>, <$u as RepresentableAsArray>::Size>,
                <$v as RepresentableAsArray>::Size,
            >;
        }

        impl SerializableToArray for DleqProof<$u, $v> {
            fn to_array(&self) -> GenericArray<u8, Self::Size> {
                self.challenge
                    .to_array()
                    .concat(self.response.to_array())
                    .concat(self.commitment_u.to_array())
                    .concat(self.commitment_v.to_array())
            }
        }

        impl DeserializableFromArray for DleqProof<$u, $v> {
            fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
                let (challenge, rest) = CurveScalar::take(*arr)?;
                let (response, rest) = CurveScalar::take(rest)?;
                let (commitment_u, rest) = <$u>::take(rest)?;
                let commitment_v = <$v>::take_last(rest)?;
                Ok(Self {
                    challenge,
                    response,
                    commitment_u,
                    commitment_v,
                })
            }
        }
    };
}

/// The DLEQ proof relating the `G1` and `G2` halves of a public key.
pub type CrossGroupDleqProof = DleqProof<G1Point, G2Point>;

impl_dleq_proof_array!(G1Point, G2Point);
impl_dleq_proof_array!(G2Point, G2Point);
impl_dleq_proof_array!(GtElement, G1Point);

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for CrossGroupDleqProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for CrossGroupDleqProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for CrossGroupDleqProof {
    fn type_name() -> &'static str {
        "DleqProof"
    }
}

impl fmt::Display for CrossGroupDleqProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

#[cfg(test)]
mod tests {

    use rand_core::OsRng;

    use super::{CrossGroupDleqProof, DleqProof};
    use crate::curve::tests::FailingRng;
    use crate::curve::{CurveScalar, G1Point, G2Point, GroupElement, GtElement, ScalarError};
    use crate::traits::{DeserializableFromArray, RepresentableAsArray, SerializableToArray};

    #[cfg(feature = "serde-support")]
    use crate::serde::tests::{check_deserialization, check_serialization};

    #[cfg(feature = "serde-support")]
    use crate::serde::Representation;

    fn random_base<G: GroupElement>() -> G {
        G::generator().pow(&CurveScalar::try_random(&mut OsRng).unwrap())
    }

    #[test]
    fn test_completeness_gt_g2() {
        for _ in 0..5 {
            let x = CurveScalar::try_random(&mut OsRng).unwrap();
            let u = random_base::<GtElement>();
            let v = random_base::<G2Point>();
            let (y1, y2) = (u.pow(&x), v.pow(&x));

            let proof = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
            assert!(proof.verify(&u, &y1, &v, &y2));
        }
    }

    #[test]
    fn test_completeness_g1_g2() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let u = G1Point::generator();
        let v = G2Point::generator();
        let (y1, y2) = (u.pow(&x), v.pow(&x));

        let proof = CrossGroupDleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
        assert!(proof.verify(&u, &y1, &v, &y2));

        let proof_back = CrossGroupDleqProof::from_array(&proof.to_array()).unwrap();
        assert_eq!(proof, proof_back);
        assert!(proof_back.verify(&u, &y1, &v, &y2));
    }

    #[test]
    fn test_tampered_response() {
        let x = CurveScalar::from(5u64);
        let u = random_base::<G1Point>();
        let v = random_base::<G2Point>();
        let (y1, y2) = (u.pow(&x), v.pow(&x));

        let mut proof = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
        assert!(proof.verify(&u, &y1, &v, &y2));

        proof.response = &proof.response + &CurveScalar::one();
        assert!(!proof.verify(&u, &y1, &v, &y2));
    }

    #[test]
    fn test_wrong_statement() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let x_other = CurveScalar::try_random(&mut OsRng).unwrap();
        let u = G1Point::generator();
        let v = G2Point::generator();

        // Different exponents on the two sides.
        let (y1, y2) = (u.pow(&x), v.pow(&x_other));
        let proof = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
        assert!(!proof.verify(&u, &y1, &v, &y2));

        // A valid proof does not transfer to other images.
        let y2 = v.pow(&x);
        let proof = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
        assert!(!proof.verify(&u, &y1, &v, &v.pow(&x_other)));
    }

    #[test]
    fn test_tampered_challenge_and_commitment() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let u = G1Point::generator();
        let v = G2Point::generator();
        let (y1, y2) = (u.pow(&x), v.pow(&x));
        let proof = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();

        let mut tampered = proof;
        tampered.challenge = &proof.challenge + &CurveScalar::one();
        assert!(!tampered.verify(&u, &y1, &v, &y2));

        let mut tampered = proof;
        tampered.commitment_u = proof.commitment_u.combine(&u);
        assert!(!tampered.verify(&u, &y1, &v, &y2));
    }

    #[test]
    fn test_context_binding() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let u = random_base::<GtElement>();
        let v = G1Point::generator();
        let (y1, y2) = (u.pow(&x), v.pow(&x));

        let proof =
            DleqProof::prove_in_context_with_rng(&mut OsRng, &x, &u, &y1, &v, &y2, b"first")
                .unwrap();
        assert!(proof.verify_in_context(&u, &y1, &v, &y2, b"first"));
        assert!(!proof.verify_in_context(&u, &y1, &v, &y2, b"second"));
        assert!(!proof.verify(&u, &y1, &v, &y2));

        // A proof without context does not verify in a context either.
        let plain = DleqProof::prove(&x, &u, &y1, &v, &y2).unwrap();
        assert!(plain.verify(&u, &y1, &v, &y2));
        assert!(!plain.verify_in_context(&u, &y1, &v, &y2, b"first"));

        // The proof is tied to the bases, not only to the images.
        let u_other = random_base::<GtElement>();
        assert!(!proof.verify_in_context(&u_other, &y1, &v, &y2, b"first"));

        let bytes = proof.to_array();
        assert_eq!(bytes.len(), 32 + 32 + 384 + 32);
        assert_eq!(bytes.len(), DleqProof::<GtElement, G1Point>::serialized_size());
        let proof_back = DleqProof::<GtElement, G1Point>::from_array(&bytes).unwrap();
        assert!(proof_back.verify_in_context(&u, &y1, &v, &y2, b"first"));
    }

    #[test]
    fn test_randomness_failure() {
        let x = CurveScalar::from(5u64);
        let u = G1Point::generator();
        let v = G2Point::generator();
        let (y1, y2) = (u.pow(&x), v.pow(&x));

        assert_eq!(
            DleqProof::prove_with_rng(&mut FailingRng, &x, &u, &y1, &v, &y2),
            Err(ScalarError::RandomnessSourceFailure)
        );
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_serde_serialization() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let u = G1Point::generator();
        let v = G2Point::generator();
        let proof = CrossGroupDleqProof::prove(&x, &u, &u.pow(&x), &v, &v.pow(&x)).unwrap();

        check_serialization(&proof, Representation::Base64);
        check_deserialization(&proof);
    }
}
