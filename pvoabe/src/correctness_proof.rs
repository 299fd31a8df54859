//! The cloud server's proof that it holds a well-formed blinded key
//! for a given identity and attribute subset, bound to one ciphertext.

use alloc::collections::BTreeSet;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use typenum::op;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::ciphertext::Ciphertext;
use crate::curve::{
    pairing, CurveScalar, G1Point, G2Point, GroupElement, GtElement, NonZeroCurveScalar,
    ScalarError,
};
use crate::dleq::DleqProof;
use crate::hashing_ds::hash_identity;
use crate::keys::{CloudKey, PublicParameters};
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can happen when creating or checking a [`KeyConsistencyProof`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The attribute is missing from the key or from the universe.
    UnknownAttribute(String),
    /// The proof must cover at least one attribute.
    EmptyAttributeSet,
    /// The pairing equation with the given number (1 to 6) does not hold.
    ProofVerificationFailed(usize),
    /// The proof of knowledge of the blinding exponent does not verify
    /// against this ciphertext and these proof elements.
    BindingProofFailed,
    /// Scalar arithmetic or randomness failure.
    Scalar(ScalarError),
}

impl fmt::Display for ProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute(attribute) => write!(f, "Unknown attribute `{}`", attribute),
            Self::EmptyAttributeSet => write!(f, "The attribute set is empty"),
            Self::ProofVerificationFailed(equation) => {
                write!(f, "Proof verification failed at equation {}", equation)
            }
            Self::BindingProofFailed => {
                write!(f, "The proof is not bound to this ciphertext")
            }
            Self::Scalar(err) => write!(f, "{}", err),
        }
    }
}

impl From<ScalarError> for ProofError {
    fn from(err: ScalarError) -> Self {
        Self::Scalar(err)
    }
}

/// Proof that a blinded cloud key is consistent with the public parameters,
/// with the identity it was issued for, and with every attribute it covers,
/// bound to one ciphertext through a hash of all of its components.
///
/// With fresh `t, y, z`:
/// `K' = K·(g^a)^t`, `L' = L·g2^t`, `R' = R^z`, `ΠK'_x = Π K_x·h_x^t`,
/// `A1 = L'^{H(ct)}·w^y`, `A2 = g2^y`, `A3 = w^{1/z}`,
/// `A4 = (g^b·g^{H(ID)})^{1/z}`, `A6 = g2^{1/z}`.
///
/// `A1` alone does not tie the proof to the ciphertext, since anyone can shift it
/// by a power of the public `L'`. The proof therefore also carries a DLEQ proof
/// of knowledge of `1/z` for `(g2, A6)` and `(w, A3)`, whose challenge absorbs `H(ct)`
/// and every other element of the proof.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyConsistencyProof {
    point_k: G1Point,
    point_l: G2Point,
    point_r: G1Point,
    product_k: G2Point,
    a1: G2Point,
    a2: G2Point,
    a3: G2Point,
    a4: G2Point,
    a6: G2Point,
    binding: DleqProof<G2Point, G2Point>,
}

/// The bytes the blinding proof is bound to:
/// the ciphertext challenge and the proof elements not covered by its statement.
fn binding_context(
    h_ct: &CurveScalar,
    g1_points: [&G1Point; 2],
    g2_points: [&G2Point; 5],
) -> Vec<u8> {
    let mut context = h_ct.to_array().to_vec();
    for point in g1_points.iter() {
        context.extend_from_slice(&point.to_array());
    }
    for point in g2_points.iter() {
        context.extend_from_slice(&point.to_array());
    }
    context
}

fn normalize_attributes<'a>(
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<BTreeSet<&'a str>, ProofError> {
    let attributes: BTreeSet<&str> = attributes.into_iter().collect();
    if attributes.is_empty() {
        return Err(ProofError::EmptyAttributeSet);
    }
    Ok(attributes)
}

fn check_equation(equation: usize, lhs: &GtElement, rhs: &GtElement) -> Result<(), ProofError> {
    if lhs == rhs {
        Ok(())
    } else {
        Err(ProofError::ProofVerificationFailed(equation))
    }
}

impl KeyConsistencyProof {
    /// Blinds `cloud_key` restricted to `attributes` and proves its consistency
    /// with respect to `ciphertext`, using the given RNG.
    pub fn prove_with_rng<'a>(
        rng: &mut (impl CryptoRng + RngCore),
        pp: &PublicParameters,
        cloud_key: &CloudKey,
        ciphertext: &Ciphertext,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ProofError> {
        let attributes = normalize_attributes(attributes)?;

        let t_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let y_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let z_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let t = t_secret.as_secret().as_scalar();
        let y = y_secret.as_secret().as_scalar();
        let z = z_secret.as_secret().as_scalar();
        let z_inv_secret = SecretBox::new(z_secret.as_secret().invert()?);
        let z_inv = z_inv_secret.as_secret().as_scalar();

        let g2 = G2Point::generator();

        let product_k = attributes
            .iter()
            .try_fold(G2Point::identity(), |acc, attribute| {
                let key = cloud_key.attribute_keys.get(*attribute);
                let base = pp.attribute_base(attribute);
                match (key, base) {
                    (Some(key), Some(base)) => {
                        Ok(acc.combine(&key.combine(&base.point_g2.pow(t))))
                    }
                    _ => Err(ProofError::UnknownAttribute(attribute.to_string())),
                }
            })?;

        let point_k = cloud_key.point_k.combine(&pp.ga.pow(t));
        let point_l = cloud_key.point_l.combine(&g2.pow(t));
        let point_r = cloud_key.point_r.pow(z);

        let h_ct = ciphertext.challenge();
        let h_id = hash_identity(&cloud_key.identity);

        let a1 = point_l.pow(&h_ct).combine(&pp.w_g2.pow(y));
        let a2 = g2.pow(y);
        let a3 = pp.w_g2.pow(z_inv);
        let a4 = pp.gb_g2.combine(&g2.pow(&h_id)).pow(z_inv);
        let a6 = g2.pow(z_inv);

        let context = binding_context(
            &h_ct,
            [&point_k, &point_r],
            [&point_l, &product_k, &a1, &a2, &a4],
        );
        let binding =
            DleqProof::prove_in_context_with_rng(rng, z_inv, &g2, &a6, &pp.w_g2, &a3, &context)?;

        Ok(Self {
            point_k,
            point_l,
            point_r,
            product_k,
            a1,
            a2,
            a3,
            a4,
            a6,
            binding,
        })
    }

    /// Creates the proof using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn prove<'a>(
        pp: &PublicParameters,
        cloud_key: &CloudKey,
        ciphertext: &Ciphertext,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ProofError> {
        Self::prove_with_rng(&mut OsRng, pp, cloud_key, ciphertext, attributes)
    }

    /// Evaluates the six pairing equations in order,
    /// returning the number of the first one that does not hold,
    /// then checks that the proof is bound to `ciphertext`.
    ///
    /// `attributes` is the subset the verifier asked the proof to cover.
    pub fn check<'a>(
        &self,
        pp: &PublicParameters,
        ciphertext: &Ciphertext,
        identity: &str,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ProofError> {
        let attributes = normalize_attributes(attributes)?;
        let product_h = attributes
            .iter()
            .try_fold(G1Point::identity(), |acc, attribute| {
                pp.attribute_base(attribute)
                    .map(|base| acc.combine(&base.point_g1))
                    .ok_or_else(|| ProofError::UnknownAttribute(attribute.to_string()))
            })?;

        let g1 = G1Point::generator();
        let g2 = G2Point::generator();
        let h_ct = ciphertext.challenge();
        let h_id = hash_identity(identity);

        // Key consistency: e(K', g2) = e(g,g)^α1 · e(g^a, L') · e(R', A3)
        check_equation(
            1,
            &pairing(&self.point_k, &g2),
            &pp.base1
                .combine(&pairing(&pp.ga, &self.point_l))
                .combine(&pairing(&self.point_r, &self.a3)),
        )?;

        // Blinding: e(g, A3) = e(w, A6)
        check_equation(
            2,
            &pairing(&g1, &self.a3),
            &pairing(&pp.w_g1, &self.a6),
        )?;

        // Identity: e(g, A4) = e(g^b·g^H(ID), A6)
        check_equation(
            3,
            &pairing(&g1, &self.a4),
            &pairing(&pp.gb_g1.combine(&g1.pow(&h_id)), &self.a6),
        )?;

        // e(R', A4) = e(g, g)
        check_equation(
            4,
            &pairing(&self.point_r, &self.a4),
            &GtElement::generator(),
        )?;

        // Attributes: e(g, ΠK'_x) = e(Πh_x, L')
        check_equation(
            5,
            &pairing(&g1, &self.product_k),
            &pairing(&product_h, &self.point_l),
        )?;

        // Ciphertext: e(g, A1) = e(g, L')^H(ct) · e(w, A2)
        check_equation(
            6,
            &pairing(&g1, &self.a1),
            &pairing(&g1, &self.point_l)
                .pow(&h_ct)
                .combine(&pairing(&pp.w_g1, &self.a2)),
        )?;

        let context = binding_context(
            &h_ct,
            [&self.point_k, &self.point_r],
            [&self.point_l, &self.product_k, &self.a1, &self.a2, &self.a4],
        );
        if !self
            .binding
            .verify_in_context(&g2, &self.a6, &pp.w_g2, &self.a3, &context)
        {
            return Err(ProofError::BindingProofFailed);
        }

        Ok(())
    }

    /// Returns `true` if all six pairing equations hold and the proof is bound to `ciphertext`.
    pub fn verify<'a>(
        &self,
        pp: &PublicParameters,
        ciphertext: &Ciphertext,
        identity: &str,
        attributes: impl IntoIterator<Item = &'a str>,
    ) -> bool {
        match self.check(pp, ciphertext, identity, attributes) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "key consistency proof rejected");
                false
            }
        }
    }
}

type G1Size = <G1Point as RepresentableAsArray>::Size;
type G2Size = <G2Point as RepresentableAsArray>::Size;
type BindingSize = <DleqProof<G2Point, G2Point> as RepresentableAsArray>::Size;

impl RepresentableAsArray for KeyConsistencyProof {
    type Size = op!(
        G1Size
            + G2Size
            + G1Size
            + G2Size
            + G2Size
            + G2Size
            + G2Size
            + G2Size
            + G2Size
            + BindingSize
    );
}

impl SerializableToArray for KeyConsistencyProof {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.point_k
            .to_array()
            .concat(self.point_l.to_array())
            .concat(self.point_r.to_array())
            .concat(self.product_k.to_array())
            .concat(self.a1.to_array())
            .concat(self.a2.to_array())
            .concat(self.a3.to_array())
            .concat(self.a4.to_array())
            .concat(self.a6.to_array())
            .concat(self.binding.to_array())
    }
}

impl DeserializableFromArray for KeyConsistencyProof {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (point_k, rest) = G1Point::take(*arr)?;
        let (point_l, rest) = G2Point::take(rest)?;
        let (point_r, rest) = G1Point::take(rest)?;
        let (product_k, rest) = G2Point::take(rest)?;
        let (a1, rest) = G2Point::take(rest)?;
        let (a2, rest) = G2Point::take(rest)?;
        let (a3, rest) = G2Point::take(rest)?;
        let (a4, rest) = G2Point::take(rest)?;
        let (a6, rest) = G2Point::take(rest)?;
        let binding = DleqProof::<G2Point, G2Point>::take_last(rest)?;
        Ok(Self {
            point_k,
            point_l,
            point_r,
            product_k,
            a1,
            a2,
            a3,
            a4,
            a6,
            binding,
        })
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for KeyConsistencyProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for KeyConsistencyProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for KeyConsistencyProof {
    fn type_name() -> &'static str {
        "KeyConsistencyProof"
    }
}

impl fmt::Display for KeyConsistencyProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

#[cfg(test)]
mod tests {

    use alloc::vec;
    use alloc::vec::Vec;

    use super::{KeyConsistencyProof, ProofError};
    use crate::abe::encrypt;
    use crate::ciphertext::Ciphertext;
    use crate::curve::tests::FailingRng;
    use crate::curve::{CurveScalar, G1Point, G2Point, GroupElement, ScalarError};
    use crate::keys::{generate_user_key, setup, CloudKey, PublicParameters, VerifierSecretKey};
    use crate::policy::AccessMatrix;
    use crate::traits::{DeserializableFromArray, RepresentableAsArray, SerializableToArray};

    #[cfg(feature = "serde-support")]
    use crate::serde::tests::{check_deserialization, check_serialization};

    #[cfg(feature = "serde-support")]
    use crate::serde::Representation;

    const ATTRIBUTES: [&str; 3] = ["Doctor", "Nurse", "Cardiology"];

    fn make_ciphertext(pp: &PublicParameters) -> Ciphertext {
        let pv_sk = VerifierSecretKey::random().unwrap();
        let pv_pk = pv_sk.public_key().unwrap();
        let matrix = AccessMatrix::from_policy("Doctor AND (Nurse OR Cardiology)").unwrap();
        let (intermediate, _payload) = encrypt(pp, &pv_pk, &matrix, b"record").unwrap();
        intermediate.complete(pp, &pv_pk).unwrap()
    }

    fn make_instance() -> (PublicParameters, CloudKey, Ciphertext) {
        let (pp, msk) = setup(ATTRIBUTES).unwrap();
        let (cloud_key, _user_key) =
            generate_user_key(&pp, &msk, "owner@hospital", ATTRIBUTES).unwrap();
        let ciphertext = make_ciphertext(&pp);
        (pp, cloud_key, ciphertext)
    }

    fn tampered(
        proof: &KeyConsistencyProof,
        tamper: impl FnOnce(&mut KeyConsistencyProof),
    ) -> KeyConsistencyProof {
        let mut result = *proof;
        tamper(&mut result);
        result
    }

    #[test]
    fn test_honest_proof() {
        let (pp, cloud_key, ct) = make_instance();

        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();
        assert_eq!(proof.check(&pp, &ct, "owner@hospital", ATTRIBUTES), Ok(()));
        assert!(proof.verify(&pp, &ct, "owner@hospital", ATTRIBUTES));

        // Any non-empty subset of the key's attributes can be proven.
        let subset = ["Nurse", "Doctor"];
        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, subset).unwrap();
        assert!(proof.verify(&pp, &ct, "owner@hospital", subset));
    }

    #[test]
    fn test_tampered_fields() {
        let (pp, cloud_key, ct) = make_instance();
        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();
        let bytes = proof.to_array();
        assert_eq!(bytes.len(), KeyConsistencyProof::serialized_size());
        assert_eq!(bytes.len(), 32 * 2 + 64 * 7 + 192);

        // Every field is shifted by a generator, so the tampered proof still decodes.
        let g1 = G1Point::generator();
        let g2 = G2Point::generator();
        let one = CurveScalar::one();
        let cases: Vec<(&str, KeyConsistencyProof)> = vec![
            ("K'", tampered(&proof, |p| p.point_k = p.point_k.combine(&g1))),
            ("L'", tampered(&proof, |p| p.point_l = p.point_l.combine(&g2))),
            ("R'", tampered(&proof, |p| p.point_r = p.point_r.combine(&g1))),
            ("prod K'", tampered(&proof, |p| p.product_k = p.product_k.combine(&g2))),
            ("A1", tampered(&proof, |p| p.a1 = p.a1.combine(&g2))),
            ("A2", tampered(&proof, |p| p.a2 = p.a2.combine(&g2))),
            ("A3", tampered(&proof, |p| p.a3 = p.a3.combine(&g2))),
            ("A4", tampered(&proof, |p| p.a4 = p.a4.combine(&g2))),
            ("A6", tampered(&proof, |p| p.a6 = p.a6.combine(&g2))),
            (
                "binding challenge",
                tampered(&proof, |p| p.binding.challenge = &p.binding.challenge + &one),
            ),
            (
                "binding response",
                tampered(&proof, |p| p.binding.response = &p.binding.response + &one),
            ),
            (
                "binding commitment",
                tampered(&proof, |p| {
                    p.binding.commitment_u = p.binding.commitment_u.combine(&g2)
                }),
            ),
        ];

        for (field, tampered_proof) in cases.iter() {
            let decoded = KeyConsistencyProof::from_bytes(tampered_proof.to_array()).unwrap();
            assert!(
                !decoded.verify(&pp, &ct, "owner@hospital", ATTRIBUTES),
                "tampering with {} went undetected",
                field
            );
        }

        let proof_back = KeyConsistencyProof::from_bytes(&bytes).unwrap();
        assert!(proof_back.verify(&pp, &ct, "owner@hospital", ATTRIBUTES));
    }

    #[test]
    fn test_no_transfer_to_another_ciphertext() {
        let (pp, cloud_key, ct) = make_instance();
        let other = make_ciphertext(&pp);
        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();
        assert!(!proof.verify(&pp, &other, "owner@hospital", ATTRIBUTES));

        // Shifting A1 by L'^{H(ct2) - H(ct1)} satisfies all six pairing equations
        // for the other ciphertext, but not the binding proof.
        let shift = &other.challenge() - &ct.challenge();
        let moved = tampered(&proof, |p| p.a1 = p.a1.combine(&p.point_l.pow(&shift)));
        assert_eq!(
            moved.check(&pp, &other, "owner@hospital", ATTRIBUTES),
            Err(ProofError::BindingProofFailed)
        );
        assert!(!moved.verify(&pp, &other, "owner@hospital", ATTRIBUTES));
    }

    #[test]
    fn test_randomness_failure() {
        let (pp, cloud_key, ct) = make_instance();
        assert_eq!(
            KeyConsistencyProof::prove_with_rng(&mut FailingRng, &pp, &cloud_key, &ct, ATTRIBUTES),
            Err(ProofError::Scalar(ScalarError::RandomnessSourceFailure))
        );
    }

    #[test]
    fn test_failing_equations() {
        let (pp, cloud_key, ct) = make_instance();
        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();

        // Another identity breaks the identity binding.
        assert_eq!(
            proof.check(&pp, &ct, "intruder@hospital", ATTRIBUTES),
            Err(ProofError::ProofVerificationFailed(3))
        );

        // Another attribute subset breaks attribute consistency.
        assert_eq!(
            proof.check(&pp, &ct, "owner@hospital", ["Doctor", "Nurse"]),
            Err(ProofError::ProofVerificationFailed(5))
        );

        // Changing one component of the ciphertext changes its challenge.
        let other_ct = make_ciphertext(&pp);
        let mut ct_other = ct.clone();
        ct_other.point_c_prime = other_ct.point_c_prime;
        assert_eq!(
            proof.check(&pp, &ct_other, "owner@hospital", ATTRIBUTES),
            Err(ProofError::ProofVerificationFailed(6))
        );

        // A blinded key from another authority breaks key consistency.
        let (pp_foreign, cloud_key_foreign, ct_foreign) = make_instance();
        let foreign = KeyConsistencyProof::prove(
            &pp_foreign,
            &cloud_key_foreign,
            &ct_foreign,
            ATTRIBUTES,
        )
        .unwrap();
        assert_eq!(
            foreign.check(&pp, &ct, "owner@hospital", ATTRIBUTES),
            Err(ProofError::ProofVerificationFailed(1))
        );
    }

    #[test]
    fn test_attribute_errors() {
        let (pp, cloud_key, ct) = make_instance();
        assert_eq!(
            KeyConsistencyProof::prove(&pp, &cloud_key, &ct, []),
            Err(ProofError::EmptyAttributeSet)
        );
        assert_eq!(
            KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ["Doctor", "Surgeon"]),
            Err(ProofError::UnknownAttribute("Surgeon".into()))
        );

        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();
        assert_eq!(
            proof.check(&pp, &ct, "owner@hospital", ["Surgeon"]),
            Err(ProofError::UnknownAttribute("Surgeon".into()))
        );
        assert!(!proof.verify(&pp, &ct, "owner@hospital", []));
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_serde_serialization() {
        let (pp, cloud_key, ct) = make_instance();
        let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ct, ATTRIBUTES).unwrap();
        check_serialization(&proof, Representation::Base64);
        check_deserialization(&proof);
    }
}
