//! The high-level outsourced encryption and decryption API.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
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

use crate::ciphertext::{Ciphertext, CiphertextError, IntermediateCiphertext};
use crate::curve::{pairing, CurveScalar, G1Point, GroupElement, GtElement, ScalarError};
use crate::dem::{DecryptionError, DEM};
use crate::dleq::DleqProof;
use crate::keys::{
    CloudKey, PublicParameters, ServerPublicKey, ServerSecretKey, UserKey, VerifierPublicKey,
};
use crate::lsss::{combine_in_exponent, reconstruct_coefficients, LsssError};
use crate::policy::AccessMatrix;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can happen during outsourced decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The ciphertext still carries the verifier's mask.
    NotSanitized,
    /// The attributes used do not satisfy the access policy.
    PolicyNotSatisfied,
    /// The cloud key has no component for an attribute needed by the policy.
    MissingAttributeKey(String),
    /// The ciphertext is inconsistent with its access matrix.
    Lsss(LsssError),
    /// The transform proof was not made by the server for this ciphertext and key.
    InvalidTransformProof,
    /// The transformed key differs from the one the ciphertext and cloud key give.
    IncorrectTransformation,
    /// The random number generator failed while proving.
    Scalar(ScalarError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSanitized => write!(f, "The ciphertext has not been sanitized"),
            Self::PolicyNotSatisfied => write!(f, "The attributes do not satisfy the policy"),
            Self::MissingAttributeKey(attribute) => {
                write!(f, "No key component for attribute `{}`", attribute)
            }
            Self::Lsss(err) => write!(f, "{}", err),
            Self::InvalidTransformProof => write!(f, "Transform proof verification failed"),
            Self::IncorrectTransformation => write!(f, "The transformed key is incorrect"),
            Self::Scalar(err) => write!(f, "{}", err),
        }
    }
}

impl From<ScalarError> for TransformError {
    fn from(err: ScalarError) -> Self {
        Self::Scalar(err)
    }
}

impl From<LsssError> for TransformError {
    fn from(err: LsssError) -> Self {
        match err {
            LsssError::PolicyNotSatisfied => Self::PolicyNotSatisfied,
            other => Self::Lsss(other),
        }
    }
}

/// The result of outsourced decryption, `φ = e(g,g)^{(α1 - a·t)s}`,
/// which only the holder of the matching [`UserKey`] can turn into the payload key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformedKey(GtElement);

impl RepresentableAsArray for TransformedKey {
    type Size = <GtElement as RepresentableAsArray>::Size;
}

impl SerializableToArray for TransformedKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_array()
    }
}

impl DeserializableFromArray for TransformedKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        GtElement::from_array(arr).map(Self)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for TransformedKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for TransformedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for TransformedKey {
    fn type_name() -> &'static str {
        "TransformedKey"
    }
}

impl fmt::Display for TransformedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

/// A cloud server's signature on one transformation.
///
/// Holds the tag `φ^x` and a proof that it shares the exponent of the server key `g^x`,
/// bound to the ciphertext challenge and the identity of the cloud key.
/// A server cannot deny a transformed key it signed, nor move the signature to another ciphertext.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformProof {
    tag: GtElement,
    proof: DleqProof<GtElement, G1Point>,
}

type GtSize = <GtElement as RepresentableAsArray>::Size;
type TagProofSize = <DleqProof<GtElement, G1Point> as RepresentableAsArray>::Size;

impl RepresentableAsArray for TransformProof {
    type Size = op!(GtSize + TagProofSize);
}

impl SerializableToArray for TransformProof {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.tag.to_array().concat(self.proof.to_array())
    }
}

impl DeserializableFromArray for TransformProof {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (tag, rest) = GtElement::take(*arr)?;
        let proof = DleqProof::<GtElement, G1Point>::take_last(rest)?;
        Ok(Self { tag, proof })
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for TransformProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for TransformProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for TransformProof {
    fn type_name() -> &'static str {
        "TransformProof"
    }
}

impl fmt::Display for TransformProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

fn transform_context(ciphertext: &Ciphertext, cloud_key: &CloudKey) -> Vec<u8> {
    let mut context = ciphertext.challenge().to_array().to_vec();
    context.extend_from_slice(cloud_key.identity().as_bytes());
    context
}

/// Encrypts `plaintext` under the access policy `matrix`, using the given RNG.
///
/// Returns the intermediate ciphertext for the cloud server
/// and the payload encrypted with a key only a satisfying user can recover.
pub fn encrypt_with_rng(
    rng: &mut (impl CryptoRng + RngCore),
    pp: &PublicParameters,
    verifier_pk: &VerifierPublicKey,
    matrix: &AccessMatrix,
    plaintext: &[u8],
) -> Result<(IntermediateCiphertext, Box<[u8]>), CiphertextError> {
    let (ciphertext, key) = IntermediateCiphertext::new_with_rng(rng, pp, verifier_pk, matrix)?;
    let dem = DEM::new(key.as_secret());
    let payload = dem
        .encrypt(rng, plaintext, &matrix.to_bytes())
        .map_err(CiphertextError::Payload)?;
    Ok((ciphertext, payload))
}

/// Encrypts `plaintext` under the access policy `matrix` using the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
pub fn encrypt(
    pp: &PublicParameters,
    verifier_pk: &VerifierPublicKey,
    matrix: &AccessMatrix,
    plaintext: &[u8],
) -> Result<(IntermediateCiphertext, Box<[u8]>), CiphertextError> {
    encrypt_with_rng(&mut OsRng, pp, verifier_pk, matrix, plaintext)
}

/// Outsourced decryption: the cloud server combines the sanitized `ciphertext`
/// with `cloud_key` over the rows labelled with `attributes`.
///
/// Computes `e(K, C') / e(R, C'')` divided by the square of
/// `Π [e(C_i, L)·e(D_i, K_ρ(i))]^{w_i} · e(C0, L)`.
pub fn transform<'a>(
    ciphertext: &Ciphertext,
    cloud_key: &CloudKey,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<TransformedKey, TransformError> {
    let point_c0 = ciphertext.point_c0.ok_or(TransformError::NotSanitized)?;
    let matrix = &ciphertext.matrix;

    let coefficients = reconstruct_coefficients(matrix, attributes)?;

    let mut paired = BTreeMap::new();
    for row in coefficients.rows() {
        let components = ciphertext.rows.get(&row).ok_or(LsssError::MissingRow(row))?;
        let label = matrix.label(row).ok_or(LsssError::InvalidRow(row))?;
        let attribute_key = cloud_key
            .attribute_keys
            .get(label)
            .ok_or_else(|| TransformError::MissingAttributeKey(label.to_string()))?;

        let value = pairing(&components.point_c, &cloud_key.point_l)
            .combine(&pairing(&components.point_d, attribute_key));
        paired.insert(row, value);
    }

    let product = combine_in_exponent(&coefficients, &paired)?
        .combine(&pairing(&point_c0, &cloud_key.point_l));

    let masked = pairing(&cloud_key.point_k, &ciphertext.point_c_prime)
        .combine(&pairing(&cloud_key.point_r, &ciphertext.point_c_second).inverse());

    let phi = masked.combine(&product.pow(&-&CurveScalar::from(2u64)));
    Ok(TransformedKey(phi))
}

/// Runs [`transform`] and signs the result with `server_sk`, using the given RNG.
pub fn transform_and_prove_with_rng<'a>(
    rng: &mut (impl CryptoRng + RngCore),
    server_sk: &ServerSecretKey,
    ciphertext: &Ciphertext,
    cloud_key: &CloudKey,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<(TransformedKey, TransformProof), TransformError> {
    let transformed = transform(ciphertext, cloud_key, attributes)?;

    let x = server_sk.as_scalar();
    let tag = transformed.0.pow(x);
    let context = transform_context(ciphertext, cloud_key);
    let proof = DleqProof::prove_in_context_with_rng(
        rng,
        x,
        &transformed.0,
        &tag,
        &G1Point::generator(),
        &server_sk.public_key().0,
        &context,
    )?;
    Ok((transformed, TransformProof { tag, proof }))
}

/// Runs [`transform`] and signs the result with `server_sk`, using the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
pub fn transform_and_prove<'a>(
    server_sk: &ServerSecretKey,
    ciphertext: &Ciphertext,
    cloud_key: &CloudKey,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<(TransformedKey, TransformProof), TransformError> {
    transform_and_prove_with_rng(&mut OsRng, server_sk, ciphertext, cloud_key, attributes)
}

/// Checks a transformed key returned by the cloud server:
/// the proof must be signed by `server_pk` for this ciphertext and cloud key,
/// and the key must equal the transformation of `ciphertext` over `attributes`.
pub fn verify_transformed<'a>(
    ciphertext: &Ciphertext,
    cloud_key: &CloudKey,
    attributes: impl IntoIterator<Item = &'a str>,
    server_pk: &ServerPublicKey,
    transformed: &TransformedKey,
    proof: &TransformProof,
) -> Result<(), TransformError> {
    let context = transform_context(ciphertext, cloud_key);
    if !proof.proof.verify_in_context(
        &transformed.0,
        &proof.tag,
        &G1Point::generator(),
        &server_pk.0,
        &context,
    ) {
        tracing::debug!("transform proof verification failed");
        return Err(TransformError::InvalidTransformProof);
    }
    if transform(ciphertext, cloud_key, attributes)? != *transformed {
        tracing::debug!("transformed key does not match the ciphertext");
        return Err(TransformError::IncorrectTransformation);
    }
    Ok(())
}

/// Final decryption by the user: recovers the payload key
/// `K_R = C / (φ·e(sk, C'))` and decrypts `payload`.
pub fn decrypt_transformed(
    user_key: &UserKey,
    ciphertext: &Ciphertext,
    transformed: &TransformedKey,
    payload: impl AsRef<[u8]>,
) -> Result<Box<[u8]>, DecryptionError> {
    let blinding = transformed
        .0
        .combine(&pairing(user_key.as_point(), &ciphertext.point_c_prime));
    let key = SecretBox::new(ciphertext.point_c.combine(&blinding.inverse()));

    let dem = DEM::new(key.as_secret());
    dem.decrypt(payload, &ciphertext.matrix.to_bytes())
        .map_err(|err| {
            tracing::debug!(%err, "payload decryption failed");
            err
        })
}
