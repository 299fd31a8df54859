use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use typenum::op;
use zeroize::Zeroize;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::curve::{
    CurveScalar, G1Point, G2Point, GroupElement, GtElement, NonZeroCurveScalar, ScalarError,
};
use crate::dleq::CrossGroupDleqProof;
use crate::hashing_ds::hash_identity;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can happen during system setup and key generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGenerationError {
    /// The attribute is not part of the attribute universe.
    UnknownAttribute(String),
    /// Scalar arithmetic or randomness failure
    /// (including an identity that hashes to `-b`, which has no key).
    Scalar(ScalarError),
}

impl fmt::Display for KeyGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAttribute(attribute) => {
                write!(f, "Attribute `{}` is not in the universe", attribute)
            }
            Self::Scalar(err) => write!(f, "Key generation failed: {}", err),
        }
    }
}

impl From<ScalarError> for KeyGenerationError {
    fn from(err: ScalarError) -> Self {
        Self::Scalar(err)
    }
}

/// The public group elements of one attribute, `h_x` in both source groups
/// with a common exponent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttributeBase {
    pub(crate) point_g1: G1Point,
    pub(crate) point_g2: G2Point,
}

/// Public parameters of the scheme.
#[derive(Clone, Debug, PartialEq)]
pub struct PublicParameters {
    /// `w` in `G1`.
    pub(crate) w_g1: G1Point,
    /// `w` in `G2`, with the same exponent.
    pub(crate) w_g2: G2Point,
    /// `e(g, g)^α`.
    pub(crate) base: GtElement,
    /// `e(g, g)^α1`.
    pub(crate) base1: GtElement,
    /// `g^a`.
    pub(crate) ga: G1Point,
    /// `g^b` in `G1`.
    pub(crate) gb_g1: G1Point,
    /// `g^b` in `G2`.
    pub(crate) gb_g2: G2Point,
    pub(crate) attributes: BTreeMap<String, AttributeBase>,
}

impl PublicParameters {
    /// Returns the public elements of `attribute`, if it is in the universe.
    pub fn attribute_base(&self, attribute: &str) -> Option<&AttributeBase> {
        self.attributes.get(attribute)
    }

    /// Iterates over the attribute universe in sorted order.
    pub fn universe(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|attribute| attribute.as_str())
    }
}

#[derive(Clone)]
struct MasterSecret {
    alpha1: CurveScalar,
    alpha2: CurveScalar,
    b: CurveScalar,
}

impl Zeroize for MasterSecret {
    fn zeroize(&mut self) {
        self.alpha1.zeroize();
        self.alpha2.zeroize();
        self.b.zeroize();
    }
}

/// The master secret of the authority: `α1`, `α2 = α - α1` and `b`.
#[derive(Clone, Debug)]
pub struct MasterSecretKey(SecretBox<MasterSecret>);

/// Generates the public parameters and the master secret for the given attribute universe.
pub fn setup_with_rng<'a>(
    rng: &mut (impl CryptoRng + RngCore),
    universe: impl IntoIterator<Item = &'a str>,
) -> Result<(PublicParameters, MasterSecretKey), KeyGenerationError> {
    let alpha = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
    let alpha1 = NonZeroCurveScalar::try_random(rng)?;
    let a = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
    let b = NonZeroCurveScalar::try_random(rng)?;
    let omega = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);

    let alpha2 = alpha.as_secret().as_scalar() - alpha1.as_scalar();

    let g1 = G1Point::generator();
    let g2 = G2Point::generator();
    let egg = GtElement::generator();

    let mut attributes = BTreeMap::new();
    for attribute in universe {
        let exponent = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let base = AttributeBase {
            point_g1: g1.pow(exponent.as_secret().as_scalar()),
            point_g2: g2.pow(exponent.as_secret().as_scalar()),
        };
        attributes.insert(attribute.to_string(), base);
    }

    let pp = PublicParameters {
        w_g1: g1.pow(omega.as_secret().as_scalar()),
        w_g2: g2.pow(omega.as_secret().as_scalar()),
        base: egg.pow(alpha.as_secret().as_scalar()),
        base1: egg.pow(alpha1.as_scalar()),
        ga: g1.pow(a.as_secret().as_scalar()),
        gb_g1: g1.pow(b.as_scalar()),
        gb_g2: g2.pow(b.as_scalar()),
        attributes,
    };

    let msk = MasterSecretKey(SecretBox::new(MasterSecret {
        alpha1: alpha1.into(),
        alpha2,
        b: b.into(),
    }));

    tracing::debug!(attributes = pp.attributes.len(), "generated public parameters");
    Ok((pp, msk))
}

/// Generates the public parameters and the master secret using the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
pub fn setup<'a>(
    universe: impl IntoIterator<Item = &'a str>,
) -> Result<(PublicParameters, MasterSecretKey), KeyGenerationError> {
    setup_with_rng(&mut OsRng, universe)
}

/// The secret key `c` of the public verifier, who sanitizes ciphertexts.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifierSecretKey(SecretBox<NonZeroCurveScalar>);

impl VerifierSecretKey {
    /// Generates a new secret key using the given RNG.
    pub fn random_with_rng(rng: &mut (impl CryptoRng + RngCore)) -> Result<Self, ScalarError> {
        Ok(Self(SecretBox::new(NonZeroCurveScalar::try_random(rng)?)))
    }

    /// Generates a new secret key using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn random() -> Result<Self, ScalarError> {
        Self::random_with_rng(&mut OsRng)
    }

    /// Returns the public key `(g1^c, g2^c)`, together with a proof
    /// that both halves share the exponent.
    pub fn public_key_with_rng(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
    ) -> Result<VerifierPublicKey, ScalarError> {
        let c = self.0.as_secret().as_scalar();
        let g1 = G1Point::generator();
        let g2 = G2Point::generator();
        let point_g1 = g1.pow(c);
        let point_g2 = g2.pow(c);
        let proof = CrossGroupDleqProof::prove_with_rng(rng, c, &g1, &point_g1, &g2, &point_g2)?;
        Ok(VerifierPublicKey {
            point_g1,
            point_g2,
            proof,
        })
    }

    /// Returns the public key, using the default RNG for its proof.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn public_key(&self) -> Result<VerifierPublicKey, ScalarError> {
        self.public_key_with_rng(&mut OsRng)
    }

    pub(crate) fn as_scalar(&self) -> &CurveScalar {
        self.0.as_secret().as_scalar()
    }
}

/// The public key of the verifier: `g^c` in both source groups.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VerifierPublicKey {
    pub(crate) point_g1: G1Point,
    pub(crate) point_g2: G2Point,
    proof: CrossGroupDleqProof,
}

impl VerifierPublicKey {
    /// Checks that the two halves of the key share one exponent.
    pub fn verify(&self) -> bool {
        self.proof.verify(
            &G1Point::generator(),
            &self.point_g1,
            &G2Point::generator(),
            &self.point_g2,
        )
    }
}

type G1Size = <G1Point as RepresentableAsArray>::Size;
type G2Size = <G2Point as RepresentableAsArray>::Size;
type DleqProofSize = <CrossGroupDleqProof as RepresentableAsArray>::Size;

impl RepresentableAsArray for VerifierPublicKey {
    type Size = op!(G1Size + G2Size + DleqProofSize);
}

impl SerializableToArray for VerifierPublicKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.point_g1
            .to_array()
            .concat(self.point_g2.to_array())
            .concat(self.proof.to_array())
    }
}

impl DeserializableFromArray for VerifierPublicKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (point_g1, rest) = G1Point::take(*arr)?;
        let (point_g2, rest) = G2Point::take(rest)?;
        let proof = CrossGroupDleqProof::take_last(rest)?;
        Ok(Self {
            point_g1,
            point_g2,
            proof,
        })
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for VerifierPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Hex)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for VerifierPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Hex)
    }
}

impl HasTypeName for VerifierPublicKey {
    fn type_name() -> &'static str {
        "VerifierPublicKey"
    }
}

impl fmt::Display for VerifierPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

/// The secret key `x` of a cloud server, used to sign its transformations.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerSecretKey(SecretBox<NonZeroCurveScalar>);

impl ServerSecretKey {
    /// Generates a new secret key using the given RNG.
    pub fn random_with_rng(rng: &mut (impl CryptoRng + RngCore)) -> Result<Self, ScalarError> {
        Ok(Self(SecretBox::new(NonZeroCurveScalar::try_random(rng)?)))
    }

    /// Generates a new secret key using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn random() -> Result<Self, ScalarError> {
        Self::random_with_rng(&mut OsRng)
    }

    /// Returns the public key `g^x`.
    pub fn public_key(&self) -> ServerPublicKey {
        ServerPublicKey(G1Point::generator().pow(self.as_scalar()))
    }

    pub(crate) fn as_scalar(&self) -> &CurveScalar {
        self.0.as_secret().as_scalar()
    }
}

/// The public key `g^x` of a cloud server.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServerPublicKey(pub(crate) G1Point);

impl RepresentableAsArray for ServerPublicKey {
    type Size = G1Size;
}

impl SerializableToArray for ServerPublicKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_array()
    }
}

impl DeserializableFromArray for ServerPublicKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        G1Point::from_array(arr).map(Self)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for ServerPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Hex)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for ServerPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Hex)
    }
}

impl HasTypeName for ServerPublicKey {
    fn type_name() -> &'static str {
        "ServerPublicKey"
    }
}

impl fmt::Display for ServerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

/// The part of a user's key handed to the cloud server for outsourced decryption.
///
/// `K = g^α1·(g^a)^t·w^{1/(b+H(ID))}`, `L = g2^t`, `R = g^{1/(b+H(ID))}`
/// and `K_x = h_x^t` for every attribute of the user.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudKey {
    pub(crate) identity: String,
    pub(crate) point_k: G1Point,
    pub(crate) point_l: G2Point,
    pub(crate) point_r: G1Point,
    pub(crate) attribute_keys: BTreeMap<String, G2Point>,
}

impl CloudKey {
    /// The identity the key was issued for.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// The attributes of the key, in sorted order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attribute_keys.keys().map(|attribute| attribute.as_str())
    }
}

/// The part of a user's key kept by the user: `g^α2·(g^a)^t`.
#[derive(Clone, Debug, PartialEq)]
pub struct UserKey(SecretBox<G1Point>);

impl UserKey {
    pub(crate) fn as_point(&self) -> &G1Point {
        self.0.as_secret()
    }
}

/// Generates the key pair of the user `identity` holding `attributes`.
pub fn generate_user_key_with_rng<'a>(
    rng: &mut (impl CryptoRng + RngCore),
    pp: &PublicParameters,
    msk: &MasterSecretKey,
    identity: &str,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<(CloudKey, UserKey), KeyGenerationError> {
    let msk = msk.0.as_secret();
    let t_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
    let t = t_secret.as_secret().as_scalar();

    let denominator = &msk.b + &hash_identity(identity);
    let d = SecretBox::new(denominator.invert()?);

    let g1 = G1Point::generator();
    let g2 = G2Point::generator();
    let ga_t = pp.ga.pow(t);

    let mut attribute_keys = BTreeMap::new();
    for attribute in attributes {
        let base = pp
            .attribute_base(attribute)
            .ok_or_else(|| KeyGenerationError::UnknownAttribute(attribute.to_string()))?;
        attribute_keys.insert(attribute.to_string(), base.point_g2.pow(t));
    }

    let cloud_key = CloudKey {
        identity: identity.to_string(),
        point_k: g1
            .pow(&msk.alpha1)
            .combine(&ga_t)
            .combine(&pp.w_g1.pow(d.as_secret())),
        point_l: g2.pow(t),
        point_r: g1.pow(d.as_secret()),
        attribute_keys,
    };
    let user_key = UserKey(SecretBox::new(g1.pow(&msk.alpha2).combine(&ga_t)));

    Ok((cloud_key, user_key))
}

/// Generates the key pair of the user `identity` holding `attributes`, using the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
pub fn generate_user_key<'a>(
    pp: &PublicParameters,
    msk: &MasterSecretKey,
    identity: &str,
    attributes: impl IntoIterator<Item = &'a str>,
) -> Result<(CloudKey, UserKey), KeyGenerationError> {
    generate_user_key_with_rng(&mut OsRng, pp, msk, identity, attributes)
}
