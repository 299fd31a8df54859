//! This module is an adapter to the BN254 pairing groups from `arkworks`.
//! The rest of the crate only sees scalars, three opaque group types,
//! the pairing map and their canonical encodings.

use core::fmt;
use core::ops::{Add, Mul, Neg, Sub};

use ark_bn254::{Bn254, Fr, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ec::pairing::{Pairing, PairingOutput};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{Field, One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use generic_array::{ArrayLength, GenericArray};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use typenum::{U32, U384, U64};
use zeroize::Zeroize;

use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

/// Errors of the scalar field arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarError {
    /// Attempted to invert zero.
    ModularInverseUndefined,
    /// The random number generator could not provide entropy.
    RandomnessSourceFailure,
}

impl fmt::Display for ScalarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModularInverseUndefined => write!(f, "Zero has no modular inverse"),
            Self::RandomnessSourceFailure => write!(f, "Failed to draw randomness"),
        }
    }
}

/// An element of the scalar field of BN254, always reduced into `[0, p-1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveScalar(Fr);

impl CurveScalar {
    /// The additive identity.
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        Self(Fr::one())
    }

    /// Returns `true` if the scalar is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the modular inverse, failing on zero.
    pub fn invert(&self) -> Result<Self, ScalarError> {
        self.0
            .inverse()
            .map(Self)
            .ok_or(ScalarError::ModularInverseUndefined)
    }

    /// Samples a uniformly distributed scalar.
    ///
    /// 64 bytes are drawn and reduced modulo the group order,
    /// which keeps the bias negligible.
    pub fn try_random(rng: &mut (impl CryptoRng + RngCore)) -> Result<Self, ScalarError> {
        let mut bytes = SecretBox::new([0u8; 64]);
        rng.try_fill_bytes(bytes.as_mut_secret())
            .map_err(|_| ScalarError::RandomnessSourceFailure)?;
        Ok(Self(Fr::from_le_bytes_mod_order(bytes.as_secret())))
    }

    /// Interprets a digest as a big-endian integer reduced modulo the group order.
    pub(crate) fn from_digest(digest: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(digest))
    }
}

impl From<u64> for CurveScalar {
    fn from(value: u64) -> Self {
        Self(Fr::from(value))
    }
}

impl Zeroize for CurveScalar {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl Add<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn add(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0 + other.0)
    }
}

impl Sub<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn sub(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0 - other.0)
    }
}

impl Mul<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn mul(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0 * other.0)
    }
}

impl Neg for &CurveScalar {
    type Output = CurveScalar;

    fn neg(self) -> CurveScalar {
        CurveScalar(-self.0)
    }
}

impl RepresentableAsArray for CurveScalar {
    type Size = U32;
}

impl SerializableToArray for CurveScalar {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        serialize_to_array(&self.0)
    }
}

impl DeserializableFromArray for CurveScalar {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        Fr::deserialize_compressed(arr.as_slice())
            .map(Self)
            .map_err(|_| ConstructionError::invalid_value("CurveScalar", "not reduced"))
    }
}

/// A scalar guaranteed to be non-zero, used for blinding factors and key exponents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NonZeroCurveScalar(CurveScalar);

impl NonZeroCurveScalar {
    /// Samples a uniformly distributed non-zero scalar.
    pub fn try_random(rng: &mut (impl CryptoRng + RngCore)) -> Result<Self, ScalarError> {
        loop {
            let scalar = CurveScalar::try_random(rng)?;
            if !scalar.is_zero() {
                return Ok(Self(scalar));
            }
        }
    }

    /// Returns the underlying scalar.
    pub fn as_scalar(&self) -> &CurveScalar {
        &self.0
    }

    /// Returns the modular inverse.
    pub fn invert(&self) -> Result<Self, ScalarError> {
        self.0.invert().map(Self)
    }
}

impl From<NonZeroCurveScalar> for CurveScalar {
    fn from(scalar: NonZeroCurveScalar) -> Self {
        scalar.0
    }
}

impl Zeroize for NonZeroCurveScalar {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

/// Writes the compressed encoding of `value` into a fixed-size array.
///
/// # Panics
///
/// Panics if the compressed encoding of `T` is not exactly `N` bytes long.
/// Every caller pairs a BN254 type with its compressed width
/// (32 bytes for `Fr` and `G1`, 64 for `G2`, 384 for `GT`),
/// which `test_canonical_encodings` exercises for each of them.
fn serialize_to_array<T, N>(value: &T) -> GenericArray<u8, N>
where
    T: CanonicalSerialize,
    N: ArrayLength<u8>,
{
    let mut arr = GenericArray::<u8, N>::default();
    value
        .serialize_compressed(arr.as_mut_slice())
        .expect("fixed-width compressed encoding");
    arr
}

/// The operations the secret sharing and proof engines need from a group.
///
/// Implemented for the two source groups and the target group of the pairing.
pub trait GroupElement:
    Clone + fmt::Debug + SerializableToArray + DeserializableFromArray
{
    /// The neutral element.
    fn identity() -> Self;

    /// The fixed generator of the group.
    fn generator() -> Self;

    /// The group operation.
    fn combine(&self, other: &Self) -> Self;

    /// Repeated application of the group operation, `self^exponent`.
    fn pow(&self, exponent: &CurveScalar) -> Self;

    /// The inverse element.
    fn inverse(&self) -> Self {
        self.pow(&-&CurveScalar::one())
    }

    /// Compares two elements through their canonical encodings, in constant time.
    fn canonical_eq(&self, other: &Self) -> bool {
        self.to_array()
            .as_slice()
            .ct_eq(other.to_array().as_slice())
            .into()
    }
}

macro_rules! impl_source_group {
    ($name:ident, $projective:ty, $affine:ty, $size:ty, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name($projective);

        impl GroupElement for $name {
            fn identity() -> Self {
                Self(<$projective>::zero())
            }

            fn generator() -> Self {
                Self(<$affine>::generator().into_group())
            }

            fn combine(&self, other: &Self) -> Self {
                Self(self.0 + other.0)
            }

            fn pow(&self, exponent: &CurveScalar) -> Self {
                Self(self.0 * exponent.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.canonical_eq(other)
            }
        }

        impl Eq for $name {}

        impl Zeroize for $name {
            fn zeroize(&mut self) {
                self.0.zeroize()
            }
        }

        impl RepresentableAsArray for $name {
            type Size = $size;
        }

        impl SerializableToArray for $name {
            fn to_array(&self) -> GenericArray<u8, Self::Size> {
                serialize_to_array(&self.0.into_affine())
            }
        }

        impl DeserializableFromArray for $name {
            fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
                <$affine>::deserialize_compressed(arr.as_slice())
                    .map(|point| Self(point.into_group()))
                    .map_err(|_| {
                        ConstructionError::invalid_value(
                            stringify!($name),
                            "not a valid compressed point",
                        )
                    })
            }
        }

        impl HasTypeName for $name {
            fn type_name() -> &'static str {
                stringify!($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt_public::<Self>(self, f)
            }
        }
    };
}

impl_source_group!(
    G1Point,
    G1Projective,
    G1Affine,
    U32,
    "An element of the first source group of the pairing."
);

impl_source_group!(
    G2Point,
    G2Projective,
    G2Affine,
    U64,
    "An element of the second source group of the pairing."
);

/// An element of the target group of the pairing, written multiplicatively.
#[derive(Clone, Copy, Debug)]
pub struct GtElement(PairingOutput<Bn254>);

impl GroupElement for GtElement {
    fn identity() -> Self {
        Self(PairingOutput::<Bn254>::zero())
    }

    fn generator() -> Self {
        pairing(&G1Point::generator(), &G2Point::generator())
    }

    fn combine(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    fn pow(&self, exponent: &CurveScalar) -> Self {
        Self(self.0 * exponent.0)
    }
}

impl PartialEq for GtElement {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_eq(other)
    }
}

impl Eq for GtElement {}

impl Zeroize for GtElement {
    fn zeroize(&mut self) {
        self.0 .0.zeroize()
    }
}

impl RepresentableAsArray for GtElement {
    type Size = U384;
}

impl SerializableToArray for GtElement {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        serialize_to_array(&self.0)
    }
}

impl DeserializableFromArray for GtElement {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        PairingOutput::<Bn254>::deserialize_compressed(arr.as_slice())
            .map(Self)
            .map_err(|_| ConstructionError::invalid_value("GtElement", "not a valid encoding"))
    }
}

impl HasTypeName for GtElement {
    fn type_name() -> &'static str {
        "GtElement"
    }
}

impl fmt::Display for GtElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

/// The bilinear map `e: G1 x G2 -> GT`.
pub fn pairing(p: &G1Point, q: &G2Point) -> GtElement {
    GtElement(Bn254::pairing(p.0.into_affine(), q.0.into_affine()))
}

#[cfg(test)]
pub(crate) mod tests {

    use core::num::NonZeroU32;

    use rand_core::{CryptoRng, OsRng, RngCore};

    use super::{
        pairing, CurveScalar, G1Point, G2Point, GroupElement, GtElement, NonZeroCurveScalar,
        ScalarError,
    };
    use crate::traits::{DeserializableFromArray, SerializableToArray};

    /// A random number generator whose entropy source is always unavailable.
    pub(crate) struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            panic!("entropy source unavailable")
        }

        fn next_u64(&mut self) -> u64 {
            panic!("entropy source unavailable")
        }

        fn fill_bytes(&mut self, _dest: &mut [u8]) {
            panic!("entropy source unavailable")
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand_core::Error> {
            let code = NonZeroU32::new(rand_core::Error::CUSTOM_START).unwrap();
            Err(rand_core::Error::from(code))
        }
    }

    impl CryptoRng for FailingRng {}

    #[test]
    fn test_randomness_failure() {
        assert_eq!(
            CurveScalar::try_random(&mut FailingRng),
            Err(ScalarError::RandomnessSourceFailure)
        );
        assert_eq!(
            NonZeroCurveScalar::try_random(&mut FailingRng),
            Err(ScalarError::RandomnessSourceFailure)
        );
    }

    #[test]
    fn test_invert_zero() {
        assert_eq!(
            CurveScalar::zero().invert(),
            Err(ScalarError::ModularInverseUndefined)
        );
        let x = NonZeroCurveScalar::try_random(&mut OsRng).unwrap();
        let x_inv = x.invert().unwrap();
        assert_eq!(x.as_scalar() * x_inv.as_scalar(), CurveScalar::one());
    }

    #[test]
    fn test_bilinearity() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let y = CurveScalar::try_random(&mut OsRng).unwrap();
        let g1 = G1Point::generator();
        let g2 = G2Point::generator();

        let lhs = pairing(&g1.pow(&x), &g2.pow(&y));
        let rhs = GtElement::generator().pow(&(&x * &y));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_identity_and_inverse() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let h = GtElement::generator().pow(&x);
        assert_eq!(h.combine(&GtElement::identity()), h);
        assert_eq!(h.combine(&h.pow(&-&CurveScalar::one())), GtElement::identity());

        let p = G2Point::generator().pow(&x);
        assert_eq!(p.pow(&CurveScalar::zero()), G2Point::identity());
    }

    #[test]
    fn test_canonical_encodings() {
        let x = CurveScalar::try_random(&mut OsRng).unwrap();
        let p1 = G1Point::generator().pow(&x);
        let p2 = G2Point::generator().pow(&x);
        let t = GtElement::generator().pow(&x);

        assert_eq!(G1Point::from_array(&p1.to_array()).unwrap(), p1);
        assert_eq!(G2Point::from_array(&p2.to_array()).unwrap(), p2);
        assert_eq!(GtElement::from_array(&t.to_array()).unwrap(), t);
        assert_eq!(CurveScalar::from_array(&x.to_array()).unwrap(), x);

        // An all-ones encoding lies above the modulus.
        let all_ones = [0xffu8; 32];
        assert!(CurveScalar::from_bytes(all_ones).is_err());
    }
}
