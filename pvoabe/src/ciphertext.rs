use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::fmt;

use rand_core::{CryptoRng, RngCore};

use crate::curve::{
    pairing, CurveScalar, G1Point, G2Point, GroupElement, GtElement, NonZeroCurveScalar,
    ScalarError,
};
use crate::dem::EncryptionError;
use crate::hashing_ds::ciphertext_challenge_digest;
use crate::keys::{AttributeBase, PublicParameters, VerifierPublicKey, VerifierSecretKey};
use crate::lsss::{share_with_rng, verify_encoded_shares, GroupEncodedShares, LsssError};
use crate::policy::AccessMatrix;
use crate::secret_box::SecretBox;

/// Errors that can happen while building, completing or sanitizing a ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CiphertextError {
    /// The verifier's public key halves do not share one exponent.
    InvalidVerifierKey,
    /// A row of the access matrix is labelled with an attribute outside of the universe.
    UnknownAttribute(String),
    /// The ciphertext has already been sanitized.
    AlreadySanitized,
    /// The encoded shares are not a sharing of the exponent of `C'`.
    InvalidShares,
    /// Secret sharing failed.
    Lsss(LsssError),
    /// Scalar arithmetic or randomness failure.
    Scalar(ScalarError),
    /// The payload could not be encrypted.
    Payload(EncryptionError),
}

impl fmt::Display for CiphertextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidVerifierKey => write!(f, "The verifier public key is malformed"),
            Self::UnknownAttribute(attribute) => {
                write!(f, "Attribute `{}` is not in the universe", attribute)
            }
            Self::AlreadySanitized => write!(f, "The ciphertext is already sanitized"),
            Self::InvalidShares => write!(f, "The encoded shares are inconsistent"),
            Self::Lsss(err) => write!(f, "Secret sharing failed: {}", err),
            Self::Scalar(err) => write!(f, "{}", err),
            Self::Payload(err) => write!(f, "{}", err),
        }
    }
}

impl From<LsssError> for CiphertextError {
    fn from(err: LsssError) -> Self {
        Self::Lsss(err)
    }
}

impl From<ScalarError> for CiphertextError {
    fn from(err: ScalarError) -> Self {
        Self::Scalar(err)
    }
}

fn attribute_of<'a>(
    pp: &'a PublicParameters,
    matrix: &AccessMatrix,
    row: usize,
) -> Result<&'a AttributeBase, CiphertextError> {
    let label = matrix.label(row).ok_or(LsssError::InvalidRow(row))?;
    pp.attribute_base(label)
        .ok_or_else(|| CiphertextError::UnknownAttribute(label.to_string()))
}

/// The ciphertext produced by the data owner and handed to the cloud server.
///
/// `C = K_R·e(g,g)^{αs}·e(g, pk_V)^s`, `C' = g2^s`, `C'' = (w·pk_V)^s`,
/// and the shares of `s` encoded as `(g^a)^{λ_i}`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntermediateCiphertext {
    pub(crate) matrix: AccessMatrix,
    pub(crate) point_c: GtElement,
    pub(crate) point_c_prime: G2Point,
    pub(crate) point_c_second: G2Point,
    pub(crate) encoded_shares: GroupEncodedShares<G1Point>,
}

impl IntermediateCiphertext {
    /// Encapsulates a fresh target group key under `matrix`.
    pub(crate) fn new_with_rng(
        rng: &mut (impl CryptoRng + RngCore),
        pp: &PublicParameters,
        verifier_pk: &VerifierPublicKey,
        matrix: &AccessMatrix,
    ) -> Result<(Self, SecretBox<GtElement>), CiphertextError> {
        if !verifier_pk.verify() {
            return Err(CiphertextError::InvalidVerifierKey);
        }
        for row in 0..matrix.num_rows() {
            attribute_of(pp, matrix, row)?;
        }

        let k = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let key = SecretBox::new(pp.base.pow(k.as_secret().as_scalar()));

        let s_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let s = s_secret.as_secret().as_scalar();
        let shares = share_with_rng(rng, matrix, s)?;

        let mask = pairing(&verifier_pk.point_g1, &G2Point::generator());
        let point_c = key
            .as_secret()
            .combine(&pp.base.pow(s))
            .combine(&mask.pow(s));
        let point_c_prime = G2Point::generator().pow(s);
        let point_c_second = pp.w_g2.combine(&verifier_pk.point_g2).pow(s);

        let ciphertext = Self {
            matrix: matrix.clone(),
            point_c,
            point_c_prime,
            point_c_second,
            encoded_shares: shares.encode(&pp.ga),
        };
        Ok((ciphertext, key))
    }

    /// The access matrix the ciphertext is encrypted under.
    pub fn matrix(&self) -> &AccessMatrix {
        &self.matrix
    }

    /// Checks, from public values only, that the encoded shares `(g^a)^{λ_i}`
    /// come from one sharing of the exponent `s` of `C' = g2^s`:
    /// the shares satisfy every row dependency of the matrix,
    /// and `e(Π ((g^a)^{λ_i})^{w_i}, g2) = e(g^a, C')`.
    pub fn verify_shares(&self, pp: &PublicParameters) -> Result<(), CiphertextError> {
        let encoded_secret = verify_encoded_shares(&self.matrix, &self.encoded_shares)
            .map_err(|err| match err {
                LsssError::InconsistentShares => CiphertextError::InvalidShares,
                other => other.into(),
            })?;
        if pairing(&encoded_secret, &G2Point::generator()) != pairing(&pp.ga, &self.point_c_prime)
        {
            tracing::debug!("encoded shares do not match C'");
            return Err(CiphertextError::InvalidShares);
        }
        Ok(())
    }

    /// Checks the encoded shares with [`verify_shares`](`Self::verify_shares`),
    /// then adds the per-row components `C_i = (g^a)^{λ_i}·(h_ρ(i)·pk_V)^{-r_i}`, `D_i = g^{r_i}`,
    /// using the given RNG.
    pub fn complete_with_rng(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        pp: &PublicParameters,
        verifier_pk: &VerifierPublicKey,
    ) -> Result<Ciphertext, CiphertextError> {
        self.verify_shares(pp)?;

        let g1 = G1Point::generator();
        let mut rows = BTreeMap::new();
        for row in 0..self.matrix.num_rows() {
            let encoded_share = self
                .encoded_shares
                .get(&row)
                .ok_or(LsssError::MissingRow(row))?;
            let attribute = attribute_of(pp, &self.matrix, row)?;

            let r = NonZeroCurveScalar::try_random(rng)?;
            let mask = attribute.point_g1.combine(&verifier_pk.point_g1);
            let components = RowComponents {
                point_c: encoded_share.combine(&mask.pow(&-r.as_scalar())),
                point_d: g1.pow(r.as_scalar()),
            };
            rows.insert(row, components);
        }

        Ok(Ciphertext {
            matrix: self.matrix.clone(),
            point_c: self.point_c,
            point_c_prime: self.point_c_prime,
            point_c_second: self.point_c_second,
            point_c0: None,
            rows,
        })
    }

    /// Adds the per-row components using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn complete(
        &self,
        pp: &PublicParameters,
        verifier_pk: &VerifierPublicKey,
    ) -> Result<Ciphertext, CiphertextError> {
        self.complete_with_rng(&mut rand_core::OsRng, pp, verifier_pk)
    }
}

/// The pair `(C_i, D_i)` attached to one row of the access matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowComponents {
    pub(crate) point_c: G1Point,
    pub(crate) point_d: G1Point,
}

/// The complete ciphertext, before or after sanitization.
#[derive(Clone, Debug, PartialEq)]
pub struct Ciphertext {
    pub(crate) matrix: AccessMatrix,
    pub(crate) point_c: GtElement,
    pub(crate) point_c_prime: G2Point,
    pub(crate) point_c_second: G2Point,
    /// `(g^a)^r`, present once the ciphertext is sanitized.
    pub(crate) point_c0: Option<G1Point>,
    pub(crate) rows: BTreeMap<usize, RowComponents>,
}

impl Ciphertext {
    /// The access matrix the ciphertext is encrypted under.
    pub fn matrix(&self) -> &AccessMatrix {
        &self.matrix
    }

    /// Returns `true` if the verifier's mask has been removed.
    pub fn is_sanitized(&self) -> bool {
        self.point_c0.is_some()
    }

    /// Hashes every component of the ciphertext into a scalar,
    /// visiting the rows in ascending order.
    pub fn challenge(&self) -> CurveScalar {
        let mut digest = ciphertext_challenge_digest()
            .chain_bytes_with_len(self.matrix.to_bytes())
            .chain_element(&self.point_c)
            .chain_element(&self.point_c_prime)
            .chain_element(&self.point_c_second);
        digest = match &self.point_c0 {
            Some(point_c0) => digest.chain_bytes([1u8]).chain_element(point_c0),
            None => digest.chain_bytes([0u8]),
        };
        self.rows
            .iter()
            .fold(digest, |digest, (row, components)| {
                digest
                    .chain_element(&(*row as u32))
                    .chain_element(&components.point_c)
                    .chain_element(&components.point_d)
            })
            .finalize()
    }

    /// Strips the verifier's mask with its secret key `c` and re-randomizes every component,
    /// using the given RNG.
    ///
    /// With a fresh `r`: `C0 = (g^a)^r`, `C ← C·e(g, C')^{-c}·e(g,g)^{αr}`,
    /// `C'' ← C''·C'^{-c}·w^r`, `C' ← C'·g^r`, `C_i ← C_i·D_i^c·h_ρ(i)^{-r}`, `D_i ← D_i·g^r`.
    pub fn sanitize_with_rng(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        pp: &PublicParameters,
        verifier_sk: &VerifierSecretKey,
    ) -> Result<Ciphertext, CiphertextError> {
        if self.is_sanitized() {
            return Err(CiphertextError::AlreadySanitized);
        }

        let c = verifier_sk.as_scalar();
        let neg_c = -c;
        let r_secret = SecretBox::new(NonZeroCurveScalar::try_random(rng)?);
        let r = r_secret.as_secret().as_scalar();
        let neg_r = -r;

        let g1 = G1Point::generator();
        let g2 = G2Point::generator();
        let g1_r = g1.pow(r);

        let point_c = self
            .point_c
            .combine(&pairing(&g1, &self.point_c_prime).pow(&neg_c))
            .combine(&pp.base.pow(r));
        let point_c_second = self
            .point_c_second
            .combine(&self.point_c_prime.pow(&neg_c))
            .combine(&pp.w_g2.pow(r));
        let point_c_prime = self.point_c_prime.combine(&g2.pow(r));

        let mut rows = BTreeMap::new();
        for (row, components) in self.rows.iter() {
            let attribute = attribute_of(pp, &self.matrix, *row)?;
            let sanitized = RowComponents {
                point_c: components
                    .point_c
                    .combine(&components.point_d.pow(c))
                    .combine(&attribute.point_g1.pow(&neg_r)),
                point_d: components.point_d.combine(&g1_r),
            };
            rows.insert(*row, sanitized);
        }

        Ok(Ciphertext {
            matrix: self.matrix.clone(),
            point_c,
            point_c_prime,
            point_c_second,
            point_c0: Some(pp.ga.pow(r)),
            rows,
        })
    }

    /// Strips the verifier's mask using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn sanitize(
        &self,
        pp: &PublicParameters,
        verifier_sk: &VerifierSecretKey,
    ) -> Result<Ciphertext, CiphertextError> {
        self.sanitize_with_rng(&mut rand_core::OsRng, pp, verifier_sk)
    }
}
