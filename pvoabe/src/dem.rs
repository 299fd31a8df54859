use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use aead::{Aead, AeadCore, Payload};
use chacha20poly1305::aead::NewAead;
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use generic_array::{ArrayLength, GenericArray};
use hkdf::Hkdf;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use typenum::Unsigned;

use crate::curve::GtElement;
use crate::secret_box::SecretBox;
use crate::traits::SerializableToArray;

/// Errors of payload encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    /// The AEAD refused the payload length.
    PlaintextTooLarge,
    /// The nonce could not be drawn from the random number generator.
    RandomnessSourceFailure,
}

impl fmt::Display for EncryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaintextTooLarge => write!(f, "The payload is too large to encrypt"),
            Self::RandomnessSourceFailure => write!(f, "Failed to draw the payload nonce"),
        }
    }
}

/// Errors of payload decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    /// The encrypted payload cannot even hold its nonce.
    CiphertextTooShort,
    /// The tag did not verify: the payload key is wrong (the transformed key
    /// belongs to another user or ciphertext), the payload was altered,
    /// or the ciphertext it is attached to carries another access matrix.
    AuthenticationFailed,
}

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CiphertextTooShort => write!(f, "The payload is shorter than its nonce"),
            Self::AuthenticationFailed => write!(f, "Payload authentication failed"),
        }
    }
}

/// HKDF-SHA256 expansion of `seed` into `S` bytes.
///
/// # Panics
///
/// HKDF-SHA256 refuses to produce more than `255 * 32` bytes.
/// Every `S` used in this crate is a symmetric key size, far below that limit,
/// so the expansion cannot fail.
pub(crate) fn kdf<S: ArrayLength<u8>>(
    seed: &[u8],
    salt: Option<&[u8]>,
    info: Option<&[u8]>,
) -> SecretBox<GenericArray<u8, S>> {
    let hk = Hkdf::<Sha256>::new(salt, seed);
    let mut okm = SecretBox::new(GenericArray::<u8, S>::default());
    hk.expand(info.unwrap_or(&[]), okm.as_mut_secret())
        .expect("HKDF output length within bounds");
    okm
}

type NonceSize = <XChaCha20Poly1305 as AeadCore>::NonceSize;

/// XChaCha20-Poly1305 over payloads, keyed by a target group element.
///
/// An encrypted payload is the random 24-byte nonce followed by the AEAD output.
pub(crate) struct DEM {
    cipher: XChaCha20Poly1305,
}

impl DEM {
    /// Derives the symmetric key from the canonical encoding of `key`.
    pub fn new(key: &GtElement) -> Self {
        type KeySize = <XChaCha20Poly1305 as NewAead>::KeySize;
        let seed = SecretBox::new(key.to_array());
        let key_bytes = kdf::<KeySize>(seed.as_secret(), None, Some(b"PVOABE_DEM_KEY"));
        let key = Key::from_slice(key_bytes.as_secret());
        let cipher = XChaCha20Poly1305::new(key);
        Self { cipher }
    }

    pub fn encrypt(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        data: &[u8],
        authenticated_data: &[u8],
    ) -> Result<Box<[u8]>, EncryptionError> {
        let mut nonce = GenericArray::<u8, NonceSize>::default();
        rng.try_fill_bytes(&mut nonce)
            .map_err(|_| EncryptionError::RandomnessSourceFailure)?;
        let nonce = XNonce::from_slice(&nonce);
        let payload = Payload {
            msg: data,
            aad: authenticated_data,
        };

        let mut result: Vec<u8> = nonce.to_vec();
        let enc_data = self
            .cipher
            .encrypt(nonce, payload)
            .or(Err(EncryptionError::PlaintextTooLarge))?;

        result.extend(enc_data);
        Ok(result.into_boxed_slice())
    }

    pub fn decrypt(
        &self,
        ciphertext: impl AsRef<[u8]>,
        authenticated_data: &[u8],
    ) -> Result<Box<[u8]>, DecryptionError> {
        let nonce_size = <NonceSize as Unsigned>::to_usize();
        let buf_size = ciphertext.as_ref().len();

        if buf_size < nonce_size {
            return Err(DecryptionError::CiphertextTooShort);
        }

        let nonce = XNonce::from_slice(&ciphertext.as_ref()[..nonce_size]);
        let payload = Payload {
            msg: &ciphertext.as_ref()[nonce_size..],
            aad: authenticated_data,
        };
        self.cipher
            .decrypt(nonce, payload)
            .map(|pt| pt.into_boxed_slice())
            .or(Err(DecryptionError::AuthenticationFailed))
    }
}
