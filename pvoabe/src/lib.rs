//! `pvoabe` is a publicly verifiable outsourced attribute-based encryption scheme
//! over the BN254 pairing.
//!
//! A data owner encrypts under an access policy expressed as a monotone span program
//! (an [`AccessMatrix`]). A cloud server completes the ciphertext and, holding transformed
//! keys for data users, performs the expensive pairing work of decryption.
//! Anyone can check that the encoded shares of an [`IntermediateCiphertext`] are consistent
//! before the cloud server completes it.
//! A public verifier checks a [`KeyConsistencyProof`] that the cloud server uses keys
//! issued by the authority, and sanitizes the ciphertext before it can be decrypted.
//! The cloud server signs each transformed key with a [`TransformProof`],
//! which the data user checks before finishing decryption with a single pairing.
//!
//! The building blocks are exposed as well: the linear secret sharing engine
//! ([`share`], [`reconstruct_coefficients`], [`reconstruct`]) and
//! Chaum-Pedersen equality of discrete logarithms proofs ([`DleqProof`]).
//!
//! ## Available feature flags
//!
//! * `default-rng` - adds methods that use the system RNG (default).
//! * `serde-support` - implements `serde`-based serialization and deserialization.
//! * `std` - enables the standard library in the arithmetic backend.
//!
//! # Usage
//!
//! ```
//! use pvoabe::*;
//!
//! // The authority sets the system up over a fixed attribute universe.
//! let (pp, msk) = setup(["Doctor", "Nurse", "Cardiology"]).unwrap();
//!
//! // The public verifier publishes a key together with a proof of its well-formedness.
//! let pv_sk = VerifierSecretKey::random().unwrap();
//! let pv_pk = pv_sk.public_key().unwrap();
//! assert!(pv_pk.verify());
//!
//! // The data owner encrypts under a policy; the cloud server completes the ciphertext.
//! let plaintext = b"peace at dawn";
//! let policy = AccessMatrix::from_policy("Doctor AND (Nurse OR Cardiology)").unwrap();
//! let (intermediate, payload) = encrypt(&pp, &pv_pk, &policy, plaintext).unwrap();
//! assert!(intermediate.verify_shares(&pp).is_ok());
//! let ciphertext = intermediate.complete(&pp, &pv_pk).unwrap();
//!
//! // The authority issues a user key: one part goes to the cloud server,
//! // the other stays with the user.
//! let (cloud_key, user_key) =
//!     generate_user_key(&pp, &msk, "alice", ["Doctor", "Cardiology"]).unwrap();
//!
//! // The cloud server proves it holds a key consistent with the public parameters.
//! let attributes = ["Doctor", "Cardiology"];
//! let proof = KeyConsistencyProof::prove(&pp, &cloud_key, &ciphertext, attributes).unwrap();
//!
//! // Simulate network transfer
//! let proof_back = KeyConsistencyProof::from_array(&proof.to_array()).unwrap();
//!
//! // The verifier checks the proof and sanitizes the ciphertext.
//! assert!(proof_back.verify(&pp, &ciphertext, "alice", attributes));
//! let sanitized = ciphertext.sanitize(&pp, &pv_sk).unwrap();
//!
//! // The cloud server does the heavy lifting and signs the result...
//! let server_sk = ServerSecretKey::random().unwrap();
//! let server_pk = server_sk.public_key();
//! let (transformed, transform_proof) =
//!     transform_and_prove(&server_sk, &sanitized, &cloud_key, attributes).unwrap();
//!
//! // ...and the user checks it and finishes decryption.
//! verify_transformed(
//!     &sanitized,
//!     &cloud_key,
//!     attributes,
//!     &server_pk,
//!     &transformed,
//!     &transform_proof,
//! )
//! .unwrap();
//! let decrypted = decrypt_transformed(&user_key, &sanitized, &transformed, &payload).unwrap();
//! assert_eq!(&decrypted as &[u8], plaintext);
//! ```

#![doc(html_root_url = "https://docs.rs/pvoabe")]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
#![no_std]
// Allows us to mark items in the documentation as gated under specific features.
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod abe;
mod ciphertext;
mod correctness_proof;
mod curve;
mod dem;
mod dleq;
mod hashing;
mod hashing_ds;
mod keys;
mod lsss;
mod policy;
mod secret_box;
mod traits;

#[cfg(feature = "serde-support")]
mod serde;

pub use abe::{
    decrypt_transformed, encrypt_with_rng, transform, transform_and_prove_with_rng,
    verify_transformed, TransformError, TransformProof, TransformedKey,
};
pub use ciphertext::{Ciphertext, CiphertextError, IntermediateCiphertext, RowComponents};
pub use correctness_proof::{KeyConsistencyProof, ProofError};
pub use curve::{
    pairing, CurveScalar, G1Point, G2Point, GroupElement, GtElement, NonZeroCurveScalar,
    ScalarError,
};
pub use dem::{DecryptionError, EncryptionError};
pub use dleq::{CrossGroupDleqProof, DleqProof};
pub use keys::{
    generate_user_key_with_rng, setup_with_rng, AttributeBase, CloudKey, KeyGenerationError,
    MasterSecretKey, PublicParameters, ServerPublicKey, ServerSecretKey, UserKey,
    VerifierPublicKey, VerifierSecretKey,
};
pub use lsss::{
    combine_in_exponent, reconstruct, reconstruct_coefficients, reconstruct_coefficients_for_rows,
    share_with_rng, verify_encoded_shares, GroupEncodedShares, LsssError,
    ReconstructionCoefficients, ShareSet,
};
pub use policy::{AccessMatrix, PolicyError, MAX_GATES, MAX_NESTING_DEPTH};
pub use secret_box::{CanBeZeroizedOnDrop, SecretBox};
pub use traits::{
    ConstructionError, DeserializableFromArray, DeserializationError, HasTypeName,
    RepresentableAsArray, SerializableToArray, SizeMismatchError,
};

#[cfg(feature = "default-rng")]
pub use abe::{encrypt, transform_and_prove};
#[cfg(feature = "default-rng")]
pub use keys::{generate_user_key, setup};
#[cfg(feature = "default-rng")]
pub use lsss::share;
