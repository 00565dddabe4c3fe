//! Signature and signed-envelope wire shapes.
//!
//! An envelope is a frozen request body plus the signatures collected over
//! it. Signatures travel with a shortened public-key prefix rather than the
//! full key; the receiving network matches each prefix back to a full key
//! among the candidates it derives from the transaction, so every prefix in
//! one envelope must be unambiguous within that envelope.

use serde::{Serialize, Serializer};

use crate::identity::TransactionIdentity;

/// Hex serialization function.
///
/// Can be used in `#[serde(serialize_with = "")]` attributes for any
/// byte-slice field.
fn serialize_bytes_hex<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

/// Signature scheme a public key belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, serde::Deserialize)]
pub enum KeyAlgorithm {
    /// Ed25519 over Curve25519; 32-byte public keys, 64-byte signatures.
    Ed25519,
    /// ECDSA over secp256k1 with SHA-256 prehashing; SEC1-compressed
    /// 33-byte public keys.
    EcdsaSecp256k1,
}

/// One collected signature, keyed externally by its full public key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SignatureEntry {
    /// Scheme the signature was produced under.
    pub algorithm: KeyAlgorithm,
    /// The raw signature bytes.
    #[serde(serialize_with = "serialize_bytes_hex")]
    pub signature: Vec<u8>,
}

/// A signature paired with the disambiguating prefix of its public key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SignaturePair {
    /// Shortest prefix of the signer's public key that is unique within
    /// the envelope's signature map (the full key when only one signature
    /// is present and no minimum prefix was requested).
    #[serde(serialize_with = "serialize_bytes_hex")]
    pub key_prefix: Vec<u8>,
    /// Scheme the signature was produced under.
    pub algorithm: KeyAlgorithm,
    /// The raw signature bytes.
    #[serde(serialize_with = "serialize_bytes_hex")]
    pub signature: Vec<u8>,
}

/// Ordered sequence of prefix-identified signatures.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SignatureMap {
    /// The pairs, in public-key order.
    pub pairs: Vec<SignaturePair>,
}

impl SignatureMap {
    /// Number of signatures in the map.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when the map holds no signatures.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A frozen, fully signed request ready for transmission.
///
/// The identity and memo ride alongside the opaque body bytes so that the
/// executor's submission-recovery check and the receipt resolver can key
/// off the identity without ever re-parsing the body.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SignedEnvelope {
    /// Identity the body was stamped with.
    pub identity: TransactionIdentity,
    /// Human-readable memo carried for diagnostics.
    pub memo: String,
    /// The serialized, already-frozen request body.
    #[serde(serialize_with = "serialize_bytes_hex")]
    pub body_bytes: Vec<u8>,
    /// Signatures collected over `body_bytes`.
    pub signatures: SignatureMap,
}
