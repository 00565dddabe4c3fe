//! The invoice: signature collection over one frozen request body.
//!
//! An invoice accumulates signatures from however many signatories a
//! transaction needs, deduplicates them by full public key, and on freeze
//! packages them into a [`SignedEnvelope`] with each key shortened to the
//! minimal prefix that stays unique within the batch. The receiving
//! network matches signatures to signers by these prefixes, so an
//! ambiguous prefix would make the envelope unverifiable; the search here
//! is correctness-sensitive, not an optimization.
//!
//! No network I/O happens in this module, and an invoice is private to one
//! submission pipeline; it is never shared across tasks.

use std::collections::BTreeMap;

use ledger_core::envelope::SignatureEntry;
use ledger_core::{
    KeyAlgorithm, SignatureMap, SignaturePair, SignedEnvelope, TransactionIdentity,
};

use crate::error::{Error, Result};

/// Mutable signature collector for a single request body.
///
/// Mutable only during the collection phase; [`Invoice::freeze`] consumes
/// it and produces the immutable envelope handed to the executor.
#[derive(Debug)]
pub struct Invoice {
    /// Identity the body was stamped with.
    identity: TransactionIdentity,
    /// Human-readable memo describing the request.
    memo: String,
    /// The serialized, already-frozen request body.
    body_bytes: Vec<u8>,
    /// Collected signatures, keyed (and ordered) by full public key.
    signatures: BTreeMap<Vec<u8>, SignatureEntry>,
}

impl Invoice {
    /// Starts a collector over `body_bytes` with an empty signature map.
    ///
    /// Fails with [`Error::EmptyTransactionBody`] when the body is empty;
    /// an empty body can never be a valid request and signing it would
    /// only produce a confusing rejection later.
    pub fn new(
        body_bytes: Vec<u8>,
        memo: impl Into<String>,
        identity: TransactionIdentity,
    ) -> Result<Self> {
        if body_bytes.is_empty() {
            return Err(Error::EmptyTransactionBody);
        }
        Ok(Self {
            identity,
            memo: memo.into(),
            body_bytes,
            signatures: BTreeMap::new(),
        })
    }

    /// The bytes every signatory must sign.
    pub fn body_bytes(&self) -> &[u8] {
        &self.body_bytes
    }

    /// Identity of the request being signed.
    pub fn identity(&self) -> &TransactionIdentity {
        &self.identity
    }

    /// Memo of the request being signed.
    pub fn memo(&self) -> &str {
        &self.memo
    }

    /// Number of distinct signatures collected so far.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Registers a signature under the signer's full public key.
    ///
    /// Registering the same key twice is fine as long as the entry is
    /// byte-identical (multiple composite signatories may share a key); a
    /// differing entry fails with [`Error::DuplicateSignatureConflict`]
    /// and leaves the collector untouched.
    pub fn add_signature(
        &mut self,
        algorithm: KeyAlgorithm,
        public_key: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let entry = SignatureEntry {
            algorithm,
            signature: signature.to_vec(),
        };
        if let Some(existing) = self.signatures.get(public_key) {
            if *existing != entry {
                return Err(Error::DuplicateSignatureConflict {
                    public_key_hex: hex::encode(public_key),
                });
            }
            return Ok(());
        }
        self.signatures.insert(public_key.to_vec(), entry);
        Ok(())
    }

    /// Freezes the collector into a [`SignedEnvelope`].
    ///
    /// With exactly one signature and no minimum prefix requested, the
    /// full key is emitted as its own prefix — it is trivially unique and
    /// the search is unnecessary. Otherwise the minimal unique prefix
    /// length is discovered by growing a candidate length from
    /// `max(1, minimum_prefix_len)` until all prefixes are pairwise
    /// distinct; a prefix never grows past its own key's length, so keys
    /// of different sizes where one is a prefix of the other still resolve.
    pub fn freeze(self, minimum_prefix_len: usize) -> Result<SignedEnvelope> {
        if self.signatures.is_empty() {
            return Err(Error::NoSignatures);
        }
        let pairs = if self.signatures.len() == 1 && minimum_prefix_len < 1 {
            let (key, entry) = self.signatures.into_iter().next().expect("one signature");
            vec![SignaturePair {
                key_prefix: key,
                algorithm: entry.algorithm,
                signature: entry.signature,
            }]
        } else {
            let entries: Vec<(Vec<u8>, SignatureEntry)> = self.signatures.into_iter().collect();
            let keys: Vec<&[u8]> = entries.iter().map(|(key, _)| key.as_slice()).collect();
            let length = minimal_unique_prefix_len(&keys, minimum_prefix_len.max(1));
            entries
                .into_iter()
                .map(|(key, entry)| {
                    let cut = length.min(key.len());
                    SignaturePair {
                        key_prefix: key[..cut].to_vec(),
                        algorithm: entry.algorithm,
                        signature: entry.signature,
                    }
                })
                .collect()
        };
        Ok(SignedEnvelope {
            identity: self.identity,
            memo: self.memo,
            body_bytes: self.body_bytes,
            signatures: SignatureMap { pairs },
        })
    }
}

/// Finds the smallest prefix length, at least `start`, at which all keys
/// are pairwise distinct when each is truncated to `min(len, key.len())`.
///
/// The keys come from a map keyed by full key bytes, so they are distinct
/// and the search always terminates.
fn minimal_unique_prefix_len(keys: &[&[u8]], start: usize) -> usize {
    let mut length = start;
    loop {
        let distinct = keys.iter().enumerate().all(|(i, key)| {
            let prefix = &key[..length.min(key.len())];
            keys[..i]
                .iter()
                .all(|earlier| prefix != &earlier[..length.min(earlier.len())])
        });
        if distinct {
            return length;
        }
        length += 1;
    }
}

#[cfg(test)]
mod tests {
    use ledger_core::{AccountAddress, Timestamp};

    use super::*;

    fn identity() -> TransactionIdentity {
        TransactionIdentity {
            payer: AccountAddress::new(0, 0, 42),
            valid_start: Timestamp {
                seconds: 100,
                nanos: 7,
            },
        }
    }

    fn invoice() -> Invoice {
        Invoice::new(b"transfer body".to_vec(), "Transfer Crypto", identity()).unwrap()
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = Invoice::new(Vec::new(), "memo", identity()).unwrap_err();
        assert!(matches!(err, Error::EmptyTransactionBody));
    }

    #[test]
    fn freezing_without_signatures_fails() {
        let err = invoice().freeze(0).unwrap_err();
        assert!(matches!(err, Error::NoSignatures));
    }

    #[test]
    fn single_signature_emits_full_key_as_prefix() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[9, 8, 7, 6], &[1; 64])
            .unwrap();
        let envelope = inv.freeze(0).unwrap();
        assert_eq!(envelope.signatures.len(), 1);
        assert_eq!(envelope.signatures.pairs[0].key_prefix, vec![9, 8, 7, 6]);
    }

    #[test]
    fn single_signature_honors_minimum_prefix() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[9, 8, 7, 6], &[1; 64])
            .unwrap();
        let envelope = inv.freeze(2).unwrap();
        assert_eq!(envelope.signatures.pairs[0].key_prefix, vec![9, 8]);
    }

    #[test]
    fn identical_duplicate_registration_is_a_no_op() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[5; 64])
            .unwrap();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[5; 64])
            .unwrap();
        assert_eq!(inv.signature_count(), 1);
    }

    #[test]
    fn conflicting_duplicate_fails_and_leaves_state_unchanged() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[5; 64])
            .unwrap();
        let err = inv
            .add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[6; 64])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSignatureConflict { .. }));
        assert_eq!(inv.signature_count(), 1);
        let envelope = inv.freeze(0).unwrap();
        assert_eq!(envelope.signatures.pairs[0].signature, vec![5; 64]);
    }

    #[test]
    fn same_key_different_algorithm_is_a_conflict() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[5; 64])
            .unwrap();
        let err = inv
            .add_signature(KeyAlgorithm::EcdsaSecp256k1, &[1, 2, 3], &[5; 64])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSignatureConflict { .. }));
    }

    #[test]
    fn prefix_length_is_minimal_and_unambiguous() {
        let mut inv = invoice();
        // Diverge at the third byte: minimal unique length is 3.
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3, 4], &[10; 64])
            .unwrap();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 9, 4], &[11; 64])
            .unwrap();
        inv.add_signature(KeyAlgorithm::Ed25519, &[7, 7, 7, 7], &[12; 64])
            .unwrap();
        let envelope = inv.freeze(0).unwrap();
        let prefixes: Vec<_> = envelope
            .signatures
            .pairs
            .iter()
            .map(|pair| pair.key_prefix.clone())
            .collect();
        assert!(prefixes.iter().all(|prefix| prefix.len() == 3));
        // Pairwise distinct at the chosen length.
        for (i, prefix) in prefixes.iter().enumerate() {
            for other in &prefixes[..i] {
                assert_ne!(prefix, other);
            }
        }
        // One byte shorter would collide: [1, 2] repeats.
        assert_eq!(&prefixes[0][..2], &prefixes[1][..2]);
    }

    #[test]
    fn key_that_prefixes_another_is_truncated_at_its_own_length() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2], &[10; 64])
            .unwrap();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 2, 3], &[11; 64])
            .unwrap();
        let envelope = inv.freeze(0).unwrap();
        let prefixes: Vec<_> = envelope
            .signatures
            .pairs
            .iter()
            .map(|pair| pair.key_prefix.clone())
            .collect();
        // The shorter key caps at its own length; the longer one grows
        // past it and the pair stays distinguishable.
        assert_eq!(prefixes, vec![vec![1, 2], vec![1, 2, 3]]);
    }

    #[test]
    fn minimum_prefix_floor_is_respected_for_batches() {
        let mut inv = invoice();
        inv.add_signature(KeyAlgorithm::Ed25519, &[1, 0, 0], &[10; 64])
            .unwrap();
        inv.add_signature(KeyAlgorithm::Ed25519, &[2, 0, 0], &[11; 64])
            .unwrap();
        let envelope = inv.freeze(2).unwrap();
        assert!(envelope
            .signatures
            .pairs
            .iter()
            .all(|pair| pair.key_prefix.len() == 2));
    }
}
