//! Signatories: the holders of signing authority for a transaction.
//!
//! A signatory is anything that can add one or more signatures to an
//! [`Invoice`]: a locally held Ed25519 or secp256k1 key, an asynchronous
//! callback delegating to an external signer such as an HSM, or a list
//! combining several of the above. Composite signing is sequential so the
//! resulting signature map is deterministic.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use ed25519_dalek::Signer as _;
use futures::future::BoxFuture;
use hex::FromHex;
use k256::ecdsa::signature::DigestSigner as _;
use ledger_core::KeyAlgorithm;
use sha2::{Digest, Sha256};
use snafu::ResultExt;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::{Error, KeyFileReadSnafu, KeyParseSnafu, Result};
use crate::invoice::Invoice;

/// One signature produced by an external signer.
#[derive(Clone, Debug)]
pub struct SignatureContribution {
    /// Scheme the signature was produced under.
    pub algorithm: KeyAlgorithm,
    /// The signer's full public key bytes.
    pub public_key: Vec<u8>,
    /// The raw signature over the body bytes.
    pub signature: Vec<u8>,
}

/// An asynchronous external signing function: receives the body bytes to
/// sign and returns the signatures to register.
pub type SigningFn =
    Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<Vec<SignatureContribution>>> + Send + Sync>;

/// A source of signatures over a request body.
pub enum Signatory {
    /// A locally held Ed25519 signing key.
    Ed25519(ed25519_dalek::SigningKey),
    /// A locally held secp256k1 ECDSA signing key; the body is prehashed
    /// with SHA-256 before signing.
    EcdsaSecp256k1(k256::ecdsa::SigningKey),
    /// An external signer invoked asynchronously.
    Callback(SigningFn),
    /// A composite of several signatories, applied in order.
    List(Vec<Signatory>),
}

impl fmt::Debug for Signatory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(_) => f.write_str("Signatory::Ed25519"),
            Self::EcdsaSecp256k1(_) => f.write_str("Signatory::EcdsaSecp256k1"),
            Self::Callback(_) => f.write_str("Signatory::Callback"),
            Self::List(members) => write!(f, "Signatory::List({})", members.len()),
        }
    }
}

impl Signatory {
    /// Wraps an external signing function as a signatory.
    pub fn callback<F, Fut>(signer: F) -> Self
    where
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<SignatureContribution>>> + Send + 'static,
    {
        Self::Callback(Arc::new(move |body| Box::pin(signer(body))))
    }

    /// Signs the invoice's body bytes, registering every produced
    /// signature on the invoice.
    ///
    /// Boxed because [`Signatory::List`] recurses.
    pub fn sign<'a>(&'a self, invoice: &'a mut Invoice) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self {
                Self::Ed25519(key) => {
                    let signature = key.sign(invoice.body_bytes());
                    invoice.add_signature(
                        KeyAlgorithm::Ed25519,
                        key.verifying_key().as_bytes(),
                        &signature.to_bytes(),
                    )
                }
                Self::EcdsaSecp256k1(key) => {
                    let digest = Sha256::new_with_prefix(invoice.body_bytes());
                    let signature: k256::ecdsa::Signature = key.sign_digest(digest);
                    let public_key = key.verifying_key().to_encoded_point(true);
                    invoice.add_signature(
                        KeyAlgorithm::EcdsaSecp256k1,
                        public_key.as_bytes(),
                        &signature.to_bytes(),
                    )
                }
                Self::Callback(callback) => {
                    let contributions = callback(invoice.body_bytes().to_vec()).await?;
                    for contribution in contributions {
                        invoice.add_signature(
                            contribution.algorithm,
                            &contribution.public_key,
                            &contribution.signature,
                        )?;
                    }
                    Ok(())
                }
                Self::List(members) => {
                    for member in members {
                        member.sign(invoice).await?;
                    }
                    Ok(())
                }
            }
        })
    }
}

/// Folds the client's context signatory and any per-call extras into one
/// ordered set, skipping absent entries.
pub fn gather_signatories<'a>(
    context: Option<&'a Signatory>,
    extras: impl IntoIterator<Item = &'a Signatory>,
) -> Vec<&'a Signatory> {
    let mut signatories = Vec::new();
    if let Some(signatory) = context {
        signatories.push(signatory);
    }
    signatories.extend(extras);
    signatories
}

/// Applies every gathered signatory to the invoice, in order.
pub async fn sign_with_all(signatories: &[&Signatory], invoice: &mut Invoice) -> Result<()> {
    for signatory in signatories {
        signatory.sign(invoice).await?;
    }
    Ok(())
}

/// Reads a hex-encoded 32-byte secret key from a file.
async fn load_secret_bytes(file_path: &str) -> Result<[u8; 32]> {
    let mut file = File::open(file_path).await.context(KeyFileReadSnafu {
        path: file_path.to_string(),
    })?;

    let mut hex_string = String::new();
    file.read_to_string(&mut hex_string)
        .await
        .context(KeyFileReadSnafu {
            path: file_path.to_string(),
        })?;

    let key_bytes = Vec::from_hex(hex_string.trim()).context(KeyParseSnafu)?;

    key_bytes
        .try_into()
        .map_err(|rejected: Vec<u8>| Error::InvalidKeyLength {
            length: rejected.len(),
        })
}

/// Loads a hex-encoded Ed25519 key from a file and wraps it as a
/// signatory.
pub async fn load_ed25519_signatory(file_path: &str) -> Result<Signatory> {
    let secret = load_secret_bytes(file_path).await?;
    Ok(Signatory::Ed25519(ed25519_dalek::SigningKey::from_bytes(
        &secret,
    )))
}

/// Loads a hex-encoded secp256k1 key from a file and wraps it as a
/// signatory.
pub async fn load_ecdsa_signatory(file_path: &str) -> Result<Signatory> {
    let secret = load_secret_bytes(file_path).await?;
    let key = k256::ecdsa::SigningKey::from_bytes(&secret.into())
        .map_err(|_| Error::SigningKeyRejected)?;
    Ok(Signatory::EcdsaSecp256k1(key))
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::Verifier as _;
    use k256::ecdsa::signature::DigestVerifier as _;
    use ledger_core::{AccountAddress, Timestamp, TransactionIdentity};
    use rand::rngs::OsRng;

    use super::*;

    fn invoice() -> Invoice {
        Invoice::new(
            b"create topic body".to_vec(),
            "Create Topic",
            TransactionIdentity {
                payer: AccountAddress::new(0, 0, 9),
                valid_start: Timestamp {
                    seconds: 5,
                    nanos: 0,
                },
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ed25519_signatory_produces_a_verifiable_signature() {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let verifying_key = key.verifying_key();
        let signatory = Signatory::Ed25519(key);

        let mut inv = invoice();
        signatory.sign(&mut inv).await.unwrap();
        let envelope = inv.freeze(0).unwrap();

        let pair = &envelope.signatures.pairs[0];
        assert_eq!(pair.algorithm, KeyAlgorithm::Ed25519);
        assert_eq!(pair.key_prefix, verifying_key.as_bytes().to_vec());
        let signature =
            ed25519_dalek::Signature::from_bytes(pair.signature.as_slice().try_into().unwrap());
        verifying_key
            .verify(&envelope.body_bytes, &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn ecdsa_signatory_produces_a_verifiable_signature() {
        let key = k256::ecdsa::SigningKey::random(&mut OsRng);
        let verifying_key = *key.verifying_key();
        let signatory = Signatory::EcdsaSecp256k1(key);

        let mut inv = invoice();
        signatory.sign(&mut inv).await.unwrap();
        let envelope = inv.freeze(0).unwrap();

        let pair = &envelope.signatures.pairs[0];
        assert_eq!(pair.algorithm, KeyAlgorithm::EcdsaSecp256k1);
        assert_eq!(pair.key_prefix.len(), 33);
        let signature = k256::ecdsa::Signature::from_slice(&pair.signature).unwrap();
        verifying_key
            .verify_digest(Sha256::new_with_prefix(&envelope.body_bytes), &signature)
            .unwrap();
    }

    #[tokio::test]
    async fn composite_signatory_registers_every_member() {
        let first = Signatory::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng));
        let second = Signatory::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng));
        let composite = Signatory::List(vec![first, second]);

        let mut inv = invoice();
        composite.sign(&mut inv).await.unwrap();
        assert_eq!(inv.signature_count(), 2);
    }

    #[tokio::test]
    async fn callback_signatory_contributions_are_registered() {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let verifying_key = key.verifying_key();
        let signatory = Signatory::callback(move |body: Vec<u8>| {
            let key = key.clone();
            async move {
                let signature = key.sign(&body);
                Ok(vec![SignatureContribution {
                    algorithm: KeyAlgorithm::Ed25519,
                    public_key: key.verifying_key().as_bytes().to_vec(),
                    signature: signature.to_bytes().to_vec(),
                }])
            }
        });

        let mut inv = invoice();
        signatory.sign(&mut inv).await.unwrap();
        let envelope = inv.freeze(0).unwrap();

        let pair = &envelope.signatures.pairs[0];
        assert_eq!(pair.key_prefix, verifying_key.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn callback_failures_surface_as_signatory_errors() {
        let signatory = Signatory::callback(|_body: Vec<u8>| async {
            Err(Error::SignatoryFailure {
                detail: "hsm offline".to_string(),
            })
        });

        let mut inv = invoice();
        let err = signatory.sign(&mut inv).await.unwrap_err();
        assert!(matches!(err, Error::SignatoryFailure { .. }));
        assert_eq!(inv.signature_count(), 0);
    }

    #[tokio::test]
    async fn gathering_keeps_context_signatory_first() {
        let context = Signatory::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng));
        let extra = Signatory::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng));
        let gathered = gather_signatories(Some(&context), [&extra]);
        assert_eq!(gathered.len(), 2);
        let gathered = gather_signatories(None, [&extra]);
        assert_eq!(gathered.len(), 1);
    }

    #[tokio::test]
    async fn key_files_round_trip_through_hex() {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let path = std::env::temp_dir().join(format!("ed25519-key-{}.hex", std::process::id()));
        tokio::fs::write(&path, hex::encode(key.to_bytes()))
            .await
            .unwrap();

        let loaded = load_ed25519_signatory(path.to_str().unwrap())
            .await
            .unwrap();
        match loaded {
            Signatory::Ed25519(loaded_key) => {
                assert_eq!(loaded_key.to_bytes(), key.to_bytes());
            }
            other => panic!("expected an Ed25519 signatory, got {other:?}"),
        }
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn short_key_files_are_rejected() {
        let path = std::env::temp_dir().join(format!("short-key-{}.hex", std::process::id()));
        tokio::fs::write(&path, hex::encode([1u8; 16]))
            .await
            .unwrap();

        let err = load_ed25519_signatory(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKeyLength { length: 16 }));
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn unreadable_key_files_surface_the_path() {
        let err = load_ed25519_signatory("/definitely/not/a/key/file")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::KeyFileRead { .. }));
    }
}
