use ledger_core::{ResponseCode, TransactionIdentity};
use snafu::Snafu;

/// Represents errors that can occur while collecting signatures, loading
/// signing keys, and submitting transactions to the network.
///
/// Validation failures (`EmptyTransactionBody`, `NoSignatures`,
/// `DuplicateSignatureConflict`) are surfaced synchronously before any
/// network I/O and never wrap an underlying source; transport failures
/// always carry the target node so the caller can retry or log them
/// meaningfully.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A signature collector was created over an empty request body.
    #[snafu(display("A transaction or query requires a non-empty body"))]
    EmptyTransactionBody,

    /// An envelope was frozen with no signatures collected.
    ///
    /// A transaction or query requires at least one signature, sometimes
    /// more; this usually means no signatory was assigned to the client or
    /// the call.
    #[snafu(display("A transaction requires at least one signature, none were found"))]
    NoSignatures,

    /// A signature was re-registered under an existing public key but with
    /// different bytes. The collector is left unchanged.
    #[snafu(display(
        "Signature with duplicate key identifier '{}' was provided, \
         but did not have an identical signature",
        public_key_hex
    ))]
    DuplicateSignatureConflict {
        /// Hex rendering of the conflicting public key.
        public_key_hex: String,
    },

    /// Error when reading a signing key from a file.
    ///
    /// This occurs when the specified file cannot be read due to an I/O
    /// issue.
    #[snafu(display("Failed to read signing key from file '{}': {}", path, source))]
    KeyFileRead {
        /// The path of the key file that could not be read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Error when parsing a signing key from a hexadecimal string.
    #[snafu(display("Failed to parse signing key as hex: {}", source))]
    KeyParse {
        /// The underlying hex parsing error.
        source: hex::FromHexError,
    },

    /// Error when the parsed key length is invalid.
    ///
    /// Ed25519 and secp256k1 secret keys must be exactly 32 bytes long.
    #[snafu(display("Invalid key length: expected 32 bytes, got {}", length))]
    InvalidKeyLength {
        /// The actual length of the provided key.
        length: usize,
    },

    /// Error when the key bytes do not form a usable signing key.
    #[snafu(display("Failed to create signing key from secret bytes"))]
    SigningKeyRejected,

    /// A callback signatory reported a failure while signing an invoice.
    #[snafu(display("External signatory failed: {}", detail))]
    SignatoryFailure {
        /// Description reported by the callback.
        detail: String,
    },

    /// A transport-level failure that the retry policy did not absorb.
    #[snafu(display("Unable to communicate with network node {}: {}", node, detail))]
    Transport {
        /// Identity of the node the request was bound for.
        node: String,
        /// The underlying transport status.
        detail: String,
    },

    /// The node rejected the submission at precheck with a terminal code.
    #[snafu(display("Transaction {} failed precheck with status {}", identity, code))]
    PrecheckFailed {
        /// Identity of the rejected transaction.
        identity: TransactionIdentity,
        /// The precheck code the node answered with.
        code: ResponseCode,
    },

    /// The caller-supplied deadline elapsed at a suspension point.
    #[snafu(display("Deadline elapsed while awaiting network node {}", node))]
    DeadlineExceeded {
        /// Identity of the node the pipeline was waiting on.
        node: String,
    },
}

impl Error {
    /// True for failures detected before any network I/O was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyTransactionBody
                | Self::NoSignatures
                | Self::DuplicateSignatureConflict { .. }
        )
    }
}

/// Type alias for results that return a `Result<T, Error>`, simplifying
/// error handling.
pub type Result<T, E = Error> = std::result::Result<T, E>;
