//! Errors related to proving and verifying threshold range proofs.

extern crate alloc;

use alloc::vec::Vec;

/// Represents an error in proof creation, verification, or parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ProofError {
    /// This error occurs when a proof failed to verify.
    #[cfg_attr(feature = "std", error("Proof verification failed."))]
    VerificationError,
    /// This error occurs when the proof encoding is malformed.
    #[cfg_attr(feature = "std", error("Proof data could not be parsed."))]
    FormatError,
    /// This error occurs when attempting to create a proof with a
    /// bitsize that is not a power of two between \\(1\\) and \\(64\\).
    #[cfg_attr(
        feature = "std",
        error("Invalid bitsize, n must be a power of two no larger than 64.")
    )]
    InvalidBitsize,
    /// This error occurs when the upper end of the range is not a power of two.
    #[cfg_attr(feature = "std", error("Invalid range end, must be a power of two."))]
    InvalidRangeEnd,
    /// This error occurs when a proof is requested for zero parties.
    #[cfg_attr(feature = "std", error("Invalid aggregation size, need at least one party."))]
    InvalidAggregation,
    /// This error occurs when there are insufficient generators for the proof.
    #[cfg_attr(
        feature = "std",
        error("Invalid generators size, too few generators for proof")
    )]
    InvalidGeneratorsLength,
    /// This error occurs when vectors handed to the inner-product
    /// argument do not agree in length with the generators.
    #[cfg_attr(feature = "std", error("Vector lengths do not match the parameters."))]
    ParameterMismatch,
    /// This error occurs when the value does not fit in the bitsize.
    #[cfg_attr(feature = "std", error("Value is outside of the provable range."))]
    ValueOutOfRange,
    /// This error results from an internal error during proving.
    ///
    /// The single-party prover is implemented by performing
    /// multiparty computation with ourselves.  However, because the
    /// MPC protocol is not exposed by the single-party API, we
    /// consider its errors to be internal errors.
    #[cfg_attr(feature = "std", error("Internal error during proof creation: {0}"))]
    ProvingError(MPCError),
}

impl From<MPCError> for ProofError {
    fn from(e: MPCError) -> ProofError {
        match e {
            MPCError::InvalidAggregation => ProofError::InvalidAggregation,
            MPCError::ParameterMismatch => ProofError::ParameterMismatch,
            MPCError::ValueOutOfRange => ProofError::ValueOutOfRange,
            _ => ProofError::ProvingError(e),
        }
    }
}

/// Represents an error during the threshold proving protocol.
///
/// This is a separate type from the `ProofError` to allow a layered
/// API: although the MPC protocol is used internally for single-party
/// proving, its API should not expose the complexity of the MPC
/// protocol.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum MPCError {
    /// This error occurs when the dealer is created for zero parties.
    #[cfg_attr(feature = "std", error("Invalid aggregation size, need at least one party"))]
    InvalidAggregation,
    /// This error occurs when the shared blinding vectors or the
    /// broadcast set do not fit the setup parameters.
    #[cfg_attr(feature = "std", error("Session inputs do not match the setup parameters"))]
    ParameterMismatch,
    /// This error occurs when the secret value does not fit in the bitsize.
    #[cfg_attr(feature = "std", error("Value is outside of the provable range"))]
    ValueOutOfRange,
    /// This error occurs when a Fiat-Shamir challenge is zero,
    /// which would annihilate the blinding factors.
    #[cfg_attr(feature = "std", error("Derived a zero challenge"))]
    ZeroChallenge,
    /// This error occurs when the dealer is given the wrong number of
    /// tau commitments.
    #[cfg_attr(feature = "std", error("Wrong number of tau commitments"))]
    WrongNumTauCommitments,
    /// This error occurs when the dealer is given the wrong number of
    /// partial proofs.
    #[cfg_attr(feature = "std", error("Wrong number of partial proofs"))]
    WrongNumPartialProofs,
    /// This error occurs when the wrong number of proof shares is
    /// supplied for aggregation.
    #[cfg_attr(feature = "std", error("Wrong number of proof shares"))]
    WrongNumProofShares,
    /// This error occurs when a party receives session inputs whose
    /// fingerprint differs from the one published by the dealer.
    #[cfg_attr(feature = "std", error("Session inputs do not match the published fingerprint"))]
    InconsistentSessionInputs,
    /// This error occurs when parties disagree on the public part of
    /// their round-two output.
    #[cfg_attr(
        feature = "std",
        error("Partial proofs from parties {bad_parties:?} disagree with the majority")
    )]
    InconsistentPartialProofs {
        /// The indexes of the parties whose partial proofs were outvoted.
        bad_parties: Vec<usize>,
    },
    /// This error occurs when the assembled proof does not verify.
    #[cfg_attr(feature = "std", error("Aggregated proof failed to verify"))]
    AggregateVerificationFailed,
}
