#![cfg_attr(not(feature = "std"), no_std)]
//! Threshold Bulletproof range proofs.
//!
//! Several parties, each holding an additive share of the blinding
//! factor of a Pedersen commitment \\(V = v \cdot G + (\sum_j \gamma_j) \cdot H\\),
//! jointly prove that \\(v \in [0, 2^n)\\) without revealing their
//! shares to one another. The protocol runs in three rounds (see
//! [`range_proof_mpc`]) and produces a single [`BulletProof`].

extern crate alloc;
extern crate core;

mod util;

mod errors;
mod generators;
mod inner_product_proof;
mod range_proof;
mod serdes;
mod setup;
mod transcript;
mod types;

use subtle::Choice;

pub use crate::errors::ProofError;
pub use crate::generators::{BulletproofGens, PedersenGens};
pub use crate::inner_product_proof::{InnerProductParams, InnerProductProof};
pub use crate::range_proof::BulletProof;
pub use crate::setup::{SetupParams, MAX_RANGE_END};
pub use transcript::TranscriptProtocol;
#[cfg(feature = "curve25519")]
pub use types::curve25519_impls::Curve25519;
pub use types::{
    BulletproofCurveArithmetic, FromWideBytes, HashToPoint, PippengerScalar, ScalarBatchInvert,
};
pub use group;
pub use merlin;

#[cfg(feature = "curve25519")]
pub use vsss_rs;
#[cfg(feature = "k256")]
pub use k256;
#[cfg(feature = "p256")]
pub use p256;
#[cfg(feature = "bls12_381")]
pub use bls12_381_plus;

trait CtOptionOps<T> {
    fn ok_or<E>(self, err: E) -> Result<T, E>;
}

impl<T> CtOptionOps<T> for subtle::CtOption<T> {
    fn ok_or<E>(self, err: E) -> Result<T, E> {
        if self.is_some().unwrap_u8() == 1u8 {
            Ok(self.unwrap())
        } else {
            Err(err)
        }
    }
}

impl CtOptionOps<()> for Choice {
    fn ok_or<E>(self, err: E) -> Result<(), E> {
        if self.unwrap_u8() == 1u8 {
            Ok(())
        } else {
            Err(err)
        }
    }
}

/// The threshold proving protocol, for parties that each hold a share
/// of the blinding factor and communicate through a dealer.
///
/// 1. Every party calls [`Party::initiate`](party::Party::initiate) and
///    sends the resulting [`TauCommitment`](messages::TauCommitment) to
///    the dealer.
/// 2. The dealer calls
///    [`receive_tau_commitments`](dealer::DealerAwaitingTauCommitments::receive_tau_commitments)
///    and hands the [`SessionInputs`](messages::SessionInputs) to every
///    party over a confidential channel. Their
///    [`SessionFingerprint`](messages::SessionFingerprint) is broadcast so
///    that all parties agree on it. The dealer can recover the secret
///    value from the session inputs, so it must be a party or be trusted
///    with the value.
/// 3. Every party calls
///    [`partial_prove`](party::PartyAwaitingSessionInputs::partial_prove)
///    with the common value, its own blinding share and a transcript in
///    the same state as everyone else's, and returns its
///    [`PartialProof`](messages::PartialProof) and
///    [`ProofShare`](messages::ProofShare).
/// 4. The dealer calls
///    [`receive_shares`](dealer::DealerAwaitingProofShares::receive_shares),
///    or any party calls
///    [`aggregate`](party::PartyAwaitingAggregation::aggregate) with
///    all shares, to obtain the [`BulletProof`].
pub mod range_proof_mpc {
    pub use crate::errors::MPCError;
    pub use crate::range_proof::dealer;
    pub use crate::range_proof::messages;
    pub use crate::range_proof::party;
}
