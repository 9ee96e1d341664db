//! The `dealer` module contains the API for the dealer state while the dealer is
//! engaging in the threshold range proof protocol.
//!
//! The dealer relays the parties' [`TauCommitment`]s, samples the
//! [`SharedBlinding`] once per session, and assembles and checks the
//! final proof. Whoever holds the shared blinding can recover the
//! secret value, so the dealer must be one of the parties or be
//! trusted with the value. The [`SessionInputs`] it hands out must only
//! reach the parties over confidential channels.
//!
//! For more explanation of how the `dealer`, `party`, and `messages` modules orchestrate the protocol execution, see
//! the documentation in the [`range_proof_mpc`](crate::range_proof_mpc) module.

#![allow(non_snake_case)]

extern crate alloc;

use alloc::vec::Vec;
use core::marker::PhantomData;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

use crate::errors::MPCError;
use crate::setup::SetupParams;
use crate::types::*;

#[cfg(feature = "std")]
use rand::thread_rng;

use super::messages::*;
use super::BulletProof;

/// Used to construct a dealer for the threshold range proof protocol.
pub struct Dealer<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> Dealer<C> {
    /// Creates a new dealer coordinating `m` parties.
    ///
    /// `transcript` is the state every party starts round two from; the
    /// dealer keeps a copy to verify the assembled proof.
    pub fn new<'a>(
        params: &'a SetupParams<C>,
        transcript: &Transcript,
        m: usize,
    ) -> Result<DealerAwaitingTauCommitments<'a, C>, MPCError> {
        if m == 0 {
            return Err(MPCError::InvalidAggregation);
        }

        Ok(DealerAwaitingTauCommitments {
            params,
            initial_transcript: transcript.clone(),
            m,
        })
    }
}

/// A dealer waiting for the parties to send their [`TauCommitment`]s.
pub struct DealerAwaitingTauCommitments<'a, C: BulletproofCurveArithmetic> {
    params: &'a SetupParams<C>,
    /// The dealer keeps a copy of the initial transcript in order
    /// to verify the assembled proof.
    initial_transcript: Transcript,
    m: usize,
}

impl<'a, C: BulletproofCurveArithmetic> DealerAwaitingTauCommitments<'a, C> {
    /// Receives every party's [`TauCommitment`], samples the shared
    /// blinding and returns the [`SessionInputs`] to hand to every
    /// party together with their [`SessionFingerprint`].
    #[cfg(feature = "std")]
    pub fn receive_tau_commitments(
        self,
        tau_commitments: Vec<TauCommitment<C>>,
    ) -> Result<
        (
            DealerAwaitingProofShares<'a, C>,
            SessionInputs<C>,
            SessionFingerprint,
        ),
        MPCError,
    > {
        self.receive_tau_commitments_with_rng(tau_commitments, &mut thread_rng())
    }

    /// Receives every party's [`TauCommitment`], samples the shared
    /// blinding from `rng` and returns the [`SessionInputs`] to hand to
    /// every party together with their [`SessionFingerprint`].
    #[tracing::instrument(skip_all, name = "DealerAwaitingTauCommitments::receive_tau_commitments")]
    pub fn receive_tau_commitments_with_rng(
        self,
        tau_commitments: Vec<TauCommitment<C>>,
        rng: impl RngCore + CryptoRng,
    ) -> Result<
        (
            DealerAwaitingProofShares<'a, C>,
            SessionInputs<C>,
            SessionFingerprint,
        ),
        MPCError,
    > {
        if self.m != tau_commitments.len() {
            return Err(MPCError::WrongNumTauCommitments);
        }

        let shared = SharedBlinding::random(self.params.n(), rng);
        let inputs = SessionInputs::new(tau_commitments, shared);
        let fingerprint = inputs.fingerprint(self.params);

        tracing::debug!(
            n = self.params.n(),
            num_parties = self.m,
            "published session inputs"
        );

        Ok((
            DealerAwaitingProofShares {
                params: self.params,
                initial_transcript: self.initial_transcript,
                m: self.m,
                fingerprint,
            },
            inputs,
            fingerprint,
        ))
    }
}

/// A dealer which has published the session inputs and waits for the
/// parties' round-two output.
pub struct DealerAwaitingProofShares<'a, C: BulletproofCurveArithmetic> {
    params: &'a SetupParams<C>,
    initial_transcript: Transcript,
    m: usize,
    fingerprint: SessionFingerprint,
}

impl<'a, C: BulletproofCurveArithmetic> DealerAwaitingProofShares<'a, C> {
    /// The fingerprint of the published session inputs.
    pub fn fingerprint(&self) -> &SessionFingerprint {
        &self.fingerprint
    }

    /// Assembles the final proof for the commitment `V` from every
    /// party's [`PartialProof`] and [`ProofShare`], in party order.
    ///
    /// The partial proofs must agree byte for byte. Parties outside the
    /// largest agreeing group are reported by index. The assembled
    /// proof is then verified against the initial transcript.
    #[tracing::instrument(skip_all, name = "DealerAwaitingProofShares::receive_shares")]
    pub fn receive_shares(
        self,
        V: C::Point,
        partial_proofs: &[PartialProof<C>],
        shares: &[ProofShare<C>],
    ) -> Result<BulletProof<C>, MPCError> {
        if self.m != partial_proofs.len() {
            return Err(MPCError::WrongNumPartialProofs);
        }
        if self.m != shares.len() {
            return Err(MPCError::WrongNumProofShares);
        }

        let encodings: Vec<Vec<u8>> = partial_proofs.iter().map(|pp| pp.to_bytes()).collect();
        let agreeing = |i: usize| encodings.iter().filter(|e| **e == encodings[i]).count();
        // First index of the most common encoding.
        let mut majority = 0;
        let mut majority_count = 0;
        for i in 0..self.m {
            let count = agreeing(i);
            if count > majority_count {
                majority = i;
                majority_count = count;
            }
        }
        if majority_count != self.m {
            let bad_parties: Vec<usize> = (0..self.m)
                .filter(|&i| encodings[i] != encodings[majority])
                .collect();
            tracing::warn!(?bad_parties, "partial proofs disagree");
            return Err(MPCError::InconsistentPartialProofs { bad_parties });
        }

        let proof = BulletProof::assemble(V, partial_proofs[majority].clone(), shares);

        let mut transcript = self.initial_transcript.clone();
        if proof.verify(self.params, &mut transcript).is_err() {
            tracing::warn!(num_parties = self.m, "aggregated proof failed to verify");
            return Err(MPCError::AggregateVerificationFailed);
        }

        tracing::debug!(num_parties = self.m, "aggregated proof verified");
        Ok(proof)
    }

    /// Assembles the final proof for the commitment `V` from one
    /// [`PartialProof`] and every party's [`ProofShare`], without
    /// checking it.
    ///
    /// This should only be used when the dealer is trusted, or when the
    /// caller verifies the proof itself.
    pub fn receive_trusted_shares(
        self,
        V: C::Point,
        partial_proof: &PartialProof<C>,
        shares: &[ProofShare<C>],
    ) -> Result<BulletProof<C>, MPCError> {
        if self.m != shares.len() {
            return Err(MPCError::WrongNumProofShares);
        }

        Ok(BulletProof::assemble(V, partial_proof.clone(), shares))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::range_proof::party::{Party, PartyAwaitingAggregation};
    use group::ff::Field;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct Round2<C: BulletproofCurveArithmetic> {
        V: C::Point,
        partial_proofs: Vec<PartialProof<C>>,
        shares: Vec<ProofShare<C>>,
    }

    /// Runs rounds one and two with party `j` told `values[j]`; `V`
    /// commits to `values[0]`.
    fn round2<'a, C: BulletproofCurveArithmetic>(
        params: &'a SetupParams<C>,
        transcript: &Transcript,
        values: &[u64],
        rng: &mut ChaCha20Rng,
    ) -> (DealerAwaitingProofShares<'a, C>, Round2<C>) {
        let m = values.len();
        let dealer = Dealer::new(params, transcript, m).unwrap();
        let (parties, tau_commitments): (Vec<_>, Vec<_>) = (0..m)
            .map(|_| Party::initiate_with_rng(params, &mut *rng))
            .unzip();
        let (dealer, inputs, fingerprint) = dealer
            .receive_tau_commitments_with_rng(tau_commitments, &mut *rng)
            .unwrap();
        assert_eq!(dealer.fingerprint(), &fingerprint);

        let blindings: Vec<C::Scalar> = (0..m).map(|_| C::Scalar::random(&mut *rng)).collect();
        let mut partial_proofs = Vec::with_capacity(m);
        let mut shares = Vec::with_capacity(m);
        for ((party, v), gamma) in parties.into_iter().zip(values).zip(blindings.iter()) {
            let (state, share): (PartyAwaitingAggregation<C>, _) = party
                .partial_prove(&mut transcript.clone(), *v, gamma, &inputs, &fingerprint)
                .unwrap();
            partial_proofs.push(state.partial_proof().clone());
            shares.push(share);
        }

        let gamma: C::Scalar = blindings.iter().sum();
        let V = params.commit(values[0], gamma);
        (
            dealer,
            Round2 {
                V,
                partial_proofs,
                shares,
            },
        )
    }

    fn check_honest_parties<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(16).unwrap();
        let transcript = Transcript::new(b"dealer test");
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        let (dealer, r) = round2(&params, &transcript, &[1000, 1000, 1000, 1000], &mut rng);
        let proof = dealer
            .receive_shares(r.V, &r.partial_proofs, &r.shares)
            .unwrap();
        assert!(proof.verify(&params, &mut transcript.clone()).is_ok());
    }

    fn check_divergent_party_singled_out<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(16).unwrap();
        let transcript = Transcript::new(b"dealer test");
        let mut rng = ChaCha20Rng::seed_from_u64(2);

        let (dealer, r) = round2(&params, &transcript, &[1000, 1000, 999, 1000], &mut rng);
        assert_eq!(
            dealer
                .receive_shares(r.V, &r.partial_proofs, &r.shares)
                .unwrap_err(),
            MPCError::InconsistentPartialProofs {
                bad_parties: alloc::vec![2]
            }
        );
    }

    fn check_bad_share_detected<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(8).unwrap();
        let transcript = Transcript::new(b"dealer test");
        let mut rng = ChaCha20Rng::seed_from_u64(3);

        let (dealer, mut r) = round2(&params, &transcript, &[42, 42, 42], &mut rng);
        r.shares[0].t_x_blinding += C::Scalar::ONE;
        assert_eq!(
            dealer
                .receive_shares(r.V, &r.partial_proofs, &r.shares)
                .unwrap_err(),
            MPCError::AggregateVerificationFailed
        );
    }

    fn check_counts<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(8).unwrap();
        let transcript = Transcript::new(b"dealer test");
        let mut rng = ChaCha20Rng::seed_from_u64(4);

        assert!(matches!(
            Dealer::new(&params, &transcript, 0),
            Err(MPCError::InvalidAggregation)
        ));

        let dealer = Dealer::new(&params, &transcript, 2).unwrap();
        let (_party, tc) = Party::initiate_with_rng(&params, &mut rng);
        assert!(matches!(
            dealer.receive_tau_commitments_with_rng(alloc::vec![tc], &mut rng),
            Err(MPCError::WrongNumTauCommitments)
        ));

        let (dealer, r) = round2(&params, &transcript, &[5, 5], &mut rng);
        assert!(matches!(
            dealer.receive_shares(r.V, &r.partial_proofs[..1], &r.shares),
            Err(MPCError::WrongNumPartialProofs)
        ));

        let (dealer, r) = round2(&params, &transcript, &[5, 5], &mut rng);
        assert!(matches!(
            dealer.receive_shares(r.V, &r.partial_proofs, &r.shares[..1]),
            Err(MPCError::WrongNumProofShares)
        ));

        let (dealer, r) = round2(&params, &transcript, &[5, 5], &mut rng);
        assert!(matches!(
            dealer.receive_trusted_shares(r.V, &r.partial_proofs[0], &r.shares[..1]),
            Err(MPCError::WrongNumProofShares)
        ));

        let (dealer, r) = round2(&params, &transcript, &[5, 5], &mut rng);
        let proof = dealer
            .receive_trusted_shares(r.V, &r.partial_proofs[1], &r.shares)
            .unwrap();
        assert!(proof.verify(&params, &mut transcript.clone()).is_ok());
    }

    #[cfg(feature = "p256")]
    #[test]
    fn dealer_p256() {
        check_honest_parties::<p256::NistP256>();
        check_divergent_party_singled_out::<p256::NistP256>();
        check_bad_share_detected::<p256::NistP256>();
        check_counts::<p256::NistP256>();
    }

    #[cfg(feature = "k256")]
    #[test]
    fn dealer_k256() {
        check_honest_parties::<k256::Secp256k1>();
        check_divergent_party_singled_out::<k256::Secp256k1>();
        check_bad_share_detected::<k256::Secp256k1>();
        check_counts::<k256::Secp256k1>();
    }

    #[cfg(feature = "bls12_381")]
    #[test]
    fn dealer_bls12_381() {
        check_honest_parties::<bls12_381_plus::Bls12381G1>();
        check_divergent_party_singled_out::<bls12_381_plus::Bls12381G1>();
        check_bad_share_detected::<bls12_381_plus::Bls12381G1>();
        check_counts::<bls12_381_plus::Bls12381G1>();
    }

    #[cfg(feature = "curve25519")]
    #[test]
    fn dealer_curve25519() {
        check_honest_parties::<crate::Curve25519>();
        check_divergent_party_singled_out::<crate::Curve25519>();
        check_bad_share_detected::<crate::Curve25519>();
        check_counts::<crate::Curve25519>();
    }
}
