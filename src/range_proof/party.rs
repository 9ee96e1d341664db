//! The `party` module contains the API for the party state while the party is
//! engaging in the threshold range proof protocol.
//!
//! Each state of the MPC protocol is represented by a different Rust
//! type.  The state transitions consume the previous state, making it
//! a compile error to perform the steps out of order or to repeat a
//! step.
//!
//! For more explanation of how the `dealer`, `party`, and `messages`
//! modules orchestrate the protocol execution, see the documentation
//! in the [`range_proof_mpc`](crate::range_proof_mpc) module.

#![allow(non_snake_case)]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::{iter, marker::PhantomData};
use group::ff::Field;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use subtle::{Choice, ConditionallySelectable};
use zeroize::Zeroize;

use crate::errors::{MPCError, ProofError};
use crate::inner_product_proof::{InnerProductParams, InnerProductProof};
use crate::setup::SetupParams;
use crate::transcript::TranscriptProtocol;
use crate::types::*;
use crate::util;
use crate::CtOptionOps;

#[cfg(feature = "std")]
use rand::thread_rng;

use super::messages::*;
use super::BulletProof;

/// Used to construct a party for the threshold range proof protocol.
pub struct Party<C: BulletproofCurveArithmetic> {
    _marker: PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> Party<C> {
    /// Round one: samples this party's polynomial blinding shares and
    /// returns the [`TauCommitment`] to broadcast.
    #[cfg(feature = "std")]
    pub fn initiate(
        params: &SetupParams<C>,
    ) -> (PartyAwaitingSessionInputs<'_, C>, TauCommitment<C>) {
        Self::initiate_with_rng(params, &mut thread_rng())
    }

    /// Round one: samples this party's polynomial blinding shares and
    /// returns the [`TauCommitment`] to broadcast.
    #[tracing::instrument(skip_all, name = "Party::initiate")]
    pub fn initiate_with_rng(
        params: &SetupParams<C>,
        mut rng: impl RngCore + CryptoRng,
    ) -> (PartyAwaitingSessionInputs<'_, C>, TauCommitment<C>) {
        let tau_1 = C::Scalar::random(&mut rng);
        let tau_2 = C::Scalar::random(&mut rng);

        let B_blinding = params.pc_gens().B_blinding;
        let tau_commitment = TauCommitment {
            T_1_j: B_blinding * tau_1,
            T_2_j: B_blinding * tau_2,
        };

        tracing::debug!(n = params.n(), "committed to polynomial blinding shares");

        (
            PartyAwaitingSessionInputs {
                params,
                tau_1,
                tau_2,
                tau_commitment,
            },
            tau_commitment,
        )
    }
}

/// A party that has broadcast its [`TauCommitment`] and waits for the
/// session inputs of round two.
pub struct PartyAwaitingSessionInputs<'a, C: BulletproofCurveArithmetic> {
    pub(super) params: &'a SetupParams<C>,
    pub(super) tau_1: C::Scalar,
    pub(super) tau_2: C::Scalar,
    pub(super) tau_commitment: TauCommitment<C>,
}

impl<'a, C: BulletproofCurveArithmetic> PartyAwaitingSessionInputs<'a, C> {
    /// Round two: builds the public [`PartialProof`] shared by all
    /// honest parties and this party's [`ProofShare`].
    ///
    /// `v` is the common secret value and `v_blinding` this party's
    /// additive share of its blinding factor. `transcript` must be in the
    /// same state for every party and the verifier.
    ///
    /// The inputs are checked against `expected` before any secret is
    /// used. `expected` must be the fingerprint all parties agreed on,
    /// for example over a broadcast channel, not just the one the dealer
    /// sent alongside `inputs`. The inputs must also contain this
    /// party's own [`TauCommitment`].
    #[tracing::instrument(skip_all, name = "PartyAwaitingSessionInputs::partial_prove")]
    pub fn partial_prove(
        self,
        transcript: &mut Transcript,
        v: u64,
        v_blinding: &C::Scalar,
        inputs: &SessionInputs<C>,
        expected: &SessionFingerprint,
    ) -> Result<(PartyAwaitingAggregation<C>, ProofShare<C>), MPCError> {
        let n = self.params.n();
        let shared = &inputs.shared;
        if inputs.tau_commitments.is_empty() || shared.len() != Some(n) {
            return Err(MPCError::ParameterMismatch);
        }
        if inputs.fingerprint(self.params) != *expected {
            tracing::warn!(
                num_parties = inputs.num_parties(),
                "session inputs do not match the published fingerprint"
            );
            return Err(MPCError::InconsistentSessionInputs);
        }
        let own = &self.tau_commitment;
        if !inputs
            .tau_commitments
            .iter()
            .any(|tc| tc.T_1_j == own.T_1_j && tc.T_2_j == own.T_2_j)
        {
            tracing::warn!(
                num_parties = inputs.num_parties(),
                "session inputs leave out this party's tau commitment"
            );
            return Err(MPCError::ParameterMismatch);
        }

        let a_L = util::bit_decompose::<C>(v, n).map_err(|_| MPCError::ValueOutOfRange)?;
        let a_R = util::complement::<C>(&a_L);

        let pc_gens = self.params.pc_gens();
        let G: Vec<C::Point> = self.params.bp_gens().G(n).copied().collect();
        let H: Vec<C::Point> = self.params.bp_gens().H(n).copied().collect();

        // Compute A = <a_L, G> + <a_R, H> + alpha * B_blinding
        let mut A = pc_gens.B_blinding * shared.alpha;
        for (i, (G_i, H_i)) in G.iter().zip(H.iter()).enumerate() {
            // If v_i = 0, we add a_L[i] * G[i] + a_R[i] * H[i] = - H[i]
            // If v_i = 1, we add a_L[i] * G[i] + a_R[i] * H[i] =   G[i]
            let v_i = Choice::from(((v >> i) & 1) as u8);
            let mut point = -*H_i;
            point.conditional_assign(G_i, v_i);
            A += point;
        }

        // Compute S = <s_L, G> + <s_R, H> + rho * B_blinding
        let S_points: Vec<C::Point> = iter::once(pc_gens.B_blinding)
            .chain(G.iter().copied())
            .chain(H.iter().copied())
            .collect();
        let S_scalars: Vec<C::Scalar> = iter::once(shared.rho)
            .chain(shared.s_L.iter().copied())
            .chain(shared.s_R.iter().copied())
            .collect();
        let S = C::pippenger_sum_of_products(&S_points, &S_scalars);

        transcript.threshold_rangeproof_domain_sep(n as u64);
        transcript.append_point::<C>(b"A", &A);
        transcript.append_point::<C>(b"S", &S);

        let y = transcript.challenge_scalar::<C>(b"y");
        let z = transcript.challenge_scalar::<C>(b"z");
        let y_inv = y.invert().ok_or(MPCError::ZeroChallenge)?;

        let z_sq = z * z;
        let y_n = util::powers::<C>(y, n);
        let two_n = util::powers::<C>(C::Scalar::from(2u64), n);
        let z_n = vec![z; n];

        // l(x) = (a_L - z 1) + s_L x
        let l_poly = util::VecPoly1::<C>(util::sub_vec::<C>(&a_L, &z_n), shared.s_L.clone());
        // r(x) = y^n o (a_R + z 1 + s_R x) + z^2 2^n
        let r_poly = util::VecPoly1::<C>(
            util::add_vec::<C>(
                &util::hadamard::<C>(&y_n, &util::add_vec::<C>(&a_R, &z_n)),
                &util::scalar_mul_vec::<C>(&two_n, &z_sq),
            ),
            util::hadamard::<C>(&y_n, &shared.s_R),
        );
        let t_poly = l_poly.inner_product(&r_poly);

        // T_1 and T_2 fold every party's blinding commitment in.
        let T_1 = inputs
            .tau_commitments
            .iter()
            .fold(pc_gens.B * t_poly.1, |acc, tc| acc + tc.T_1_j);
        let T_2 = inputs
            .tau_commitments
            .iter()
            .fold(pc_gens.B * t_poly.2, |acc, tc| acc + tc.T_2_j);

        transcript.append_point::<C>(b"T_1", &T_1);
        transcript.append_point::<C>(b"T_2", &T_2);

        let x = transcript.challenge_scalar::<C>(b"x");
        if x.is_zero().into() {
            return Err(MPCError::ZeroChallenge);
        }

        let t_x_blinding = self.tau_2 * x * x + self.tau_1 * x + z_sq * v_blinding;

        let t_x = t_poly.eval(x);
        let e_blinding = shared.alpha + shared.rho * x;
        let l_vec = l_poly.eval(x);
        let r_vec = r_poly.eval(x);

        transcript.append_scalar::<C>(b"t_x", &t_x);
        transcript.append_scalar::<C>(b"e_blinding", &e_blinding);

        let w = transcript.challenge_scalar::<C>(b"w");
        let Q = pc_gens.B * w;

        let H_prime = util::scale_points::<C>(&H, util::exp_iter::<C>(y_inv));
        let ipp_params = InnerProductParams::<C>::setup(Q, G, H_prime, t_x, n)
            .map_err(|_| MPCError::ParameterMismatch)?;
        let commit = ipp_params
            .commit(&l_vec, &r_vec)
            .map_err(|_| MPCError::ParameterMismatch)?;
        let ipp_proof = InnerProductProof::create(transcript, &ipp_params, l_vec, r_vec)
            .map_err(|e| match e {
                ProofError::ParameterMismatch => MPCError::ParameterMismatch,
                _ => MPCError::ZeroChallenge,
            })?;

        tracing::debug!(
            n,
            num_parties = inputs.num_parties(),
            "computed partial proof"
        );

        let partial_proof = PartialProof {
            A,
            S,
            T_1,
            T_2,
            e_blinding,
            t_x,
            ipp_proof,
            commit,
        };
        let share = ProofShare { t_x_blinding };

        Ok((
            PartyAwaitingAggregation {
                partial_proof,
                share,
            },
            share,
        ))
    }
}

/// Overwrite secrets with null bytes when they go out of scope.
impl<'a, C: BulletproofCurveArithmetic> Drop for PartyAwaitingSessionInputs<'a, C> {
    fn drop(&mut self) {
        self.tau_1.zeroize();
        self.tau_2.zeroize();
    }
}

/// A party that has produced its round-two output and waits for the
/// other parties' [`ProofShare`]s.
pub struct PartyAwaitingAggregation<C: BulletproofCurveArithmetic> {
    partial_proof: PartialProof<C>,
    share: ProofShare<C>,
}

impl<C: BulletproofCurveArithmetic> PartyAwaitingAggregation<C> {
    /// The public part of this party's round-two output.
    pub fn partial_proof(&self) -> &PartialProof<C> {
        &self.partial_proof
    }

    /// This party's own share.
    pub fn share(&self) -> &ProofShare<C> {
        &self.share
    }

    /// Round three: sums every party's share into the final proof for
    /// the commitment `V`.
    ///
    /// Shares are not checked here; a wrong share only shows up when
    /// the proof fails to verify.
    #[tracing::instrument(skip_all, name = "PartyAwaitingAggregation::aggregate")]
    pub fn aggregate(
        self,
        V: C::Point,
        shares: &[ProofShare<C>],
    ) -> Result<BulletProof<C>, MPCError> {
        if shares.is_empty() {
            return Err(MPCError::WrongNumProofShares);
        }
        tracing::debug!(num_shares = shares.len(), "aggregating proof shares");
        Ok(BulletProof::assemble(V, self.partial_proof, shares))
    }
}
