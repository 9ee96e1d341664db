#![allow(non_snake_case)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate rand;

use super::CtOptionOps;

#[cfg(feature = "std")]
use self::rand::thread_rng;
use alloc::vec;
use alloc::vec::Vec;

use core::iter;

use group::ff::Field;
use group::Group;
use merlin::Transcript;
use subtle::ConstantTimeEq;

use crate::errors::ProofError;
use crate::inner_product_proof::InnerProductProof;
use crate::serdes::*;
use crate::setup::SetupParams;
use crate::transcript::TranscriptProtocol;
use crate::types::*;
use crate::util;

use rand_core::{CryptoRng, RngCore};
use serde::{self, Deserialize, Serialize};

// Modules for MPC protocol

pub mod dealer;
pub mod messages;
pub mod party;

use self::dealer::Dealer;
use self::messages::{PartialProof, ProofShare};
use self::party::Party;

/// The `BulletProof` struct represents a proof that the value committed
/// to in \\(V\\) lies in \\([0, 2^n)\\).
///
/// The proof is produced jointly by parties each holding an additive
/// share of the blinding factor of \\(V\\); see the
/// [`range_proof_mpc`](crate::range_proof_mpc) module. The single-prover
/// case runs the same protocol locally with one party.
///
/// The bitsize is recorded implicitly by the number of rounds of the
/// inner-product argument, and the verifier must be handed the same
/// [`SetupParams`] the parties used.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BulletProof<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment to the value
    V: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment to the bits of the value
    A: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment to the blinding factors
    S: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment to the \\(t_1\\) coefficient of \\( t(x) \\)
    T_1: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment to the \\(t_2\\) coefficient of \\( t(x) \\)
    T_2: C::Point,
    #[serde(with = "CurveScalar::<C>")]
    /// Evaluation of the polynomial \\(t(x)\\) at the challenge point \\(x\\)
    t_x: C::Scalar,
    #[serde(with = "CurveScalar::<C>")]
    /// Blinding factor for the synthetic commitment to \\(t(x)\\),
    /// summed over all parties
    t_x_blinding: C::Scalar,
    #[serde(with = "CurveScalar::<C>")]
    /// Blinding factor for the synthetic commitment to the inner-product arguments
    e_blinding: C::Scalar,
    /// Proof data for the inner-product argument.
    ipp_proof: InnerProductProof<C>,
    #[serde(with = "CurvePoint::<C>")]
    /// Commitment \\( \langle \mathbf{l}, \mathbf{G} \rangle + \langle \mathbf{r}, \mathbf{H}' \rangle \\)
    commit: C::Point,
}

impl<C: BulletproofCurveArithmetic> BulletProof<C> {
    /// Create a range proof for a given pair of value `v` and
    /// blinding scalar `v_blinding` by running the protocol locally
    /// with a single party.
    ///
    /// # Example
    /// ```
    /// use rand::thread_rng;
    /// use group::ff::Field;
    /// use merlin::Transcript;
    /// use threshold_bulletproofs::{BulletProof, SetupParams};
    ///
    /// # fn main() {
    /// type Scalar = p256::Scalar;
    ///
    /// let params = SetupParams::<p256::NistP256>::new(32).unwrap();
    ///
    /// // A secret value we want to prove lies in the range [0, 2^32)
    /// let secret_value = 1037578891u64;
    /// let blinding = Scalar::random(&mut thread_rng());
    ///
    /// // The proof can be chained to an existing transcript.
    /// let mut prover_transcript = Transcript::new(b"doctest example");
    /// let proof = BulletProof::prove_single(
    ///     &params,
    ///     &mut prover_transcript,
    ///     secret_value,
    ///     blinding,
    /// ).expect("A real program could handle errors");
    ///
    /// let mut verifier_transcript = Transcript::new(b"doctest example");
    /// assert!(proof.verify(&params, &mut verifier_transcript).is_ok());
    /// # }
    /// ```
    #[cfg(feature = "std")]
    pub fn prove_single(
        params: &SetupParams<C>,
        transcript: &mut Transcript,
        v: u64,
        v_blinding: C::Scalar,
    ) -> Result<BulletProof<C>, ProofError> {
        Self::prove_single_with_rng(params, transcript, v, v_blinding, &mut thread_rng())
    }

    /// Create a range proof for a given pair of value `v` and
    /// blinding scalar `v_blinding`, drawing randomness from `rng`.
    pub fn prove_single_with_rng<T: RngCore + CryptoRng>(
        params: &SetupParams<C>,
        transcript: &mut Transcript,
        v: u64,
        v_blinding: C::Scalar,
        rng: &mut T,
    ) -> Result<BulletProof<C>, ProofError> {
        let dealer = Dealer::new(params, transcript, 1)?;

        let (party, tau_commitment) = Party::initiate_with_rng(params, &mut *rng);
        let (dealer, inputs, fingerprint) =
            dealer.receive_tau_commitments_with_rng(vec![tau_commitment], &mut *rng)?;

        let (party, share) =
            party.partial_prove(transcript, v, &v_blinding, &inputs, &fingerprint)?;

        let V = params.commit(v, v_blinding);
        let proof = dealer.receive_trusted_shares(V, party.partial_proof(), &[share])?;

        Ok(proof)
    }

    /// Combines a round-two output with the shares of all parties.
    pub(crate) fn assemble(
        V: C::Point,
        partial_proof: PartialProof<C>,
        shares: &[ProofShare<C>],
    ) -> Self {
        let t_x_blinding = shares
            .iter()
            .fold(C::Scalar::ZERO, |acc, share| acc + share.t_x_blinding);

        BulletProof {
            V,
            A: partial_proof.A,
            S: partial_proof.S,
            T_1: partial_proof.T_1,
            T_2: partial_proof.T_2,
            t_x: partial_proof.t_x,
            t_x_blinding,
            e_blinding: partial_proof.e_blinding,
            ipp_proof: partial_proof.ipp_proof,
            commit: partial_proof.commit,
        }
    }

    /// The commitment \\(V\\) the proof is about.
    pub fn value_commitment(&self) -> &C::Point {
        &self.V
    }

    /// The bitsize \\(n\\) the proof was made for, or `None` if the
    /// proof claims more inner-product rounds than a `usize` can count.
    pub fn bitsize(&self) -> Option<usize> {
        u32::try_from(self.ipp_proof.L_vec.len())
            .ok()
            .and_then(|lg_n| 1usize.checked_shl(lg_n))
    }

    /// Verifies the proof against `params`, replaying the transcript
    /// from the state it had when the parties started round two.
    pub fn verify(
        &self,
        params: &SetupParams<C>,
        transcript: &mut Transcript,
    ) -> Result<(), ProofError> {
        let n = params.n();
        if self.ipp_proof.L_vec.len() != n.trailing_zeros() as usize {
            return Err(ProofError::VerificationError);
        }

        // First, replay the "interactive" protocol using the proof
        // data to recompute all challenges.
        transcript.threshold_rangeproof_domain_sep(n as u64);

        transcript.validate_and_append_point::<C>(b"A", &self.A)?;
        transcript.validate_and_append_point::<C>(b"S", &self.S)?;

        let y: C::Scalar = transcript.challenge_scalar::<C>(b"y");
        let z: C::Scalar = transcript.challenge_scalar::<C>(b"z");
        let zz = z * z;
        let y_inv = y.invert().ok_or(ProofError::VerificationError)?;

        transcript.validate_and_append_point::<C>(b"T_1", &self.T_1)?;
        transcript.validate_and_append_point::<C>(b"T_2", &self.T_2)?;

        let x = transcript.challenge_scalar::<C>(b"x");

        transcript.append_scalar::<C>(b"t_x", &self.t_x);
        transcript.append_scalar::<C>(b"e_blinding", &self.e_blinding);

        let w: C::Scalar = transcript.challenge_scalar::<C>(b"w");

        let pc_gens = params.pc_gens();
        let G: Vec<C::Point> = params.bp_gens().G(n).copied().collect();
        let H: Vec<C::Point> = params.bp_gens().H(n).copied().collect();

        // t_x B + t_x_blinding B_blinding == z^2 V + delta(y,z) B + x T_1 + x^2 T_2
        let poly_check = C::pippenger_sum_of_products(
            &[
                pc_gens.B,
                pc_gens.B_blinding,
                self.V,
                self.T_1,
                self.T_2,
            ],
            &[
                self.t_x - delta::<C>(n, &y, &z),
                self.t_x_blinding,
                -zz,
                -x,
                -(x * x),
            ],
        );
        if poly_check.is_identity().unwrap_u8() == 0 {
            return Err(ProofError::VerificationError);
        }

        // commit == A + x S - e_blinding B_blinding - z <1, G> + <z + z^2 2^i y^-i, H>
        let minus_z = -z;
        let h = util::exp_iter::<C>(C::Scalar::from(2u64))
            .zip(util::exp_iter::<C>(y_inv))
            .map(|(exp_2, exp_y_inv)| z + zz * exp_2 * exp_y_inv)
            .take(n);
        let commit_points: Vec<C::Point> = iter::once(self.A)
            .chain(iter::once(self.S))
            .chain(iter::once(pc_gens.B_blinding))
            .chain(G.iter().copied())
            .chain(H.iter().copied())
            .collect();
        let commit_scalars: Vec<C::Scalar> = iter::once(C::Scalar::ONE)
            .chain(iter::once(x))
            .chain(iter::once(-self.e_blinding))
            .chain(iter::repeat(minus_z).take(n))
            .chain(h)
            .collect();
        let expected_commit = C::pippenger_sum_of_products(&commit_points, &commit_scalars);
        expected_commit
            .ct_eq(&self.commit)
            .ok_or(ProofError::VerificationError)?;

        let Q = pc_gens.B * w;
        let P = self.commit + Q * self.t_x;
        self.ipp_proof.verify(
            n,
            transcript,
            iter::repeat(C::Scalar::ONE).take(n),
            util::exp_iter::<C>(y_inv).take(n),
            &P,
            &Q,
            &G,
            &H,
        )
    }

    /// Serializes the proof into a byte array of six points, three
    /// scalars and the inner-product proof.
    ///
    /// # Layout
    ///
    /// The layout of the range proof encoding is:
    ///
    /// * six compressed points \\(V,A,S,T_1,T_2\\) and the inner-product commitment,
    /// * three scalars \\(t_x, \tilde{t}_x, \tilde{e}\\),
    /// * the inner-product proof, two scalars \\(a, b\\) followed by
    ///   \\(\lg n\\) pairs of compressed points \\(L_0,R_0\dots,L_{k-1},R_{k-1}\\).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            6 * C::POINT_BYTES + 3 * C::SCALAR_BYTES + self.ipp_proof.serialized_size(),
        );
        buf.append(&mut C::serialize_point(&self.V));
        buf.append(&mut C::serialize_point(&self.A));
        buf.append(&mut C::serialize_point(&self.S));
        buf.append(&mut C::serialize_point(&self.T_1));
        buf.append(&mut C::serialize_point(&self.T_2));
        buf.append(&mut C::serialize_point(&self.commit));
        buf.append(&mut C::serialize_scalar(&self.t_x));
        buf.append(&mut C::serialize_scalar(&self.t_x_blinding));
        buf.append(&mut C::serialize_scalar(&self.e_blinding));
        buf.append(&mut self.ipp_proof.to_bytes());
        buf
    }

    /// Deserializes the proof from a byte slice.
    ///
    /// Returns an error if the byte slice cannot be parsed into a `BulletProof`.
    pub fn from_bytes(slice: &[u8]) -> Result<Self, ProofError> {
        if slice.len() < 6 * C::POINT_BYTES + 5 * C::SCALAR_BYTES {
            return Err(ProofError::FormatError);
        }

        let point_at = |i: usize| {
            C::deserialize_point(&slice[i * C::POINT_BYTES..(i + 1) * C::POINT_BYTES])
                .map_err(|_| ProofError::FormatError)
        };
        let scalars = 6 * C::POINT_BYTES;
        let scalar_at = |i: usize| {
            let start = scalars + i * C::SCALAR_BYTES;
            C::deserialize_scalar(&slice[start..start + C::SCALAR_BYTES])
                .map_err(|_| ProofError::FormatError)
        };

        let V = point_at(0)?;
        let A = point_at(1)?;
        let S = point_at(2)?;
        let T_1 = point_at(3)?;
        let T_2 = point_at(4)?;
        let commit = point_at(5)?;

        let t_x = scalar_at(0)?;
        let t_x_blinding = scalar_at(1)?;
        let e_blinding = scalar_at(2)?;

        let ipp_proof = InnerProductProof::from_bytes(&slice[scalars + 3 * C::SCALAR_BYTES..])?;

        Ok(BulletProof {
            V,
            A,
            S,
            T_1,
            T_2,
            t_x,
            t_x_blinding,
            e_blinding,
            ipp_proof,
            commit,
        })
    }
}

/// Compute
/// \\[
/// \delta(y,z) = (z - z^{2}) \langle \mathbf{1}, {\mathbf{y}}^{n} \rangle - z^{3} \langle \mathbf{1}, {\mathbf{2}}^{n} \rangle
/// \\]
fn delta<C: BulletproofCurveArithmetic>(n: usize, y: &C::Scalar, z: &C::Scalar) -> C::Scalar {
    let sum_y = util::sum_of_powers::<C>(y, n);
    let sum_2 = util::sum_of_powers::<C>(&C::Scalar::from(2u64), n);

    (*z - *z * *z) * sum_y - *z * *z * *z * sum_2
}
