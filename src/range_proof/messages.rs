//! The `messages` module contains the API for the messages passed between the parties and the dealer
//! in the threshold range proof protocol.
//!
//! For more explanation of how the `dealer`, `party`, and `messages` modules orchestrate the protocol execution, see
//! the documentation of the [`range_proof_mpc`](crate::range_proof_mpc) module.

#![allow(non_snake_case)]

extern crate alloc;

use alloc::vec::Vec;
use group::ff::Field;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use zeroize::Zeroize;

use crate::inner_product_proof::InnerProductProof;
use crate::serdes::*;
use crate::setup::SetupParams;
use crate::types::*;

/// A party's commitment to its polynomial blinding shares,
/// \\(T\_{1,j} = \tau\_{1,j} \cdot H\\) and \\(T\_{2,j} = \tau\_{2,j} \cdot H\\).
#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct TauCommitment<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurvePoint::<C>")]
    pub(super) T_1_j: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    pub(super) T_2_j: C::Point,
}

/// Blinding randomness sampled once per session and handed to every
/// party, so that all of them derive the same \\(A\\) and \\(S\\).
///
/// These values hide the bits of the secret value in \\(A\\), \\(S\\)
/// and \\(t(x)\\): whoever holds them can recover the value. They must
/// only be sampled by a participant or a dealer trusted with the value,
/// and only be sent to participants over confidential channels.
#[derive(Serialize, Deserialize, Clone)]
pub struct SharedBlinding<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurveScalar::<C>")]
    pub(super) alpha: C::Scalar,
    #[serde(with = "CurveScalar::<C>")]
    pub(super) rho: C::Scalar,
    #[serde(with = "CurveScalarVec::<C>")]
    pub(super) s_L: Vec<C::Scalar>,
    #[serde(with = "CurveScalarVec::<C>")]
    pub(super) s_R: Vec<C::Scalar>,
}

impl<C: BulletproofCurveArithmetic> SharedBlinding<C> {
    /// Samples \\(\alpha\\), \\(\rho\\), \\(\mathbf{s}\_L\\) and \\(\mathbf{s}\_R\\) for an `n`-bit proof.
    pub fn random(n: usize, mut rng: impl RngCore + CryptoRng) -> Self {
        SharedBlinding {
            alpha: C::Scalar::random(&mut rng),
            rho: C::Scalar::random(&mut rng),
            s_L: (0..n).map(|_| C::Scalar::random(&mut rng)).collect(),
            s_R: (0..n).map(|_| C::Scalar::random(&mut rng)).collect(),
        }
    }

    /// Assembles shared blinding from parts agreed upon out of band.
    pub fn from_parts(
        alpha: C::Scalar,
        rho: C::Scalar,
        s_L: Vec<C::Scalar>,
        s_R: Vec<C::Scalar>,
    ) -> Self {
        SharedBlinding {
            alpha,
            rho,
            s_L,
            s_R,
        }
    }

    /// Length of the blinding vectors, or `None` if they disagree.
    pub fn len(&self) -> Option<usize> {
        if self.s_L.len() == self.s_R.len() {
            Some(self.s_L.len())
        } else {
            None
        }
    }
}

impl<C: BulletproofCurveArithmetic> core::fmt::Debug for SharedBlinding<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedBlinding")
            .field("n", &self.s_L.len())
            .finish_non_exhaustive()
    }
}

impl<C: BulletproofCurveArithmetic> Drop for SharedBlinding<C> {
    fn drop(&mut self) {
        self.alpha.zeroize();
        self.rho.zeroize();
        for e in self.s_L.iter_mut() {
            e.zeroize();
        }
        for e in self.s_R.iter_mut() {
            e.zeroize();
        }
    }
}

/// Digest of a [`SessionInputs`] value and the setup it is used with.
///
/// The dealer publishes it alongside the inputs; each party recomputes
/// it before round two and refuses to continue on a mismatch. It only
/// catches a dealer that sends different inputs to different parties
/// when the parties agree on the fingerprint among themselves, for
/// example over a broadcast channel.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionFingerprint(pub [u8; 32]);

/// Everything a party needs from the others before round two: all
/// [`TauCommitment`]s and the [`SharedBlinding`].
///
/// Carries the [`SharedBlinding`], so it is as sensitive as the secret
/// value and must only travel over confidential channels.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound = "")]
pub struct SessionInputs<C: BulletproofCurveArithmetic> {
    pub(super) tau_commitments: Vec<TauCommitment<C>>,
    pub(super) shared: SharedBlinding<C>,
}

impl<C: BulletproofCurveArithmetic> SessionInputs<C> {
    /// Bundles the broadcast set with the shared blinding.
    pub fn new(tau_commitments: Vec<TauCommitment<C>>, shared: SharedBlinding<C>) -> Self {
        SessionInputs {
            tau_commitments,
            shared,
        }
    }

    /// Number of parties whose commitments are included.
    pub fn num_parties(&self) -> usize {
        self.tau_commitments.len()
    }

    /// SHA3-256 over the setup and every field of the inputs, in a fixed order.
    pub fn fingerprint(&self, params: &SetupParams<C>) -> SessionFingerprint {
        let n = params.n();
        let mut hasher = Sha3_256::new();
        Digest::update(&mut hasher, b"threshold-rangeproof session v1");
        Digest::update(&mut hasher, (n as u64).to_le_bytes());
        Digest::update(&mut hasher, C::serialize_point(&params.pc_gens().B));
        Digest::update(&mut hasher, C::serialize_point(&params.pc_gens().B_blinding));
        for (G_i, H_i) in params.bp_gens().G(n).zip(params.bp_gens().H(n)) {
            Digest::update(&mut hasher, C::serialize_point(G_i));
            Digest::update(&mut hasher, C::serialize_point(H_i));
        }
        Digest::update(
            &mut hasher,
            (self.tau_commitments.len() as u64).to_le_bytes(),
        );
        for tc in &self.tau_commitments {
            Digest::update(&mut hasher, C::serialize_point(&tc.T_1_j));
            Digest::update(&mut hasher, C::serialize_point(&tc.T_2_j));
        }
        Digest::update(&mut hasher, C::serialize_scalar(&self.shared.alpha));
        Digest::update(&mut hasher, C::serialize_scalar(&self.shared.rho));
        Digest::update(&mut hasher, (self.shared.s_L.len() as u64).to_le_bytes());
        for (l, r) in self.shared.s_L.iter().zip(self.shared.s_R.iter()) {
            Digest::update(&mut hasher, C::serialize_scalar(l));
            Digest::update(&mut hasher, C::serialize_scalar(r));
        }
        Digest::update(&mut hasher, (self.shared.s_R.len() as u64).to_le_bytes());
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        SessionFingerprint(digest)
    }
}

/// The public output of round two. Honest parties produce
/// byte-identical partial proofs.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound = "")]
pub struct PartialProof<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurvePoint::<C>")]
    pub(super) A: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    pub(super) S: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    pub(super) T_1: C::Point,
    #[serde(with = "CurvePoint::<C>")]
    pub(super) T_2: C::Point,
    #[serde(with = "CurveScalar::<C>")]
    pub(super) e_blinding: C::Scalar,
    #[serde(with = "CurveScalar::<C>")]
    pub(super) t_x: C::Scalar,
    pub(super) ipp_proof: InnerProductProof<C>,
    #[serde(with = "CurvePoint::<C>")]
    pub(super) commit: C::Point,
}

impl<C: BulletproofCurveArithmetic> PartialProof<C> {
    /// Canonical encoding used to compare partial proofs across parties.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            5 * C::POINT_BYTES + 2 * C::SCALAR_BYTES + self.ipp_proof.serialized_size(),
        );
        buf.extend_from_slice(&C::serialize_point(&self.A));
        buf.extend_from_slice(&C::serialize_point(&self.S));
        buf.extend_from_slice(&C::serialize_point(&self.T_1));
        buf.extend_from_slice(&C::serialize_point(&self.T_2));
        buf.extend_from_slice(&C::serialize_scalar(&self.e_blinding));
        buf.extend_from_slice(&C::serialize_scalar(&self.t_x));
        buf.extend_from_slice(&C::serialize_point(&self.commit));
        buf.extend_from_slice(&self.ipp_proof.to_bytes());
        buf
    }
}

/// A party's share of the aggregate \\(\tau\_x\\), ready for aggregation
/// into the final [`BulletProof`](crate::BulletProof).
#[derive(Serialize, Deserialize, Copy, Clone, Debug)]
pub struct ProofShare<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurveScalar::<C>")]
    pub(super) t_x_blinding: C::Scalar,
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::Group;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn inputs<C: BulletproofCurveArithmetic>(seed: u64, n: usize) -> SessionInputs<C> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let tau_commitments = (0..3)
            .map(|_| TauCommitment {
                T_1_j: C::Point::random(&mut rng),
                T_2_j: C::Point::random(&mut rng),
            })
            .collect();
        SessionInputs::new(tau_commitments, SharedBlinding::random(n, &mut rng))
    }

    fn check_fingerprint_binds_inputs<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(8).unwrap();
        let a = inputs::<C>(1, 8);
        let b = inputs::<C>(1, 8);
        assert_eq!(a.fingerprint(&params), b.fingerprint(&params));

        let other = inputs::<C>(2, 8);
        assert_ne!(a.fingerprint(&params), other.fingerprint(&params));

        let mut dropped = a.clone();
        dropped.tau_commitments.pop();
        assert_ne!(a.fingerprint(&params), dropped.fingerprint(&params));

        let mut tweaked = a.clone();
        tweaked.shared.s_R[3] += C::Scalar::ONE;
        assert_ne!(a.fingerprint(&params), tweaked.fingerprint(&params));

        let mut moved = a.clone();
        moved.tau_commitments[0].T_1_j += C::Point::generator();
        assert_ne!(a.fingerprint(&params), moved.fingerprint(&params));

        let wider = SetupParams::<C>::new(16).unwrap();
        assert_ne!(a.fingerprint(&params), a.fingerprint(&wider));
    }

    fn check_shared_blinding_len<C: BulletproofCurveArithmetic>() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert_eq!(SharedBlinding::<C>::random(16, &mut rng).len(), Some(16));
        let lopsided = SharedBlinding::<C>::from_parts(
            C::Scalar::ONE,
            C::Scalar::ONE,
            alloc::vec![C::Scalar::ONE; 4],
            alloc::vec![C::Scalar::ONE; 2],
        );
        assert_eq!(lopsided.len(), None);
    }

    fn check_debug_hides_shared_blinding<C: BulletproofCurveArithmetic>() {
        let a = inputs::<C>(4, 8);
        assert_eq!(alloc::format!("{:?}", a.shared), "SharedBlinding { n: 8, .. }");

        let printed = alloc::format!("{:?}", a);
        assert!(!printed.contains(&alloc::format!("{:?}", a.shared.alpha)));
        assert!(!printed.contains(&alloc::format!("{:?}", a.shared.rho)));
    }

    fn check_session_inputs_serde<C: BulletproofCurveArithmetic>() {
        let params = SetupParams::<C>::new(8).unwrap();
        let a = inputs::<C>(3, 8);

        let json = serde_json::to_string(&a).unwrap();
        let from_json: SessionInputs<C> = serde_json::from_str(&json).unwrap();
        assert_eq!(a.fingerprint(&params), from_json.fingerprint(&params));

        let bin = bincode::serialize(&a).unwrap();
        let from_bin: SessionInputs<C> = bincode::deserialize(&bin).unwrap();
        assert_eq!(a.fingerprint(&params), from_bin.fingerprint(&params));
    }

    #[cfg(feature = "p256")]
    #[test]
    fn messages_p256() {
        check_fingerprint_binds_inputs::<p256::NistP256>();
        check_shared_blinding_len::<p256::NistP256>();
        check_debug_hides_shared_blinding::<p256::NistP256>();
        check_session_inputs_serde::<p256::NistP256>();
    }

    #[cfg(feature = "k256")]
    #[test]
    fn messages_k256() {
        check_fingerprint_binds_inputs::<k256::Secp256k1>();
        check_shared_blinding_len::<k256::Secp256k1>();
        check_debug_hides_shared_blinding::<k256::Secp256k1>();
        check_session_inputs_serde::<k256::Secp256k1>();
    }

    #[cfg(feature = "bls12_381")]
    #[test]
    fn messages_bls12_381() {
        check_fingerprint_binds_inputs::<bls12_381_plus::Bls12381G1>();
        check_shared_blinding_len::<bls12_381_plus::Bls12381G1>();
        check_debug_hides_shared_blinding::<bls12_381_plus::Bls12381G1>();
        check_session_inputs_serde::<bls12_381_plus::Bls12381G1>();
    }

    #[cfg(feature = "curve25519")]
    #[test]
    fn messages_curve25519() {
        check_fingerprint_binds_inputs::<crate::Curve25519>();
        check_shared_blinding_len::<crate::Curve25519>();
        check_debug_hides_shared_blinding::<crate::Curve25519>();
        check_session_inputs_serde::<crate::Curve25519>();
    }
}
