#![allow(non_snake_case)]

extern crate alloc;

use super::CtOptionOps;
use alloc::borrow::Borrow;
use alloc::vec::Vec;

use core::iter;
use group::ff::Field;
use merlin::Transcript;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::errors::ProofError;
use crate::serdes::*;
use crate::transcript::TranscriptProtocol;
use crate::types::*;

/// Parameters of a single inner-product argument: the bases
/// \\(\mathbf{G}\\), \\(\mathbf{H}'\\), the point \\(Q\\) binding the
/// claimed product, and the claimed product \\(c\\) itself.
///
/// These are derived per proof from the setup generators and the
/// transcript challenges, and are owned by whoever derived them.
#[derive(Clone, Debug)]
pub struct InnerProductParams<C: BulletproofCurveArithmetic> {
    n: usize,
    Q: C::Point,
    G_vec: Vec<C::Point>,
    H_vec: Vec<C::Point>,
    c: C::Scalar,
}

impl<C: BulletproofCurveArithmetic> InnerProductParams<C> {
    /// Checks that both generator vectors have length `n`, a power of two,
    /// and bundles them with `Q` and the claimed product `c`.
    pub fn setup(
        Q: C::Point,
        G_vec: Vec<C::Point>,
        H_vec: Vec<C::Point>,
        c: C::Scalar,
        n: usize,
    ) -> Result<Self, ProofError> {
        if !n.is_power_of_two() {
            return Err(ProofError::InvalidBitsize);
        }
        if G_vec.len() != n || H_vec.len() != n {
            return Err(ProofError::ParameterMismatch);
        }
        Ok(InnerProductParams {
            n,
            Q,
            G_vec,
            H_vec,
            c,
        })
    }

    /// Vector length of the argument.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The claimed inner product.
    pub fn claimed_product(&self) -> &C::Scalar {
        &self.c
    }

    /// Computes \\( \langle \mathbf{a}, \mathbf{G} \rangle + \langle \mathbf{b}, \mathbf{H}' \rangle \\).
    pub fn commit(&self, a: &[C::Scalar], b: &[C::Scalar]) -> Result<C::Point, ProofError> {
        if a.len() != self.n || b.len() != self.n {
            return Err(ProofError::ParameterMismatch);
        }
        let points: Vec<C::Point> = self
            .G_vec
            .iter()
            .chain(self.H_vec.iter())
            .copied()
            .collect();
        let scalars: Vec<C::Scalar> = a.iter().chain(b.iter()).copied().collect();
        Ok(C::pippenger_sum_of_products(&points, &scalars))
    }

    /// The point the argument is made against, \\( P + c \cdot Q \\).
    pub fn statement(&self, commitment: &C::Point) -> C::Point {
        *commitment + self.Q * self.c
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InnerProductProof<C: BulletproofCurveArithmetic> {
    #[serde(with = "CurvePointVec::<C>")]
    pub(crate) L_vec: Vec<C::Point>,
    #[serde(with = "CurvePointVec::<C>")]
    pub(crate) R_vec: Vec<C::Point>,
    #[serde(with = "CurveScalar::<C>")]
    pub(crate) a: C::Scalar,
    #[serde(with = "CurveScalar::<C>")]
    pub(crate) b: C::Scalar,
}

impl<C: BulletproofCurveArithmetic> InnerProductProof<C> {
    /// Create an inner-product proof that
    /// \\( \langle \mathbf{a}, \mathbf{b} \rangle \\) equals the claimed
    /// product of `params`, for the commitment
    /// \\( \langle \mathbf{a}, \mathbf{G} \rangle + \langle \mathbf{b}, \mathbf{H}' \rangle \\).
    ///
    /// The `transcript` is passed in as a parameter so that the
    /// challenges depend on the *entire* transcript (including parent
    /// protocols).
    pub fn create(
        transcript: &mut Transcript,
        params: &InnerProductParams<C>,
        mut a_vec: Vec<C::Scalar>,
        mut b_vec: Vec<C::Scalar>,
    ) -> Result<Self, ProofError> {
        let mut n = params.n;
        if a_vec.len() != n || b_vec.len() != n {
            return Err(ProofError::ParameterMismatch);
        }

        let mut G_vec = params.G_vec.clone();
        let mut H_vec = params.H_vec.clone();
        let Q = params.Q;

        // Slices backed by the vectors above, resliced as the lengths
        // halve every round.
        let mut G = &mut G_vec[..];
        let mut H = &mut H_vec[..];
        let mut a = &mut a_vec[..];
        let mut b = &mut b_vec[..];

        transcript.innerproduct_domain_sep(n as u64);

        let lg_n = n.trailing_zeros() as usize;
        let mut L_vec = Vec::with_capacity(lg_n);
        let mut R_vec = Vec::with_capacity(lg_n);

        while n != 1 {
            n /= 2;
            let (a_L, a_R) = a.split_at_mut(n);
            let (b_L, b_R) = b.split_at_mut(n);
            let (G_L, G_R) = G.split_at_mut(n);
            let (H_L, H_R) = H.split_at_mut(n);

            let c_L = inner_product::<C>(a_L, b_R);
            let c_R = inner_product::<C>(a_R, b_L);

            let L_points: Vec<C::Point> = G_R
                .iter()
                .chain(H_L.iter())
                .copied()
                .chain(iter::once(Q))
                .collect();
            let L_scalars: Vec<C::Scalar> = a_L
                .iter()
                .chain(b_R.iter())
                .copied()
                .chain(iter::once(c_L))
                .collect();
            let L = C::pippenger_sum_of_products(&L_points, &L_scalars);

            let R_points: Vec<C::Point> = G_L
                .iter()
                .chain(H_R.iter())
                .copied()
                .chain(iter::once(Q))
                .collect();
            let R_scalars: Vec<C::Scalar> = a_R
                .iter()
                .chain(b_L.iter())
                .copied()
                .chain(iter::once(c_R))
                .collect();
            let R = C::pippenger_sum_of_products(&R_points, &R_scalars);

            L_vec.push(L);
            R_vec.push(R);

            transcript.append_point::<C>(b"L", &L);
            transcript.append_point::<C>(b"R", &R);

            let u: C::Scalar = transcript.challenge_scalar::<C>(b"u");
            let u_inv = u.invert().ok_or(ProofError::VerificationError)?;

            for i in 0..n {
                a_L[i] = a_L[i] * u + u_inv * a_R[i];
                b_L[i] = b_L[i] * u_inv + u * b_R[i];
                G_L[i] = C::pippenger_sum_of_products(&[G_L[i], G_R[i]], &[u_inv, u]);
                H_L[i] = C::pippenger_sum_of_products(&[H_L[i], H_R[i]], &[u, u_inv]);
            }

            a = a_L;
            b = b_L;
            G = G_L;
            H = H_L;
        }

        Ok(InnerProductProof {
            L_vec,
            R_vec,
            a: a[0],
            b: b[0],
        })
    }

    /// Computes three vectors of verification scalars \\([u\_{i}^{2}]\\), \\([u\_{i}^{-2}]\\) and \\([s\_{i}]\\).
    /// The verifier must provide the input length \\(n\\) explicitly to avoid unbounded allocation within the inner product proof.
    pub(crate) fn verification_scalars(
        &self,
        n: usize,
        transcript: &mut Transcript,
    ) -> Result<(Vec<C::Scalar>, Vec<C::Scalar>, Vec<C::Scalar>), ProofError> {
        let lg_n = self.L_vec.len();
        if lg_n >= 32 || lg_n != self.R_vec.len() {
            return Err(ProofError::VerificationError);
        }
        if n != (1 << lg_n) {
            return Err(ProofError::VerificationError);
        }

        transcript.innerproduct_domain_sep(n as u64);

        // 1. Recompute u_k,...,u_1 based on the proof transcript

        let mut challenges = Vec::with_capacity(lg_n);
        for (L, R) in self.L_vec.iter().zip(self.R_vec.iter()) {
            transcript.validate_and_append_point::<C>(b"L", L)?;
            transcript.validate_and_append_point::<C>(b"R", R)?;
            challenges.push(transcript.challenge_scalar::<C>(b"u"));
        }

        // 2. Compute 1/(u_k...u_1) and 1/u_k, ..., 1/u_1

        let mut challenges_inv = challenges.clone();
        let allinv = C::Scalar::batch_invert(&mut challenges_inv);

        // 3. Compute u_i^2 and (1/u_i)^2

        let challenges_sq: Vec<C::Scalar> = challenges.iter().map(|u| u.square()).collect();
        let challenges_inv_sq: Vec<C::Scalar> =
            challenges_inv.iter().map(|u_inv| u_inv.square()).collect();

        // 4. Compute s values inductively.

        let mut s = Vec::with_capacity(n);
        s.push(allinv);
        for i in 1..n {
            let lg_i = (32 - 1 - (i as u32).leading_zeros()) as usize;
            let k = 1 << lg_i;
            // The challenges are stored in "creation order" as [u_k,...,u_1],
            // so u_{lg(i)+1} = is indexed by (lg_n-1) - lg_i
            let u_lg_i_sq = challenges_sq[(lg_n - 1) - lg_i];
            s.push(s[i - k] * u_lg_i_sq);
        }

        Ok((challenges_sq, challenges_inv_sq, s))
    }

    /// Verifies the proof against \\( P = \langle \mathbf{a}, \mathbf{G} \rangle
    /// + \langle \mathbf{b}, \mathbf{H} \rangle + \langle \mathbf{a}, \mathbf{b} \rangle Q \\),
    /// where the bases are rescaled by `G_factors` and `H_factors`.
    pub fn verify<IG, IH>(
        &self,
        n: usize,
        transcript: &mut Transcript,
        G_factors: IG,
        H_factors: IH,
        P: &C::Point,
        Q: &C::Point,
        G: &[C::Point],
        H: &[C::Point],
    ) -> Result<(), ProofError>
    where
        IG: IntoIterator,
        IG::Item: Borrow<C::Scalar>,
        IH: IntoIterator,
        IH::Item: Borrow<C::Scalar>,
    {
        if G.len() != n || H.len() != n {
            return Err(ProofError::ParameterMismatch);
        }

        let (u_sq, u_inv_sq, s) = self.verification_scalars(n, transcript)?;

        let g_times_a_times_s = G_factors
            .into_iter()
            .zip(s.iter())
            .map(|(g_i, s_i)| (self.a * s_i) * g_i.borrow())
            .take(G.len());

        // 1/s[i] is s[!i], and !i runs from n-1 to 0 as i runs from 0 to n-1
        let inv_s = s.iter().rev();

        let h_times_b_div_s = H_factors
            .into_iter()
            .zip(inv_s)
            .map(|(h_i, s_i_inv)| (self.b * s_i_inv) * h_i.borrow());

        let neg_u_sq = u_sq.iter().map(|ui| -*ui);
        let neg_u_inv_sq = u_inv_sq.iter().map(|ui| -*ui);

        let P_points: Vec<C::Point> = iter::once(*Q)
            .chain(G.iter().copied())
            .chain(H.iter().copied())
            .chain(self.L_vec.iter().copied())
            .chain(self.R_vec.iter().copied())
            .collect();
        let P_scalars: Vec<C::Scalar> = iter::once(self.a * self.b)
            .chain(g_times_a_times_s)
            .chain(h_times_b_div_s)
            .chain(neg_u_sq)
            .chain(neg_u_inv_sq)
            .collect();
        let expect_P = C::pippenger_sum_of_products(P_points.as_slice(), P_scalars.as_slice());

        expect_P.ct_eq(P).ok_or(ProofError::VerificationError)
    }

    /// Returns the size in bytes required to serialize the inner
    /// product proof.
    ///
    /// For vectors of length `n` the proof size is
    /// \\(2 \lg n \cdot POINT\\_BYTES + 2 \cdot SCALAR\\_BYTES\\) bytes.
    pub fn serialized_size(&self) -> usize {
        (self.L_vec.len() * 2) * C::POINT_BYTES + 2 * C::SCALAR_BYTES
    }

    /// Serializes the proof into a byte array.
    /// The layout of the inner product proof is:
    /// * two scalars \\(a, b\\),
    /// * \\(\lg n\\) pairs of compressed points \\(L_0, R_0 \dots, L_{k-1}, R_{k-1}\\).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());
        buf.append(&mut C::serialize_scalar(&self.a));
        buf.append(&mut C::serialize_scalar(&self.b));
        for (l, r) in self.L_vec.iter().zip(self.R_vec.iter()) {
            buf.append(&mut C::serialize_point(l));
            buf.append(&mut C::serialize_point(r));
        }
        buf
    }

    /// Deserializes the proof from a byte slice.
    /// Returns an error in the following cases:
    /// * the slice is shorter than two scalars or has trailing bytes,
    /// * \\(\lg n\\) is larger or equal to 32 (proof is too big),
    /// * any of the points is not a valid compressed point,
    /// * any of 2 scalars are not canonical scalars modulo the group order.
    pub fn from_bytes(slice: &[u8]) -> Result<Self, ProofError> {
        if slice.len() < C::SCALAR_BYTES * 2 {
            return Err(ProofError::FormatError);
        }
        let rest = slice.len() - C::SCALAR_BYTES * 2;
        if rest % (C::POINT_BYTES * 2) != 0 {
            return Err(ProofError::FormatError);
        }
        let lg_n = rest / (C::POINT_BYTES * 2);
        if lg_n >= 32 {
            return Err(ProofError::FormatError);
        }

        let a = C::deserialize_scalar(&slice[..C::SCALAR_BYTES])
            .map_err(|_| ProofError::FormatError)?;
        let b = C::deserialize_scalar(&slice[C::SCALAR_BYTES..C::SCALAR_BYTES * 2])
            .map_err(|_| ProofError::FormatError)?;

        let mut L_vec: Vec<C::Point> = Vec::with_capacity(lg_n);
        let mut R_vec: Vec<C::Point> = Vec::with_capacity(lg_n);
        for pair in slice[C::SCALAR_BYTES * 2..].chunks_exact(C::POINT_BYTES * 2) {
            let (l, r) = pair.split_at(C::POINT_BYTES);
            L_vec.push(C::deserialize_point(l).map_err(|_| ProofError::FormatError)?);
            R_vec.push(C::deserialize_point(r).map_err(|_| ProofError::FormatError)?);
        }

        Ok(InnerProductProof { L_vec, R_vec, a, b })
    }
}

/// Computes an inner product of two vectors
/// \\[
///    {\langle {\mathbf{a}}, {\mathbf{b}} \rangle} = \sum\_{i=0}^{n-1} a\_i \cdot b\_i.
/// \\]
/// Panics if the lengths of \\(\mathbf{a}\\) and \\(\mathbf{b}\\) are not equal.
pub fn inner_product<C: BulletproofCurveArithmetic>(a: &[C::Scalar], b: &[C::Scalar]) -> C::Scalar {
    if a.len() != b.len() {
        panic!("inner_product(a,b): lengths of vectors do not match");
    }
    a.iter()
        .zip(b.iter())
        .fold(C::Scalar::ZERO, |acc, (a_i, b_i)| acc + *a_i * b_i)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::generators::BulletproofGens;
    use crate::util;
    use group::Group;

    fn test_helper_create<C: BulletproofCurveArithmetic>(n: usize) {
        let mut rng = rand::thread_rng();

        let bp_gens = BulletproofGens::<C>::new(n);
        let G: Vec<C::Point> = bp_gens.G(n).cloned().collect();
        let H: Vec<C::Point> = bp_gens.H(n).cloned().collect();

        // Q would be determined upstream in the protocol, so we pick a random one.
        let Q = C::Point::hash_to_point(b"test point");

        // a and b are the vectors for which we want to prove c = <a,b>
        let a: Vec<_> = (0..n).map(|_| C::Scalar::random(&mut rng)).collect();
        let b: Vec<_> = (0..n).map(|_| C::Scalar::random(&mut rng)).collect();
        let c = inner_product::<C>(&a, &b);

        // H' = H * y^-i, for some challenge y
        let y_inv = C::Scalar::random(&mut rng);
        let H_prime = util::scale_points::<C>(&H, util::exp_iter::<C>(y_inv));

        let params = InnerProductParams::<C>::setup(Q, G.clone(), H_prime.clone(), c, n).unwrap();
        let commitment = params.commit(&a, &b).unwrap();
        let P = params.statement(&commitment);

        let mut transcript = Transcript::new(b"innerproducttest");
        let proof = InnerProductProof::<C>::create(&mut transcript, &params, a.clone(), b.clone())
            .unwrap();

        // Verify once against the rescaled bases directly...
        let mut transcript = Transcript::new(b"innerproducttest");
        assert!(proof
            .verify(
                n,
                &mut transcript,
                iter::repeat(C::Scalar::ONE).take(n),
                iter::repeat(C::Scalar::ONE).take(n),
                &P,
                &Q,
                &G,
                &H_prime,
            )
            .is_ok());

        // ...and once against the original bases with the factors folded in.
        let proof = InnerProductProof::<C>::from_bytes(proof.to_bytes().as_slice()).unwrap();
        let mut transcript = Transcript::new(b"innerproducttest");
        assert!(proof
            .verify(
                n,
                &mut transcript,
                iter::repeat(C::Scalar::ONE).take(n),
                util::exp_iter::<C>(y_inv).take(n),
                &P,
                &Q,
                &G,
                &H,
            )
            .is_ok());

        // A different claimed product must not verify.
        let wrong = params.statement(&(commitment + C::Point::generator()));
        let mut transcript = Transcript::new(b"innerproducttest");
        assert!(proof
            .verify(
                n,
                &mut transcript,
                iter::repeat(C::Scalar::ONE).take(n),
                iter::repeat(C::Scalar::ONE).take(n),
                &wrong,
                &Q,
                &G,
                &H_prime,
            )
            .is_err());
    }

    fn setup_rejects_mismatched_lengths<C: BulletproofCurveArithmetic>() {
        let bp_gens = BulletproofGens::<C>::new(8);
        let G: Vec<C::Point> = bp_gens.G(8).cloned().collect();
        let H: Vec<C::Point> = bp_gens.H(4).cloned().collect();
        let Q = C::Point::generator();

        assert_eq!(
            InnerProductParams::<C>::setup(Q, G.clone(), H, C::Scalar::ONE, 8).unwrap_err(),
            ProofError::ParameterMismatch
        );
        assert_eq!(
            InnerProductParams::<C>::setup(Q, G.clone(), G[..6].to_vec(), C::Scalar::ONE, 6)
                .unwrap_err(),
            ProofError::InvalidBitsize
        );
    }

    fn from_bytes_rejects_truncation<C: BulletproofCurveArithmetic>() {
        assert_eq!(
            InnerProductProof::<C>::from_bytes(&[0u8; 3]).unwrap_err(),
            ProofError::FormatError
        );
    }

    #[cfg(feature = "p256")]
    #[test]
    fn make_ipp_p256() {
        for n in [1, 2, 4, 32, 64] {
            test_helper_create::<p256::NistP256>(n);
        }
        setup_rejects_mismatched_lengths::<p256::NistP256>();
        from_bytes_rejects_truncation::<p256::NistP256>();
    }

    #[cfg(feature = "k256")]
    #[test]
    fn make_ipp_k256() {
        for n in [1, 2, 4, 32, 64] {
            test_helper_create::<k256::Secp256k1>(n);
        }
        setup_rejects_mismatched_lengths::<k256::Secp256k1>();
        from_bytes_rejects_truncation::<k256::Secp256k1>();
    }

    #[cfg(feature = "bls12_381")]
    #[test]
    fn make_ipp_bls12_381() {
        for n in [1, 2, 4, 32, 64] {
            test_helper_create::<bls12_381_plus::Bls12381G1>(n);
        }
        setup_rejects_mismatched_lengths::<bls12_381_plus::Bls12381G1>();
        from_bytes_rejects_truncation::<bls12_381_plus::Bls12381G1>();
    }

    #[cfg(feature = "curve25519")]
    #[test]
    fn make_ipp_curve25519() {
        for n in [1, 2, 4, 32, 64] {
            test_helper_create::<crate::Curve25519>(n);
        }
        setup_rejects_mismatched_lengths::<crate::Curve25519>();
        from_bytes_rejects_truncation::<crate::Curve25519>();
    }

    #[cfg(feature = "p256")]
    #[test]
    fn inner_product_of_small_vectors() {
        type C = p256::NistP256;
        let a: Vec<_> = (1u64..=4).map(<C as BulletproofCurveArithmetic>::Scalar::from).collect();
        let b: Vec<_> = (2u64..=5).map(<C as BulletproofCurveArithmetic>::Scalar::from).collect();
        assert_eq!(
            <C as BulletproofCurveArithmetic>::Scalar::from(40u64),
            inner_product::<C>(&a, &b)
        );
    }
}
