//! Public parameters shared by every participant and the verifier.

#![allow(non_snake_case)]

use crate::errors::ProofError;
use crate::generators::{BulletproofGens, PedersenGens};
use crate::types::BulletproofCurveArithmetic;

/// The largest range end accepted by [`SetupParams::from_range_end`].
pub const MAX_RANGE_END: u64 = 1 << 32;

/// Immutable setup for proving \\(v \in [0, 2^n)\\).
///
/// Parameters are derived deterministically, so every participant
/// calling [`SetupParams::new`] with the same `n` holds the same value.
#[derive(Clone, Debug)]
pub struct SetupParams<C: BulletproofCurveArithmetic> {
    n: usize,
    pc_gens: PedersenGens<C>,
    bp_gens: BulletproofGens<C>,
}

impl<C: BulletproofCurveArithmetic> SetupParams<C> {
    /// Setup for an `n`-bit range, `n` a power of two no larger than 64.
    pub fn new(n: usize) -> Result<Self, ProofError> {
        Self::with_generators(PedersenGens::default(), BulletproofGens::new(n), n)
    }

    /// Setup for the range \\([0, b)\\).
    ///
    /// `b` must be a power of two, and its exponent must itself be a
    /// power of two, so that the bit vectors fold evenly in the
    /// inner-product argument.
    pub fn from_range_end(b: u64) -> Result<Self, ProofError> {
        if b > MAX_RANGE_END || !b.is_power_of_two() {
            return Err(ProofError::InvalidRangeEnd);
        }
        let n = b.trailing_zeros() as usize;
        if !n.is_power_of_two() {
            return Err(ProofError::InvalidBitsize);
        }
        Self::new(n)
    }

    /// Setup from caller-provided generators.
    pub fn with_generators(
        pc_gens: PedersenGens<C>,
        bp_gens: BulletproofGens<C>,
        n: usize,
    ) -> Result<Self, ProofError> {
        if !(n == 1 || n == 2 || n == 4 || n == 8 || n == 16 || n == 32 || n == 64) {
            return Err(ProofError::InvalidBitsize);
        }
        if bp_gens.gens_capacity() < n {
            return Err(ProofError::InvalidGeneratorsLength);
        }
        Ok(SetupParams {
            n,
            pc_gens,
            bp_gens,
        })
    }

    /// The bitsize \\(n\\).
    pub fn n(&self) -> usize {
        self.n
    }

    /// The Pedersen bases \\((G, H)\\).
    pub fn pc_gens(&self) -> &PedersenGens<C> {
        &self.pc_gens
    }

    /// The bit-vector bases \\((\mathbf{G}, \mathbf{H})\\).
    pub fn bp_gens(&self) -> &BulletproofGens<C> {
        &self.bp_gens
    }

    /// Pedersen commitment \\(v \cdot G + \gamma \cdot H\\) to an integer value.
    pub fn commit(&self, v: u64, blinding: C::Scalar) -> C::Point {
        self.pc_gens.commit(C::Scalar::from(v), blinding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_bitsizes<C: BulletproofCurveArithmetic>() {
        for n in [1, 2, 4, 8, 16, 32, 64] {
            assert_eq!(SetupParams::<C>::new(n).unwrap().n(), n);
        }
        for n in [0, 3, 12, 128] {
            assert_eq!(
                SetupParams::<C>::new(n).unwrap_err(),
                ProofError::InvalidBitsize
            );
        }
    }

    fn check_range_ends<C: BulletproofCurveArithmetic>() {
        assert_eq!(
            SetupParams::<C>::from_range_end(MAX_RANGE_END).unwrap().n(),
            32
        );
        assert_eq!(SetupParams::<C>::from_range_end(1 << 16).unwrap().n(), 16);
        assert_eq!(SetupParams::<C>::from_range_end(2).unwrap().n(), 1);
        assert_eq!(
            SetupParams::<C>::from_range_end(300).unwrap_err(),
            ProofError::InvalidRangeEnd
        );
        assert_eq!(
            SetupParams::<C>::from_range_end(0).unwrap_err(),
            ProofError::InvalidRangeEnd
        );
        assert_eq!(
            SetupParams::<C>::from_range_end(MAX_RANGE_END << 1).unwrap_err(),
            ProofError::InvalidRangeEnd
        );
        // 2^3: the exponent is not a power of two.
        assert_eq!(
            SetupParams::<C>::from_range_end(8).unwrap_err(),
            ProofError::InvalidBitsize
        );
        // 2^0 gives n = 0.
        assert_eq!(
            SetupParams::<C>::from_range_end(1).unwrap_err(),
            ProofError::InvalidBitsize
        );
    }

    fn check_too_few_generators<C: BulletproofCurveArithmetic>() {
        assert_eq!(
            SetupParams::<C>::with_generators(PedersenGens::default(), BulletproofGens::new(8), 16)
                .unwrap_err(),
            ProofError::InvalidGeneratorsLength
        );
    }

    fn check_commit<C: BulletproofCurveArithmetic>() {
        use group::ff::Field;

        let params = SetupParams::<C>::new(8).unwrap();
        let blinding = C::Scalar::from(7u64);
        let expected = params.pc_gens().B * C::Scalar::from(300u64)
            + params.pc_gens().B_blinding * blinding;
        assert_eq!(params.commit(300, blinding), expected);
        assert_eq!(
            params.commit(0, C::Scalar::ZERO),
            <C::Point as group::Group>::identity()
        );
    }

    #[cfg(feature = "p256")]
    #[test]
    fn setup_p256() {
        check_bitsizes::<p256::NistP256>();
        check_range_ends::<p256::NistP256>();
        check_too_few_generators::<p256::NistP256>();
        check_commit::<p256::NistP256>();
    }

    #[cfg(feature = "k256")]
    #[test]
    fn setup_k256() {
        check_bitsizes::<k256::Secp256k1>();
        check_range_ends::<k256::Secp256k1>();
        check_too_few_generators::<k256::Secp256k1>();
        check_commit::<k256::Secp256k1>();
    }

    #[cfg(feature = "bls12_381")]
    #[test]
    fn setup_bls12_381() {
        check_bitsizes::<bls12_381_plus::Bls12381G1>();
        check_range_ends::<bls12_381_plus::Bls12381G1>();
        check_too_few_generators::<bls12_381_plus::Bls12381G1>();
        check_commit::<bls12_381_plus::Bls12381G1>();
    }

    #[cfg(feature = "curve25519")]
    #[test]
    fn setup_curve25519() {
        check_bitsizes::<crate::Curve25519>();
        check_range_ends::<crate::Curve25519>();
        check_too_few_generators::<crate::Curve25519>();
        check_commit::<crate::Curve25519>();
    }
}
