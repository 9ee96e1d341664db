//! The `generators` module contains API for producing a
//! set of generators for a threshold range proof.

#![allow(non_snake_case)]
#![deny(missing_docs)]

extern crate alloc;

use alloc::vec::Vec;

use digest::{ExtendableOutput, Update, XofReader};
use group::Group;
use sha3::{Shake256, Shake256Reader};

use crate::types::{BulletproofCurveArithmetic, HashToPoint};

/// Represents a pair of base points for Pedersen commitments.
///
/// The default generators are:
///
/// * `B`: the group generator;
/// * `B_blinding`: the result of hashing the encoding of `B` to the
///   curve, so its discrete log relative to `B` is unknown.
#[derive(Copy, Clone, Debug)]
pub struct PedersenGens<C: BulletproofCurveArithmetic> {
    /// Base for the committed value
    pub B: C::Point,
    /// Base for the blinding factor
    pub B_blinding: C::Point,
}

impl<C: BulletproofCurveArithmetic> PedersenGens<C> {
    /// Creates a Pedersen commitment using the value scalar and a blinding factor.
    pub fn commit(&self, value: C::Scalar, blinding: C::Scalar) -> C::Point {
        self.B * value + self.B_blinding * blinding
    }
}

impl<C: BulletproofCurveArithmetic> Default for PedersenGens<C> {
    fn default() -> Self {
        let B = C::Point::generator();
        PedersenGens {
            B,
            B_blinding: C::Point::hash_to_point(&C::serialize_point(&B)),
        }
    }
}

/// The `GeneratorsChain` creates an arbitrary-long sequence of
/// orthogonal generators. The sequence can be deterministically
/// produced starting with an arbitrary point.
struct GeneratorsChain<C: BulletproofCurveArithmetic> {
    reader: Shake256Reader,
    _marker: core::marker::PhantomData<C>,
}

impl<C: BulletproofCurveArithmetic> GeneratorsChain<C> {
    /// Creates a chain of generators, determined by the hash of `label`.
    fn new(label: &[u8]) -> Self {
        let mut shake = Shake256::default();
        shake.update(b"GeneratorsChain");
        shake.update(label);

        GeneratorsChain {
            reader: shake.finalize_xof(),
            _marker: core::marker::PhantomData,
        }
    }
}

impl<C: BulletproofCurveArithmetic> Iterator for GeneratorsChain<C> {
    type Item = C::Point;

    fn next(&mut self) -> Option<Self::Item> {
        let mut uniform_bytes = [0u8; 64];
        self.reader.read(&mut uniform_bytes);

        Some(C::Point::hash_to_point(&uniform_bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// The `BulletproofGens` struct contains all the generators needed
/// for the bit vectors of a range proof of up to `gens_capacity` bits.
///
/// Every party derives the same generators from the same capacity,
/// so the vectors never need to be transmitted.
#[derive(Clone, Debug)]
pub struct BulletproofGens<C: BulletproofCurveArithmetic> {
    /// The maximum number of usable generators.
    gens_capacity: usize,
    /// Precomputed \\(\mathbf G\\) generators.
    G_vec: Vec<C::Point>,
    /// Precomputed \\(\mathbf H\\) generators.
    H_vec: Vec<C::Point>,
}

impl<C: BulletproofCurveArithmetic> BulletproofGens<C> {
    /// Create a new `BulletproofGens` object.
    ///
    /// # Inputs
    ///
    /// * `gens_capacity` is the number of generators to precompute
    ///    for each of \\(\mathbf G\\) and \\(\mathbf H\\). For range
    ///    proofs, it is sufficient to pass the bitsize \\(n\\).
    pub fn new(gens_capacity: usize) -> Self {
        let mut gens = BulletproofGens {
            gens_capacity: 0,
            G_vec: Vec::new(),
            H_vec: Vec::new(),
        };
        gens.increase_capacity(gens_capacity);
        gens
    }

    /// The number of precomputed generators in each of \\(\mathbf G\\)
    /// and \\(\mathbf H\\).
    pub fn gens_capacity(&self) -> usize {
        self.gens_capacity
    }

    /// Increases the generators' capacity to the amount specified.
    /// If less than or equal to the current capacity, does nothing.
    pub fn increase_capacity(&mut self, new_capacity: usize) {
        if self.gens_capacity >= new_capacity {
            return;
        }

        // Regenerating from the start of the chain keeps the prefix
        // identical to what a smaller capacity would produce.
        self.G_vec = GeneratorsChain::<C>::new(b"G")
            .take(new_capacity)
            .collect();
        self.H_vec = GeneratorsChain::<C>::new(b"H")
            .take(new_capacity)
            .collect();
        self.gens_capacity = new_capacity;
    }

    /// Return an iterator over the first `n` \\(\mathbf G\\) generators.
    pub fn G(&self, n: usize) -> impl Iterator<Item = &C::Point> {
        self.G_vec.iter().take(n)
    }

    /// Return an iterator over the first `n` \\(\mathbf H\\) generators.
    pub fn H(&self, n: usize) -> impl Iterator<Item = &C::Point> {
        self.H_vec.iter().take(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_deterministic<C: BulletproofCurveArithmetic>() {
        let a = BulletproofGens::<C>::new(16);
        let b = BulletproofGens::<C>::new(16);
        assert!(a.G(16).zip(b.G(16)).all(|(x, y)| x == y));
        assert!(a.H(16).zip(b.H(16)).all(|(x, y)| x == y));

        let pc_a = PedersenGens::<C>::default();
        let pc_b = PedersenGens::<C>::default();
        assert_eq!(pc_a.B_blinding, pc_b.B_blinding);
        assert_ne!(pc_a.B, pc_a.B_blinding);
    }

    fn check_increase_capacity_keeps_prefix<C: BulletproofCurveArithmetic>() {
        let small = BulletproofGens::<C>::new(8);
        let mut grown = BulletproofGens::<C>::new(2);
        grown.increase_capacity(32);

        assert_eq!(grown.gens_capacity(), 32);
        assert_eq!(grown.G(64).count(), 32);
        assert_eq!(grown.H(64).count(), 32);

        // Asking for less keeps what is there.
        grown.increase_capacity(4);
        assert_eq!(grown.gens_capacity(), 32);
        assert_eq!(grown.G(64).count(), grown.gens_capacity());
        assert!(small.G(8).zip(grown.G(8)).all(|(x, y)| x == y));
        assert!(small.H(8).zip(grown.H(8)).all(|(x, y)| x == y));
    }

    fn check_g_and_h_are_distinct<C: BulletproofCurveArithmetic>() {
        let gens = BulletproofGens::<C>::new(4);
        for g in gens.G(4) {
            assert!(gens.H(4).all(|h| h != g));
        }
    }

    #[cfg(feature = "p256")]
    #[test]
    fn generators_p256() {
        check_deterministic::<p256::NistP256>();
        check_increase_capacity_keeps_prefix::<p256::NistP256>();
        check_g_and_h_are_distinct::<p256::NistP256>();
    }

    #[cfg(feature = "k256")]
    #[test]
    fn generators_k256() {
        check_deterministic::<k256::Secp256k1>();
        check_increase_capacity_keeps_prefix::<k256::Secp256k1>();
        check_g_and_h_are_distinct::<k256::Secp256k1>();
    }

    #[cfg(feature = "bls12_381")]
    #[test]
    fn generators_bls12_381() {
        check_deterministic::<bls12_381_plus::Bls12381G1>();
        check_increase_capacity_keeps_prefix::<bls12_381_plus::Bls12381G1>();
        check_g_and_h_are_distinct::<bls12_381_plus::Bls12381G1>();
    }

    #[cfg(feature = "curve25519")]
    #[test]
    fn generators_curve25519() {
        check_deterministic::<crate::Curve25519>();
        check_increase_capacity_keeps_prefix::<crate::Curve25519>();
        check_g_and_h_are_distinct::<crate::Curve25519>();
    }
}
