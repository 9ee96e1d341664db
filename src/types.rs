//! Curve abstraction used by every part of the protocol.
//!
//! A curve is a zero-sized marker type implementing
//! [`BulletproofCurveArithmetic`], which fixes the scalar field, the
//! group, their canonical encodings and a multiscalar multiplication.

extern crate alloc;

use alloc::vec::Vec;
use core::fmt::Debug;
use group::{ff::PrimeField, Group, GroupEncoding};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroize;

/// A scalar that can be split into four little-endian 64-bit limbs,
/// as consumed by [`sum_of_products_pippenger`].
pub trait PippengerScalar: PrimeField + Zeroize {
    /// Convert the scalar to a 4-limb representation in canonical form.
    fn as_pippenger_scalar(&self) -> [u64; 4];
}

/// Nothing-up-my-sleeve derivation of group elements.
pub trait HashToPoint {
    /// The output point type
    type Point: Group + GroupEncoding + Default + ConditionallySelectable;

    /// Hash the message `m` to a point whose discrete log is unknown.
    fn hash_to_point(m: &[u8]) -> Self::Point;
}

/// Montgomery's trick for inverting many scalars at once.
pub trait ScalarBatchInvert: PrimeField + Zeroize {
    /// Inverts every element of `scalars` in place and returns the
    /// inverse of their product.
    fn batch_invert(scalars: &mut [Self]) -> Self {
        let mut acc = Self::ONE;
        let mut scratch = Vec::with_capacity(scalars.len());

        for s in scalars.iter() {
            scratch.push(acc);
            acc *= s;
        }

        debug_assert!(acc.is_zero().unwrap_u8() == 0);

        acc = acc.invert().unwrap_or(Self::ZERO);
        let allinv = acc;

        for (s, sc) in scalars.iter_mut().zip(scratch.iter()).rev() {
            let next = *s * acc;
            *s = *sc * acc;
            acc = next;
        }

        allinv
    }
}

/// Reduction of a uniformly random 64-byte string into the scalar field.
pub trait FromWideBytes: PrimeField {
    /// Reduce `bytes` modulo the group order.
    fn from_wide_bytes(bytes: &[u8]) -> Self;
}

/// The group arithmetic the threshold range proof is generic over.
pub trait BulletproofCurveArithmetic: Copy + Clone + Debug {
    /// Length of a canonical scalar encoding.
    const SCALAR_BYTES: usize;
    /// Length of a canonical (compressed) point encoding.
    const POINT_BYTES: usize;

    /// The scalar field, of prime order equal to the group order.
    type Scalar: ScalarBatchInvert + FromWideBytes;
    /// The prime-order group.
    type Point: Group<Scalar = Self::Scalar>
        + GroupEncoding
        + Default
        + ConditionallySelectable
        + ConstantTimeEq
        + HashToPoint<Point = Self::Point>;

    /// Canonical encoding of a point.
    fn serialize_point(p: &Self::Point) -> Vec<u8>;
    /// Decode a point, rejecting non-canonical encodings.
    fn deserialize_point(bytes: &[u8]) -> Result<Self::Point, ()>;
    /// Canonical encoding of a scalar.
    fn serialize_scalar(s: &Self::Scalar) -> Vec<u8>;
    /// Decode a scalar, rejecting non-reduced encodings.
    fn deserialize_scalar(bytes: &[u8]) -> Result<Self::Scalar, ()>;
    /// Computes \\( \sum_i s_i \cdot P_i \\). Variable time.
    fn pippenger_sum_of_products(points: &[Self::Point], scalars: &[Self::Scalar]) -> Self::Point;
}

/// Shared implementation for the short-Weierstrass curves of the
/// RustCrypto `elliptic-curve` family.
#[cfg(any(feature = "k256", feature = "p256"))]
macro_rules! impl_weierstrass_curve {
    ($krate:ident, $curve:ident, $dst:expr) => {
        impl HashToPoint for $krate::ProjectivePoint {
            type Point = $krate::ProjectivePoint;

            fn hash_to_point(m: &[u8]) -> Self::Point {
                use $krate::elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
                $krate::$curve::hash_from_bytes::<ExpandMsgXmd<sha2::Sha256>>(&[m], &[$dst])
                    .expect("DST is shorter than 256 bytes")
            }
        }

        impl PippengerScalar for $krate::Scalar {
            fn as_pippenger_scalar(&self) -> [u64; 4] {
                let s: $krate::elliptic_curve::ScalarPrimitive<$krate::$curve> = (*self).into();
                let mut out = [0u64; 4];
                for (o, limb) in out.iter_mut().zip(s.as_limbs().iter()) {
                    *o = limb.0 as u64;
                }
                out
            }
        }

        impl ScalarBatchInvert for $krate::Scalar {}

        impl BulletproofCurveArithmetic for $krate::$curve {
            const SCALAR_BYTES: usize = 32;
            const POINT_BYTES: usize = 33;

            type Scalar = $krate::Scalar;
            type Point = $krate::ProjectivePoint;

            fn serialize_point(p: &Self::Point) -> Vec<u8> {
                p.to_affine().to_bytes().to_vec()
            }

            fn deserialize_point(bytes: &[u8]) -> Result<Self::Point, ()> {
                use $krate::elliptic_curve::sec1::FromEncodedPoint;
                let encoded = $krate::EncodedPoint::from_bytes(bytes).map_err(|_| ())?;
                Option::<$krate::ProjectivePoint>::from(
                    $krate::ProjectivePoint::from_encoded_point(&encoded),
                )
                .ok_or(())
            }

            fn serialize_scalar(s: &Self::Scalar) -> Vec<u8> {
                s.to_bytes().to_vec()
            }

            fn deserialize_scalar(bytes: &[u8]) -> Result<Self::Scalar, ()> {
                if bytes.len() != Self::SCALAR_BYTES {
                    return Err(());
                }
                let repr = $krate::FieldBytes::clone_from_slice(bytes);
                Option::<$krate::Scalar>::from($krate::Scalar::from_repr(repr)).ok_or(())
            }

            fn pippenger_sum_of_products(
                points: &[Self::Point],
                scalars: &[Self::Scalar],
            ) -> Self::Point {
                sum_of_products_pippenger(points, scalars)
            }
        }
    };
}

#[cfg(feature = "k256")]
mod k256_impls {
    use super::*;
    use k256::{
        elliptic_curve::{bigint::U512, ops::Reduce},
        Scalar,
    };

    impl_weierstrass_curve!(k256, Secp256k1, b"secp256k1_XMD:SHA-256_SSWU_RO_");

    impl FromWideBytes for Scalar {
        fn from_wide_bytes(bytes: &[u8]) -> Self {
            let repr = k256::WideBytes::clone_from_slice(bytes);
            <Scalar as Reduce<U512>>::reduce_bytes(&repr)
        }
    }
}

#[cfg(feature = "p256")]
mod p256_impls {
    use super::*;
    use p256::{
        elliptic_curve::{bigint::U256, ops::Reduce},
        FieldBytes, Scalar,
    };

    impl_weierstrass_curve!(p256, NistP256, b"P256_XMD:SHA-256_SSWU_RO_");

    impl FromWideBytes for Scalar {
        // hi * 2^256 + lo, each half reduced on its own
        fn from_wide_bytes(bytes: &[u8]) -> Self {
            let hi = <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(&bytes[..32]));
            let lo = <Scalar as Reduce<U256>>::reduce_bytes(FieldBytes::from_slice(&bytes[32..]));
            let shift = Scalar::from(2u64).pow_vartime(&[256u64]);
            hi * shift + lo
        }
    }
}

#[cfg(feature = "bls12_381")]
mod bls12_381_impls {
    use super::*;
    use crate::util::{read32, read48};
    use bls12_381_plus::elliptic_curve::hash2curve::ExpandMsgXmd;
    use bls12_381_plus::{Bls12381G1, G1Affine, G1Projective, Scalar};

    const DST: &[u8] = b"BLS12381G1_XMD:SHA-256_SSWU_RO_";

    impl HashToPoint for G1Projective {
        type Point = Self;

        fn hash_to_point(m: &[u8]) -> Self::Point {
            G1Projective::hash::<ExpandMsgXmd<sha2::Sha256>>(m, DST)
        }
    }

    impl FromWideBytes for Scalar {
        fn from_wide_bytes(bytes: &[u8]) -> Self {
            let mut wide = [0u8; 64];
            wide.copy_from_slice(&bytes[..64]);
            Scalar::from_bytes_wide(&wide)
        }
    }

    impl ScalarBatchInvert for Scalar {}

    impl BulletproofCurveArithmetic for Bls12381G1 {
        const SCALAR_BYTES: usize = 32;
        const POINT_BYTES: usize = 48;

        type Scalar = Scalar;
        type Point = G1Projective;

        fn serialize_point(p: &Self::Point) -> Vec<u8> {
            p.to_bytes().as_ref().to_vec()
        }

        fn deserialize_point(bytes: &[u8]) -> Result<Self::Point, ()> {
            if bytes.len() != Self::POINT_BYTES {
                return Err(());
            }
            Option::<G1Projective>::from(
                G1Affine::from_compressed(&read48(bytes)).map(G1Projective::from),
            )
            .ok_or(())
        }

        fn serialize_scalar(s: &Self::Scalar) -> Vec<u8> {
            s.to_be_bytes().to_vec()
        }

        fn deserialize_scalar(bytes: &[u8]) -> Result<Self::Scalar, ()> {
            if bytes.len() != Self::SCALAR_BYTES {
                return Err(());
            }
            Option::<Scalar>::from(Scalar::from_be_bytes(&read32(bytes))).ok_or(())
        }

        fn pippenger_sum_of_products(
            points: &[Self::Point],
            scalars: &[Self::Scalar],
        ) -> Self::Point {
            G1Projective::sum_of_products(points, scalars)
        }
    }
}

#[cfg(feature = "curve25519")]
pub mod curve25519_impls {
    use super::*;
    use crate::util::read32;
    use vsss_rs::{
        curve25519::{WrappedRistretto, WrappedScalar},
        curve25519_dalek::{traits::MultiscalarMul, RistrettoPoint, Scalar},
    };

    impl HashToPoint for WrappedRistretto {
        type Point = WrappedRistretto;

        fn hash_to_point(m: &[u8]) -> Self::Point {
            RistrettoPoint::hash_from_bytes::<sha2::Sha512>(m).into()
        }
    }

    impl FromWideBytes for WrappedScalar {
        fn from_wide_bytes(bytes: &[u8]) -> Self {
            let mut wide = [0u8; 64];
            wide.copy_from_slice(&bytes[..64]);
            Scalar::from_bytes_mod_order_wide(&wide).into()
        }
    }

    impl ScalarBatchInvert for WrappedScalar {}

    /// Marker type selecting the Ristretto group over Curve25519.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Curve25519;

    impl BulletproofCurveArithmetic for Curve25519 {
        const SCALAR_BYTES: usize = 32;
        const POINT_BYTES: usize = 32;

        type Scalar = WrappedScalar;
        type Point = WrappedRistretto;

        fn serialize_point(p: &Self::Point) -> Vec<u8> {
            p.to_bytes().to_vec()
        }

        fn deserialize_point(bytes: &[u8]) -> Result<Self::Point, ()> {
            if bytes.len() != Self::POINT_BYTES {
                return Err(());
            }
            Option::<WrappedRistretto>::from(WrappedRistretto::from_bytes(&read32(bytes)))
                .ok_or(())
        }

        fn serialize_scalar(s: &Self::Scalar) -> Vec<u8> {
            s.0.to_bytes().to_vec()
        }

        fn deserialize_scalar(bytes: &[u8]) -> Result<Self::Scalar, ()> {
            if bytes.len() != Self::SCALAR_BYTES {
                return Err(());
            }
            Option::<WrappedScalar>::from(WrappedScalar::from_repr(read32(bytes))).ok_or(())
        }

        fn pippenger_sum_of_products(
            points: &[Self::Point],
            scalars: &[Self::Scalar],
        ) -> Self::Point {
            let scalars = scalars.iter().map(|s| s.0);
            let points = points.iter().map(|p| p.0);
            RistrettoPoint::multiscalar_mul(scalars, points).into()
        }
    }
}

/// Bucket-method multiscalar multiplication over 4-bit windows,
/// scanning the scalars from the most significant window down.
#[cfg(any(feature = "k256", feature = "p256"))]
fn sum_of_products_pippenger<P, S>(points: &[P], scalars: &[S]) -> P
where
    P: Group<Scalar = S> + GroupEncoding + Default + ConditionallySelectable,
    S: PippengerScalar,
{
    const WINDOW: usize = 4;
    const NUM_BUCKETS: usize = 1 << WINDOW;
    const WINDOWS: usize = 256 / WINDOW;

    let limbs: Vec<[u64; 4]> = scalars.iter().map(|s| s.as_pippenger_scalar()).collect();
    let num_components = core::cmp::min(points.len(), limbs.len());

    // Windows never straddle a limb boundary since 64 is a multiple of WINDOW.
    let digit = |limbs: &[u64; 4], window: usize| -> usize {
        let bit = window * WINDOW;
        ((limbs[bit / 64] >> (bit % 64)) & (NUM_BUCKETS as u64 - 1)) as usize
    };

    let mut res = P::identity();
    for window in (0..WINDOWS).rev() {
        for _ in 0..WINDOW {
            res = res.double();
        }

        let mut buckets = [P::identity(); NUM_BUCKETS];
        for i in 0..num_components {
            let d = digit(&limbs[i], window);
            if d != 0 {
                buckets[d] += points[i];
            }
        }

        // sum_{d} d * bucket[d] via running sums
        let mut running = P::identity();
        let mut window_sum = P::identity();
        for bucket in buckets[1..].iter().rev() {
            running += bucket;
            window_sum += running;
        }
        res += window_sum;
    }
    res
}
