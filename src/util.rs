#![deny(missing_docs)]
#![allow(non_snake_case)]

extern crate alloc;

use crate::errors::ProofError;
use crate::BulletproofCurveArithmetic;
use alloc::vec::Vec;
use group::ff::Field;
use zeroize::Zeroize;

use crate::inner_product_proof::inner_product;

/// Represents a degree-1 vector polynomial \\(\mathbf{a} + \mathbf{b} \cdot x\\).
pub struct VecPoly1<C: BulletproofCurveArithmetic>(pub Vec<C::Scalar>, pub Vec<C::Scalar>);

/// Represents a degree-2 scalar polynomial \\(a + b \cdot x + c \cdot x^2\\)
pub struct Poly2<C: BulletproofCurveArithmetic>(pub C::Scalar, pub C::Scalar, pub C::Scalar);

/// Provides an iterator over the powers of a `Scalar`.
///
/// This struct is created by the `exp_iter` function.
pub struct ScalarExp<C: BulletproofCurveArithmetic> {
    x: C::Scalar,
    next_exp_x: C::Scalar,
}

impl<C: BulletproofCurveArithmetic> Iterator for ScalarExp<C> {
    type Item = C::Scalar;

    fn next(&mut self) -> Option<C::Scalar> {
        let exp_x = self.next_exp_x;
        self.next_exp_x *= self.x;
        Some(exp_x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Return an iterator of the powers of `x`.
pub fn exp_iter<C: BulletproofCurveArithmetic>(x: C::Scalar) -> ScalarExp<C> {
    let next_exp_x = C::Scalar::ONE;
    ScalarExp { x, next_exp_x }
}

/// The power vector \\([1, x, x^2, \dots, x^{n-1}]\\).
pub fn powers<C: BulletproofCurveArithmetic>(x: C::Scalar, n: usize) -> Vec<C::Scalar> {
    exp_iter::<C>(x).take(n).collect()
}

/// Component-wise \\(\mathbf{a} + \mathbf{b}\\).
pub fn add_vec<C: BulletproofCurveArithmetic>(a: &[C::Scalar], b: &[C::Scalar]) -> Vec<C::Scalar> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a_i, b_i)| *a_i + b_i).collect()
}

/// Component-wise \\(\mathbf{a} - \mathbf{b}\\).
pub fn sub_vec<C: BulletproofCurveArithmetic>(a: &[C::Scalar], b: &[C::Scalar]) -> Vec<C::Scalar> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a_i, b_i)| *a_i - b_i).collect()
}

/// Hadamard product \\(\mathbf{a} \circ \mathbf{b}\\).
pub fn hadamard<C: BulletproofCurveArithmetic>(a: &[C::Scalar], b: &[C::Scalar]) -> Vec<C::Scalar> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a_i, b_i)| *a_i * b_i).collect()
}

/// Scalar-vector product \\(k \cdot \mathbf{a}\\).
pub fn scalar_mul_vec<C: BulletproofCurveArithmetic>(a: &[C::Scalar], k: &C::Scalar) -> Vec<C::Scalar> {
    a.iter().map(|a_i| *a_i * k).collect()
}

/// Decomposes `v` into its `n` low bits, least significant first.
///
/// Fails with [`ProofError::ValueOutOfRange`] if \\(v \geq 2^n\\).
pub fn bit_decompose<C: BulletproofCurveArithmetic>(
    v: u64,
    n: usize,
) -> Result<Vec<C::Scalar>, ProofError> {
    if n < 64 && (v >> n) != 0 {
        return Err(ProofError::ValueOutOfRange);
    }
    Ok((0..n)
        .map(|i| C::Scalar::from((v >> i) & 1))
        .collect())
}

/// The complement \\(\mathbf{a}\_R = \mathbf{a}\_L - \mathbf{1}^n\\) of a bit vector.
pub fn complement<C: BulletproofCurveArithmetic>(a_L: &[C::Scalar]) -> Vec<C::Scalar> {
    a_L.iter().map(|a_i| *a_i - C::Scalar::ONE).collect()
}

/// Rescales each point by the matching factor, \\(P\_i' = f\_i \cdot P\_i\\).
pub fn scale_points<C: BulletproofCurveArithmetic>(
    points: &[C::Point],
    factors: impl Iterator<Item = C::Scalar>,
) -> Vec<C::Point> {
    points.iter().zip(factors).map(|(p, f)| *p * f).collect()
}

impl<C: BulletproofCurveArithmetic> VecPoly1<C> {
    /// Coefficients of \\(\langle \mathbf{l}(x), \mathbf{r}(x) \rangle\\).
    pub fn inner_product(&self, rhs: &VecPoly1<C>) -> Poly2<C> {
        // Uses Karatsuba's method
        let l = self;
        let r = rhs;

        let t0 = inner_product::<C>(&l.0, &r.0);
        let t2 = inner_product::<C>(&l.1, &r.1);

        let l0_plus_l1 = add_vec::<C>(&l.0, &l.1);
        let r0_plus_r1 = add_vec::<C>(&r.0, &r.1);

        let t1 = inner_product::<C>(&l0_plus_l1, &r0_plus_r1) - t0 - t2;

        Poly2(t0, t1, t2)
    }

    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: C::Scalar) -> Vec<C::Scalar> {
        self.0
            .iter()
            .zip(self.1.iter())
            .map(|(a_i, b_i)| *a_i + *b_i * x)
            .collect()
    }
}

impl<C: BulletproofCurveArithmetic> Poly2<C> {
    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: C::Scalar) -> C::Scalar {
        self.0 + x * (self.1 + x * self.2)
    }
}

impl<C: BulletproofCurveArithmetic> Drop for VecPoly1<C> {
    fn drop(&mut self) {
        for e in self.0.iter_mut() {
            e.zeroize();
        }
        for e in self.1.iter_mut() {
            e.zeroize();
        }
    }
}

impl<C: BulletproofCurveArithmetic> Drop for Poly2<C> {
    fn drop(&mut self) {
        self.0.zeroize();
        self.1.zeroize();
        self.2.zeroize();
    }
}

/// Takes the sum of all the powers of `x`, up to `n`
/// If `n` is a power of 2, it uses the efficient algorithm with `2*lg n` multiplications and additions.
/// If `n` is not a power of 2, it uses the slow algorithm with `n` multiplications and additions.
/// In the Bulletproofs case, all calls to `sum_of_powers` should have `n` as a power of 2.
pub fn sum_of_powers<C: BulletproofCurveArithmetic>(x: &C::Scalar, n: usize) -> C::Scalar {
    if !n.is_power_of_two() {
        return sum_of_powers_slow::<C>(x, n);
    }
    if n == 1 {
        return C::Scalar::ONE;
    }
    let mut m = n;
    let mut result = C::Scalar::ONE + x;
    let mut factor = *x;
    while m > 2 {
        factor = factor * factor;
        result = result + factor * result;
        m /= 2;
    }
    result
}

// takes the sum of all of the powers of x, up to n
fn sum_of_powers_slow<C: BulletproofCurveArithmetic>(x: &C::Scalar, n: usize) -> C::Scalar {
    exp_iter::<C>(*x).take(n).sum()
}

#[cfg(any(feature = "bls12_381", feature = "curve25519"))]
/// Given `data` with `len >= 32`, return the first 32 bytes.
pub fn read32(data: &[u8]) -> [u8; 32] {
    let mut buf32 = [0u8; 32];
    buf32[..].copy_from_slice(&data[..32]);
    buf32
}

#[cfg(feature = "bls12_381")]
/// Given `data` with `len >= 48`, return the first 48 bytes.
pub fn read48(data: &[u8]) -> [u8; 48] {
    let mut buf48 = [0u8; 48];
    buf48.copy_from_slice(&data[..48]);
    buf48
}
