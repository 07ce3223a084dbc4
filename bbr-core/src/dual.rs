use nalgebra::{Const, SMatrix, U1, U4};
use num_dual::{Derivative, DualNum, DualSVec64};

/// Dual number carrying the partial derivatives w.r.t. one box's 4 corner coordinates (`l, t, r, b`).
///
/// Box losses only couple a predicted box with its own target, so a batch gradient is the concatenation of
/// per-box 4-vectors; a statically-sized dual keeps each of those evaluations on the stack.
pub type D4 = DualSVec64<4>;
pub type D4D = Derivative<f64, f64, Const<4>, Const<1>>;

pub fn d4d(d: [f64; 4]) -> D4D {
    D4D::new(Some(SMatrix::from(d)))
}

pub fn d4(v: f64, d: [f64; 4]) -> D4 {
    D4::new(v, d4d(d))
}

/// Seed coordinate `idx` of a box: value `v`, derivative `e_idx`.
pub fn one_hot(v: f64, idx: usize) -> D4 {
    let mut d = [0.; 4];
    d[idx] = 1.;
    d4(v, d)
}

pub fn grad(x: &D4) -> [f64; 4] {
    x.eps.unwrap_generic(U4, U1).into()
}

/// Lift an `f64` into any dual type (zero derivative).
pub fn constant<D: DualNum<f64>>(v: f64) -> D {
    D::one() * v
}

/// Drop the derivative part, keeping the value (`tensor.detach()`).
pub fn detach<D: DualNum<f64>>(x: &D) -> D {
    constant(x.re())
}

pub fn max<D: PartialOrd>(a: D, b: D) -> D {
    if a >= b { a } else { b }
}

pub fn min<D: PartialOrd>(a: D, b: D) -> D {
    if a <= b { a } else { b }
}

/// `max(x, 0)`, passing the gradient through only on the positive side.
pub fn relu<D: DualNum<f64> + PartialOrd>(x: D) -> D {
    if x.re() > 0. { x } else { D::zero() }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use super::*;
    use test_log::test;

    #[test]
    fn test_one_hot() {
        let x = one_hot(2.5, 2);
        assert_eq!(x.re, 2.5);
        assert_eq!(grad(&x), [0., 0., 1., 0.]);
    }

    #[test]
    fn test_mul_grad() {
        // d/dl (l * r) = r, d/dr (l * r) = l
        let l = one_hot(2., 0);
        let r = one_hot(3., 2);
        let p = l * r;
        assert_eq!(p.re, 6.);
        assert_eq!(grad(&p), [3., 0., 2., 0.]);
    }

    #[test]
    fn test_constant_and_detach() {
        let c: D4 = constant(4.);
        assert_eq!(c.re, 4.);
        assert_eq!(grad(&c), [0.; 4]);

        let x = one_hot(1.5, 1) * 2.;
        let dx = detach(&x);
        assert_eq!(dx.re, 3.);
        assert_eq!(grad(&dx), [0.; 4]);

        let f: f64 = constant(1.25);
        assert_eq!(f, 1.25);
    }

    #[test]
    fn test_extrema() {
        let a = one_hot(1., 0);
        let b = one_hot(2., 1);
        assert_eq!(grad(&max(a, b)), [0., 1., 0., 0.]);
        assert_eq!(grad(&min(a, b)), [1., 0., 0., 0.]);
        assert_eq!(max(1., 2.), 2.);
        assert_eq!(min(1., 2.), 1.);
    }

    #[test]
    fn test_relu() {
        let pos = relu(one_hot(0.5, 3));
        assert_eq!(pos.re, 0.5);
        assert_eq!(grad(&pos), [0., 0., 0., 1.]);

        let neg = relu(one_hot(-0.5, 3));
        assert_eq!(neg.re, 0.);
        assert_eq!(grad(&neg), [0.; 4]);
    }

    #[test]
    fn test_exp_atan() {
        // d/dx e^x = e^x, d/dx atan(x) = 1/(1+x²)
        let x = one_hot(1., 0);
        let e = x.exp();
        assert_relative_eq!(e.re, 1f64.exp());
        assert_relative_eq!(grad(&e)[0], 1f64.exp());
        let a = x.atan();
        assert_relative_eq!(a.re, std::f64::consts::FRAC_PI_4);
        assert_relative_eq!(grad(&a)[0], 0.5);
    }
}
