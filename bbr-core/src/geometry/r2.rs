use std::{ops::{Sub, Mul, Add}, fmt::{Display, Formatter, self}};

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct R2<D> {
    pub x: D,
    pub y: D,
}

impl<D: Display> Display for R2<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl R2<f64> {
    pub fn polar(rho: f64, theta: f64) -> Self {
        R2 { x: rho * theta.cos(), y: rho * theta.sin() }
    }
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
    pub fn distance(&self, o: &R2<f64>) -> f64 {
        (*self - *o).norm()
    }
}

impl<D: Add<Output = D>> Add for R2<D> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        R2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<D: Sub<Output = D>> Sub for R2<D> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        R2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<D: Mul<D, Output = D> + Clone> Mul<D> for R2<D> {
    type Output = Self;
    fn mul(self, rhs: D) -> Self::Output {
        R2 {
            x: self.x * rhs.clone(),
            y: self.y * rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use super::*;
    use test_log::test;

    #[test]
    fn test_polar() {
        let p = R2::polar(2., FRAC_PI_2);
        assert_relative_eq!(p.x, 0., epsilon = 1e-15);
        assert_relative_eq!(p.y, 2.);
        assert_relative_eq!(p.norm(), 2.);
    }

    #[test]
    fn test_ops() {
        let a = R2 { x: 1., y: 2. };
        let b = R2 { x: 0.5, y: -1. };
        assert_eq!(a + b, R2 { x: 1.5, y: 1. });
        assert_eq!(a - b, R2 { x: 0.5, y: 3. });
        assert_eq!(a * 2., R2 { x: 2., y: 4. });
        assert_relative_eq!(a.distance(&b), (0.25f64 + 9.).sqrt());
    }
}
