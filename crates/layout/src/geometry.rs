use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 2D vector with f64 coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a zero vector
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Return the sum of x and y components
    pub fn sum(self) -> f64 {
        self.x + self.y
    }

    /// Return the Euclidean length
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Return the vector scaled to unit length, or zero for a zero vector
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > f64::EPSILON {
            Self::new(self.x / len, self.y / len)
        } else {
            Self::zero()
        }
    }

    /// Clamp the length to `max`, preserving direction
    pub fn clamped(self, max: f64) -> Self {
        let len = self.length();
        if len > max {
            self * (max / len)
        } else {
            self
        }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn length_and_normalization() {
        let v = Vec2::new(3.0, 4.0);
        assert!(approx_eq!(f64, v.length(), 5.0));
        assert!(approx_eq!(f64, v.normalized().length(), 1.0));
        assert_eq!(Vec2::zero().normalized(), Vec2::zero());
    }

    #[test]
    fn clamping_preserves_direction() {
        let v = Vec2::new(6.0, 8.0).clamped(5.0);
        assert!(approx_eq!(f64, v.length(), 5.0));
        assert!(approx_eq!(f64, v.x, 3.0));
        assert!(approx_eq!(f64, v.y, 4.0));

        let short = Vec2::new(1.0, 0.0);
        assert_eq!(short.clamped(5.0), short);
    }
}
