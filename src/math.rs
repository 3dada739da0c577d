use std::{
    array,
    ops::{Add, Mul, Sub},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Vec<T, const N: usize>([T; N]);

impl<const N: usize> Vec<f32, N> {
    pub fn dist(self, other: Self) -> f32 {
        let mut sum = 0.0;
        for (&a, &b) in self.0.iter().zip(&other.0) {
            let diff = b - a;
            sum += diff * diff;
        }
        sum.sqrt()
    }

    pub fn dot(self, other: Self) -> f32 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }
}

impl<T: Copy> Vec<T, 2> {
    pub fn x(self) -> T {
        self.0[0]
    }

    pub fn y(self) -> T {
        self.0[1]
    }
}

pub type Vec2<T> = Vec<T, 2>;
pub type Vec2f = Vec2<f32>;
/// A point in frame pixel coordinates.
pub type Vec2i = Vec2<i32>;

impl Vec2i {
    pub fn as_f32(self) -> Vec2f {
        vec2(self.0[0] as f32, self.0[1] as f32)
    }
}

impl Vec2f {
    /// Truncates towards zero, the same way landmark positions are snapped to pixels.
    pub fn as_i32(self) -> Vec2i {
        vec2(self.0[0] as i32, self.0[1] as i32)
    }
}

impl<T, const N: usize> Add<Vec<T, N>> for Vec<T, N>
where
    T: Add<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn add(self, rhs: Vec<T, N>) -> Self::Output {
        Vec(array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<T, const N: usize> Sub<Vec<T, N>> for Vec<T, N>
where
    T: Sub<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn sub(self, rhs: Vec<T, N>) -> Self::Output {
        Vec(array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl<T, const N: usize> Mul<T> for Vec<T, N>
where
    T: Mul<Output = T> + Copy,
{
    type Output = Vec<T, N>;

    fn mul(self, rhs: T) -> Self::Output {
        Vec(array::from_fn(|i| self.0[i] * rhs))
    }
}

pub fn vec2<T>(x: T, y: T) -> Vec2<T> {
    Vec([x, y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(vec2(0.0, 0.0).dist(vec2(3.0, 4.0)), 5.0);
        assert_eq!(vec2(1.0, 1.0).dist(vec2(1.0, 1.0)), 0.0);
    }

    #[test]
    fn truncates_to_pixels() {
        assert_eq!(vec2(10.9f32, 3.2).as_i32(), vec2(10, 3));
        assert_eq!(vec2(7, -2).as_f32(), vec2(7.0, -2.0));
    }
}
