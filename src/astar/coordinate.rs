//! Fixed precision positions. Every node position, distance and edge cost
//! is derived from [Int3] so that results are identical between runs and
//! don't degrade far from the origin
//!

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bevy::prelude::*;

/// Number of [Int3] units that make up one world unit
pub const INT3_PRECISION: i32 = 100;
/// [INT3_PRECISION] as a float for conversions
pub const INT3_PRECISION_F32: f32 = INT3_PRECISION as f32;

/// A position in space stored as three integers where `100` units equal one
/// world unit
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct Int3 {
	/// x component
	pub x: i32,
	/// y component
	pub y: i32,
	/// z component
	pub z: i32,
}

impl Int3 {
	/// The origin
	pub const ZERO: Int3 = Int3 { x: 0, y: 0, z: 0 };
	/// Create a new instance of [Int3] from raw fixed precision components
	pub const fn new(x: i32, y: i32, z: i32) -> Self {
		Int3 { x, y, z }
	}
	/// Convert a world-space position into fixed precision, each axis is
	/// rounded to the nearest unit
	pub fn from_vec3(position: Vec3) -> Self {
		Int3 {
			x: (position.x * INT3_PRECISION_F32).round() as i32,
			y: (position.y * INT3_PRECISION_F32).round() as i32,
			z: (position.z * INT3_PRECISION_F32).round() as i32,
		}
	}
	/// Convert back into a world-space position
	pub fn to_vec3(self) -> Vec3 {
		Vec3::new(
			self.x as f32 / INT3_PRECISION_F32,
			self.y as f32 / INT3_PRECISION_F32,
			self.z as f32 / INT3_PRECISION_F32,
		)
	}
	/// Squared length, widened so that it cannot overflow
	pub fn sqr_magnitude(self) -> i64 {
		let x = self.x as i64;
		let y = self.y as i64;
		let z = self.z as i64;
		x * x + y * y + z * z
	}
	/// Euclidean length in fixed precision units. The square root is taken in
	/// double precision
	pub fn magnitude(self) -> f32 {
		(self.sqr_magnitude() as f64).sqrt() as f32
	}
	/// The canonical edge cost unit, the [Int3::magnitude] rounded to the
	/// nearest integer
	pub fn cost_magnitude(self) -> u32 {
		(self.sqr_magnitude() as f64).sqrt().round() as u32
	}
	/// Length in the XZ plane
	pub fn magnitude_xz(self) -> f32 {
		let x = self.x as f64;
		let z = self.z as f64;
		(x * x + z * z).sqrt() as f32
	}
	/// Scale each component by a float factor, rounding the result
	pub fn scale(self, factor: f32) -> Self {
		Int3 {
			x: (self.x as f32 * factor).round() as i32,
			y: (self.y as f32 * factor).round() as i32,
			z: (self.z as f32 * factor).round() as i32,
		}
	}
	/// Component-wise absolute value
	pub fn abs(self) -> Self {
		Int3 {
			x: self.x.abs(),
			y: self.y.abs(),
			z: self.z.abs(),
		}
	}
}

impl From<Vec3> for Int3 {
	fn from(value: Vec3) -> Self {
		Int3::from_vec3(value)
	}
}

impl From<Int3> for Vec3 {
	fn from(value: Int3) -> Self {
		value.to_vec3()
	}
}

impl Add for Int3 {
	type Output = Int3;
	fn add(self, rhs: Int3) -> Int3 {
		Int3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl AddAssign for Int3 {
	fn add_assign(&mut self, rhs: Int3) {
		*self = *self + rhs;
	}
}

impl Sub for Int3 {
	type Output = Int3;
	fn sub(self, rhs: Int3) -> Int3 {
		Int3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl SubAssign for Int3 {
	fn sub_assign(&mut self, rhs: Int3) {
		*self = *self - rhs;
	}
}

impl Mul<i32> for Int3 {
	type Output = Int3;
	fn mul(self, rhs: i32) -> Int3 {
		Int3::new(self.x * rhs, self.y * rhs, self.z * rhs)
	}
}

impl Div<i32> for Int3 {
	type Output = Int3;
	fn div(self, rhs: i32) -> Int3 {
		Int3::new(self.x / rhs, self.y / rhs, self.z / rhs)
	}
}

impl Neg for Int3 {
	type Output = Int3;
	fn neg(self) -> Int3 {
		Int3::new(-self.x, -self.y, -self.z)
	}
}

impl std::fmt::Display for Int3 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}, {}, {})", self.x, self.y, self.z)
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn from_world_rounds_each_axis() {
		let p = Int3::from_vec3(Vec3::new(1.004, -0.506, 2.5));
		assert_eq!(Int3::new(100, -51, 250), p);
	}
	#[test]
	fn diagonal_cost_magnitude() {
		let a = Int3::from_vec3(Vec3::new(0.0, 0.0, 0.0));
		let b = Int3::from_vec3(Vec3::new(1.0, 0.0, 1.0));
		assert_eq!(141, (b - a).cost_magnitude());
	}
	#[test]
	fn cost_magnitude_rounds_to_nearest() {
		// sqrt(0.5^2 + 0.5^2) * 100 = 70.71
		assert_eq!(150, Int3::new(150, 0, 0).cost_magnitude());
		assert_eq!(71, Int3::new(50, 0, 50).cost_magnitude());
	}
	#[test]
	fn cost_magnitude_is_stable() {
		let a = Int3::new(-1234, 77, 98421);
		let b = Int3::new(5521, -3, -20011);
		let first = (a - b).cost_magnitude();
		for _ in 0..100 {
			assert_eq!(first, (a - b).cost_magnitude());
		}
	}
	#[test]
	fn magnitude_far_from_origin_does_not_overflow() {
		let p = Int3::new(i32::MAX, i32::MAX, 0);
		let expected = ((i32::MAX as f64) * 2.0_f64.sqrt()) as f32;
		assert!((expected - p.magnitude()).abs() <= 256.0);
	}
	#[test]
	fn round_trip_world_position() {
		let v = Vec3::new(3.25, 1.0, -7.5);
		assert_eq!(v, Int3::from_vec3(v).to_vec3());
	}
	#[test]
	fn arithmetic() {
		let a = Int3::new(1, 2, 3);
		let b = Int3::new(10, 20, 30);
		assert_eq!(Int3::new(11, 22, 33), a + b);
		assert_eq!(Int3::new(9, 18, 27), b - a);
		assert_eq!(Int3::new(2, 4, 6), a * 2);
		assert_eq!(Int3::new(5, 10, 15), b / 2);
		assert_eq!(Int3::new(-1, -2, -3), -a);
		assert_eq!(Int3::new(15, 30, 45), b.scale(1.5));
	}
}
