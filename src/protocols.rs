pub mod brng;
pub mod opener;
pub mod rkpg;
pub mod rng;
pub mod table;

#[cfg(test)]
pub mod helpers;

use crate::crypto::{
	secp256k1::{Point, Scalar},
	vss,
};

/// Parameters shared by every state machine of one protocol instance.
/// The generators are protocol inputs and are carried explicitly rather
/// than living in any global state.
#[derive(Clone, Debug)]
pub struct Parameters {
	indices: Vec<Scalar>,
	own_index: Scalar,
	h: Point,
}

impl Parameters {
	/// Panics unless the indices are distinct, `own_index` is one of
	/// them and `h` passes the Pedersen parameter sanity check.
	pub fn new(indices: Vec<Scalar>, own_index: Scalar, h: Point) -> Self {
		assert!(
			vss::h_is_safe(&h),
			"the pedersen parameter must not be the identity or the base generator"
		);
		assert!(
			indices
				.iter()
				.enumerate()
				.all(|(i, index)| !indices[..i].contains(index)),
			"indices must be distinct"
		);
		assert!(indices.contains(&own_index), "own index must be one of the indices");

		Parameters { indices, own_index, h }
	}

	pub fn indices(&self) -> &[Scalar] {
		&self.indices
	}

	pub fn own_index(&self) -> &Scalar {
		&self.own_index
	}

	pub fn h(&self) -> &Point {
		&self.h
	}

	pub fn share_count(&self) -> usize {
		self.indices.len()
	}
}
