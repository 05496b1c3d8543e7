//! Pedersen-verifiable secret sharing over secp256k1.
//!
//! A secret is shared with two degree `k-1` polynomials: `f` carries the
//! secret in its constant term and `g` hides it. The published commitment
//! commits to both coefficient lists at once (`f_l·G + g_l·H`), so a share
//! `(f(x), g(x))` can be checked against the commitment evaluated at `x`
//! without revealing anything about the secret.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::{
	secp256k1::{Point, Scalar},
	Rng,
};

/// Evaluate polynomial f(x) = c0 + c1 * x + c2 * x^2 + ... (expressed as
/// an iterator over its coefficients [c0, c1, c2, ...]) at x = at
pub(crate) fn evaluate_polynomial<'a, T, I>(coefficients: I, at: &Scalar) -> T
where
	T: 'a + Clone,
	T: std::ops::Mul<Scalar, Output = T>,
	T: std::ops::Add<T, Output = T>,
	I: DoubleEndedIterator<Item = &'a T>,
{
	coefficients
		.rev()
		.cloned()
		.reduce(|acc, coefficient| acc * at.clone() + coefficient)
		.unwrap()
}

/// Evaluation of a sharing polynomial at a given index
#[derive(Debug, Clone, Deserialize, Serialize, Zeroize, PartialOrd, Ord, PartialEq, Eq)]
pub struct Share {
	/// the evaluation point
	pub index: Scalar,
	/// the result of polynomial evaluation
	pub value: Scalar,
}

/// A share together with the evaluation of the hiding polynomial at the
/// same index
#[derive(Debug, Clone, Deserialize, Serialize, Zeroize, PartialOrd, Ord, PartialEq, Eq)]
pub struct VerifiableShare {
	pub share: Share,
	pub decommitment: Scalar,
}

impl std::ops::Add for &VerifiableShare {
	type Output = VerifiableShare;

	fn add(self, rhs: Self) -> Self::Output {
		debug_assert!(self.share.index == rhs.share.index);
		VerifiableShare {
			share: Share {
				index: self.share.index.clone(),
				value: &self.share.value + &rhs.share.value,
			},
			decommitment: &self.decommitment + &rhs.decommitment,
		}
	}
}

impl VerifiableShare {
	/// Scale the value and decommitment, keeping the index
	pub fn scale(&self, scalar: &Scalar) -> VerifiableShare {
		VerifiableShare {
			share: Share { index: self.share.index.clone(), value: &self.share.value * scalar },
			decommitment: &self.decommitment * scalar,
		}
	}
}

/// Commitments to the coefficients of a sharing polynomial ("the
/// polynomial in the exponent"); its length is the sharing threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq)]
pub struct Commitment(Vec<Point>);

impl Commitment {
	pub fn new(coefficients: Vec<Point>) -> Self {
		Commitment(coefficients)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn coefficients(&self) -> &[Point] {
		&self.0
	}

	pub fn evaluate(&self, at: &Scalar) -> Point {
		evaluate_polynomial(self.0.iter(), at)
	}

	pub fn scale(&self, scalar: &Scalar) -> Commitment {
		Commitment(self.0.iter().map(|point| *point * scalar).collect())
	}
}

impl std::ops::Add for &Commitment {
	type Output = Commitment;

	fn add(self, rhs: Self) -> Self::Output {
		assert_eq!(self.0.len(), rhs.0.len(), "commitment lengths must match");
		Commitment(self.0.iter().zip(&rhs.0).map(|(a, b)| *a + *b).collect())
	}
}

/// A complete verifiable sharing: one share per index plus the commitment
/// they all validate against
#[derive(Debug, Clone, Serialize, Deserialize, PartialOrd, Ord, PartialEq, Eq)]
pub struct Sharing {
	pub vshares: Vec<VerifiableShare>,
	pub commitment: Commitment,
}

/// Deal a Pedersen-verifiable sharing of `secret` with threshold `k` at
/// the given evaluation indices. Also returns the decommitment of the
/// secret (the hiding polynomial at zero), which the dealer may discard.
pub fn share_secret(
	rng: &mut Rng,
	secret: &Scalar,
	indices: &[Scalar],
	k: usize,
	h: &Point,
) -> (Sharing, Scalar) {
	assert!(k >= 1, "threshold must be at least 1");
	assert!(k <= indices.len(), "threshold cannot exceed the number of indices");

	let value_coefficients: Vec<Scalar> =
		std::iter::once(secret.clone()).chain((1..k).map(|_| Scalar::random(rng))).collect();
	let hiding_coefficients: Vec<Scalar> = (0..k).map(|_| Scalar::random(rng)).collect();

	let commitment = Commitment(
		value_coefficients
			.iter()
			.zip(&hiding_coefficients)
			.map(|(f, g)| Point::from_scalar(f) + *h * g)
			.collect(),
	);

	let vshares = indices
		.iter()
		.map(|index| VerifiableShare {
			share: Share {
				index: index.clone(),
				value: evaluate_polynomial(value_coefficients.iter(), index),
			},
			decommitment: evaluate_polynomial(hiding_coefficients.iter(), index),
		})
		.collect();

	let decommitment = hiding_coefficients[0].clone();

	// Coefficients are zeroized on drop here
	(Sharing { vshares, commitment }, decommitment)
}

/// Check a share against a commitment:
/// `value·G + decommitment·H == commitment(index)`
pub fn vshare_is_valid(h: &Point, commitment: &Commitment, vshare: &VerifiableShare) -> bool {
	Point::from_scalar(&vshare.share.value) + *h * &vshare.decommitment ==
		commitment.evaluate(&vshare.share.index)
}

/// Generate a lagrange coefficient for the given evaluation point
pub fn lagrange_coefficient_at_zero(index: &Scalar, all_indices: &[Scalar]) -> Scalar {
	let mut num = Scalar::from(1);
	let mut den = Scalar::from(1);

	for j in all_indices {
		if j == index {
			continue
		}

		num = &num * j;
		den = &den * &(j - index);
	}

	&num * &den.invert().expect(
		"Should not be possible to get a zero scalar
			because all indices are distinct",
	)
}

/// Reconstruct the shared secret from the given shares. The caller is
/// responsible for providing at least threshold many shares with
/// distinct indices.
pub fn interpolate_shares_at_zero<'a, I>(shares: I) -> Scalar
where
	I: Iterator<Item = &'a Share> + Clone,
{
	let all_indices: Vec<Scalar> = shares.clone().map(|share| share.index.clone()).collect();

	shares.fold(Scalar::zero(), |acc, share| {
		acc + lagrange_coefficient_at_zero(&share.index, &all_indices) * &share.value
	})
}

/// Reconstruct the shared secret and its decommitment at once, using the
/// same index set for both coordinates
pub fn interpolate_vshares_at_zero<'a, I>(vshares: I) -> (Scalar, Scalar)
where
	I: Iterator<Item = &'a VerifiableShare> + Clone,
{
	let all_indices: Vec<Scalar> = vshares.clone().map(|vshare| vshare.share.index.clone()).collect();

	vshares.fold((Scalar::zero(), Scalar::zero()), |(secret, decommitment), vshare| {
		let coefficient = lagrange_coefficient_at_zero(&vshare.share.index, &all_indices);
		(
			secret + &coefficient * &vshare.share.value,
			decommitment + coefficient * &vshare.decommitment,
		)
	})
}

/// Evaluate a polynomial whose coefficients are whole commitments
/// (point-wise Horner). All commitments must have the same length.
pub fn share_commitment(at: &Scalar, commitments: &[Commitment]) -> Commitment {
	assert!(!commitments.is_empty(), "coefficient list must not be empty");
	debug_assert!(commitments.iter().map(Commitment::len).all_equal());

	let mut acc = commitments.last().expect("checked non-empty").clone();
	for commitment in commitments.iter().rev().skip(1) {
		acc = &acc.scale(at) + commitment;
	}
	acc
}

/// Evaluate a polynomial whose coefficients are verifiable shares, all at
/// the same index. The result keeps that index: it is the coefficient
/// owner's share of the evaluated polynomial.
pub fn share_of_share(at: &Scalar, coefficients: &[VerifiableShare]) -> VerifiableShare {
	assert!(!coefficients.is_empty(), "coefficient list must not be empty");
	debug_assert!(coefficients.iter().map(|vshare| &vshare.share.index).all_equal());

	let mut value = Scalar::zero();
	let mut decommitment = Scalar::zero();
	for vshare in coefficients.iter().rev() {
		value = &value * at + &vshare.share.value;
		decommitment = &decommitment * at + &vshare.decommitment;
	}

	VerifiableShare {
		share: Share { index: coefficients[0].share.index.clone(), value },
		decommitment,
	}
}

/// Sanity check on the Pedersen parameter: it must not be the identity
/// and must not equal the base generator. This does not prove that its
/// discrete log is unknown.
pub fn h_is_safe(h: &Point) -> bool {
	!h.is_point_at_infinity() && h != &Point::generator()
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;

	use super::*;

	#[test]
	fn test_simple_polynomial() {
		// f(x) = 4 + 5x + 2x^2
		let coefficients = [Scalar::from(4), Scalar::from(5), Scalar::from(2)];

		// f(3) = 4 + 15 + 18 = 37
		let value: Scalar = evaluate_polynomial(coefficients.iter(), &Scalar::from(3));
		assert_eq!(value, Scalar::from(37));
	}

	#[test]
	fn lagrange_coeff_with_one_party() {
		// Just a sanity check that the lagrange coefficient
		// is 1 when there is only one party
		let index = Scalar::from(42);
		let coeff = lagrange_coefficient_at_zero(&index, &[index.clone()]);
		assert_eq!(coeff, Scalar::from(1));
	}

	#[test]
	fn basic_sharing() {
		let n = 7;
		let k = 5;

		let mut rng = Rng::from_seed([0; 32]);

		let indices: Vec<_> = (0..n).map(|_| Scalar::random(&mut rng)).collect();
		let h = Point::random(&mut rng);
		let secret = Scalar::random(&mut rng);

		let (sharing, decommitment) = share_secret(&mut rng, &secret, &indices, k, &h);

		assert_eq!(sharing.vshares.len(), n);
		assert_eq!(sharing.commitment.len(), k);

		for vshare in &sharing.vshares {
			assert!(vshare_is_valid(&h, &sharing.commitment, vshare));
		}

		// Any k shares reconstruct the same secret and decommitment
		assert_eq!(
			interpolate_vshares_at_zero(sharing.vshares[..k].iter()),
			(secret.clone(), decommitment.clone())
		);
		assert_eq!(
			interpolate_vshares_at_zero(sharing.vshares[n - k..].iter()),
			(secret.clone(), decommitment)
		);
		assert_eq!(
			interpolate_shares_at_zero(sharing.vshares[..k].iter().map(|vshare| &vshare.share)),
			secret
		);
	}

	#[test]
	fn tampered_shares_are_invalid() {
		let mut rng = Rng::from_seed([1; 32]);

		let indices: Vec<_> = (0..5).map(|_| Scalar::random(&mut rng)).collect();
		let h = Point::random(&mut rng);
		let secret = Scalar::random(&mut rng);

		let (sharing, _) = share_secret(&mut rng, &secret, &indices, 3, &h);

		let mut bad_value = sharing.vshares[0].clone();
		bad_value.share.value = &bad_value.share.value + &Scalar::from(1);
		assert!(!vshare_is_valid(&h, &sharing.commitment, &bad_value));

		let mut bad_index = sharing.vshares[1].clone();
		bad_index.share.index = Scalar::random(&mut rng);
		assert!(!vshare_is_valid(&h, &sharing.commitment, &bad_index));

		let mut bad_decommitment = sharing.vshares[2].clone();
		bad_decommitment.decommitment = &bad_decommitment.decommitment + &Scalar::from(1);
		assert!(!vshare_is_valid(&h, &sharing.commitment, &bad_decommitment));
	}

	#[test]
	fn share_of_share_matches_share_commitment() {
		// Sharing the evaluations of a polynomial whose coefficients are
		// themselves shared: evaluating the coefficient shares must stay
		// consistent with evaluating the coefficient commitments
		let n = 5;
		let k = 3;
		let coefficient_count = 3;

		let mut rng = Rng::from_seed([2; 32]);

		let indices: Vec<_> = (0..n).map(|_| Scalar::random(&mut rng)).collect();
		let h = Point::random(&mut rng);

		let (sharings, _): (Vec<_>, Vec<_>) = (0..coefficient_count)
			.map(|_| {
				let secret = Scalar::random(&mut rng);
				share_secret(&mut rng, &secret, &indices, k, &h)
			})
			.unzip();
		let commitments: Vec<_> = sharings.iter().map(|s| s.commitment.clone()).collect();

		let at = Scalar::random(&mut rng);
		let combined_commitment = share_commitment(&at, &commitments);

		for party in 0..n {
			let coefficient_shares: Vec<_> =
				sharings.iter().map(|s| s.vshares[party].clone()).collect();
			let combined_share = share_of_share(&at, &coefficient_shares);

			assert_eq!(combined_share.share.index, indices[party]);
			assert!(vshare_is_valid(&h, &combined_commitment, &combined_share));
		}
	}

	#[test]
	fn serde_representations_are_fixed_width() {
		let mut rng = Rng::from_seed([5; 32]);

		let vshare = VerifiableShare {
			share: Share { index: Scalar::random(&mut rng), value: Scalar::random(&mut rng) },
			decommitment: Scalar::random(&mut rng),
		};

		// A verifiable share is exactly three raw scalars
		let bytes = bincode::serialize(&vshare).unwrap();
		assert_eq!(bytes.len(), 96);
		assert_eq!(bincode::deserialize::<VerifiableShare>(&bytes).unwrap(), vshare);

		// A commitment is a length-prefixed list of raw points
		let commitment =
			Commitment::new(vec![Point::random(&mut rng), Point::point_at_infinity()]);
		let bytes = bincode::serialize(&commitment).unwrap();
		assert_eq!(bytes.len(), 8 + 2 * 33);
		assert_eq!(bincode::deserialize::<Commitment>(&bytes).unwrap(), commitment);
	}

	#[test]
	fn summed_shares_validate_against_summed_commitments() {
		let n = 4;
		let k = 2;

		let mut rng = Rng::from_seed([3; 32]);

		let indices: Vec<_> = (0..n).map(|_| Scalar::random(&mut rng)).collect();
		let h = Point::random(&mut rng);

		let secret = Scalar::random(&mut rng);
		let (first, _) = share_secret(&mut rng, &secret, &indices, k, &h);
		let secret = Scalar::random(&mut rng);
		let (second, _) = share_secret(&mut rng, &secret, &indices, k, &h);

		let summed_commitment = &first.commitment + &second.commitment;
		for (a, b) in first.vshares.iter().zip(&second.vshares) {
			assert!(vshare_is_valid(&h, &summed_commitment, &(a + b)));
		}
	}
}
