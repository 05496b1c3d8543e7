//! Berlekamp-Welch decoding of Reed-Solomon codewords over the scalar
//! field. A codeword is the evaluation of a polynomial of degree below
//! the dimension `k` at a fixed set of distinct indices; the decoder
//! recovers the polynomial as long as at most `⌊(n−k)/2⌋` of the
//! evaluations are wrong.

use super::{
	secp256k1::Scalar,
	vss::evaluate_polynomial,
};

/// Decoder for a fixed index set and dimension
#[derive(Clone, Debug)]
pub struct Decoder {
	indices: Vec<Scalar>,
	dimension: usize,
}

impl Decoder {
	pub fn new(indices: &[Scalar], dimension: usize) -> Self {
		assert!(dimension >= 1, "dimension must be at least 1");
		assert!(dimension <= indices.len(), "dimension cannot exceed the number of indices");
		Decoder { indices: indices.to_vec(), dimension }
	}

	/// Number of wrong evaluations the decoder can correct
	pub fn max_errors(&self) -> usize {
		(self.indices.len() - self.dimension) / 2
	}

	/// Recover the coefficients of the unique polynomial of degree below
	/// the dimension that agrees with `values` in all but at most
	/// [Decoder::max_errors] positions. `values[i]` is the claimed
	/// evaluation at the `i`-th index. Returns None when no such
	/// polynomial exists.
	pub fn decode(&self, values: &[Scalar]) -> Option<Vec<Scalar>> {
		assert_eq!(values.len(), self.indices.len(), "one value per index");

		let k = self.dimension;
		let e = self.max_errors();
		let unknowns = k + 2 * e;

		// Berlekamp-Welch: find Q of degree < k+e and monic E of degree e
		// with Q(x_i) = y_i·E(x_i) for all i. The unknowns are the k+e
		// coefficients of Q followed by the e low coefficients of E.
		let mut rows: Vec<Vec<Scalar>> = Vec::with_capacity(self.indices.len());
		for (x, y) in self.indices.iter().zip(values) {
			let mut row = Vec::with_capacity(unknowns + 1);

			let mut power = Scalar::from(1);
			for _ in 0..(k + e) {
				row.push(power.clone());
				power = &power * x;
			}

			let mut power = Scalar::from(1);
			for _ in 0..e {
				row.push(&Scalar::zero() - &(y * &power));
				power = &power * x;
			}

			// `power` is now x^e, the coefficient of the monic term
			// moved to the right-hand side
			row.push(y * &power);
			rows.push(row);
		}

		let solution = solve(rows, unknowns)?;

		let quotient_coefficients = &solution[..k + e];
		let mut error_locator = solution[k + e..].to_vec();
		error_locator.push(Scalar::from(1));

		let (mut coefficients, remainder) = poly_divmod(quotient_coefficients, &error_locator);
		if remainder.iter().any(|c| c != &Scalar::zero()) {
			return None
		}
		coefficients.resize(k, Scalar::zero());

		// The division can succeed even when more than `e` values were
		// wrong; recount against the received word
		let mut wrong = 0;
		for (x, y) in self.indices.iter().zip(values) {
			if evaluate_polynomial(coefficients.iter(), x) != *y {
				wrong += 1;
			}
		}
		if wrong > e {
			return None
		}

		Some(coefficients)
	}
}

/// Solve the linear system given by `rows` (each row is `unknowns`
/// coefficients followed by the right-hand side) by Gauss-Jordan
/// elimination, taking zero for every free variable. Returns None when
/// the system is inconsistent.
fn solve(mut rows: Vec<Vec<Scalar>>, unknowns: usize) -> Option<Vec<Scalar>> {
	let mut pivot_of_column: Vec<Option<usize>> = vec![None; unknowns];
	let mut next_row = 0;

	for col in 0..unknowns {
		if next_row == rows.len() {
			break
		}

		let Some(pivot) = (next_row..rows.len()).find(|&r| rows[r][col] != Scalar::zero()) else {
			continue
		};
		rows.swap(next_row, pivot);

		let inverse = rows[next_row][col].invert().expect("pivot is non-zero");
		for entry in rows[next_row].iter_mut() {
			*entry = &*entry * &inverse;
		}

		for r in 0..rows.len() {
			if r == next_row {
				continue
			}
			let factor = rows[r][col].clone();
			if factor == Scalar::zero() {
				continue
			}
			for c in col..=unknowns {
				rows[r][c] = &rows[r][c] - &(&factor * &rows[next_row][c]);
			}
		}

		pivot_of_column[col] = Some(next_row);
		next_row += 1;
	}

	// Rows that never produced a pivot have all-zero coefficients; a
	// non-zero right-hand side there makes the system unsolvable
	if rows[next_row..].iter().any(|row| row[unknowns] != Scalar::zero()) {
		return None
	}

	Some(
		pivot_of_column
			.into_iter()
			.map(|pivot| match pivot {
				Some(row) => rows[row][unknowns].clone(),
				None => Scalar::zero(),
			})
			.collect(),
	)
}

/// Divide by a monic polynomial, returning quotient and remainder.
/// Polynomials are coefficient vectors, lowest degree first.
fn poly_divmod(numerator: &[Scalar], divisor: &[Scalar]) -> (Vec<Scalar>, Vec<Scalar>) {
	debug_assert_eq!(divisor.last(), Some(&Scalar::from(1)));

	let degree = divisor.len() - 1;
	let mut remainder: Vec<Scalar> = numerator.to_vec();
	if remainder.len() <= degree {
		return (Vec::new(), remainder)
	}

	let quotient_len = remainder.len() - degree;
	let mut quotient = vec![Scalar::zero(); quotient_len];
	for i in (0..quotient_len).rev() {
		let coefficient = remainder[i + degree].clone();
		if coefficient == Scalar::zero() {
			continue
		}
		for j in 0..=degree {
			remainder[i + j] = &remainder[i + j] - &(&coefficient * &divisor[j]);
		}
		quotient[i] = coefficient;
	}
	remainder.truncate(degree);

	(quotient, remainder)
}
