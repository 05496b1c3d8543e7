//! Test fixtures: random sharings shaped like the protocol layers expect
//! them, and a whole RNG/RZG network run in memory.

use crate::crypto::{
	secp256k1::{Point, Scalar},
	vss::{self, Commitment, Sharing, VerifiableShare},
	Rng,
};

use super::{
	rng::RngState,
	table::{Row, Table},
	Parameters,
};

pub fn random_indices(rng: &mut Rng, n: usize) -> Vec<Scalar> {
	(0..n).map(|_| Scalar::random(rng)).collect()
}

pub fn random_pedersen_parameter(rng: &mut Rng) -> Point {
	loop {
		let h = Point::random(rng);
		if vss::h_is_safe(&h) {
			return h
		}
	}
}

/// A batch of `b` random sharings, rearranged per party: returns the
/// share batches (one per party), the commitment batch, and the shared
/// secrets with their decommitments.
pub fn random_sharing_batch(
	rng: &mut Rng,
	n: usize,
	k: usize,
	b: usize,
	indices: &[Scalar],
	h: &Point,
) -> (Vec<Vec<VerifiableShare>>, Vec<Commitment>, Vec<Scalar>, Vec<Scalar>) {
	debug_assert_eq!(n, indices.len());

	let mut vshare_batches = vec![Vec::with_capacity(b); n];
	let mut commitment_batch = Vec::with_capacity(b);
	let mut secrets = Vec::with_capacity(b);
	let mut decommitments = Vec::with_capacity(b);

	for _ in 0..b {
		let secret = Scalar::random(rng);
		let (sharing, decommitment) = vss::share_secret(rng, &secret, indices, k, h);
		let Sharing { vshares, commitment } = sharing;
		for (party, vshare) in vshares.into_iter().enumerate() {
			vshare_batches[party].push(vshare);
		}
		commitment_batch.push(commitment);
		secrets.push(secret);
		decommitments.push(decommitment);
	}

	(vshare_batches, commitment_batch, secrets, decommitments)
}

/// A table of `height` honest contributor rows, each a batch of `b`
/// random sharings with threshold `k`
pub fn random_table(
	rng: &mut Rng,
	height: usize,
	k: usize,
	b: usize,
	indices: &[Scalar],
	h: &Point,
) -> Table {
	let rows = (0..height)
		.map(|_| {
			let sharings = (0..b)
				.map(|_| {
					let secret = Scalar::random(rng);
					vss::share_secret(rng, &secret, indices, k, h).0
				})
				.collect();
			Row::new(sharings)
		})
		.collect();
	Table::new(rows)
}

/// Sharings of `contributions` random coefficients per batch entry,
/// rearranged the way each party sees its BRNG output: returns the
/// coefficient share batches per party, the coefficient commitments
/// (identical for every party), and the coefficients themselves.
pub fn random_coefficient_sharings(
	rng: &mut Rng,
	contributions: usize,
	k: usize,
	b: usize,
	indices: &[Scalar],
	h: &Point,
) -> (Vec<Vec<Vec<VerifiableShare>>>, Vec<Vec<Commitment>>, Vec<Vec<Scalar>>) {
	let n = indices.len();

	let mut per_party = vec![vec![Vec::with_capacity(contributions); b]; n];
	let mut commitments = Vec::with_capacity(b);
	let mut coefficients = Vec::with_capacity(b);

	for batch in 0..b {
		let mut entry_commitments = Vec::with_capacity(contributions);
		let mut entry_coefficients = Vec::with_capacity(contributions);
		for _ in 0..contributions {
			let coefficient = Scalar::random(rng);
			let (sharing, _) = vss::share_secret(rng, &coefficient, indices, k, h);
			let Sharing { vshares, commitment } = sharing;
			for (party, vshare) in vshares.into_iter().enumerate() {
				per_party[party][batch].push(vshare);
			}
			entry_commitments.push(commitment);
			entry_coefficients.push(coefficient);
		}
		commitments.push(entry_commitments);
		coefficients.push(entry_coefficients);
	}

	(per_party, commitments, coefficients)
}

/// The result of running a whole RNG (or RZG) network in memory
pub struct RngNetwork {
	/// Every party's verifiable shares of the `b` outputs
	pub own_shares: Vec<Vec<VerifiableShare>>,
	/// The output commitments (identical across parties)
	pub output_commitments: Vec<Commitment>,
	/// What the outputs open to: the dealt constant coefficients, or
	/// zeros for RZG
	pub expected_secrets: Vec<Scalar>,
}

/// Build BRNG-shaped inputs for every party, run all their RNG (or RZG)
/// instances against each other and collect every party's output shares
pub fn run_rng_network(
	rng: &mut Rng,
	k: usize,
	b: usize,
	indices: &[Scalar],
	h: &Point,
	is_zero: bool,
) -> RngNetwork {
	let n = indices.len();
	let contributions = if is_zero { k - 1 } else { k };
	let (per_party_shares, commitments, coefficients) =
		random_coefficient_sharings(rng, contributions, k, b, indices, h);

	let expected_secrets = if is_zero {
		(0..b).map(|_| Scalar::zero()).collect()
	} else {
		coefficients.iter().map(|entry| entry[0].clone()).collect()
	};

	let mut states = Vec::with_capacity(n);
	let mut all_openings = Vec::with_capacity(n);
	let mut output_commitments: Option<Vec<Commitment>> = None;

	for (party, index) in indices.iter().enumerate() {
		let params = Parameters::new(indices.to_vec(), index.clone(), *h);
		let (state, openings, outputs) = RngState::new(
			params,
			Some(per_party_shares[party].clone()),
			commitments.clone(),
			is_zero,
		);

		// Every party must derive the same output commitments
		match &output_commitments {
			Some(existing) => assert_eq!(existing, &outputs),
			None => output_commitments = Some(outputs),
		}

		states.push(state);
		all_openings.push(openings);
	}

	let mut own_shares = Vec::with_capacity(n);
	for (recipient, index) in indices.iter().enumerate() {
		let mut result = None;
		for sender in 0..n {
			if sender == recipient {
				continue
			}
			let batch = all_openings[sender][index].clone();
			if let Some(shares) = states[recipient].handle_share_batch(batch).unwrap() {
				assert!(result.is_none(), "the opener must reconstruct exactly once");
				result = Some(shares);
			}
		}
		own_shares.push(result.expect("every party must reach the threshold"));
	}

	RngNetwork {
		own_shares,
		output_commitments: output_commitments.expect("at least one party"),
		expected_secrets,
	}
}
