//! Biased random number generation. Every party contributes a batch of
//! fresh verifiable sharings of random scalars; an external consensus
//! layer arranges all contributions into a table and returns to each
//! party the slice addressed to it. Summing a valid slice per batch
//! entry yields this party's verifiable share of a random scalar that
//! every accepted contributor had a hand in (hence "biased": the last
//! contributor to reveal could bias it, which the RNG layer corrects).


use thiserror::Error;
use tracing::warn;

use super::{
	table::{Fault, Row, Slice},
	Parameters,
};
use crate::crypto::{
	secp256k1::Scalar,
	vss::{self, Commitment, VerifiableShare},
	Rng,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BrngError {
	#[error("slice dimensions disagree with the started batch")]
	InvalidDimensions,
	#[error("slice contains {} invalid shares", .0.len())]
	Faults(Vec<Fault>),
	#[error("the machine is not waiting for a slice")]
	NotWaiting,
}

/// The summed result of one BRNG invocation: per batch entry, this
/// party's verifiable share of the aggregate random scalar and the
/// matching aggregate commitment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrngOutput {
	pub shares: Vec<VerifiableShare>,
	pub commitments: Vec<Commitment>,
}

enum State {
	Init,
	Waiting { batch_size: usize },
	Ok { output: BrngOutput },
	Error,
}

/// Per-party BRNG state machine:
/// `Init → Waiting → {Ok | Error} → Init` (via reset). Inputs that do
/// not match the current state are no-ops.
pub struct Brng {
	params: Parameters,
	state: State,
}

impl Brng {
	pub fn new(params: Parameters) -> Self {
		Brng { params, state: State::Init }
	}

	/// Deal a row of `b` fresh sharings of random scalars with threshold
	/// `k`, to be handed to the consensus layer. Returns None (and does
	/// nothing) unless the machine is in its initial state.
	pub fn start(&mut self, rng: &mut Rng, k: usize, b: usize) -> Option<Row> {
		assert!(b >= 1, "batch size must be at least 1");
		assert!(k >= 1, "threshold must be at least 1");
		assert!(k <= self.params.share_count(), "threshold cannot exceed the number of parties");

		if !matches!(self.state, State::Init) {
			return None
		}

		let sharings = (0..b)
			.map(|_| {
				let secret = Scalar::random(rng);
				let (sharing, _decommitment) =
					vss::share_secret(rng, &secret, self.params.indices(), k, self.params.h());
				// The secret and its decommitment are never needed again
				sharing
			})
			.collect();

		self.state = State::Waiting { batch_size: b };
		Some(Row::new(sharings))
	}

	/// Consume the slice returned by consensus. On success the machine
	/// moves to `Ok` and yields the summed shares and commitments; a
	/// malformed slice or one containing invalid shares moves it to
	/// `Error` until reset.
	pub fn handle_slice(&mut self, slice: &Slice) -> Result<BrngOutput, BrngError> {
		let batch_size = match self.state {
			State::Waiting { batch_size } => batch_size,
			_ => return Err(BrngError::NotWaiting),
		};

		if !slice.has_valid_form() || slice.batch_size() != batch_size {
			warn!("discarding a malformed slice");
			self.state = State::Error;
			return Err(BrngError::InvalidDimensions)
		}

		let faults = slice.faults(self.params.h());
		if !faults.is_empty() {
			warn!(fault_count = faults.len(), "slice contains invalid shares");
			self.state = State::Error;
			return Err(BrngError::Faults(faults))
		}

		let (shares, commitments) = slice
			.cols()
			.iter()
			.map(|col| {
				let mut elements = col.elements().iter();
				let first = elements.next().expect("cols are non-empty in a well-formed slice");
				elements.fold(
					(first.vshare.clone(), first.commitment.clone()),
					|(share, commitment), element| {
						(&share + &element.vshare, &commitment + &element.commitment)
					},
				)
			})
			.unzip();

		let output = BrngOutput { shares, commitments };
		self.state = State::Ok { output: output.clone() };
		Ok(output)
	}

	/// The summed output, if the machine has successfully consumed a
	/// slice since the last reset
	pub fn output(&self) -> Option<&BrngOutput> {
		match &self.state {
			State::Ok { output } => Some(output),
			_ => None,
		}
	}

	/// Return to the initial state, discarding any output or error
	pub fn reset(&mut self) {
		self.state = State::Init;
	}
}
