//! Robust reconstruction of the public keys of RNG outputs. Every party
//! broadcasts, per batch entry, the sum of its RNG decommitment and its
//! RZG share value (a "share-hiding open": the zero share masks nothing
//! in the exponent but keeps the decommitment itself hidden). The sums
//! lie on a polynomial whose constant term is the hiding scalar of the
//! unbiased random's commitment, so subtracting it in the exponent
//! leaves the bare public key. Reed-Solomon decoding makes the
//! reconstruction tolerate wrong or missing contributions.

#[cfg(test)]
mod tests;

use thiserror::Error;
use tracing::warn;

use super::Parameters;
use crate::crypto::{
	reed_solomon::Decoder,
	secp256k1::{Point, Scalar},
	vss::{Commitment, Share, VerifiableShare},
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RkpgError {
	#[error("batch length disagrees with the configured batch size")]
	WrongBatchSize,
	#[error("shares within the batch carry different indices")]
	InconsistentShares,
	#[error("the share index is not one of the configured indices")]
	InvalidIndex,
	#[error("shares with this index have already been recorded")]
	DuplicateIndex,
}

/// Outcome of handling one share batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RkpgOutput {
	/// Recorded; not enough shares to attempt a reconstruction yet
	ShareAdded,
	/// A reconstruction was attempted but the decoder could not correct
	/// the buffers; more shares may fix this
	TooManyErrors,
	/// The batch of output public keys
	Reconstructed(Vec<Point>),
}

pub struct Rkpg {
	params: Parameters,
	rng_commitments: Vec<Commitment>,
	decoder: Decoder,
	bufs: Vec<Vec<Share>>,
	share_received: Vec<bool>,
	count: usize,
}

impl Rkpg {
	/// Build the state over the RNG output commitments and this party's
	/// own RNG and RZG output shares. Returns the state together with
	/// the initial share batch (own decommitments masked by the zero
	/// shares), which has already been recorded locally and must be
	/// broadcast to all peers. Panics on ill-shaped inputs.
	pub fn new(
		params: Parameters,
		rng_commitments: Vec<Commitment>,
		rng_shares: &[VerifiableShare],
		rzg_shares: &[VerifiableShare],
	) -> (Self, Vec<Share>) {
		let b = rng_commitments.len();
		assert!(b >= 1, "batch size must be at least 1");

		let k = rng_commitments[0].len();
		assert!(k >= 1, "threshold must be at least 1");
		assert!(k <= params.share_count(), "threshold cannot exceed the number of parties");
		assert!(
			rng_commitments.iter().all(|commitment| commitment.len() == k),
			"commitments must all have the same length"
		);
		assert_eq!(rng_shares.len(), b, "one rng share per batch entry");
		assert_eq!(rzg_shares.len(), b, "one rzg share per batch entry");
		assert!(
			rng_shares
				.iter()
				.chain(rzg_shares)
				.all(|vshare| &vshare.share.index == params.own_index()),
			"own shares must carry the own index"
		);

		let decoder = Decoder::new(params.indices(), k);
		let bufs = (0..b)
			.map(|_| {
				params
					.indices()
					.iter()
					.map(|index| Share { index: index.clone(), value: Scalar::zero() })
					.collect()
			})
			.collect();
		let share_received = vec![false; params.share_count()];

		let initial_batch: Vec<Share> = rng_shares
			.iter()
			.zip(rzg_shares)
			.map(|(rng_share, rzg_share)| Share {
				index: params.own_index().clone(),
				value: &rng_share.decommitment + &rzg_share.share.value,
			})
			.collect();

		let mut state =
			Rkpg { params, rng_commitments, decoder, bufs, share_received, count: 0 };
		state
			.insert_batch(&initial_batch)
			.expect("own initial batch is well-formed by construction");

		(state, initial_batch)
	}

	fn insert_batch(&mut self, batch: &[Share]) -> Result<(), RkpgError> {
		use RkpgError::*;

		if batch.len() != self.bufs.len() {
			return Err(WrongBatchSize)
		}

		let index = &batch[0].index;
		if !batch.iter().skip(1).all(|share| &share.index == index) {
			return Err(InconsistentShares)
		}

		let position = self
			.params
			.indices()
			.iter()
			.position(|candidate| candidate == index)
			.ok_or(InvalidIndex)?;
		if self.share_received[position] {
			return Err(DuplicateIndex)
		}

		for (buf, share) in self.bufs.iter_mut().zip(batch) {
			buf[position] = share.clone();
		}
		self.share_received[position] = true;
		self.count += 1;
		Ok(())
	}

	pub fn shares_received(&self) -> usize {
		self.count
	}

	/// Record a peer's share batch and, once `n - k + 1` batches are in,
	/// attempt to decode every buffer. Decoding failures are transient:
	/// the caller keeps feeding shares and retrying happens on every
	/// subsequent batch.
	pub fn handle_share_batch(&mut self, batch: Vec<Share>) -> Result<RkpgOutput, RkpgError> {
		self.insert_batch(&batch)?;

		let n = self.params.share_count();
		let k = self.rng_commitments[0].len();
		if self.count < n - k + 1 {
			return Ok(RkpgOutput::ShareAdded)
		}

		let mut pubkeys = Vec::with_capacity(self.bufs.len());
		for (buf, commitment) in self.bufs.iter().zip(&self.rng_commitments) {
			let values: Vec<Scalar> = buf.iter().map(|share| share.value.clone()).collect();
			let coefficients = match self.decoder.decode(&values) {
				Some(coefficients) => coefficients,
				None => {
					warn!(
						shares_received = self.count,
						"not enough consistent shares to decode yet"
					);
					return Ok(RkpgOutput::TooManyErrors)
				},
			};

			// The constant term is the hiding scalar of the unbiased
			// random's commitment; peel it off in the exponent
			let pubkey = commitment.coefficients()[0] - *self.params.h() * &coefficients[0];
			pubkeys.push(pubkey);
		}

		Ok(RkpgOutput::Reconstructed(pubkeys))
	}
}
