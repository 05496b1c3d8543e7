//! Batched collection of verifiable shares and threshold reconstruction.
//! An opener is configured with one commitment per batch entry; senders
//! submit one verifiable share per batch entry, all at their own index,
//! and once threshold many distinct senders have been accepted the
//! secrets and their decommitments are reconstructed in parallel.

use itertools::Itertools;
use thiserror::Error;
use tracing::warn;

use super::Parameters;
use crate::crypto::{
	secp256k1::Scalar,
	vss::{self, Commitment, VerifiableShare},
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OpenerError {
	#[error("batch length disagrees with the configured batch size")]
	IncorrectBatchSize,
	#[error("at least one share in the batch is invalid")]
	InvalidShares,
	#[error("the share index is not one of the configured indices")]
	IndexOutOfRange,
	#[error("shares with this index have already been accepted")]
	DuplicateIndex,
}

pub type OpenResult = Result<Option<(Vec<Scalar>, Vec<Scalar>)>, OpenerError>;

pub struct Opener {
	params: Parameters,
	commitment_batch: Vec<Commitment>,
	share_bufs: Vec<Vec<VerifiableShare>>,
}

impl Opener {
	/// Panics unless the commitment batch is non-empty and all
	/// commitments have the same non-zero length (the threshold).
	pub fn new(commitment_batch: Vec<Commitment>, params: Parameters) -> Self {
		assert!(!commitment_batch.is_empty(), "commitment batch must not be empty");
		assert!(commitment_batch[0].len() >= 1, "threshold must be at least 1");
		assert!(
			commitment_batch.iter().map(Commitment::len).all_equal(),
			"commitments must all have the same length"
		);

		let threshold = commitment_batch[0].len();
		let share_bufs =
			commitment_batch.iter().map(|_| Vec::with_capacity(threshold)).collect();

		Opener { params, commitment_batch, share_bufs }
	}

	pub fn threshold(&self) -> usize {
		self.commitment_batch[0].len()
	}

	pub fn batch_size(&self) -> usize {
		self.commitment_batch.len()
	}

	pub fn shares_received(&self) -> usize {
		self.share_bufs[0].len()
	}

	fn contains_index(&self, index: &Scalar) -> bool {
		self.share_bufs[0].iter().any(|vshare| &vshare.share.index == index)
	}

	/// Validate and buffer one sender's batch. Returns the reconstructed
	/// secrets and decommitments exactly when the threshold-th distinct
	/// valid batch is accepted. A rejected batch leaves the buffers
	/// untouched.
	pub fn handle_share_batch(&mut self, batch: Vec<VerifiableShare>) -> OpenResult {
		use OpenerError::*;

		if batch.len() != self.batch_size() {
			return Err(IncorrectBatchSize)
		}
		if !batch.iter().map(|vshare| &vshare.share.index).all_equal() {
			return Err(InvalidShares)
		}

		let index = &batch[0].share.index;
		if !self.params.indices().contains(index) {
			return Err(IndexOutOfRange)
		}
		if self.contains_index(index) {
			return Err(DuplicateIndex)
		}

		// All of the batch is checked before any of it is admitted
		if batch
			.iter()
			.zip(&self.commitment_batch)
			.any(|(vshare, commitment)| !vss::vshare_is_valid(self.params.h(), commitment, vshare))
		{
			warn!("rejecting a share batch that does not match its commitments");
			return Err(InvalidShares)
		}

		for (buf, vshare) in self.share_bufs.iter_mut().zip(batch) {
			buf.push(vshare);
		}

		if self.shares_received() == self.threshold() {
			Ok(Some(self.reconstruct()))
		} else {
			Ok(None)
		}
	}

	/// The reconstruction, once at least threshold many batches have
	/// been accepted
	pub fn reconstructed(&self) -> Option<(Vec<Scalar>, Vec<Scalar>)> {
		(self.shares_received() >= self.threshold()).then(|| self.reconstruct())
	}

	fn reconstruct(&self) -> (Vec<Scalar>, Vec<Scalar>) {
		self.share_bufs.iter().map(|buf| vss::interpolate_vshares_at_zero(buf.iter())).unzip()
	}

	/// Discard all buffered shares, optionally replacing the commitment
	/// batch (which must have the same batch size and threshold) for the
	/// next sharing instance.
	pub fn reset(&mut self, commitment_batch: Option<Vec<Commitment>>) {
		if let Some(commitment_batch) = commitment_batch {
			assert_eq!(
				commitment_batch.len(),
				self.batch_size(),
				"replacement commitments must keep the batch size"
			);
			assert!(
				commitment_batch.iter().map(Commitment::len).all(|len| len == self.threshold()),
				"replacement commitments must keep the threshold"
			);
			self.commitment_batch = commitment_batch;
		}
		for buf in &mut self.share_bufs {
			buf.clear();
		}
	}
}
