//! The shape of BRNG output across a network: a contributor-major table
//! of sharing batches, and the destination-major slice of it that the
//! consensus layer hands to each party.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{
	secp256k1::{Point, Scalar},
	vss::{self, Commitment, Sharing, VerifiableShare},
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
	#[error("contributor rows disagree on batch size or share count")]
	InvalidDimensions,
	#[error("no share is addressed to the requested index")]
	UnknownIndex,
}

/// The batch of sharings produced by a single contributor
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Row(pub(crate) Vec<Sharing>);

impl Row {
	pub fn new(sharings: Vec<Sharing>) -> Self {
		Row(sharings)
	}

	pub fn sharings(&self) -> &[Sharing] {
		&self.0
	}

	pub fn batch_size(&self) -> usize {
		self.0.len()
	}
}

/// One contributor's part of a slice: their share addressed to the
/// recipient, tagged with who it came from, plus the commitment of the
/// sharing it was taken from
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
	pub from: Scalar,
	pub vshare: VerifiableShare,
	pub commitment: Commitment,
}

/// The contributions for one batch entry, all addressed to the same
/// recipient
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Col(pub(crate) Vec<Element>);

impl Col {
	pub fn new(elements: Vec<Element>) -> Self {
		Col(elements)
	}

	pub fn elements(&self) -> &[Element] {
		&self.0
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// A batch-entry/contributor position in a slice that failed the share
/// validity check
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fault {
	pub batch: usize,
	pub from: Scalar,
}

/// The portion of a table directed at one recipient: one [Col] per batch
/// entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slice(pub(crate) Vec<Col>);

impl Slice {
	pub fn new(cols: Vec<Col>) -> Self {
		Slice(cols)
	}

	pub fn cols(&self) -> &[Col] {
		&self.0
	}

	pub fn batch_size(&self) -> usize {
		self.0.len()
	}

	/// Structural validity: a non-empty batch of equally sized, non-empty
	/// cols, where all shares within a col are addressed to the same
	/// index and all commitments in the slice have the same non-zero
	/// length
	pub fn has_valid_form(&self) -> bool {
		!self.0.is_empty() &&
			self.0.iter().all(|col| !col.is_empty()) &&
			self.0.iter().map(Col::len).all_equal() &&
			self.0.iter().all(|col| {
				col.elements().iter().map(|element| &element.vshare.share.index).all_equal()
			}) &&
			self.0[0].elements()[0].commitment.len() > 0 &&
			self.0
				.iter()
				.flat_map(|col| col.elements().iter().map(|element| element.commitment.len()))
				.all_equal()
	}

	/// Scan every element and name the ones whose share does not
	/// validate against the accompanying commitment. Empty iff the whole
	/// slice is valid.
	pub fn faults(&self, h: &Point) -> Vec<Fault> {
		self.0
			.iter()
			.enumerate()
			.flat_map(|(batch, col)| {
				col.elements()
					.iter()
					.filter(|element| {
						!vss::vshare_is_valid(h, &element.commitment, &element.vshare)
					})
					.map(move |element| Fault { batch, from: element.from.clone() })
			})
			.collect()
	}
}

/// Contributor-major matrix of sharing batches, as assembled by the
/// consensus layer
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table(pub(crate) Vec<Row>);

impl Table {
	pub fn new(rows: Vec<Row>) -> Self {
		Table(rows)
	}

	pub fn height(&self) -> usize {
		self.0.len()
	}

	/// Extract the slice addressed to `index`. `from_indices[i]` names
	/// the contributor of row `i`.
	pub fn take_slice(&self, index: &Scalar, from_indices: &[Scalar]) -> Result<Slice, TableError> {
		if self.0.is_empty() || from_indices.len() != self.0.len() {
			return Err(TableError::InvalidDimensions)
		}

		let batch_size = self.0[0].batch_size();
		let share_count = self.0[0].sharings().first().map(|s| s.vshares.len()).unwrap_or(0);
		let dimensions_agree = batch_size > 0 &&
			self.0.iter().all(|row| {
				row.batch_size() == batch_size &&
					row.sharings().iter().all(|sharing| sharing.vshares.len() == share_count)
			});
		if !dimensions_agree {
			return Err(TableError::InvalidDimensions)
		}

		(0..batch_size)
			.map(|batch| {
				self.0
					.iter()
					.zip(from_indices)
					.map(|(row, from)| {
						let sharing = &row.sharings()[batch];
						let vshare = sharing
							.vshares
							.iter()
							.find(|vshare| &vshare.share.index == index)
							.ok_or(TableError::UnknownIndex)?;
						Ok(Element {
							from: from.clone(),
							vshare: vshare.clone(),
							commitment: sharing.commitment.clone(),
						})
					})
					.collect::<Result<Vec<_>, _>>()
					.map(Col)
			})
			.collect::<Result<Vec<_>, _>>()
			.map(Slice)
	}
}
