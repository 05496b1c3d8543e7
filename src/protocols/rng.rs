//! Unbiased random number generation (and random zero generation). The
//! BRNG hands every party a share of `k` (or `k-1`) aggregate random
//! scalars per batch entry; these are reinterpreted as the coefficients
//! of the sharing polynomial of a fresh unbiased random. Each party can
//! then evaluate its shares "towards" every peer, producing a directed
//! opening that lets the peer reconstruct its own share of the unbiased
//! random without anyone learning the random itself.


use std::collections::BTreeMap;

use super::{
	opener::{Opener, OpenerError},
	Parameters,
};
use crate::crypto::{
	secp256k1::{Point, Scalar},
	vss::{self, Commitment, Share, VerifiableShare},
};

/// Opening batches addressed to each peer, keyed by the peer's index
pub type DirectedOpenings = BTreeMap<Scalar, Vec<VerifiableShare>>;

/// Per-party state for one RNG (or RZG, with `is_zero`) instance. Wraps
/// an opener over this party's share-of-share commitments; only the
/// output commitments and the opener survive construction.
pub struct RngState {
	params: Parameters,
	opener: Opener,
	output_commitments: Vec<Commitment>,
}

impl RngState {
	/// Consume this party's BRNG output batch. `brng_commitments[i]`
	/// holds the `k` (`k-1` for RZG) coefficient commitments for batch
	/// entry `i`, each of length `k`; `brng_shares[i]`, when this party
	/// received a valid slice from consensus, holds the matching
	/// coefficient shares, all at this party's own index.
	///
	/// Returns the new state, the opening batches directed at each peer
	/// (this party's own batch has already been consumed), and the
	/// commitments of the `b` unbiased random outputs. Panics on
	/// ill-shaped inputs: the shapes are fixed by the BRNG layer, so a
	/// mismatch is a programming error.
	pub fn new(
		params: Parameters,
		brng_shares: Option<Vec<Vec<VerifiableShare>>>,
		brng_commitments: Vec<Vec<Commitment>>,
		is_zero: bool,
	) -> (Self, DirectedOpenings, Vec<Commitment>) {
		let b = brng_commitments.len();
		assert!(b >= 1, "batch size must be at least 1");

		let k = brng_commitments[0]
			.first()
			.map(Commitment::len)
			.expect("every batch entry must have at least one contribution");
		let required_contributions = if is_zero { k - 1 } else { k };
		assert!(required_contributions >= 1, "a zero sharing needs a threshold of at least 2");
		assert!(
			brng_commitments.iter().all(|commitments| {
				commitments.len() == required_contributions &&
					commitments.iter().all(|commitment| commitment.len() == k)
			}),
			"commitment batch has the wrong shape"
		);

		// The commitment of the unbiased random's sharing polynomial:
		// coefficient `l` is the constant term of the `l`-th contribution's
		// commitment. A zero sharing gets an explicit identity constant
		// term so that the polynomial opens to zero.
		let output_commitments: Vec<Commitment> = brng_commitments
			.iter()
			.map(|commitments| {
				let constant_terms =
					commitments.iter().map(|commitment| commitment.coefficients()[0]);
				let coefficients = if is_zero {
					std::iter::once(Point::point_at_infinity()).chain(constant_terms).collect()
				} else {
					constant_terms.collect()
				};
				Commitment::new(coefficients)
			})
			.collect();

		// What this party's own share of each unbiased random commits to,
		// from every peer's perspective: the opener validates incoming
		// directed openings against these
		let own_commitments: Vec<Commitment> = brng_commitments
			.iter()
			.map(|commitments| {
				let commitment = vss::share_commitment(params.own_index(), commitments);
				if is_zero {
					commitment.scale(params.own_index())
				} else {
					commitment
				}
			})
			.collect();

		let opener = Opener::new(own_commitments, params.clone());
		let mut state = RngState { params, opener, output_commitments };

		let mut openings = DirectedOpenings::new();
		if let Some(brng_shares) = brng_shares {
			assert_eq!(brng_shares.len(), b, "share batch has the wrong batch size");
			assert!(
				brng_shares.iter().all(|shares| {
					shares.len() == required_contributions &&
						shares
							.iter()
							.all(|vshare| &vshare.share.index == state.params.own_index())
				}),
				"share batch has the wrong shape"
			);

			for peer in state.params.indices() {
				let batch = brng_shares
					.iter()
					.map(|coefficients| {
						let vshare = vss::share_of_share(peer, coefficients);
						if is_zero {
							vshare.scale(peer)
						} else {
							vshare
						}
					})
					.collect();
				openings.insert(peer.clone(), batch);
			}

			// Our own directed opening is our contribution to our own
			// opener; it never goes over the wire
			let own = openings
				.remove(state.params.own_index())
				.expect("own index is one of the configured indices");
			let _ = state
				.opener
				.handle_share_batch(own)
				.expect("own openings are valid by construction");
		}

		let output_commitments = state.output_commitments.clone();
		(state, openings, output_commitments)
	}

	/// Feed a peer's directed opening batch into the opener. Once
	/// threshold many have been accepted, the reconstruction is this
	/// party's own verifiable shares of the `b` unbiased randoms (of
	/// zero, for RZG).
	pub fn handle_share_batch(
		&mut self,
		batch: Vec<VerifiableShare>,
	) -> Result<Option<Vec<VerifiableShare>>, OpenerError> {
		let reconstruction = self.opener.handle_share_batch(batch)?;
		Ok(reconstruction.map(|(secrets, decommitments)| self.own_shares_from(secrets, decommitments)))
	}

	/// This party's own output shares, once the opener has enough
	/// openings (this can already be the case right after construction
	/// when the threshold is 1)
	pub fn own_shares(&self) -> Option<Vec<VerifiableShare>> {
		self.opener
			.reconstructed()
			.map(|(secrets, decommitments)| self.own_shares_from(secrets, decommitments))
	}

	pub fn output_commitments(&self) -> &[Commitment] {
		&self.output_commitments
	}

	fn own_shares_from(
		&self,
		secrets: Vec<Scalar>,
		decommitments: Vec<Scalar>,
	) -> Vec<VerifiableShare> {
		secrets
			.into_iter()
			.zip(decommitments)
			.map(|(value, decommitment)| VerifiableShare {
				share: Share { index: self.params.own_index().clone(), value },
				decommitment,
			})
			.collect()
	}
}
