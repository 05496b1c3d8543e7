use rand::SeedableRng;

use super::*;
use crate::{
	crypto::{secp256k1::Point, Rng},
	protocols::helpers,
};

struct RkpgNetwork {
	indices: Vec<Scalar>,
	states: Vec<Rkpg>,
	broadcasts: Vec<Vec<Share>>,
	expected_pubkeys: Vec<Point>,
}

fn rkpg_network(rng: &mut Rng, n: usize, k: usize, b: usize) -> RkpgNetwork {
	let indices = helpers::random_indices(rng, n);
	let h = helpers::random_pedersen_parameter(rng);

	let rng_network = helpers::run_rng_network(rng, k, b, &indices, &h, false);
	let rzg_network = helpers::run_rng_network(rng, k, b, &indices, &h, true);

	let expected_pubkeys =
		rng_network.expected_secrets.iter().map(Point::from_scalar).collect();

	let (states, broadcasts) = indices
		.iter()
		.enumerate()
		.map(|(party, index)| {
			let params = Parameters::new(indices.clone(), index.clone(), h);
			Rkpg::new(
				params,
				rng_network.output_commitments.clone(),
				&rng_network.own_shares[party],
				&rzg_network.own_shares[party],
			)
		})
		.unzip();

	RkpgNetwork { indices, states, broadcasts, expected_pubkeys }
}

#[test]
fn honest_network_reconstructs_public_keys() {
	let n = 9;
	let k = 3;
	let b = 2;

	let mut rng = Rng::from_seed([0; 32]);
	let mut network = rkpg_network(&mut rng, n, k, b);

	for recipient in 0..n {
		let mut reconstructed = None;
		for sender in 0..n {
			if sender == recipient {
				continue
			}

			let outcome = network.states[recipient]
				.handle_share_batch(network.broadcasts[sender].clone())
				.unwrap();
			match outcome {
				RkpgOutput::Reconstructed(pubkeys) => {
					// Once enough shares are in, every retry must agree
					if let Some(previous) = &reconstructed {
						assert_eq!(previous, &pubkeys);
					}
					reconstructed = Some(pubkeys);
				},
				RkpgOutput::ShareAdded | RkpgOutput::TooManyErrors => {},
			}
		}

		assert_eq!(reconstructed.as_ref(), Some(&network.expected_pubkeys));
	}
}

#[test]
fn tolerates_dishonest_noise() {
	let k = 4;
	let n = 3 * k;
	let b = 2;
	let dishonest = k - 2;

	let mut rng = Rng::from_seed([1; 32]);
	let mut network = rkpg_network(&mut rng, n, k, b);

	// The last `dishonest` parties broadcast random noise in the first
	// batch entry
	for party in n - dishonest..n {
		network.broadcasts[party][0].value = Scalar::random(&mut rng);
	}

	for recipient in 0..n - dishonest {
		// Deliver the noisy batches first to exercise the retry path
		let senders = (n - dishonest..n).chain(0..n - dishonest);

		let mut saw_decode_failure = false;
		let mut reconstructed = None;
		for sender in senders {
			if sender == recipient {
				continue
			}

			let outcome = network.states[recipient]
				.handle_share_batch(network.broadcasts[sender].clone())
				.unwrap();
			match outcome {
				RkpgOutput::Reconstructed(pubkeys) => reconstructed = Some(pubkeys),
				RkpgOutput::TooManyErrors => saw_decode_failure = true,
				RkpgOutput::ShareAdded => {},
			}
		}

		assert!(saw_decode_failure, "the early decode attempts cannot correct the buffers");
		assert_eq!(reconstructed.as_ref(), Some(&network.expected_pubkeys));
	}
}

#[test]
fn malformed_batches_are_rejected() {
	let n = 6;
	let k = 2;
	let b = 2;

	let mut rng = Rng::from_seed([2; 32]);
	let mut network = rkpg_network(&mut rng, n, k, b);

	let recipient = 0;
	let own_batch = network.broadcasts[recipient].clone();
	let peer_batch = network.broadcasts[1].clone();

	// Own shares were recorded at construction
	assert_eq!(
		network.states[recipient].handle_share_batch(own_batch),
		Err(RkpgError::DuplicateIndex)
	);

	assert_eq!(
		network.states[recipient].handle_share_batch(peer_batch[..1].to_vec()),
		Err(RkpgError::WrongBatchSize)
	);

	let mut mixed = peer_batch.clone();
	mixed[1].index = network.indices[2].clone();
	assert_eq!(
		network.states[recipient].handle_share_batch(mixed),
		Err(RkpgError::InconsistentShares)
	);

	let mut stranger = peer_batch.clone();
	let stranger_index = Scalar::random(&mut rng);
	for share in &mut stranger {
		share.index = stranger_index.clone();
	}
	assert_eq!(
		network.states[recipient].handle_share_batch(stranger),
		Err(RkpgError::InvalidIndex)
	);

	// A rejected batch does not count towards the threshold
	assert_eq!(network.states[recipient].shares_received(), 1);

	// The honest batch is still accepted
	assert_eq!(
		network.states[recipient].handle_share_batch(peer_batch),
		Ok(RkpgOutput::ShareAdded)
	);
}
