//! Byte-exact message encoding. Scalars are 32 bytes big-endian
//! canonical, points 33 bytes SEC1 compressed (all-zero for the point
//! at infinity), sequences carry a 4-byte big-endian length prefix and
//! message kinds a single leading tag byte. Decoding runs against a
//! caller-supplied memory quota so that a hostile length prefix is
//! refused before anything is allocated.

use thiserror::Error;

use crate::{
	crypto::{
		secp256k1::{Point, Scalar},
		vss::{Commitment, Share, VerifiableShare},
		MAX_POINT_SIZE, MAX_SCALAR_SIZE,
	},
	protocols::table::{Col, Element, Slice},
};

pub const SCALAR_WIRE_SIZE: usize = MAX_SCALAR_SIZE;
pub const POINT_WIRE_SIZE: usize = MAX_POINT_SIZE;
pub const SHARE_WIRE_SIZE: usize = 2 * SCALAR_WIRE_SIZE;
pub const VSHARE_WIRE_SIZE: usize = 3 * SCALAR_WIRE_SIZE;

const LENGTH_PREFIX_SIZE: usize = 4;
/// The fixed part of an element: the contributor index, the verifiable
/// share and the commitment's own length prefix
const ELEMENT_MIN_WIRE_SIZE: usize = SCALAR_WIRE_SIZE + VSHARE_WIRE_SIZE + LENGTH_PREFIX_SIZE;

const TAG_BRNG_SLICE: u8 = 0x00;
const TAG_RNG_OPENINGS: u8 = 0x01;
const TAG_RKPG_SHARES: u8 = 0x02;
const TAG_OPENER_SHARES: u8 = 0x03;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
	#[error("input ended before the value was complete")]
	UnexpectedEnd,
	#[error("a length prefix exceeds the remaining memory quota")]
	QuotaExceeded,
	#[error("scalar encoding is not canonical")]
	InvalidScalar,
	#[error("point encoding is not a valid compressed point")]
	InvalidPoint,
	#[error("unknown message tag {0:#04x}")]
	UnknownTag(u8),
	#[error("input continues past the end of the message")]
	TrailingBytes,
}

/// Everything one party sends another
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
	/// A slice of the BRNG table, as relayed by the consensus layer
	BrngSlice { slice: Slice },
	/// Directed opening batch for an RNG/RZG instance
	RngOpenings { from: Scalar, openings: Vec<VerifiableShare> },
	/// Share-hiding open batch for an RKPG instance
	RkpgShares { from: Scalar, shares: Vec<Share> },
	/// Verifiable share batch for a bare opener
	OpenerShares { shares: Vec<VerifiableShare> },
}

/// Cursor over undecoded input that also tracks how much memory the
/// decoded value is still allowed to take
pub struct Reader<'a> {
	bytes: &'a [u8],
	quota: usize,
}

impl<'a> Reader<'a> {
	pub fn new(bytes: &'a [u8], quota: usize) -> Self {
		Reader { bytes, quota }
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	fn take(&mut self, count: usize) -> Result<&'a [u8], WireError> {
		if count > self.bytes.len() {
			return Err(WireError::UnexpectedEnd)
		}
		let (head, tail) = self.bytes.split_at(count);
		self.bytes = tail;
		Ok(head)
	}

	fn u8(&mut self) -> Result<u8, WireError> {
		Ok(self.take(1)?[0])
	}

	fn u32_be(&mut self) -> Result<u32, WireError> {
		let bytes: [u8; 4] = self.take(4)?.try_into().expect("take returns exactly 4 bytes");
		Ok(u32::from_be_bytes(bytes))
	}

	/// Read a sequence length and charge `len * element_footprint`
	/// against the quota before the caller allocates anything
	fn sequence_length(&mut self, element_footprint: usize) -> Result<usize, WireError> {
		let len = self.u32_be()? as usize;
		let footprint = len.checked_mul(element_footprint).ok_or(WireError::QuotaExceeded)?;
		if footprint > self.quota {
			return Err(WireError::QuotaExceeded)
		}
		self.quota -= footprint;
		Ok(len)
	}
}

fn encode_length(buf: &mut Vec<u8>, len: usize) {
	debug_assert!(len <= u32::MAX as usize);
	buf.extend_from_slice(&(len as u32).to_be_bytes());
}

pub fn encode_scalar(buf: &mut Vec<u8>, scalar: &Scalar) {
	buf.extend_from_slice(&scalar.as_bytes());
}

pub fn decode_scalar(reader: &mut Reader) -> Result<Scalar, WireError> {
	let bytes: [u8; SCALAR_WIRE_SIZE] =
		reader.take(SCALAR_WIRE_SIZE)?.try_into().expect("take returns exactly 32 bytes");
	Scalar::from_canonical_bytes(&bytes).ok_or(WireError::InvalidScalar)
}

pub fn encode_point(buf: &mut Vec<u8>, point: &Point) {
	buf.extend_from_slice(&point.as_bytes());
}

pub fn decode_point(reader: &mut Reader) -> Result<Point, WireError> {
	let bytes: [u8; POINT_WIRE_SIZE] =
		reader.take(POINT_WIRE_SIZE)?.try_into().expect("take returns exactly 33 bytes");
	Point::from_compressed_bytes(&bytes).ok_or(WireError::InvalidPoint)
}

pub fn encode_share(buf: &mut Vec<u8>, share: &Share) {
	encode_scalar(buf, &share.index);
	encode_scalar(buf, &share.value);
}

pub fn decode_share(reader: &mut Reader) -> Result<Share, WireError> {
	Ok(Share { index: decode_scalar(reader)?, value: decode_scalar(reader)? })
}

pub fn encode_vshare(buf: &mut Vec<u8>, vshare: &VerifiableShare) {
	encode_share(buf, &vshare.share);
	encode_scalar(buf, &vshare.decommitment);
}

pub fn decode_vshare(reader: &mut Reader) -> Result<VerifiableShare, WireError> {
	Ok(VerifiableShare { share: decode_share(reader)?, decommitment: decode_scalar(reader)? })
}

pub fn encode_commitment(buf: &mut Vec<u8>, commitment: &Commitment) {
	encode_length(buf, commitment.len());
	for point in commitment.coefficients() {
		encode_point(buf, point);
	}
}

pub fn decode_commitment(reader: &mut Reader) -> Result<Commitment, WireError> {
	let len = reader.sequence_length(POINT_WIRE_SIZE)?;
	let mut coefficients = Vec::with_capacity(len);
	for _ in 0..len {
		coefficients.push(decode_point(reader)?);
	}
	Ok(Commitment::new(coefficients))
}

pub fn encode_element(buf: &mut Vec<u8>, element: &Element) {
	encode_scalar(buf, &element.from);
	encode_vshare(buf, &element.vshare);
	encode_commitment(buf, &element.commitment);
}

pub fn decode_element(reader: &mut Reader) -> Result<Element, WireError> {
	Ok(Element {
		from: decode_scalar(reader)?,
		vshare: decode_vshare(reader)?,
		commitment: decode_commitment(reader)?,
	})
}

pub fn encode_col(buf: &mut Vec<u8>, col: &Col) {
	encode_length(buf, col.len());
	for element in col.elements() {
		encode_element(buf, element);
	}
}

pub fn decode_col(reader: &mut Reader) -> Result<Col, WireError> {
	let len = reader.sequence_length(ELEMENT_MIN_WIRE_SIZE)?;
	let mut elements = Vec::with_capacity(len);
	for _ in 0..len {
		elements.push(decode_element(reader)?);
	}
	Ok(Col::new(elements))
}

pub fn encode_slice(buf: &mut Vec<u8>, slice: &Slice) {
	encode_length(buf, slice.batch_size());
	for col in slice.cols() {
		encode_col(buf, col);
	}
}

pub fn decode_slice(reader: &mut Reader) -> Result<Slice, WireError> {
	let len = reader.sequence_length(LENGTH_PREFIX_SIZE)?;
	let mut cols = Vec::with_capacity(len);
	for _ in 0..len {
		cols.push(decode_col(reader)?);
	}
	Ok(Slice::new(cols))
}

pub fn encode_vshare_batch(buf: &mut Vec<u8>, batch: &[VerifiableShare]) {
	encode_length(buf, batch.len());
	for vshare in batch {
		encode_vshare(buf, vshare);
	}
}

pub fn decode_vshare_batch(reader: &mut Reader) -> Result<Vec<VerifiableShare>, WireError> {
	let len = reader.sequence_length(VSHARE_WIRE_SIZE)?;
	let mut batch = Vec::with_capacity(len);
	for _ in 0..len {
		batch.push(decode_vshare(reader)?);
	}
	Ok(batch)
}

pub fn encode_share_batch(buf: &mut Vec<u8>, batch: &[Share]) {
	encode_length(buf, batch.len());
	for share in batch {
		encode_share(buf, share);
	}
}

pub fn decode_share_batch(reader: &mut Reader) -> Result<Vec<Share>, WireError> {
	let len = reader.sequence_length(SHARE_WIRE_SIZE)?;
	let mut batch = Vec::with_capacity(len);
	for _ in 0..len {
		batch.push(decode_share(reader)?);
	}
	Ok(batch)
}

pub fn encode_message(message: &Message) -> Vec<u8> {
	let mut buf = Vec::new();
	match message {
		Message::BrngSlice { slice } => {
			buf.push(TAG_BRNG_SLICE);
			encode_slice(&mut buf, slice);
		},
		Message::RngOpenings { from, openings } => {
			buf.push(TAG_RNG_OPENINGS);
			encode_scalar(&mut buf, from);
			encode_vshare_batch(&mut buf, openings);
		},
		Message::RkpgShares { from, shares } => {
			buf.push(TAG_RKPG_SHARES);
			encode_scalar(&mut buf, from);
			encode_share_batch(&mut buf, shares);
		},
		Message::OpenerShares { shares } => {
			buf.push(TAG_OPENER_SHARES);
			encode_vshare_batch(&mut buf, shares);
		},
	}
	buf
}

/// Decode a whole message, refusing to allocate more than `quota` bytes
/// worth of decoded values. The input must be consumed exactly.
pub fn decode_message(bytes: &[u8], quota: usize) -> Result<Message, WireError> {
	let mut reader = Reader::new(bytes, quota);

	let message = match reader.u8()? {
		TAG_BRNG_SLICE => Message::BrngSlice { slice: decode_slice(&mut reader)? },
		TAG_RNG_OPENINGS => Message::RngOpenings {
			from: decode_scalar(&mut reader)?,
			openings: decode_vshare_batch(&mut reader)?,
		},
		TAG_RKPG_SHARES => Message::RkpgShares {
			from: decode_scalar(&mut reader)?,
			shares: decode_share_batch(&mut reader)?,
		},
		TAG_OPENER_SHARES =>
			Message::OpenerShares { shares: decode_vshare_batch(&mut reader)? },
		tag => return Err(WireError::UnknownTag(tag)),
	};

	if !reader.is_empty() {
		return Err(WireError::TrailingBytes)
	}
	Ok(message)
}
