//! Incremental decoder for the binary frame protocol.
//!
//! Wire format:
//! ```text
//! [0xAA][length:1][command_id:1][payload: length-1 bytes][checksum:1]
//! ```
//! `length` counts the command byte plus the payload, so it is never zero and
//! the payload holds at most 254 bytes.  `checksum` is the XOR of `length`,
//! `command_id`, and every payload byte.
//!
//! # Resynchronisation
//!
//! The decoder is fed one byte at a time.  Whatever happens on the checksum
//! byte (match or mismatch) it returns to [`Phase::WaitStart`] and discards
//! everything until the next start marker.  A zero length also resets it
//! immediately.  There is no escape scheme: the length prefix tells the decoder
//! where the payload ends, so a 0xAA inside a payload is just data.
//!
//! A sender that stops mid-frame leaves the decoder waiting; the next complete
//! frame it sends after a start marker recovers it.

use thiserror::Error;
use tracing::trace;

/// Marks the beginning of every frame.
pub const START_MARKER: u8 = 0xAA;

/// Largest payload a frame can carry (`u8::MAX` minus the command byte).
pub const MAX_PAYLOAD: usize = u8::MAX as usize - 1;

/// Bytes a frame adds around its payload: marker, length, command, checksum.
pub const FRAME_OVERHEAD: usize = 4;

/// Framing failures.  Decoders report them and reset; nothing is sent upstream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The length byte was zero; a frame needs at least its command byte.
    #[error("zero-length frame")]
    ZeroLength,

    /// The trailing checksum byte does not match the computed XOR.
    #[error("checksum mismatch: computed 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch { expected: u8, received: u8 },

    /// An encoder was asked to frame more than [`MAX_PAYLOAD`] bytes.
    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD}-byte frame limit")]
    PayloadTooLarge(usize),
}

/// A checksum-verified frame, borrowed from the decoder's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub command_id: u8,
    pub payload: &'a [u8],
}

/// Decoder phase.  Exposed for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitStart,
    ReadLength,
    ReadCommand,
    ReadPayload,
    ReadChecksum,
}

/// Computes the frame checksum over `length`, `command_id` and `payload`.
pub fn checksum(length: u8, command_id: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(length ^ command_id, |acc, b| acc ^ b)
}

/// Builds the wire bytes for one frame.
///
/// # Errors
///
/// Returns [`FramingError::PayloadTooLarge`] if `payload` exceeds [`MAX_PAYLOAD`].
///
/// # Examples
///
/// ```rust
/// use hidlink_core::protocol::frame::{encode_frame, FrameDecoder};
///
/// let bytes = encode_frame(0x01, &[5, 6]).unwrap();
/// assert_eq!(bytes, vec![0xAA, 0x03, 0x01, 0x05, 0x06, 0x01]);
///
/// let mut decoder = FrameDecoder::new();
/// let mut frames = 0;
/// for b in bytes {
///     if let Some(Ok(frame)) = decoder.feed(b) {
///         assert_eq!(frame.payload, &[5, 6]);
///         frames += 1;
///     }
/// }
/// assert_eq!(frames, 1);
/// ```
pub fn encode_frame(command_id: u8, payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FramingError::PayloadTooLarge(payload.len()));
    }
    let length = (payload.len() + 1) as u8;

    let mut buf = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    buf.push(START_MARKER);
    buf.push(length);
    buf.push(command_id);
    buf.extend_from_slice(payload);
    buf.push(checksum(length, command_id, payload));
    Ok(buf)
}

/// Byte-at-a-time frame decoder.  One instance per transport session.
pub struct FrameDecoder {
    phase: Phase,
    length: u8,
    command_id: u8,
    payload: [u8; MAX_PAYLOAD],
    index: usize,
    running_checksum: u8,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a decoder waiting for a start marker.
    pub fn new() -> Self {
        Self {
            phase: Phase::WaitStart,
            length: 0,
            command_id: 0,
            payload: [0; MAX_PAYLOAD],
            index: 0,
            running_checksum: 0,
        }
    }

    /// Current parse phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `true` when no frame is partially buffered.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::WaitStart
    }

    /// Drops any partial frame and waits for the next start marker.
    pub fn reset(&mut self) {
        self.phase = Phase::WaitStart;
        self.length = 0;
        self.command_id = 0;
        self.index = 0;
        self.running_checksum = 0;
    }

    /// Consumes one byte.
    ///
    /// Returns `Some` only on the byte that ends a frame: `Ok` with the frame if
    /// the checksum matched, `Err` for a checksum mismatch or a zero length.
    /// Every other byte returns `None`.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Frame<'_>, FramingError>> {
        match self.phase {
            Phase::WaitStart => {
                if byte == START_MARKER {
                    self.phase = Phase::ReadLength;
                } else {
                    trace!(byte, "discarding byte outside frame");
                }
                None
            }
            Phase::ReadLength => {
                if byte == 0 {
                    self.reset();
                    return Some(Err(FramingError::ZeroLength));
                }
                self.length = byte;
                self.running_checksum = byte;
                self.phase = Phase::ReadCommand;
                None
            }
            Phase::ReadCommand => {
                self.command_id = byte;
                self.running_checksum ^= byte;
                self.index = 0;
                self.phase = if self.length == 1 {
                    Phase::ReadChecksum
                } else {
                    Phase::ReadPayload
                };
                None
            }
            Phase::ReadPayload => {
                // `length` is at most 255, so `index` never passes MAX_PAYLOAD - 1;
                // the checked write keeps that an invariant rather than an assumption.
                match self.payload.get_mut(self.index) {
                    Some(slot) => *slot = byte,
                    None => {
                        self.reset();
                        return None;
                    }
                }
                self.running_checksum ^= byte;
                self.index += 1;
                if self.index + 1 == usize::from(self.length) {
                    self.phase = Phase::ReadChecksum;
                }
                None
            }
            Phase::ReadChecksum => {
                let expected = self.running_checksum;
                let len = self.index;
                let command_id = self.command_id;
                self.reset();
                if byte == expected {
                    Some(Ok(Frame {
                        command_id,
                        payload: &self.payload[..len],
                    }))
                } else {
                    Some(Err(FramingError::ChecksumMismatch {
                        expected,
                        received: byte,
                    }))
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Feeds every byte and collects owned copies of the decoded frames and errors.
    fn feed_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Result<(u8, Vec<u8>), FramingError>> {
        let mut out = Vec::new();
        for &b in bytes {
            if let Some(result) = decoder.feed(b) {
                out.push(result.map(|f| (f.command_id, f.payload.to_vec())));
            }
        }
        out
    }

    #[test]
    fn test_checksum_is_xor_of_length_command_and_payload() {
        assert_eq!(checksum(0x03, 0x01, &[0x05, 0x06]), 0x01);
        assert_eq!(checksum(0x01, 0x11, &[]), 0x10);
    }

    #[test]
    fn test_decodes_frame_without_payload() {
        // Arrange
        let mut decoder = FrameDecoder::new();

        // Act
        let out = feed_all(&mut decoder, &[0xAA, 0x01, 0x11, 0x10]);

        // Assert
        assert_eq!(out, vec![Ok((0x11, vec![]))]);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decodes_mouse_move_frame_with_correct_checksum() {
        let mut decoder = FrameDecoder::new();
        let out = feed_all(&mut decoder, &[0xAA, 0x03, 0x01, 0x05, 0x06, 0x01]);
        assert_eq!(out, vec![Ok((0x01, vec![5, 6]))]);
    }

    #[test]
    fn test_wrong_checksum_is_reported_and_decoder_resets() {
        // Arrange
        let mut decoder = FrameDecoder::new();

        // Act
        let out = feed_all(&mut decoder, &[0xAA, 0x03, 0x01, 0x05, 0x06, 0x07]);

        // Assert
        assert_eq!(
            out,
            vec![Err(FramingError::ChecksumMismatch { expected: 0x01, received: 0x07 })]
        );
        assert_eq!(decoder.phase(), Phase::WaitStart);
    }

    #[test]
    fn test_zero_length_resets_immediately() {
        // Arrange
        let mut decoder = FrameDecoder::new();

        // Act – zero length, then a valid frame right behind it
        let mut bytes = vec![0xAA, 0x00];
        bytes.extend(encode_frame(0x02, &[0x01]).unwrap());
        let out = feed_all(&mut decoder, &bytes);

        // Assert
        assert_eq!(out, vec![Err(FramingError::ZeroLength), Ok((0x02, vec![0x01]))]);
    }

    #[test]
    fn test_start_marker_inside_payload_is_data() {
        let mut decoder = FrameDecoder::new();
        let bytes = encode_frame(0x12, &[0x02, 0xAA, 0xAA]).unwrap();
        let out = feed_all(&mut decoder, &bytes);
        assert_eq!(out, vec![Ok((0x12, vec![0x02, 0xAA, 0xAA]))]);
    }

    #[test]
    fn test_maximum_payload_fits_buffer() {
        // Arrange
        let payload: Vec<u8> = (0..MAX_PAYLOAD).map(|i| i as u8).collect();
        let bytes = encode_frame(0x12, &payload).unwrap();
        let mut decoder = FrameDecoder::new();

        // Act
        let out = feed_all(&mut decoder, &bytes);

        // Assert
        assert_eq!(bytes[1], 0xFF);
        assert_eq!(out, vec![Ok((0x12, payload))]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        assert_eq!(
            encode_frame(0x12, &payload),
            Err(FramingError::PayloadTooLarge(MAX_PAYLOAD + 1))
        );
    }

    #[test]
    fn test_partial_frame_waits_indefinitely_until_completed() {
        // Arrange
        let mut decoder = FrameDecoder::new();
        let bytes = encode_frame(0x03, &[0xFD]).unwrap();

        // Act – deliver the frame in two separate chunks
        let first = feed_all(&mut decoder, &bytes[..3]);
        let mid_phase = decoder.phase();
        let second = feed_all(&mut decoder, &bytes[3..]);

        // Assert
        assert!(first.is_empty());
        assert_eq!(mid_phase, Phase::ReadPayload);
        assert_eq!(second, vec![Ok((0x03, vec![0xFD]))]);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut decoder = FrameDecoder::new();
        feed_all(&mut decoder, &[0xAA, 0x05, 0x10]);
        decoder.reset();
        assert!(decoder.is_idle());
        let out = feed_all(&mut decoder, &encode_frame(0x11, &[]).unwrap());
        assert_eq!(out, vec![Ok((0x11, vec![]))]);
    }
}
