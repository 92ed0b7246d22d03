//! Frame encoding and decoding for the coprocessor link.
//!
//! Frame format:
//! - SYNC (1 byte): 0x7E synchronization byte
//! - LENGTH (1 byte): payload length (0-255)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-255 bytes): type-specific data
//! - CRC (1 byte): CRC-8 (poly 0x07, init 0) of LENGTH, TYPE and PAYLOAD

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_SYNC: u8 = 0x7E;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 255;

/// Maximum complete frame size (SYNC + LENGTH + TYPE + MAX_PAYLOAD + CRC)
pub const MAX_FRAME_SIZE: usize = 1 + 1 + 1 + MAX_PAYLOAD_SIZE + 1;

const CRC8_POLY: u8 = 0x07;

/// Framing failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// More than 255 payload bytes
    PayloadTooLarge,
    /// CRC mismatch
    InvalidCrc,
    /// Frame type or payload not understood
    InvalidFrame,
    /// Output buffer cannot hold the encoded frame
    BufferTooSmall,
}

/// CRC-8 over `data`, continuing from `crc`
pub fn crc8(mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// One message on the link, without its framing bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Frame carrying a copy of `payload`
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Frame with an empty payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    fn crc(length: u8, msg_type: u8, payload: &[u8]) -> u8 {
        crc8(crc8(0, &[length, msg_type]), payload)
    }

    /// Write SYNC, LENGTH, TYPE, payload and CRC into `buffer`, returning the byte count
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let length = self.payload.len() as u8;
        let total = self.payload.len() + 4;
        let out = buffer
            .get_mut(..total)
            .ok_or(FrameError::BufferTooSmall)?;

        let (header, rest) = out.split_at_mut(3);
        header.copy_from_slice(&[FRAME_SYNC, length, self.msg_type]);
        let (body, crc) = rest.split_at_mut(self.payload.len());
        body.copy_from_slice(&self.payload);
        crc[0] = Self::crc(length, self.msg_type, &self.payload);

        Ok(total)
    }
}

/// Where the parser is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Hunting,
    Length,
    Type { length: u8 },
    Payload { length: u8, msg_type: u8 },
    Check { length: u8, msg_type: u8 },
}

/// Byte-at-a-time frame decoder
///
/// Bytes outside a frame are dropped until the next SYNC. A frame whose
/// CRC does not match is reported once and the decoder starts hunting again
/// after that CRC byte. Bytes already taken into the bad frame are not
/// rescanned, so a corrupted LENGTH can swallow the frames that follow it;
/// callers recover through their own reply timeouts.
#[derive(Debug, Clone)]
pub struct FrameParser {
    stage: Stage,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            stage: Stage::Hunting,
            payload: Vec::new(),
        }
    }

    /// Consume one byte; yields a frame when its CRC byte arrives and matches
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        self.stage = match self.stage {
            Stage::Hunting if byte == FRAME_SYNC => Stage::Length,
            Stage::Hunting => Stage::Hunting,
            Stage::Length => Stage::Type { length: byte },
            Stage::Type { length } => {
                self.payload.clear();
                if length == 0 {
                    Stage::Check { length, msg_type: byte }
                } else {
                    Stage::Payload { length, msg_type: byte }
                }
            }
            Stage::Payload { length, msg_type } => {
                // LENGTH never exceeds the payload capacity
                let _ = self.payload.push(byte);
                if self.payload.len() < length as usize {
                    Stage::Payload { length, msg_type }
                } else {
                    Stage::Check { length, msg_type }
                }
            }
            Stage::Check { length, msg_type } => {
                let payload = core::mem::take(&mut self.payload);
                self.stage = Stage::Hunting;
                if byte != Frame::crc(length, msg_type, &payload) {
                    return Err(FrameError::InvalidCrc);
                }
                return Ok(Some(Frame { msg_type, payload }));
            }
        };
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encoded(frame: &Frame) -> Vec<u8, MAX_FRAME_SIZE> {
        let mut out = Vec::new();
        out.resize_default(frame.payload.len() + 4).unwrap();
        let written = frame.encode(&mut out).unwrap();
        assert_eq!(written, out.len());
        out
    }

    /// Feed until the first complete frame; later bytes are left unread
    fn feed_until_frame(parser: &mut FrameParser, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = parser.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    #[test]
    fn test_crc8_check_value() {
        // CRC-8/SMBUS check value
        assert_eq!(crc8(0, b"123456789"), 0xF4);
        assert_eq!(crc8(0, &[]), 0);
    }

    #[test]
    fn test_frame_encode_empty_payload() {
        let frame = Frame::empty(0x13);
        let mut buffer = [0u8; 10];
        let len = frame.encode(&mut buffer).unwrap();

        assert_eq!(len, 4);
        assert_eq!(buffer[0], FRAME_SYNC);
        assert_eq!(buffer[1], 0);
        assert_eq!(buffer[2], 0x13);
        assert_eq!(buffer[3], crc8(0, &[0, 0x13]));
    }

    #[test]
    fn test_frame_max_payload() {
        let frame = Frame::new(0x84, &[b'x'; MAX_PAYLOAD_SIZE]).unwrap();
        let bytes = encoded(&frame);
        assert_eq!(bytes.len(), MAX_FRAME_SIZE);
        assert_eq!(bytes[1], 255);

        let mut parser = FrameParser::new();
        assert_eq!(feed_until_frame(&mut parser, &bytes).unwrap(), Some(frame));
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(0x84, b"hello").unwrap();
        let mut buffer = [0u8; 8];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parser_invalid_crc() {
        let frame = Frame::new(0x84, b"hi").unwrap();
        let mut bytes = encoded(&frame);
        if let Some(crc) = bytes.last_mut() {
            *crc = !*crc;
        }

        let mut parser = FrameParser::new();
        assert_eq!(feed_until_frame(&mut parser, &bytes), Err(FrameError::InvalidCrc));

        // Parser recovers on the next frame
        let good = encoded(&Frame::empty(0x81));
        assert_eq!(feed_until_frame(&mut parser, &good).unwrap(), Some(Frame::empty(0x81)));
    }

    #[test]
    fn test_bad_length_swallows_following_frame() {
        // LENGTH 4 claims the whole next frame as payload
        let mut stream = std::vec![FRAME_SYNC, 4, 0x84];
        stream.extend_from_slice(&encoded(&Frame::empty(0x81)));
        stream.push(0x00);
        stream.extend_from_slice(&encoded(&Frame::new(0x82, &[1]).unwrap()));

        let mut parser = FrameParser::new();
        let mut frames = std::vec::Vec::new();
        let mut errors = 0;
        for &byte in &stream {
            match parser.feed(byte) {
                Ok(Some(frame)) => frames.push(frame.msg_type),
                Ok(None) => {}
                Err(e) => {
                    assert_eq!(e, FrameError::InvalidCrc);
                    errors += 1;
                }
            }
        }

        assert_eq!(errors, 1);
        assert_eq!(frames, [0x82]);
    }

    #[test]
    fn test_line_noise_before_sync_ignored() {
        let mut stream = std::vec![0x00, 0xFF, 0x12, 0x34];
        stream.extend_from_slice(&encoded(&Frame::empty(0x81)));

        let mut parser = FrameParser::default();
        let parsed = feed_until_frame(&mut parser, &stream).unwrap();
        assert_eq!(parsed.map(|f| f.msg_type), Some(0x81));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut data = Vec::<u8, 32>::new();
        data.extend_from_slice(&encoded(&Frame::new(0x82, &[1]).unwrap()))
            .unwrap();
        data.extend_from_slice(&encoded(&Frame::new(0x83, &[0]).unwrap()))
            .unwrap();

        let mut parser = FrameParser::new();
        let mut frames = std::vec::Vec::new();
        for &byte in data.iter() {
            if let Some(frame) = parser.feed(byte).unwrap() {
                frames.push(frame.msg_type);
            }
        }
        assert_eq!(frames, [0x82, 0x83]);
    }

    #[test]
    fn test_payload_too_large() {
        assert_eq!(
            Frame::new(0x84, &[0u8; 256]),
            Err(FrameError::PayloadTooLarge)
        );
    }

    proptest! {
        #[test]
        fn prop_single_bit_errors_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            bit in 0usize..8,
        ) {
            let frame = Frame::new(0x84, &payload).unwrap();
            let mut bytes = encoded(&frame);
            // Flip one bit in the TYPE byte
            bytes[2] ^= 1 << bit;

            let mut parser = FrameParser::new();
            prop_assert_eq!(feed_until_frame(&mut parser, &bytes), Err(FrameError::InvalidCrc));
        }
    }
}
