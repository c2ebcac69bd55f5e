//! The same documents decoded through every reader backend, plus the
//! decoder's resource-limit behavior against streaming sources.

use std::io::{Cursor, Read};

use cborium::{
    ChunkReader, ChunkSource, Decoder, Error, SliceReader, StreamReader, Value, decode,
    decode_from,
};

/// A document exercising every container shape and payload kind at once.
fn fixture() -> Vec<u8> {
    let value = Value::Map(vec![
        (
            Value::Text("blob".to_string()),
            Value::Bytes((0..=255).collect()),
        ),
        (
            Value::Text("nested".to_string()),
            Value::Array(vec![
                Value::UInt(1),
                Value::NegInt(41),
                Value::Float(2.5),
                Value::Tag(32, Box::new(Value::Text("http://example.com".to_string()))),
            ]),
        ),
        (Value::UInt(7), Value::Null),
    ]);
    cborium::encode(&value).unwrap()
}

/// Yields at most `step` bytes per call.
struct Dribble {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl ChunkSource for Dribble {
    fn next_chunk(&mut self, max: usize) -> std::io::Result<Vec<u8>> {
        let n = max.min(self.step).min(self.data.len() - self.pos);
        let chunk = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(chunk)
    }
}

/// An io::Read that returns a single byte per call.
struct OneByte {
    data: Vec<u8>,
    pos: usize,
}

impl Read for OneByte {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pos == self.data.len() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.data[self.pos];
        self.pos += 1;
        Ok(1)
    }
}

#[test]
fn test_all_backends_agree() {
    let data = fixture();
    let expected = decode(&data).unwrap();

    let from_slice = decode_from(SliceReader::new(&data).unwrap()).unwrap();
    assert_eq!(from_slice, expected);

    let from_stream = decode_from(StreamReader::new(Cursor::new(data.clone()))).unwrap();
    assert_eq!(from_stream, expected);

    let from_trickle = decode_from(StreamReader::new(OneByte {
        data: data.clone(),
        pos: 0,
    }))
    .unwrap();
    assert_eq!(from_trickle, expected);

    for step in [1, 3, 7, 4096] {
        let from_chunks = decode_from(ChunkReader::new(Dribble {
            data: data.clone(),
            pos: 0,
            step,
        }))
        .unwrap();
        assert_eq!(from_chunks, expected, "chunk step {step}");
    }
}

#[test]
fn test_chunk_source_exhaustion_is_truncation() {
    let mut data = fixture();
    data.truncate(data.len() - 10);
    let result = decode_from(ChunkReader::new(Dribble {
        data,
        pos: 0,
        step: 5,
    }));
    assert!(matches!(result, Err(Error::Truncated { .. })));
}

#[test]
fn test_chunk_source_overrun_is_rejected() {
    struct Greedy;
    impl ChunkSource for Greedy {
        fn next_chunk(&mut self, max: usize) -> std::io::Result<Vec<u8>> {
            Ok(vec![0x01; max + 1])
        }
    }

    let result = decode_from(ChunkReader::new(Greedy));
    assert!(matches!(result, Err(Error::ProtocolViolation(_))));
}

#[test]
fn test_chunk_source_io_errors_surface() {
    struct Broken;
    impl ChunkSource for Broken {
        fn next_chunk(&mut self, _max: usize) -> std::io::Result<Vec<u8>> {
            Err(std::io::Error::other("backend went away"))
        }
    }

    let result = decode_from(ChunkReader::new(Broken));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_stream_truncation_mid_payload() {
    // Text header claims 4 bytes, stream carries 2.
    let result = decode_from(StreamReader::new(Cursor::new(vec![0x64, b'a', b'b'])));
    match result {
        Err(Error::Truncated { needed, .. }) => assert_eq!(needed, 2),
        other => panic!("expected Truncated, got {other:?}"),
    }
}

#[test]
fn test_decoder_position_tracks_consumed_bytes() {
    let data = fixture();
    let mut padded = data.clone();
    padded.extend_from_slice(&[0xAA, 0xBB]);

    let mut decoder = Decoder::new(SliceReader::new(&padded).unwrap());
    decoder.decode().unwrap();
    assert_eq!(decoder.position(), data.len() as u64);
}

#[test]
fn test_depth_limit_default() {
    // 200 nested single-element arrays around one integer.
    let mut data = vec![0x81; 200];
    data.push(0x01);
    assert!(matches!(
        decode(&data),
        Err(Error::DepthLimit(cborium::DEFAULT_MAX_DEPTH))
    ));
}

#[test]
fn test_depth_limit_is_configurable() {
    let mut data = vec![0x81; 200];
    data.push(0x01);

    let reader = SliceReader::new(&data).unwrap();
    let value = Decoder::with_max_depth(reader, 300).decode().unwrap();
    let mut cursor = &value;
    let mut depth = 0;
    while let Value::Array(items) = cursor {
        cursor = &items[0];
        depth += 1;
    }
    assert_eq!(depth, 200);
    assert_eq!(*cursor, Value::UInt(1));

    let reader = SliceReader::new(&data).unwrap();
    assert!(matches!(
        Decoder::with_max_depth(reader, 50).decode(),
        Err(Error::DepthLimit(50))
    ));
}

#[test]
fn test_oversized_claimed_length_does_not_preallocate() {
    // Array header claiming u64::MAX elements with no body. The decoder must
    // fail on the missing first element, not on an allocation of that size.
    let result = decode(&[0x9B, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert!(matches!(result, Err(Error::Truncated { .. })));
}
