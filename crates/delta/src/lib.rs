//! svnedit-delta: the svndiff binary delta codec (C2).
//!
//! Encodes and decodes the wire format used to carry file-content
//! differences inside `apply_textdelta` calls: a stream header, a
//! sequence of windows each built from `SOURCE`/`TARGET`/`NEW`
//! instructions, and a zero-length terminator window.

pub mod encoder;
pub mod errors;
pub mod instruction;
pub mod parser;
pub mod varint;
pub mod window;

pub use encoder::{encode_stream, EncoderConfig};
pub use errors::SvndiffError;
pub use instruction::Instruction;
pub use parser::{SvndiffParser, WindowHandler};
pub use varint::{decode_varint, decode_varint_partial, encode_varint};
pub use window::{Window, MAGIC};

/// Decode a complete, fully-buffered svndiff stream against `source`,
/// returning the reconstructed target bytes. A convenience wrapper over
/// [`SvndiffParser`] for callers (tests, small in-memory payloads) that
/// already have the whole stream in hand rather than receiving it
/// incrementally.
pub fn decode_stream(source: &[u8], stream: &[u8]) -> Result<Vec<u8>, SvndiffError> {
    if stream.len() < 4 || stream[0..3] != MAGIC {
        return Err(SvndiffError::BadMagic);
    }
    let version = stream[3];
    if version != 0 && version != 1 {
        return Err(SvndiffError::UnsupportedVersion(version));
    }

    let mut out = Vec::new();
    let mut pos = 4usize;
    loop {
        let (window, consumed) = Window::decode(&stream[pos..], version)?
            .ok_or(SvndiffError::SectionOverrun { section: "window" })?;
        pos += consumed;
        if window.is_terminator() {
            break;
        }
        out.extend_from_slice(&window.apply(source)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stream_empty_source_any_target() {
        let config = EncoderConfig::default();
        for target in [&b""[..], b"x", b"hello, world", &vec![1u8; 5000]] {
            let stream = encode_stream(b"", target, &config, 0);
            assert_eq!(decode_stream(b"", &stream).unwrap(), target);
        }
    }

    #[test]
    fn test_decode_stream_against_real_source() {
        let config = EncoderConfig::default();
        let source = b"alpha beta gamma delta";
        let target = b"alpha beta GAMMA delta epsilon";
        let stream = encode_stream(source, target, &config, 0);
        assert_eq!(decode_stream(source, &stream).unwrap(), target);
    }
}
