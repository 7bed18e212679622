//! svndiff windows: the unit of text-delta payload, and their wire
//! encoding/decoding.
//!
//! A window is serialized, in order: source view offset (varint), source
//! view length (varint), target view length (varint), instruction-section
//! length (varint), new-data-section length (varint), instruction bytes,
//! new-data bytes. In version 1 streams, the instruction bytes and
//! new-data bytes are each an independently zlib-compressed section
//! prefixed by a varint giving the section's original (uncompressed)
//! length; an original length equal to the payload length that follows it
//! signals "stored uncompressed" (compression did not help).

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::errors::SvndiffError;
use crate::instruction::Instruction;
use crate::varint::{decode_varint_partial, encode_varint};
use svnedit_core::ByteString;

/// The 3-byte magic that opens every svndiff stream, followed by a single
/// version byte (0 = uncompressed, 1 = zlib-compressed sections).
pub const MAGIC: [u8; 3] = [0x53, 0x56, 0x4e];

/// One svndiff window: a source view, a target length, and the
/// instructions that reconstruct `target_view_len` bytes of target data
/// from that source view and this window's own `new_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub source_view_offset: u64,
    pub source_view_len: u64,
    pub target_view_len: u64,
    pub instructions: Vec<Instruction>,
    pub new_data: ByteString,
}

impl Window {
    /// A window with `target_view_len == 0` is the stream terminator; it
    /// carries no instructions or new data.
    pub fn terminator() -> Self {
        Self {
            source_view_offset: 0,
            source_view_len: 0,
            target_view_len: 0,
            instructions: Vec::new(),
            new_data: ByteString::empty(),
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.target_view_len == 0
    }

    /// Static validity checks that don't depend on the output produced so
    /// far: every `SOURCE`/`NEW` instruction stays within its declared
    /// section, and the instructions' declared output lengths sum to
    /// `target_view_len`.
    pub fn validate(&self) -> Result<(), SvndiffError> {
        let mut produced: u64 = 0;
        for instr in &self.instructions {
            match *instr {
                Instruction::Source { offset, len } => {
                    if offset.saturating_add(len) > self.source_view_len {
                        return Err(SvndiffError::SourceOverrun {
                            offset,
                            len,
                            source_view_len: self.source_view_len,
                        });
                    }
                }
                Instruction::New { offset, len } => {
                    if offset.saturating_add(len) > self.new_data.len() as u64 {
                        return Err(SvndiffError::NewDataOverrun {
                            offset,
                            len,
                            new_data_len: self.new_data.len() as u64,
                        });
                    }
                }
                Instruction::Target { .. } => {
                    // Checked dynamically in `apply`, since validity
                    // depends on the output fill at the point the
                    // instruction executes.
                }
            }
            produced += instr.output_len();
        }
        if produced != self.target_view_len {
            return Err(SvndiffError::TargetLengthMismatch {
                produced,
                declared: self.target_view_len,
            });
        }
        Ok(())
    }

    /// Execute this window's instructions against `source` (the full base
    /// byte stream; only `source_view_offset..+source_view_len` of it may
    /// be referenced), producing `target_view_len` bytes of target data.
    pub fn apply(&self, source: &[u8]) -> Result<Vec<u8>, SvndiffError> {
        self.validate()?;
        let view_start = self.source_view_offset as usize;
        let view_end = view_start + self.source_view_len as usize;
        let source_view = source.get(view_start..view_end).ok_or(SvndiffError::SourceOverrun {
            offset: 0,
            len: self.source_view_len,
            source_view_len: source.len().saturating_sub(view_start) as u64,
        })?;

        let mut out = Vec::with_capacity(self.target_view_len as usize);
        for instr in &self.instructions {
            match *instr {
                Instruction::Source { offset, len } => {
                    let start = offset as usize;
                    let end = start + len as usize;
                    out.extend_from_slice(&source_view[start..end]);
                }
                Instruction::Target { offset, len } => {
                    let fill = out.len() as u64;
                    if offset >= fill {
                        return Err(SvndiffError::TargetOverrun { offset, fill });
                    }
                    // Byte-by-byte: the copy region may extend past the
                    // current fill as it's written (self-referential
                    // runs), so earlier bytes we just emitted become
                    // valid sources for later bytes in the same
                    // instruction.
                    for i in 0..len {
                        let idx = (offset + i) as usize;
                        out.push(out[idx]);
                    }
                }
                Instruction::New { offset, len } => {
                    let start = offset as usize;
                    let end = start + len as usize;
                    out.extend_from_slice(&self.new_data.as_bytes()[start..end]);
                }
            }
        }
        Ok(out)
    }

    /// Encode this window to its wire representation (fields 1-5 plus the
    /// instruction and new-data sections), per `version`.
    pub fn encode(&self, version: u8) -> Vec<u8> {
        let mut instr_bytes = Vec::new();
        for instr in &self.instructions {
            encode_instruction(instr, &mut instr_bytes);
        }
        let instr_section = build_section(&instr_bytes, version);
        let data_section = build_section(self.new_data.as_bytes(), version);

        let mut out = Vec::new();
        encode_varint(self.source_view_offset, &mut out);
        encode_varint(self.source_view_len, &mut out);
        encode_varint(self.target_view_len, &mut out);
        encode_varint(instr_section.len() as u64, &mut out);
        encode_varint(data_section.len() as u64, &mut out);
        out.extend_from_slice(&instr_section);
        out.extend_from_slice(&data_section);
        out
    }

    /// Attempt to decode one window from the start of `buf`. Returns
    /// `Ok(None)` if `buf` does not yet hold a complete window (the
    /// caller should buffer more bytes and retry), or `Ok(Some((window,
    /// consumed)))` on success.
    pub fn decode(buf: &[u8], version: u8) -> Result<Option<(Window, usize)>, SvndiffError> {
        let mut pos = 0usize;

        macro_rules! next_varint {
            () => {
                match decode_varint_partial(&buf[pos..])? {
                    Some((value, used)) => {
                        pos += used;
                        value
                    }
                    None => return Ok(None),
                }
            };
        }

        let source_view_offset = next_varint!();
        let source_view_len = next_varint!();
        let target_view_len = next_varint!();
        let instr_section_len = next_varint!() as usize;
        let data_section_len = next_varint!() as usize;

        let total = pos + instr_section_len + data_section_len;
        if buf.len() < total {
            return Ok(None);
        }

        let instr_section = &buf[pos..pos + instr_section_len];
        let data_section = &buf[pos + instr_section_len..total];

        let instr_bytes = parse_section(instr_section, version)?;
        let new_data = parse_section(data_section, version)?;

        let instructions = decode_instructions(&instr_bytes)?;

        let window = Window {
            source_view_offset,
            source_view_len,
            target_view_len,
            instructions,
            new_data: ByteString::from_bytes(new_data),
        };
        Ok(Some((window, total)))
    }
}

/// Build one section (instruction bytes or new-data bytes) for the wire.
/// Version 0 stores the section verbatim. Version 1 prefixes a varint
/// giving the original length, followed by the zlib-compressed bytes, or
/// the original bytes verbatim if compression didn't shrink them (in
/// which case the payload length following the prefix equals the
/// original length, which is how the decoder tells the two cases apart).
fn build_section(raw: &[u8], version: u8) -> Vec<u8> {
    if version == 0 {
        return raw.to_vec();
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder
        .write_all(raw)
        .and_then(|_| encoder.finish())
        .unwrap_or_else(|_| raw.to_vec());

    let mut out = Vec::new();
    encode_varint(raw.len() as u64, &mut out);
    if compressed.len() < raw.len() {
        out.extend_from_slice(&compressed);
    } else {
        out.extend_from_slice(raw);
    }
    out
}

/// Inverse of [`build_section`].
fn parse_section(section: &[u8], version: u8) -> Result<Vec<u8>, SvndiffError> {
    if version == 0 {
        return Ok(section.to_vec());
    }
    let (original_len, used) =
        decode_varint_partial(section)?.ok_or(SvndiffError::SectionOverrun { section: "compressed" })?;
    let payload = &section[used..];
    if payload.len() as u64 == original_len {
        // Stored uncompressed.
        Ok(payload.to_vec())
    } else {
        let mut decoder = ZlibDecoder::new(payload);
        let mut out = Vec::with_capacity(original_len as usize);
        decoder
            .read_to_end(&mut out)
            .map_err(|e| SvndiffError::Zlib(e.to_string()))?;
        Ok(out)
    }
}

/// Encode one instruction: opcode in the top 2 bits of a leading byte,
/// inline length in the bottom 6 bits if it fits and is non-zero,
/// otherwise a trailing length varint; `SOURCE`/`TARGET` additionally
/// carry a trailing offset varint.
fn encode_instruction(instr: &Instruction, out: &mut Vec<u8>) {
    let (opcode, offset, len) = match *instr {
        Instruction::Source { offset, len } => (Instruction::OPCODE_SOURCE, Some(offset), len),
        Instruction::Target { offset, len } => (Instruction::OPCODE_TARGET, Some(offset), len),
        Instruction::New { len, .. } => (Instruction::OPCODE_NEW, None, len),
    };

    if len != 0 && len < 0x40 {
        out.push((opcode << 6) | (len as u8));
    } else {
        out.push(opcode << 6);
        encode_varint(len, out);
    }
    if let Some(offset) = offset {
        encode_varint(offset, out);
    }
}

/// Decode every instruction in a fully-buffered instruction section.
fn decode_instructions(data: &[u8]) -> Result<Vec<Instruction>, SvndiffError> {
    let mut instructions = Vec::new();
    let mut pos = 0usize;
    while pos < data.len() {
        let header = data[pos];
        pos += 1;
        let opcode = header >> 6;
        let inline_len = header & 0x3f;

        let len = if inline_len != 0 {
            inline_len as u64
        } else {
            let (len, used) = decode_varint_partial(&data[pos..])?
                .ok_or(SvndiffError::SectionOverrun { section: "instruction" })?;
            pos += used;
            len
        };

        let instr = match opcode {
            Instruction::OPCODE_SOURCE | Instruction::OPCODE_TARGET => {
                let (offset, used) = decode_varint_partial(&data[pos..])?
                    .ok_or(SvndiffError::SectionOverrun { section: "instruction" })?;
                pos += used;
                if opcode == Instruction::OPCODE_SOURCE {
                    Instruction::Source { offset, len }
                } else {
                    Instruction::Target { offset, len }
                }
            }
            Instruction::OPCODE_NEW => Instruction::New { offset: 0, len },
            _ => return Err(SvndiffError::ReservedOpcode),
        };
        instructions.push(instr);
    }

    // `NEW` instructions don't carry their offset on the wire; reconstruct
    // it as the running offset into `new_data` so the in-memory model is
    // uniform across all three instruction kinds.
    let mut new_data_cursor = 0u64;
    for instr in &mut instructions {
        if let Instruction::New { offset, len } = instr {
            *offset = new_data_cursor;
            new_data_cursor += *len;
        }
    }

    Ok(instructions)
}
