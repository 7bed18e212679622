//! Error taxonomy for the svndiff codec.

use thiserror::Error;

/// Errors from encoding, decoding, or parsing an svndiff stream.
#[derive(Debug, Error)]
pub enum SvndiffError {
    /// The stream did not begin with the 4-byte `SVN` + version magic.
    #[error("not an svndiff stream: bad magic bytes")]
    BadMagic,

    /// The version byte was neither 0 (uncompressed) nor 1 (zlib).
    #[error("unsupported svndiff version: {0}")]
    UnsupportedVersion(u8),

    /// A varint continued past the maximum number of bytes for a u64.
    #[error("varint too long (more than 10 continuation bytes)")]
    VarintTooLong,

    /// An instruction's opcode was the reserved value `0b11`.
    #[error("reserved/invalid instruction opcode")]
    ReservedOpcode,

    /// An instruction read past the end of its declared section.
    #[error("instruction reads past end of {section} section")]
    SectionOverrun { section: &'static str },

    /// A SOURCE instruction referenced bytes outside `source_view_len`.
    #[error("SOURCE instruction offset {offset} len {len} exceeds source view length {source_view_len}")]
    SourceOverrun {
        offset: u64,
        len: u64,
        source_view_len: u64,
    },

    /// A TARGET instruction referenced an offset at or past the current
    /// output fill (a TARGET copy can only look backward into already
    /// emitted target bytes).
    #[error("TARGET instruction offset {offset} is not less than current target fill {fill}")]
    TargetOverrun { offset: u64, fill: u64 },

    /// A NEW instruction referenced bytes outside the new-data section.
    #[error("NEW instruction offset {offset} len {len} exceeds new-data length {new_data_len}")]
    NewDataOverrun {
        offset: u64,
        len: u64,
        new_data_len: u64,
    },

    /// The sum of instruction output lengths did not equal the window's
    /// declared target view length.
    #[error("instructions produce {produced} bytes, window declares target_view_len {declared}")]
    TargetLengthMismatch { produced: u64, declared: u64 },

    /// zlib decompression failed in a version-1 window.
    #[error("zlib decompression failed: {0}")]
    Zlib(String),

    /// Underlying I/O error (writing to or reading from the wrapped stream).
    #[error("svndiff I/O error: {0}")]
    Io(#[from] std::io::Error),
}
