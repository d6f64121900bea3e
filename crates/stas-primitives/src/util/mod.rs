//! Binary serialization helpers for the Bitcoin wire format.
//!
//! Provides `VarInt` (CompactSize) encoding plus the `BsvReader` and
//! `BsvWriter` cursor types used by transaction parsing, sighash preimage
//! construction and preimage inspection.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// VarInt
// ---------------------------------------------------------------------------

/// A Bitcoin CompactSize integer.
///
/// Encodes in 1, 3, 5 or 9 bytes depending on magnitude; used for input,
/// output and script length prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Wire length of this value in bytes.
    pub fn length(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    /// Encode the value into a new byte vector.
    ///
    /// # Returns
    /// A `Vec<u8>` of `self.length()` bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let v = self.0;
        let mut out = Vec::with_capacity(self.length());
        match self.length() {
            1 => out.push(v as u8),
            3 => {
                out.push(0xfd);
                out.extend_from_slice(&(v as u16).to_le_bytes());
            }
            5 => {
                out.push(0xfe);
                out.extend_from_slice(&(v as u32).to_le_bytes());
            }
            _ => {
                out.push(0xff);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        out
    }

    /// The wrapped integer.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarInt {
    fn from(v: u64) -> Self {
        VarInt(v)
    }
}

impl From<usize> for VarInt {
    fn from(v: usize) -> Self {
        VarInt(v as u64)
    }
}

// ---------------------------------------------------------------------------
// BsvReader
// ---------------------------------------------------------------------------

/// A cursor over a byte slice that reads little-endian wire fields.
pub struct BsvReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BsvReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BsvReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Arguments
    /// * `n` - Number of bytes to read.
    ///
    /// # Returns
    /// A slice of length `n`, or `UnexpectedEof` if fewer bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if n > self.remaining() {
            return Err(PrimitivesError::UnexpectedEof {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-size array, e.g. a 32-byte hash.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Read a little-endian u32.
    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian u64.
    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a CompactSize integer.
    pub fn read_varint(&mut self) -> Result<VarInt, PrimitivesError> {
        let value = match self.read_u8()? {
            0xff => self.read_u64_le()?,
            0xfe => self.read_u32_le()? as u64,
            0xfd => u16::from_le_bytes(self.read_array()?) as u64,
            b => b as u64,
        };
        Ok(VarInt(value))
    }

    /// Read a CompactSize length followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], PrimitivesError> {
        let len = self.read_varint()?.value() as usize;
        self.read_bytes(len)
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Current read offset from the start of the data.
    pub fn position(&self) -> usize {
        self.pos
    }
}

// ---------------------------------------------------------------------------
// BsvWriter
// ---------------------------------------------------------------------------

/// An append-only buffer that writes little-endian wire fields.
#[derive(Default)]
pub struct BsvWriter {
    buf: Vec<u8>,
}

impl BsvWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        BsvWriter { buf: Vec::new() }
    }

    /// Create a writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        BsvWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    /// Append a little-endian u32.
    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a little-endian u64.
    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append a CompactSize integer.
    pub fn write_varint(&mut self, varint: VarInt) {
        self.buf.extend_from_slice(&varint.to_bytes());
    }

    /// Append a CompactSize length prefix followed by `bytes`.
    ///
    /// This is how scripts are embedded in transactions and preimages.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(VarInt::from(bytes.len()));
        self.write_bytes(bytes);
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encodings_at_size_boundaries() {
        let cases: Vec<(u64, Vec<u8>)> = vec![
            (0, vec![0x00]),
            (252, vec![0xfc]),
            (253, vec![0xfd, 0xfd, 0x00]),
            (65535, vec![0xfd, 0xff, 0xff]),
            (65536, vec![0xfe, 0x00, 0x00, 0x01, 0x00]),
            (4294967295, vec![0xfe, 0xff, 0xff, 0xff, 0xff]),
            (4294967296, vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]),
        ];
        for (value, expected) in cases {
            let vi = VarInt(value);
            assert_eq!(vi.to_bytes(), expected, "encoding mismatch for {}", value);
            assert_eq!(vi.length(), expected.len());
            let mut reader = BsvReader::new(&expected);
            assert_eq!(reader.read_varint().unwrap(), vi);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn test_reader_reads_what_writer_wrote() {
        let mut writer = BsvWriter::new();
        writer.write_u8(0x42);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_var_bytes(b"hello");
        writer.write_bytes(&[0xaa; 32]);

        let data = writer.into_bytes();
        let mut reader = BsvReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_var_bytes().unwrap(), b"hello");
        assert_eq!(reader.read_array::<32>().unwrap(), [0xaa; 32]);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.position(), data.len());
    }

    #[test]
    fn test_reader_eof_reports_shortfall() {
        let mut reader = BsvReader::new(&[0x01, 0x02]);
        match reader.read_u32_le() {
            Err(PrimitivesError::UnexpectedEof { wanted, remaining }) => {
                assert_eq!(wanted, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected eof, got {:?}", other),
        }
    }
}
