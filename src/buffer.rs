use thiserror::Error;

/// Size hint used when the producer has no better estimate.
pub const DEFAULT_SIZE_HINT: usize = 255;

/// Append-only payload accumulator.
///
/// Capacity only ever grows; when an append does not fit, the store grows to
/// `max(2 * capacity, len + needed)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SIZE_HINT)
    }

    pub fn with_capacity(size_hint: usize) -> Self {
        Self {
            data: Vec::with_capacity(size_hint),
            capacity: size_hint,
        }
    }

    fn ensure_space(&mut self, needed: usize) {
        if self.capacity - self.data.len() >= needed {
            return;
        }

        let target = (2 * self.capacity).max(self.data.len() + needed);
        self.data.reserve_exact(target - self.data.len());
        self.capacity = target;
    }

    fn push_raw(&mut self, bytes: &[u8]) {
        self.ensure_space(bytes.len());
        self.data.extend_from_slice(bytes);
    }

    pub fn push_u8(&mut self, value: u8) {
        self.push_raw(&[value]);
    }

    pub fn push_u16(&mut self, value: u16) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_i16(&mut self, value: i16) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_u32(&mut self, value: u32) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_i32(&mut self, value: i32) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_u64(&mut self, value: u64) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_i64(&mut self, value: i64) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_f32(&mut self, value: f32) {
        self.push_raw(&value.to_le_bytes());
    }

    pub fn push_f64(&mut self, value: f64) {
        self.push_raw(&value.to_le_bytes());
    }

    /// Append text without any terminator. Anything from the first NUL onwards
    /// is dropped, matching C-string semantics.
    pub fn push_str(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.push_raw(&bytes[..end]);
    }

    /// Append a `u32` byte count followed by the text bytes. Text longer than
    /// the count can express is cut at `u32::MAX` bytes so the prefix always
    /// matches what follows it.
    pub fn push_counted_str(&mut self, text: &str) {
        let count = counted_len(text.len());
        let bytes = &text.as_bytes()[..count as usize];
        self.ensure_space(4 + bytes.len());
        self.push_u32(count);
        self.push_raw(bytes);
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.push_raw(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn counted_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl Default for ByteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },
    #[error("unknown payload id {0}")]
    UnknownPayload(u32),
    #[error("text field is not valid UTF-8")]
    InvalidText,
    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),
}

/// Little-endian reader over a payload slice.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < count {
            return Err(DecodeError::UnexpectedEnd {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn get_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.take_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn get_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.take_array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn get_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_le_bytes(self.take_array()?))
    }

    pub fn get_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    pub fn get_bytes(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        self.take(count)
    }

    /// Read a `u32` length followed by that many bytes of UTF-8 text.
    pub fn get_counted_str(&mut self) -> Result<String, DecodeError> {
        let length = self.get_u32()? as usize;
        let bytes = self.take(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidText)
    }

    /// Consume everything left as UTF-8 text.
    pub fn get_rest_str(&mut self) -> Result<String, DecodeError> {
        let bytes = self.take(self.remaining())?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidText)
    }

    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(DecodeError::TrailingBytes(extra)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_from_tiny_hint() {
        let mut buffer = ByteBuffer::with_capacity(1);
        buffer.push_u64(0x0102_0304_0506_0708);
        buffer.push_f64(1.5);
        buffer.push_str("$SDDBT");

        assert_eq!(buffer.len(), 8 + 8 + 6);
        assert!(buffer.capacity() >= buffer.len());
    }

    #[test]
    fn test_growth_doubles_when_larger() {
        let mut buffer = ByteBuffer::with_capacity(8);
        buffer.push_u64(1);
        assert_eq!(buffer.capacity(), 8);

        buffer.push_u8(2);
        assert_eq!(buffer.capacity(), 16);

        buffer.push_bytes(&[0u8; 40]);
        assert_eq!(buffer.capacity(), 49);
    }

    #[test]
    fn test_zero_hint_grows_to_fit() {
        let mut buffer = ByteBuffer::with_capacity(0);
        buffer.push_u32(7);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buffer = ByteBuffer::new();
        buffer.push_u16(0x1234);
        buffer.push_u32(0xAABB_CCDD);

        assert_eq!(buffer.as_bytes(), &[0x34, 0x12, 0xDD, 0xCC, 0xBB, 0xAA]);
    }

    #[test]
    fn test_text_stops_at_nul() {
        let mut buffer = ByteBuffer::new();
        buffer.push_str("abc\0def");
        assert_eq!(buffer.as_bytes(), b"abc");
    }

    #[test]
    fn test_cursor_reads_back_scalars() {
        let mut buffer = ByteBuffer::with_capacity(4);
        buffer.push_u8(0xFE);
        buffer.push_u16(65000);
        buffer.push_i16(-1234);
        buffer.push_u32(4_000_000_000);
        buffer.push_u64(u64::MAX - 3);
        buffer.push_f32(-0.125);
        buffer.push_f64(std::f64::consts::PI);
        buffer.push_counted_str("WIBL-1");

        let mut cursor = ByteCursor::new(buffer.as_bytes());
        assert_eq!(cursor.get_u8().unwrap(), 0xFE);
        assert_eq!(cursor.get_u16().unwrap(), 65000);
        assert_eq!(cursor.get_i16().unwrap(), -1234);
        assert_eq!(cursor.get_u32().unwrap(), 4_000_000_000);
        assert_eq!(cursor.get_u64().unwrap(), u64::MAX - 3);
        assert_eq!(cursor.get_f32().unwrap().to_bits(), (-0.125f32).to_bits());
        assert_eq!(cursor.get_f64().unwrap().to_bits(), std::f64::consts::PI.to_bits());
        assert_eq!(cursor.get_counted_str().unwrap(), "WIBL-1");
        assert!(cursor.finish().is_ok());
    }

    #[test]
    fn test_counted_prefix_matches_text() {
        let mut buffer = ByteBuffer::with_capacity(2);
        buffer.push_counted_str("uncertainty");
        assert_eq!(&buffer.as_bytes()[..4], &11u32.to_le_bytes());
        assert_eq!(&buffer.as_bytes()[4..], b"uncertainty");
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_counted_length_caps_at_u32() {
        assert_eq!(counted_len(0), 0);
        assert_eq!(counted_len(u32::MAX as usize), u32::MAX);
        assert_eq!(counted_len(u32::MAX as usize + 1), u32::MAX);
        assert_eq!(counted_len(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_cursor_underrun() {
        let mut cursor = ByteCursor::new(&[1, 2, 3]);
        assert_eq!(
            cursor.get_u32(),
            Err(DecodeError::UnexpectedEnd { needed: 4, remaining: 3 })
        );
    }
}
