//! Network byte order helpers for the fixed-width fields of authenticator data.
//!
//! Readers take a `&mut &[u8]` cursor and advance it past what they consumed, so a sequence of
//! reads walks a structure front to back without index arithmetic.

use crate::ctap2::CodecError;

/// Encode a `u16` as 2 big-endian bytes.
pub fn u16_to_bytes(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Encode a `u32` as 4 big-endian bytes.
pub fn u32_to_bytes(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Append `data` to `out` preceded by its length as a big-endian `u16`.
///
/// # Error
/// Returns [`CodecError::CredentialIdTooLong`] if the length of `data` cannot be represented by a
/// u16, in which case `out` is left untouched.
pub fn put_length_prefixed(out: &mut Vec<u8>, data: &[u8]) -> Result<(), CodecError> {
    let len = u16::try_from(data.len()).map_err(|_| CodecError::CredentialIdTooLong(data.len()))?;
    out.extend_from_slice(&u16_to_bytes(len));
    out.extend_from_slice(data);
    Ok(())
}

/// Split `len` bytes off the front of `input`.
pub fn take<'a>(input: &mut &'a [u8], len: usize) -> Result<&'a [u8], CodecError> {
    if input.len() < len {
        return Err(CodecError::Truncated);
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    Ok(head)
}

/// Split a fixed size array off the front of `input`.
pub fn take_array<const N: usize>(input: &mut &[u8]) -> Result<[u8; N], CodecError> {
    let head = take(input, N)?;
    head.try_into().map_err(|_| CodecError::Truncated)
}

/// Read a big-endian `u16` off the front of `input`.
pub fn read_u16(input: &mut &[u8]) -> Result<u16, CodecError> {
    take_array(input).map(u16::from_be_bytes)
}

/// Read a big-endian `u32` off the front of `input`.
pub fn read_u32(input: &mut &[u8]) -> Result<u32, CodecError> {
    take_array(input).map(u32::from_be_bytes)
}

/// Read a `u16` length prefix and then that many bytes.
pub fn read_length_prefixed<'a>(input: &mut &'a [u8]) -> Result<&'a [u8], CodecError> {
    let len = read_u16(input)?;
    take(input, usize::from(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_written_most_significant_byte_first() {
        assert_eq!(u16_to_bytes(0x0102), [0x01, 0x02]);
        assert_eq!(u32_to_bytes(1), [0, 0, 0, 1]);
        assert_eq!(u32_to_bytes(u32::MAX), [0xff; 4]);
    }

    #[test]
    fn readers_advance_the_cursor() {
        let data = [0x00, 0x02, 0xaa, 0xbb, 0x00, 0x00, 0x01, 0x00];
        let mut cursor = data.as_slice();

        assert_eq!(read_length_prefixed(&mut cursor), Ok([0xaa, 0xbb].as_slice()));
        assert_eq!(read_u32(&mut cursor), Ok(256));
        assert!(cursor.is_empty());
    }

    #[test]
    fn short_input_is_truncated() {
        let mut cursor = [0x00, 0x05, 0x01].as_slice();
        assert_eq!(read_length_prefixed(&mut cursor), Err(CodecError::Truncated));

        let mut cursor = [0x01, 0x02, 0x03].as_slice();
        assert_eq!(read_u32(&mut cursor), Err(CodecError::Truncated));
    }

    #[test]
    fn length_prefix_rejects_oversized_data() {
        let mut out = Vec::new();
        let data = vec![0; usize::from(u16::MAX) + 1];

        assert_eq!(
            put_length_prefixed(&mut out, &data),
            Err(CodecError::CredentialIdTooLong(data.len()))
        );
        assert!(out.is_empty());

        put_length_prefixed(&mut out, &[0xaa, 0xbb]).expect("short data fits");
        assert_eq!(out, [0x00, 0x02, 0xaa, 0xbb]);
    }
}
