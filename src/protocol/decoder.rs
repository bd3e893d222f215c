use super::Phase;
use std::{convert::Infallible, num::TryFromIntError, str::Utf8Error};

/// An error while decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("need at least {0} more bytes")]
    EndOfStream(usize),
    #[error("varint is too long")]
    VarIntTooLong,
    #[error("string exceeds max allowed length")]
    StringTooLong,
    #[error("packet length of {0} exceeds maximum allowed")]
    PacketTooLarge(usize),
    #[error("unknown packet ID {0:#04x}")]
    UnknownPacketId(i32),
    #[error("requested state {0} is out of bounds")]
    InvalidPhase(i32),
    #[error("cannot enter the {0:?} phase from a handshake")]
    UnreachablePhase(Phase),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    IntConversion(#[from] TryFromIntError),
    /// Special variant for derive macro integer conversions to work.
    /// Cannot occur.
    #[error(transparent)]
    Infallible(#[from] Infallible),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

const MAX_STRING_LENGTH: usize = i16::MAX as usize;

/// Maximum number of bytes in an encoded 32-bit VarInt.
const MAX_VAR_INT_SIZE: usize = 5;

/// A raw decoder over a byte slice.
///
/// Holds nothing but the remaining input, so independent decoders
/// never share state.
#[derive(Debug)]
pub struct Decoder<'a> {
    buffer: &'a [u8],
}

impl<'a> Decoder<'a> {
    /// Creates a decoder from the buffer it will read from.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Gets the remaining buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Returns if there is no data left in the buffer.
    pub fn is_finished(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes `n` bytes from the buffer, returning them as a slice.
    pub fn consume_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n <= self.buffer.len() {
            let (data, buffer) = self.buffer.split_at(n);
            self.buffer = buffer;
            Ok(data)
        } else {
            Err(DecodeError::EndOfStream(n - self.buffer.len()))
        }
    }

    /// Consumes `N` bytes into an array.
    pub fn consume<const N: usize>(&mut self) -> Result<[u8; N]> {
        let data = self.consume_slice(N)?;
        let mut array = [0; N];
        array.copy_from_slice(data);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.consume::<1>().map(|[x]| x)
    }

    /// Reads a big-endian unsigned short.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.consume().map(u16::from_be_bytes)
    }

    /// Reads a big-endian unsigned int.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.consume().map(u32::from_be_bytes)
    }

    /// Reads a big-endian signed long.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.consume().map(i64::from_be_bytes)
    }

    /// Reads a VarInt from the stream.
    pub fn read_var_int(&mut self) -> Result<i32> {
        self.read_var_int_with_size().map(|(x, _)| x)
    }

    /// Reads a VarInt from the stream, additionally
    /// returning the number of bytes read.
    ///
    /// Fails with [`DecodeError::VarIntTooLong`] as soon as the fifth byte
    /// still carries the continuation bit; nothing past it is consumed.
    pub fn read_var_int_with_size(&mut self) -> Result<(i32, usize)> {
        let mut result = 0i32;

        for num_read in 0..MAX_VAR_INT_SIZE {
            let read = self.read_u8()?;
            result |= i32::from(read & 0b0111_1111) << (7 * num_read);

            if read & 0b1000_0000 == 0 {
                return Ok((result, num_read + 1));
            }
        }
        Err(DecodeError::VarIntTooLong)
    }

    /// Reads a VarInt-prefixed UTF-8 string.
    ///
    /// The prefix is the length in bytes, not characters.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let length = usize::try_from(self.read_var_int()?)?;

        if length > MAX_STRING_LENGTH {
            return Err(DecodeError::StringTooLong);
        }

        let string = std::str::from_utf8(self.consume_slice(length)?)?;
        Ok(string)
    }
}

/// A type that can be read from a [`Decoder`].
pub trait Decode: Sized {
    fn decode(decoder: &mut Decoder) -> Result<Self>;
}

impl Decode for u8 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_u8()
    }
}

impl Decode for u16 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_u16()
    }
}

impl Decode for i64 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_i64()
    }
}

impl Decode for String {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_string().map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Encoder;
    use proptest::prelude::*;

    #[test]
    fn known_var_ints() {
        let cases: [(i32, &[u8]); 8] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (25565, &[0xdd, 0xc7, 0x01]),
            (i32::MAX, &[0xff, 0xff, 0xff, 0xff, 0x07]),
            (-1, &[0xff, 0xff, 0xff, 0xff, 0x0f]),
            (i32::MIN, &[0x80, 0x80, 0x80, 0x80, 0x08]),
        ];

        for (value, bytes) in cases {
            let mut decoder = Decoder::new(bytes);
            assert_eq!(
                decoder.read_var_int_with_size().unwrap(),
                (value, bytes.len()),
                "decoding {value}"
            );
            assert!(decoder.is_finished());
        }
    }

    #[test]
    fn var_int_with_continuation_on_fifth_byte_is_too_long() {
        let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01, 0x2a];
        let mut decoder = Decoder::new(&bytes);
        assert!(matches!(
            decoder.read_var_int(),
            Err(DecodeError::VarIntTooLong)
        ));
        assert_eq!(decoder.buffer(), &bytes[5..]);
    }

    #[test]
    fn truncated_var_int_reports_end_of_stream() {
        let mut decoder = Decoder::new(&[0x80, 0x80]);
        assert!(matches!(
            decoder.read_var_int(),
            Err(DecodeError::EndOfStream(1))
        ));
    }

    #[test]
    fn multi_byte_string_uses_byte_length_prefix() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_string("héllo");
        // 'é' is two bytes in UTF-8
        assert_eq!(buf[0], 6);
        assert_eq!(buf.len(), 7);

        let mut decoder = Decoder::new(&buf);
        assert_eq!(decoder.read_string().unwrap(), "héllo");
        assert!(decoder.is_finished());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut decoder = Decoder::new(&[0x02, 0xc3, 0x28]);
        assert!(matches!(decoder.read_string(), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn overlong_string_is_rejected() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).write_var_int(i16::MAX as i32 + 1);
        assert!(matches!(
            Decoder::new(&buf).read_string(),
            Err(DecodeError::StringTooLong)
        ));
    }

    proptest! {
        #[test]
        fn var_int_roundtrip(value in any::<i32>()) {
            let mut buf = Vec::new();
            let written = Encoder::new(&mut buf).write_var_int(value);
            prop_assert_eq!(written, buf.len());

            let mut decoder = Decoder::new(&buf);
            prop_assert_eq!(decoder.read_var_int().unwrap(), value);
            prop_assert!(decoder.is_finished());
        }

        #[test]
        fn string_roundtrip(value in "\\PC{0,64}") {
            let mut buf = Vec::new();
            Encoder::new(&mut buf).write_string(&value);
            let mut decoder = Decoder::new(&buf);
            prop_assert_eq!(decoder.read_var_int().unwrap() as usize, value.len());

            let mut decoder = Decoder::new(&buf);
            prop_assert_eq!(decoder.read_string().unwrap(), value.as_str());
        }
    }
}
