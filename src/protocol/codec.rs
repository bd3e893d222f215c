//! Length-prefixed packet framing.
//!
//! Every packet on the wire is `varint(length) ++ varint(packet_id) ++ body`,
//! where `length` counts the bytes of the packet ID and body. Encryption and
//! compression are never negotiated by this server, so frames are always
//! plain.

use super::{encoder::var_int_size, Decode, DecodeError, Decoder, Encode, Encoder, BUFFER_LIMIT};

/// One complete packet as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    id: i32,
    id_size: usize,
    /// Packet ID followed by the body.
    data: Vec<u8>,
}

impl Frame {
    /// The packet ID (opcode).
    pub fn id(&self) -> i32 {
        self.id
    }

    /// The bytes following the packet ID.
    pub fn body(&self) -> &[u8] {
        &self.data[self.id_size..]
    }

    /// Decodes the body alone, ignoring the packet ID.
    pub fn decode_body<T: Decode>(&self) -> Result<T, DecodeError> {
        T::decode(&mut Decoder::new(self.body()))
    }

    /// Decodes a packet enum, which reads the packet ID itself.
    pub fn decode_packet<T: Decode>(&self) -> Result<T, DecodeError> {
        T::decode(&mut Decoder::new(&self.data))
    }
}

/// Codec state for one connection.
#[derive(Debug, Default)]
pub struct PacketCodec {
    /// Buffered incoming bytes.
    read_buffer: Vec<u8>,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a packet (ID included) into a single length-prefixed frame.
    pub fn encode_packet(&self, packet: &impl Encode) -> anyhow::Result<Vec<u8>> {
        let mut payload = Vec::new();
        packet.encode(&mut Encoder::new(&mut payload));

        let length = i32::try_from(payload.len())?;
        let mut frame = Vec::with_capacity(var_int_size(length) + payload.len());
        let mut encoder = Encoder::new(&mut frame);
        encoder.write_var_int(length);
        encoder.write_slice(&payload);
        Ok(frame)
    }

    /// Gives data to the internal read buffer.
    ///
    /// Call `next_frame` to get a packet.
    pub fn give_data(&mut self, data: &[u8]) {
        self.read_buffer.extend_from_slice(data);
    }

    /// Attempts to split off the next frame.
    /// This should be called in a loop after any call to `give_data`
    /// until this function returns `None`.
    ///
    /// * If not enough data is available, returns `Ok(None)`.
    /// * If a frame was read, returns `Ok(Some(frame))`. More frames may be available.
    /// * If an error occurs, returns `Err(e)`, invalidating the stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, DecodeError> {
        let mut decoder = Decoder::new(&self.read_buffer);
        let (length, length_size) = match decoder.read_var_int_with_size() {
            Ok(x) => x,
            Err(DecodeError::EndOfStream(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let length = usize::try_from(length)?;
        if length > BUFFER_LIMIT {
            return Err(DecodeError::PacketTooLarge(length));
        }

        let contents = match decoder.consume_slice(length) {
            Ok(x) => x,
            Err(DecodeError::EndOfStream(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let (id, id_size) = Decoder::new(contents).read_var_int_with_size()?;
        let frame = Frame {
            id,
            id_size,
            data: contents.to_vec(),
        };

        self.read_buffer.drain(..length_size + length);
        Ok(Some(frame))
    }
}
