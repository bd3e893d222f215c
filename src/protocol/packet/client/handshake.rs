use crate::protocol::{DecodeError, Phase};
use maintenance_server_macros::{Decode, Encode, FromVariants};

#[derive(Debug, Clone, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    Handshake(Handshake),
}

/// First packet of every connection.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Handshake {
    #[encoding(varint)]
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    /// Ordinal of the requested [`Phase`].
    #[encoding(varint)]
    pub next_state: i32,
}

impl Handshake {
    /// The phase this handshake asks for, bounds-checked against [`Phase::ALL`].
    pub fn next_phase(&self) -> Result<Phase, DecodeError> {
        Phase::from_ordinal(self.next_state)
    }
}
