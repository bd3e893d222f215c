use maintenance_server_macros::{Decode, Encode, FromVariants};

#[derive(Debug, Clone, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    Disconnect(Disconnect),
}

#[derive(Debug, Clone, Encode, Decode)]
pub struct Disconnect {
    /// JSON text component, e.g. `{"text":"..."}`.
    pub reason: String,
}
