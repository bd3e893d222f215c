//! Packets spoken by the server list protocol.
//!
//! Only the Handshake, Status and Login phases have packets here. Play is
//! never entered, so it has none.

pub mod client {
    //! Packets sent by the client.
    pub mod handshake;
    pub mod status;
}

pub mod server {
    //! Packets sent by the server.
    pub mod login;
    pub mod status;
}
