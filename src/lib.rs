//! A placeholder Minecraft server for maintenance windows.
//!
//! It speaks just enough of the protocol to show up in a client's server
//! list: it answers status requests with a configurable MOTD, version and
//! player count, echoes pings, and kicks everyone who tries to log in with
//! a fixed message. There is no gameplay; the Play phase is never entered.
//!
//! # Connection flow
//! Each TCP connection is served by its own task ([`connection::Connection`]).
//! The first packet is the handshake, which names the next phase:
//! * Status: the status reply is sent right away, then status requests
//!   and pings are answered until the client disconnects.
//! * Login: a Disconnect packet carrying the kick message is sent and the
//!   connection is closed.
//!
//! Anything else, or any malformed packet, closes the connection.

pub mod config;
pub mod connection;
pub mod console;
pub mod favicon;
pub mod protocol;
pub mod server;
pub mod server_info;

#[cfg(test)]
mod test_util;
