//! Wire format of the server list protocol: VarInts, strings, framing
//! and the packets this server understands.

mod codec;
mod decoder;
mod encoder;
pub mod packet;

pub use codec::{Frame, PacketCodec};
pub use decoder::{Decode, DecodeError, Decoder};
pub use encoder::{Encode, Encoder};

/// Limit to avoid out-of-memory DOS.
const BUFFER_LIMIT: usize = 1024 * 1024; // 1 MiB

/// Protocol phase of a connection.
///
/// The ordinal of each variant is its `next_state` index in the
/// handshake packet.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr)]
pub enum Phase {
    Handshake,
    Status,
    Login,
    /// Reserved. Never entered by this server.
    Play,
}

impl Phase {
    /// All phases, indexed by ordinal.
    pub const ALL: [Phase; 4] = [Phase::Handshake, Phase::Status, Phase::Login, Phase::Play];

    /// Looks up the phase addressed by a handshake's `next_state`.
    pub fn from_ordinal(ordinal: i32) -> Result<Self, DecodeError> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(DecodeError::InvalidPhase(ordinal))
    }

    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_lookup_table() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_ordinal(phase.ordinal()).unwrap(), phase);
        }
        assert_eq!(Phase::from_ordinal(1).unwrap(), Phase::Status);
        assert_eq!(Phase::from_ordinal(2).unwrap(), Phase::Login);
    }

    #[test]
    fn out_of_range_ordinal_is_rejected() {
        for ordinal in [-1, 4, 99, i32::MAX, i32::MIN] {
            assert!(matches!(
                Phase::from_ordinal(ordinal),
                Err(DecodeError::InvalidPhase(x)) if x == ordinal
            ));
        }
    }

    #[test]
    fn phases_only_move_forward() {
        assert!(Phase::Handshake < Phase::Status);
        assert!(Phase::Status < Phase::Login);
        assert!(Phase::Login < Phase::Play);
    }
}
