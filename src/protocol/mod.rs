pub mod wire;

pub use wire::{get_entry, get_record, put_entry, put_record, ENTRY_LEN, RECORD_LEN};

use bytes::{Buf, BufMut};
use thiserror::Error;

/// Protocol version spoken by this build. Bump by one per wire change;
/// peers compare during the handshake.
pub const PROTOCOL_VERSION: i16 = 1;

/// Peer runs an incompatible version.
pub const ERR_INCOMPATIBLE_VERSION: i32 = -1;
/// Peer sent a version this build has never heard of.
pub const ERR_UNKNOWN_VERSION: i32 = -2;
/// Peer sent a block type that does not belong in the current exchange.
pub const ERR_INCORRECT_BLOCK_TYPE: i32 = -3;

/// Encoded size of a [`HandshakeHeader`].
pub const HANDSHAKE_LEN: usize = 38;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("truncated frame: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("incompatible peer version {version} (we speak {PROTOCOL_VERSION})")]
    IncompatibleVersion { version: i16 },

    #[error("peer rejected the handshake with error {error_no}")]
    Rejected { error_no: i32 },
}

/// First frame of every exchange: version, error slot, and room to grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeHeader {
    pub version: i16,
    pub error_no: i32,
    pub reserved: [u8; 32],
}

impl HandshakeHeader {
    pub fn new() -> Self {
        Self {
            version: PROTOCOL_VERSION,
            error_no: 0,
            reserved: [0u8; 32],
        }
    }

    /// A reply announcing a handshake failure to the peer.
    pub fn rejecting(error_no: i32) -> Self {
        Self {
            error_no,
            ..Self::new()
        }
    }

    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_i16_le(self.version);
        buf.put_i32_le(self.error_no);
        buf.put_slice(&self.reserved);
    }

    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, WireError> {
        if buf.remaining() < HANDSHAKE_LEN {
            return Err(WireError::Truncated {
                needed: HANDSHAKE_LEN,
                available: buf.remaining(),
            });
        }
        let version = buf.get_i16_le();
        let error_no = buf.get_i32_le();
        let mut reserved = [0u8; 32];
        buf.copy_to_slice(&mut reserved);
        Ok(Self {
            version,
            error_no,
            reserved,
        })
    }

    /// Accept or refuse a decoded header.
    pub fn validate(&self) -> Result<(), WireError> {
        if self.error_no != 0 {
            return Err(WireError::Rejected {
                error_no: self.error_no,
            });
        }
        if self.version != PROTOCOL_VERSION {
            return Err(WireError::IncompatibleVersion {
                version: self.version,
            });
        }
        Ok(())
    }
}

impl Default for HandshakeHeader {
    fn default() -> Self {
        Self::new()
    }
}
