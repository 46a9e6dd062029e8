//! DDC/CI command request and reply types.
//!
//! Each request type implements [`Command`], pairing the encoded payload
//! with the decode of its reply and the delay intervals the DDC/CI
//! specification mandates around it. Framing, checksums, and timing are
//! applied by [`Ddc`](crate::Ddc), which executes these commands.

use crate::error::{Error, ProtocolError};

/// Get VCP Feature opcode.
pub const GET_VCP_FEATURE: u8 = 0x01;
/// Get VCP Feature reply opcode.
pub const GET_VCP_FEATURE_REPLY: u8 = 0x02;
/// Set VCP Feature opcode.
pub const SET_VCP_FEATURE: u8 = 0x03;
/// Capabilities Request opcode.
pub const CAPABILITIES_REQUEST: u8 = 0xF3;
/// Capabilities Reply opcode.
pub const CAPABILITIES_REPLY: u8 = 0xE3;

/// A VCP feature code.
pub type FeatureCode = u8;

/// A DDC/CI request with an associated reply type.
pub trait Command {
    /// Decoded reply type.
    type Reply;

    /// Whether the monitor answers this command with a reply frame.
    const HAS_REPLY: bool;
    /// Minimum delay in milliseconds between sending the request and
    /// reading its reply.
    const DELAY_RESPONSE_MS: u64;
    /// Minimum delay in milliseconds before the next command may be sent.
    const DELAY_COMMAND_MS: u64;

    /// Encoded payload length in bytes.
    fn len(&self) -> usize;

    /// Encodes the request payload into `data`, returning the number of
    /// bytes written.
    fn encode(&self, data: &mut [u8]) -> Result<usize, ProtocolError>;

    /// Decodes and validates the reply payload. Called with an empty slice
    /// when the command has no reply.
    fn decode(&self, data: &[u8]) -> Result<Self::Reply, Error>;
}

/// Retrieve the current and maximum value of a VCP feature.
#[derive(Copy, Clone, Debug)]
pub struct GetVcpFeature {
    /// Requested feature code.
    pub code: FeatureCode,
}

impl GetVcpFeature {
    /// Requests the value of `code`.
    pub fn new(code: FeatureCode) -> Self {
        GetVcpFeature { code }
    }
}

impl Command for GetVcpFeature {
    type Reply = VcpValue;
    const HAS_REPLY: bool = true;
    const DELAY_RESPONSE_MS: u64 = 40;
    const DELAY_COMMAND_MS: u64 = 50;

    fn len(&self) -> usize {
        2
    }

    fn encode(&self, data: &mut [u8]) -> Result<usize, ProtocolError> {
        assert!(data.len() >= 2);
        data[0] = GET_VCP_FEATURE;
        data[1] = self.code;

        Ok(2)
    }

    fn decode(&self, data: &[u8]) -> Result<VcpValue, Error> {
        if data.len() != 8 {
            return Err(ProtocolError::InvalidLength.into());
        }
        if data[0] != GET_VCP_FEATURE_REPLY {
            return Err(ProtocolError::InvalidOpcode.into());
        }
        match data[1] {
            0x00 => (),
            0x01 => return Err(Error::UnsupportedFeature { code: self.code }),
            rc => {
                return Err(ProtocolError::Invalid(format!(
                    "unrecognized VCP result code {:#04x}",
                    rc
                ))
                .into())
            }
        }
        if data[2] != self.code {
            return Err(ProtocolError::Invalid(format!(
                "reply echoed VCP code {:#04x}, requested {:#04x}",
                data[2], self.code
            ))
            .into());
        }

        Ok(VcpValue {
            ty: data[3],
            maximum: u16::from_be_bytes([data[4], data[5]]),
            current: u16::from_be_bytes([data[6], data[7]]),
        })
    }
}

/// A Get VCP Feature reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VcpValue {
    /// VCP type code echoed by the monitor.
    pub ty: u8,
    /// Maximum value of the feature.
    pub maximum: u16,
    /// Current value of the feature.
    pub current: u16,
}

/// Set the value of a VCP feature. No reply.
#[derive(Copy, Clone, Debug)]
pub struct SetVcpFeature {
    /// Feature code to write.
    pub code: FeatureCode,
    /// Value to write.
    pub value: u16,
}

impl SetVcpFeature {
    /// Writes `value` to `code`.
    pub fn new(code: FeatureCode, value: u16) -> Self {
        SetVcpFeature { code, value }
    }
}

impl Command for SetVcpFeature {
    type Reply = ();
    const HAS_REPLY: bool = false;
    const DELAY_RESPONSE_MS: u64 = 0;
    const DELAY_COMMAND_MS: u64 = 50;

    fn len(&self) -> usize {
        4
    }

    fn encode(&self, data: &mut [u8]) -> Result<usize, ProtocolError> {
        assert!(data.len() >= 4);
        data[0] = SET_VCP_FEATURE;
        data[1] = self.code;
        data[2] = (self.value >> 8) as u8;
        data[3] = self.value as u8;

        Ok(4)
    }

    fn decode(&self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }
}

/// Request one fragment of the capability string, starting at `offset`.
#[derive(Copy, Clone, Debug)]
pub struct CapabilitiesRequest {
    /// Byte offset into the capability string.
    pub offset: u16,
}

impl CapabilitiesRequest {
    /// Requests the fragment at `offset`.
    pub fn new(offset: u16) -> Self {
        CapabilitiesRequest { offset }
    }
}

impl Command for CapabilitiesRequest {
    type Reply = CapabilitiesReply;
    const HAS_REPLY: bool = true;
    const DELAY_RESPONSE_MS: u64 = 40;
    const DELAY_COMMAND_MS: u64 = 50;

    fn len(&self) -> usize {
        3
    }

    fn encode(&self, data: &mut [u8]) -> Result<usize, ProtocolError> {
        assert!(data.len() >= 3);
        data[0] = CAPABILITIES_REQUEST;
        data[1] = (self.offset >> 8) as u8;
        data[2] = self.offset as u8;

        Ok(3)
    }

    fn decode(&self, data: &[u8]) -> Result<CapabilitiesReply, Error> {
        if data.len() < 3 || data.len() > 35 {
            return Err(ProtocolError::InvalidLength.into());
        }
        if data[0] != CAPABILITIES_REPLY {
            return Err(ProtocolError::InvalidOpcode.into());
        }

        Ok(CapabilitiesReply {
            offset: u16::from_be_bytes([data[1], data[2]]),
            data: data[3..].to_vec(),
        })
    }
}

/// One fragment of the capability string.
#[derive(Clone, Debug)]
pub struct CapabilitiesReply {
    /// Echoed byte offset of this fragment.
    pub offset: u16,
    /// Fragment bytes; empty once the whole string has been transferred.
    pub data: Vec<u8>,
}

impl<C: Command> Command for &C {
    type Reply = C::Reply;
    const HAS_REPLY: bool = C::HAS_REPLY;
    const DELAY_RESPONSE_MS: u64 = C::DELAY_RESPONSE_MS;
    const DELAY_COMMAND_MS: u64 = C::DELAY_COMMAND_MS;

    fn len(&self) -> usize {
        (*self).len()
    }

    fn encode(&self, data: &mut [u8]) -> Result<usize, ProtocolError> {
        (*self).encode(data)
    }

    fn decode(&self, data: &[u8]) -> Result<Self::Reply, Error> {
        (*self).decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_payload_shape() {
        let mut data = [0u8; 36];
        let len = GetVcpFeature::new(0x10).encode(&mut data).unwrap();
        assert_eq!(&data[..len], [0x01, 0x10]);
    }

    #[test]
    fn set_payload_shape() {
        let mut data = [0u8; 36];
        let len = SetVcpFeature::new(0x10, 300).encode(&mut data).unwrap();
        assert_eq!(&data[..len], [0x03, 0x10, 0x01, 0x2C]);
    }

    #[test]
    fn capabilities_payload_shape() {
        let mut data = [0u8; 36];
        let len = CapabilitiesRequest::new(0x1234).encode(&mut data).unwrap();
        assert_eq!(&data[..len], [0xF3, 0x12, 0x34]);
    }

    #[test]
    fn get_reply_decodes() {
        let get = GetVcpFeature::new(0x10);
        let value = get
            .decode(&[0x02, 0x00, 0x10, 0x00, 0x00, 0x64, 0x00, 0x32])
            .unwrap();
        assert_eq!(value.maximum, 100);
        assert_eq!(value.current, 50);
    }

    #[test]
    fn get_reply_rejects_wrong_length() {
        let get = GetVcpFeature::new(0x10);
        assert!(matches!(
            get.decode(&[0x02, 0x00, 0x10]),
            Err(Error::Protocol(ProtocolError::InvalidLength))
        ));
    }

    #[test]
    fn get_reply_rejects_wrong_opcode() {
        let get = GetVcpFeature::new(0x10);
        assert!(matches!(
            get.decode(&[0x03, 0x00, 0x10, 0x00, 0x00, 0x64, 0x00, 0x32]),
            Err(Error::Protocol(ProtocolError::InvalidOpcode))
        ));
    }

    #[test]
    fn get_reply_surfaces_unsupported_code() {
        let get = GetVcpFeature::new(0xE0);
        assert!(matches!(
            get.decode(&[0x02, 0x01, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x00]),
            Err(Error::UnsupportedFeature { code: 0xE0 })
        ));
    }

    #[test]
    fn get_reply_rejects_mismatched_echo() {
        let get = GetVcpFeature::new(0x10);
        assert!(matches!(
            get.decode(&[0x02, 0x00, 0x12, 0x00, 0x00, 0x64, 0x00, 0x32]),
            Err(Error::Protocol(ProtocolError::Invalid(_)))
        ));
    }

    #[test]
    fn capabilities_reply_decodes() {
        let request = CapabilitiesRequest::new(30);
        let reply = request.decode(&[0xE3, 0x00, 0x1E, b'a', b'b', b'c']).unwrap();
        assert_eq!(reply.offset, 30);
        assert_eq!(reply.data, b"abc");
    }

    #[test]
    fn capabilities_reply_rejects_out_of_range_lengths() {
        let request = CapabilitiesRequest::new(0);
        assert!(matches!(
            request.decode(&[0xE3, 0x00]),
            Err(Error::Protocol(ProtocolError::InvalidLength))
        ));
        assert!(matches!(
            request.decode(&[0u8; 36]),
            Err(Error::Protocol(ProtocolError::InvalidLength))
        ));
    }
}
