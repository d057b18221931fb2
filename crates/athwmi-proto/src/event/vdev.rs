use athwmi_wire::{MacAddr, RecordReader, RecordWriter, WireError};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum VdevResponseType {
    Start = 0,
    Restart = 1,
}

impl VdevResponseType {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(VdevResponseType::Start),
            1 => Ok(VdevResponseType::Restart),
            _ => Err(WireError::InvalidValue {
                field: "resp_type",
                value,
            }
            .into()),
        }
    }
}

pub const VDEV_START_STATUS_SUCCESS: u32 = 0;
pub const VDEV_START_STATUS_INVALID_VDEVID: u32 = 1;
pub const VDEV_START_STATUS_NOT_SUPPORTED: u32 = 2;

/// VDEV_START_RESP: answer to a start or restart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdevStartResp {
    pub vdev_id: u32,
    pub req_id: u32,
    pub resp_type: VdevResponseType,
    pub status: u32,
}

impl VdevStartResp {
    pub const WIRE_SIZE: usize = 4 * 4;

    pub fn is_success(&self) -> bool {
        self.status == VDEV_START_STATUS_SUCCESS
    }
}

impl Record for VdevStartResp {
    const NAME: &'static str = "vdev_start_resp";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.vdev_id,
            self.req_id,
            self.resp_type as u32,
            self.status,
        ]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let [vdev_id, req_id, resp_type, status] = r.get_words::<4>()?;
        Ok(Self {
            vdev_id,
            req_id,
            resp_type: VdevResponseType::from_u32(resp_type)?,
            status,
        })
    }
}

/// The body shared by VDEV_STOPPED, VDEV_STANDBY_REQ and VDEV_RESUME_REQ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VdevIdEvent {
    pub vdev_id: u32,
}

impl Record for VdevIdEvent {
    const NAME: &'static str = "vdev_event";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self {
            vdev_id: r.get_u32()?,
        })
    }
}

/// PEER_STA_KICKOUT: the firmware gave up on a station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PeerStaKickout {
    pub peer: MacAddr,
}

impl Record for PeerStaKickout {
    const NAME: &'static str = "peer_sta_kickout";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_mac(self.peer);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self { peer: r.get_mac()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::Main)
    }

    #[test]
    fn start_resp_restart() {
        let mut w = RecordWriter::new();
        w.put_words(&[3, 7, 1, VDEV_START_STATUS_NOT_SUPPORTED]);
        let resp = VdevStartResp::from_bytes(&ctx(), w.freeze()).unwrap();
        assert_eq!(resp.vdev_id, 3);
        assert_eq!(resp.resp_type, VdevResponseType::Restart);
        assert!(!resp.is_success());
    }

    #[test]
    fn start_resp_rejects_unknown_type() {
        let mut w = RecordWriter::new();
        w.put_words(&[0, 0, 5, 0]);
        let err = VdevStartResp::from_bytes(&ctx(), w.freeze()).unwrap_err();
        assert_eq!(
            err,
            ProtoError::Wire(WireError::InvalidValue {
                field: "resp_type",
                value: 5
            })
        );
    }

    #[test]
    fn kickout_mac() {
        let kickout = PeerStaKickout {
            peer: MacAddr([0x00, 0x03, 0x7f, 0x01, 0x02, 0x03]),
        };
        let bytes = kickout.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), MacAddr::WIRE_SIZE);
        assert_eq!(PeerStaKickout::from_bytes(&ctx(), bytes).unwrap(), kickout);
    }

    #[test]
    fn empty_vdev_event_is_truncated() {
        assert!(VdevIdEvent::from_bytes(&ctx(), Vec::<u8>::new()).is_err());
    }
}
