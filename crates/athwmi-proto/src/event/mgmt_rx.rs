//! Received management frames.

use athwmi_wire::{RecordReader, RecordWriter};
use bytes::Bytes;

use crate::error::Result;
use crate::generation::{AbiContext, MgmtRxShape};
use crate::record::Record;

pub const RX_STATUS_OK: u32 = 0x00;
pub const RX_STATUS_ERR_CRC: u32 = 0x01;
pub const RX_STATUS_ERR_DECRYPT: u32 = 0x08;
pub const RX_STATUS_ERR_MIC: u32 = 0x10;
pub const RX_STATUS_ERR_KEY_CACHE_MISS: u32 = 0x20;

/// Per-chain control-channel RSSI in the extended header.
pub const MGMT_RX_CHAINS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MgmtRxEvent {
    /// Channel frequency in MHz.
    pub channel: u32,
    pub snr: u32,
    pub rate: u32,
    pub phy_mode: u32,
    pub status: u32,
    /// Present only when the firmware emits the extended header.
    pub rssi_ctl: Option<[u32; MGMT_RX_CHAINS]>,
    /// Exactly `buf_len` bytes of 802.11 frame.
    pub frame: Bytes,
}

impl MgmtRxEvent {
    pub const V1_HEADER_SIZE: usize = 6 * 4;
    pub const V2_HEADER_SIZE: usize = Self::V1_HEADER_SIZE + MGMT_RX_CHAINS * 4;

    pub fn header_size(shape: MgmtRxShape) -> usize {
        match shape {
            MgmtRxShape::V1 => Self::V1_HEADER_SIZE,
            MgmtRxShape::V2 => Self::V2_HEADER_SIZE,
        }
    }

    /// Frames that failed FCS or decryption are still reported when the
    /// host asked for them; callers usually drop them.
    pub fn is_ok(&self) -> bool {
        self.status == RX_STATUS_OK
    }

    pub fn crc_error(&self) -> bool {
        self.status & RX_STATUS_ERR_CRC != 0
    }

    pub fn decrypt_error(&self) -> bool {
        self.status & (RX_STATUS_ERR_DECRYPT | RX_STATUS_ERR_MIC | RX_STATUS_ERR_KEY_CACHE_MISS) != 0
    }
}

impl Record for MgmtRxEvent {
    const NAME: &'static str = "mgmt_rx";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.channel,
            self.snr,
            self.rate,
            self.phy_mode,
            self.frame.len() as u32,
            self.status,
        ]);
        if ctx.mgmt_rx_shape() == MgmtRxShape::V2 {
            w.put_words(&self.rssi_ctl.unwrap_or_default());
        }
        w.put_bytes_padded(&self.frame);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        let shape = ctx.mgmt_rx_shape();
        r.require(Self::header_size(shape))?;
        let [channel, snr, rate, phy_mode, buf_len, status] = r.get_words::<6>()?;
        let rssi_ctl = match shape {
            MgmtRxShape::V1 => None,
            MgmtRxShape::V2 => Some(r.get_words::<MGMT_RX_CHAINS>()?),
        };
        Ok(Self {
            channel,
            snr,
            rate,
            phy_mode,
            status,
            rssi_ctl,
            frame: r.get_bytes_padded(buf_len as usize)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::generation::{FirmwareDescriptor, ProtocolGeneration};
    use athwmi_wire::WireError;

    const BEACON: [u8; 6] = [0x80, 0x00, 0x00, 0x00, 0xFF, 0xFF];

    fn header(buf_len: u32, status: u32) -> RecordWriter {
        let mut w = RecordWriter::new();
        w.put_words(&[2412, 40, 0, 3, buf_len, status]);
        w
    }

    #[test]
    fn v1_frame_bounded_by_buf_len() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let mut w = header(BEACON.len() as u32, RX_STATUS_OK);
        w.put_bytes_padded(&BEACON);
        let event = MgmtRxEvent::from_bytes(&ctx, w.freeze()).unwrap();
        assert_eq!(event.channel, 2412);
        assert_eq!(&event.frame[..], &BEACON);
        assert!(event.rssi_ctl.is_none());
        assert!(event.is_ok());
    }

    #[test]
    fn v2_reads_chain_rssi_before_frame() {
        let ctx = AbiContext::select(&FirmwareDescriptor {
            wmi_10x: false,
            ext_mgmt_rx: true,
        });
        let mut w = header(BEACON.len() as u32, RX_STATUS_ERR_MIC);
        w.put_words(&[30, 31, 0x80, 0x80]);
        w.put_bytes_padded(&BEACON);
        let event = MgmtRxEvent::from_bytes(&ctx, w.freeze()).unwrap();
        assert_eq!(event.rssi_ctl, Some([30, 31, 0x80, 0x80]));
        assert_eq!(&event.frame[..], &BEACON);
        assert!(event.decrypt_error());
        assert!(!event.crc_error());

        let bytes = event.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), MgmtRxEvent::V2_HEADER_SIZE + 8);
    }

    #[test]
    fn buf_len_past_payload_is_truncated() {
        let ctx = AbiContext::new(ProtocolGeneration::TenX);
        let mut w = header(200, RX_STATUS_OK);
        w.put_bytes_padded(&BEACON);
        let err = MgmtRxEvent::from_bytes(&ctx, w.freeze()).unwrap_err();
        assert!(matches!(err, ProtoError::Wire(WireError::Truncated { .. })));
    }

    #[test]
    fn short_header_is_truncated() {
        let ctx = AbiContext::new(ProtocolGeneration::Main);
        let err = MgmtRxEvent::from_bytes(&ctx, vec![0u8; 12]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::Wire(WireError::Truncated { need: 24, have: 12, .. })
        ));
    }
}
