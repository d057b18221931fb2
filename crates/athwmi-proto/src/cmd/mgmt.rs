//! Frames handed to the firmware for transmission.

use athwmi_wire::{MacAddr, RecordReader, RecordWriter};
use bytes::Bytes;

use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::record::{CommandRecord, Record};

/// MGMT_TX: a complete 802.11 management frame for one peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MgmtTxArg {
    pub vdev_id: u32,
    pub peer: MacAddr,
    pub tx_rate: u32,
    pub tx_power: u32,
    pub frame: Bytes,
}

impl MgmtTxArg {
    pub const HEADER_SIZE: usize = 4 + MacAddr::WIRE_SIZE + 3 * 4;
}

impl Record for MgmtTxArg {
    const NAME: &'static str = "mgmt_tx";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_mac(self.peer);
        w.put_words(&[self.tx_rate, self.tx_power, self.frame.len() as u32]);
        w.put_bytes_padded(&self.frame);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let vdev_id = r.get_u32()?;
        let peer = r.get_mac()?;
        let [tx_rate, tx_power, buf_len] = r.get_words::<3>()?;
        Ok(Self {
            vdev_id,
            peer,
            tx_rate,
            tx_power,
            frame: r.get_bytes_padded(buf_len as usize)?,
        })
    }
}

impl CommandRecord for MgmtTxArg {
    const COMMANDS: &'static [Command] = &[Command::MgmtTx];
}

/// BCN_TX: a beacon sent by reference from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BcnTxArg {
    pub vdev_id: u32,
    pub tx_rate: u32,
    pub tx_power: u32,
    pub beacon: Bytes,
}

impl BcnTxArg {
    pub const HEADER_SIZE: usize = 4 * 4;
}

impl Record for BcnTxArg {
    const NAME: &'static str = "bcn_tx";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.vdev_id,
            self.tx_rate,
            self.tx_power,
            self.beacon.len() as u32,
        ]);
        w.put_bytes_padded(&self.beacon);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let [vdev_id, tx_rate, tx_power, bcn_len] = r.get_words::<4>()?;
        Ok(Self {
            vdev_id,
            tx_rate,
            tx_power,
            beacon: r.get_bytes_padded(bcn_len as usize)?,
        })
    }
}

impl CommandRecord for BcnTxArg {
    const COMMANDS: &'static [Command] = &[Command::BcnTx];
}
