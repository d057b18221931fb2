use athwmi_wire::{RecordReader, RecordWriter};
use bytes::Bytes;

use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

pub const CHAN_INFO_FLAG_COMPLETE: u32 = 1 << 0;

/// Longest firmware debug message, NUL terminator included.
pub const MAX_DEBUG_MESG: usize = 4 * 32;

/// CHAN_INFO: per-channel survey counters reported during a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChanInfoEvent {
    pub err_code: u32,
    pub freq: u32,
    pub cmd_flags: u32,
    pub noise_floor: i32,
    pub rx_clear_count: u32,
    pub cycle_count: u32,
}

impl ChanInfoEvent {
    pub const WIRE_SIZE: usize = 6 * 4;

    /// The dwell on this channel finished; the counters are final.
    pub fn is_complete(&self) -> bool {
        self.cmd_flags & CHAN_INFO_FLAG_COMPLETE != 0
    }
}

impl Record for ChanInfoEvent {
    const NAME: &'static str = "chan_info";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.err_code, self.freq, self.cmd_flags]);
        w.put_i32(self.noise_floor);
        w.put_words(&[self.rx_clear_count, self.cycle_count]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        let [err_code, freq, cmd_flags] = r.get_words::<3>()?;
        let noise_floor = r.get_i32()?;
        let [rx_clear_count, cycle_count] = r.get_words::<2>()?;
        Ok(Self {
            err_code,
            freq,
            cmd_flags,
            noise_floor,
            rx_clear_count,
            cycle_count,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EchoEvent {
    pub value: u32,
}

impl Record for EchoEvent {
    const NAME: &'static str = "echo_event";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.value);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self {
            value: r.get_u32()?,
        })
    }
}

/// DEBUG_MESG: a text line from the firmware.
///
/// Only the first [`MAX_DEBUG_MESG`] bytes are kept and the text ends at the
/// first NUL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugMesg {
    pub raw: Bytes,
}

impl DebugMesg {
    pub fn from_payload(payload: Bytes) -> Self {
        let len = payload.len().min(MAX_DEBUG_MESG);
        Self {
            raw: payload.slice(..len),
        }
    }

    pub fn text(&self) -> String {
        let end = self
            .raw
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.raw.len());
        String::from_utf8_lossy(&self.raw[..end]).into_owned()
    }
}
