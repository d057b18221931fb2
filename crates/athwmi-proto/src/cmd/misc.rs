use athwmi_wire::{Field, RecordReader, RecordWriter, WireError};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelArg;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::record::{CommandRecord, Record};

/// ECHO; the firmware answers with an echo event carrying the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EchoArg {
    pub value: u32,
}

impl Record for EchoArg {
    const NAME: &'static str = "echo";

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

impl CommandRecord for EchoArg {
    const COMMANDS: &'static [Command] = &[Command::Echo];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum FwHangType {
    Assert = 1,
    NoDetect = 2,
    CtrlEpFull = 3,
    EmptyPoint = 4,
    StackOverflow = 5,
    InfiniteLoop = 6,
}

impl FwHangType {
    pub fn from_u32(value: u32) -> Result<Self> {
        Ok(match value {
            1 => FwHangType::Assert,
            2 => FwHangType::NoDetect,
            3 => FwHangType::CtrlEpFull,
            4 => FwHangType::EmptyPoint,
            5 => FwHangType::StackOverflow,
            6 => FwHangType::InfiniteLoop,
            _ => {
                return Err(WireError::InvalidValue {
                    field: "hang_type",
                    value,
                }
                .into())
            }
        })
    }
}

/// Let the firmware pick when to hang.
pub const FORCE_FW_HANG_RANDOM_TIME: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceFwHangArg {
    pub hang_type: FwHangType,
    pub delay_ms: u32,
}

impl Record for ForceFwHangArg {
    const NAME: &'static str = "force_fw_hang";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.hang_type as u32, self.delay_ms]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4)?;
        let [hang_type, delay_ms] = r.get_words::<2>()?;
        Ok(Self {
            hang_type: FwHangType::from_u32(hang_type)?,
            delay_ms,
        })
    }
}

impl CommandRecord for ForceFwHangArg {
    const COMMANDS: &'static [Command] = &[Command::ForceFwHang];
}

// dbglog config word
pub const DBGLOG_VAP_LOG: Field = Field::new(0x0000_FFFF, 0);
pub const DBGLOG_REPORTING_ENABLE: Field = Field::new(0x0001_0000, 16);
pub const DBGLOG_RESOLUTION: Field = Field::new(0x000E_0000, 17);
pub const DBGLOG_REPORT_SIZE: Field = Field::new(0x0FF0_0000, 20);
pub const DBGLOG_LOG_LVL: Field = Field::new(0x7000_0000, 28);

/// Minimum firmware log level; not a mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum DbglogLevel {
    Verbose = 0,
    Info = 1,
    #[default]
    Warn = 2,
    Err = 3,
}

/// DBGLOG_CFG. `*_valid` masks select which bits the firmware updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DbglogCfgArg {
    pub module_enable: u32,
    pub config_enable: u32,
    pub module_valid: u32,
    pub config_valid: u32,
}

impl DbglogCfgArg {
    /// Enable or disable firmware logging for the modules in `module_mask`.
    ///
    /// With logging on, reports are batched in groups of 10 at the chosen
    /// minimum level.
    pub fn for_modules(module_mask: u32, level: DbglogLevel) -> Self {
        let (module_enable, config_enable) = if module_mask != 0 {
            let config = athwmi_wire::pack(&[
                (DBGLOG_REPORTING_ENABLE, 1),
                (DBGLOG_LOG_LVL, level as u32),
                (DBGLOG_RESOLUTION, 1),
                (DBGLOG_REPORT_SIZE, 10),
            ]);
            (module_mask, config)
        } else {
            (0, DBGLOG_LOG_LVL.put(DbglogLevel::Warn as u32))
        };
        Self {
            module_enable,
            config_enable,
            module_valid: u32::MAX,
            config_valid: DBGLOG_REPORTING_ENABLE.mask
                | DBGLOG_LOG_LVL.mask
                | DBGLOG_RESOLUTION.mask
                | DBGLOG_REPORT_SIZE.mask,
        }
    }
}

impl Record for DbglogCfgArg {
    const NAME: &'static str = "dbglog_cfg";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.module_enable,
            self.config_enable,
            self.module_valid,
            self.config_valid,
        ]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 * 4)?;
        let [module_enable, config_enable, module_valid, config_valid] = r.get_words::<4>()?;
        Ok(Self {
            module_enable,
            config_enable,
            module_valid,
            config_valid,
        })
    }
}

impl CommandRecord for DbglogCfgArg {
    const COMMANDS: &'static [Command] = &[Command::DbglogCfg];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsaOffloadEnableArg {
    pub vdev_id: u32,
    pub enable: bool,
}

impl Record for CsaOffloadEnableArg {
    const NAME: &'static str = "csa_offload_enable";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        w.put_bool(self.enable);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4)?;
        Ok(Self {
            vdev_id: r.get_u32()?,
            enable: r.get_bool()?,
        })
    }
}

impl CommandRecord for CsaOffloadEnableArg {
    const COMMANDS: &'static [Command] = &[Command::CsaOffloadEnable];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CsaChanswitchArg {
    pub vdev_id: u32,
    pub channel: ChannelArg,
}

impl Record for CsaChanswitchArg {
    const NAME: &'static str = "csa_offload_chanswitch";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_id);
        self.channel.encode(ctx, w)
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 + ChannelArg::WIRE_SIZE)?;
        Ok(Self {
            vdev_id: r.get_u32()?,
            channel: ChannelArg::decode(ctx, r)?,
        })
    }
}

impl CommandRecord for CsaChanswitchArg {
    const COMMANDS: &'static [Command] = &[Command::CsaOffloadChanswitch];
}
