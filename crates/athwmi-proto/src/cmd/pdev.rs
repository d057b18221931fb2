use athwmi_wire::{RecordReader, RecordWriter, WireError};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelArg;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::ids::Command;
use crate::params::PdevParam;
use crate::record::{CommandRecord, Record};

/// Number of DSCP code points mapped to TIDs.
pub const DSCP_MAP_MAX: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegdomainArg {
    pub reg_domain: u32,
    pub reg_domain_2g: u32,
    pub reg_domain_5g: u32,
    pub conformance_test_limit_2g: u32,
    pub conformance_test_limit_5g: u32,
}

impl Record for RegdomainArg {
    const NAME: &'static str = "pdev_set_regdomain";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.reg_domain,
            self.reg_domain_2g,
            self.reg_domain_5g,
            self.conformance_test_limit_2g,
            self.conformance_test_limit_5g,
        ]);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(5 * 4)?;
        let [reg_domain, reg_domain_2g, reg_domain_5g, conformance_test_limit_2g, conformance_test_limit_5g] =
            r.get_words::<5>()?;
        Ok(Self {
            reg_domain,
            reg_domain_2g,
            reg_domain_5g,
            conformance_test_limit_2g,
            conformance_test_limit_5g,
        })
    }
}

impl CommandRecord for RegdomainArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetRegdomain];
}

/// PDEV_SET_CHANNEL carries a bare channel descriptor; the firmware only
/// looks at frequency, mode and flags.
impl CommandRecord for ChannelArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetChannel];
}

/// PDEV_SET_PARAM. The parameter id is resolved for the active generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdevSetParamArg {
    pub param: PdevParam,
    pub value: u32,
}

impl Record for PdevSetParamArg {
    const NAME: &'static str = "pdev_set_param";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.param.resolve(ctx.generation())?);
        w.put_u32(self.value);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(2 * 4)?;
        let [id, value] = r.get_words::<2>()?;
        Ok(Self {
            param: PdevParam::from_id(id, ctx.generation())?,
            value,
        })
    }
}

impl CommandRecord for PdevSetParamArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetParam];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum SuspendOpt {
    #[default]
    Suspend = 0,
    SuspendAndDisableIntr = 1,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuspendArg {
    pub opt: SuspendOpt,
}

impl Record for SuspendArg {
    const NAME: &'static str = "pdev_suspend";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.opt as u32);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        let opt = match r.get_u32()? {
            0 => SuspendOpt::Suspend,
            1 => SuspendOpt::SuspendAndDisableIntr,
            value => {
                return Err(WireError::InvalidValue {
                    field: "suspend_opt",
                    value,
                }
                .into())
            }
        };
        Ok(Self { opt })
    }
}

impl CommandRecord for SuspendArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSuspend];
}

/// Quiet period, all values in TUs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietModeArg {
    pub period: u32,
    pub duration: u32,
    pub next_start: u32,
    pub enabled: bool,
}

impl Record for QuietModeArg {
    const NAME: &'static str = "pdev_set_quiet";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[self.period, self.duration, self.next_start]);
        w.put_bool(self.enabled);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 * 4)?;
        let [period, duration, next_start] = r.get_words::<3>()?;
        Ok(Self {
            period,
            duration,
            next_start,
            enabled: r.get_bool()?,
        })
    }
}

impl CommandRecord for QuietModeArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetQuietMode];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetTpcConfigArg {
    pub param: u32,
}

impl Record for GetTpcConfigArg {
    const NAME: &'static str = "pdev_get_tpc_config";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.param);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self {
            param: r.get_u32()?,
        })
    }
}

impl CommandRecord for GetTpcConfigArg {
    const COMMANDS: &'static [Command] = &[Command::PdevGetTpcConfig];
}

/// EDCA parameters for one access category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmmParams {
    pub cwmin: u32,
    pub cwmax: u32,
    pub aifs: u32,
    pub txop: u32,
    pub acm: u32,
    pub no_ack: u32,
}

impl WmmParams {
    fn put(&self, w: &mut RecordWriter) {
        w.put_words(&[
            self.cwmin,
            self.cwmax,
            self.aifs,
            self.txop,
            self.acm,
            self.no_ack,
        ]);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let [cwmin, cwmax, aifs, txop, acm, no_ack] = r.get_words::<6>()?;
        Ok(Self {
            cwmin,
            cwmax,
            aifs,
            txop,
            acm,
            no_ack,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WmmParamsArg {
    pub ac_be: WmmParams,
    pub ac_bk: WmmParams,
    pub ac_vi: WmmParams,
    pub ac_vo: WmmParams,
}

impl Record for WmmParamsArg {
    const NAME: &'static str = "pdev_set_wmm_params";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        for ac in [&self.ac_be, &self.ac_bk, &self.ac_vi, &self.ac_vo] {
            ac.put(w);
        }
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(4 * 6 * 4)?;
        Ok(Self {
            ac_be: WmmParams::get(r)?,
            ac_bk: WmmParams::get(r)?,
            ac_vi: WmmParams::get(r)?,
            ac_vo: WmmParams::get(r)?,
        })
    }
}

impl CommandRecord for WmmParamsArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetWmmParams];
}

/// DSCP code point to TID (0-7) mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DscpTidMapArg {
    pub map: [u32; DSCP_MAP_MAX],
}

impl Default for DscpTidMapArg {
    fn default() -> Self {
        Self {
            map: [0; DSCP_MAP_MAX],
        }
    }
}

impl Record for DscpTidMapArg {
    const NAME: &'static str = "pdev_set_dscp_tid_map";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&self.map);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(DSCP_MAP_MAX * 4)?;
        Ok(Self {
            map: r.get_words::<DSCP_MAP_MAX>()?,
        })
    }
}

impl CommandRecord for DscpTidMapArg {
    const COMMANDS: &'static [Command] = &[Command::PdevSetDscpTidMap];
}

/// Which statistics REQUEST_STATS asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum StatsId {
    Peer = 0x01,
    Ap = 0x02,
}

impl StatsId {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0x01 => Ok(StatsId::Peer),
            0x02 => Ok(StatsId::Ap),
            _ => Err(WireError::InvalidValue {
                field: "stats_id",
                value,
            }
            .into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestStatsArg {
    pub stats_id: StatsId,
}

impl Record for RequestStatsArg {
    const NAME: &'static str = "request_stats";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.stats_id as u32);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        Ok(Self {
            stats_id: StatsId::from_u32(r.get_u32()?)?,
        })
    }
}

impl CommandRecord for RequestStatsArg {
    const COMMANDS: &'static [Command] = &[Command::RequestStats];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::generation::ProtocolGeneration;

    const MAIN: ProtocolGeneration = ProtocolGeneration::Main;
    const TENX: ProtocolGeneration = ProtocolGeneration::TenX;

    #[test]
    fn set_param_id_follows_generation() {
        let arg = PdevSetParamArg {
            param: PdevParam::PdevStatsUpdatePeriod,
            value: 1000,
        };
        let main = arg.to_bytes(&AbiContext::new(MAIN)).unwrap();
        let tenx = arg.to_bytes(&AbiContext::new(TENX)).unwrap();
        assert_eq!(&main[..4], &30u32.to_le_bytes());
        assert_eq!(&tenx[..4], &26u32.to_le_bytes());
        assert_eq!(
            PdevSetParamArg::from_bytes(&AbiContext::new(TENX), tenx).unwrap(),
            arg
        );
    }

    #[test]
    fn set_param_missing_in_generation_fails_before_writing() {
        let arg = PdevSetParamArg {
            param: PdevParam::BurstDur,
            value: 8160,
        };
        let err = arg.to_bytes(&AbiContext::new(MAIN)).unwrap_err();
        assert!(matches!(err, ProtoError::UnsupportedParam { kind: "pdev", .. }));
    }

    #[test]
    fn wmm_is_four_categories_of_six_words() {
        let ctx = AbiContext::new(MAIN);
        let arg = WmmParamsArg {
            ac_vo: WmmParams {
                cwmin: 3,
                cwmax: 7,
                aifs: 2,
                txop: 47,
                ..Default::default()
            },
            ..Default::default()
        };
        let bytes = arg.to_bytes(&ctx).unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(&bytes[72..76], &3u32.to_le_bytes());
        assert_eq!(WmmParamsArg::from_bytes(&ctx, bytes).unwrap(), arg);
    }

    #[test]
    fn dscp_map_and_quiet_mode() {
        let ctx = AbiContext::new(TENX);
        let mut map = [0u32; DSCP_MAP_MAX];
        for (dscp, tid) in map.iter_mut().enumerate() {
            *tid = (dscp >> 3) as u32;
        }
        let arg = DscpTidMapArg { map };
        assert_eq!(
            DscpTidMapArg::from_bytes(&ctx, arg.to_bytes(&ctx).unwrap()).unwrap(),
            arg
        );

        let quiet = QuietModeArg {
            period: 100,
            duration: 10,
            next_start: 5,
            enabled: true,
        };
        let bytes = quiet.to_bytes(&ctx).unwrap();
        assert_eq!(&bytes[12..], &1u32.to_le_bytes());
        assert_eq!(QuietModeArg::from_bytes(&ctx, bytes).unwrap(), quiet);
    }

    #[test]
    fn enum_words_reject_unknown_values() {
        let ctx = AbiContext::new(MAIN);
        assert!(SuspendArg::from_bytes(&ctx, 2u32.to_le_bytes().to_vec()).is_err());
        assert!(RequestStatsArg::from_bytes(&ctx, 4u32.to_le_bytes().to_vec()).is_err());
        assert_eq!(
            RequestStatsArg::from_bytes(&ctx, 2u32.to_le_bytes().to_vec()).unwrap(),
            RequestStatsArg {
                stats_id: StatsId::Ap
            }
        );
    }
}
