//! PHY error reports: radar pulse summaries and spectral FFT reports.
//!
//! One PHYERR event batches several errors behind a combined header. Each
//! error carries its own header and a buffer of report TLVs. A short or
//! overlong entry ends the batch with a warning and the entries before it
//! are kept, since the firmware fills these buffers from hardware state.

use athwmi_wire::{pack, Field, RecordReader, RecordWriter};
use bytes::Bytes;
use tracing::{trace, warn};

use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

pub const PHY_ERROR_RADAR: u8 = 0x05;
pub const PHY_ERROR_FALSE_RADAR_EXT: u8 = 0x24;
pub const PHY_ERROR_SPECTRAL_SCAN: u8 = 0x26;

// single header words
pub const PHYERR_FREQ1: Field = Field::new(0x0000_FFFF, 0);
pub const PHYERR_FREQ2: Field = Field::new(0xFFFF_0000, 16);
pub const PHYERR_RSSI_COMBINED: Field = Field::new(0x0000_00FF, 0);
pub const PHYERR_CHAN_WIDTH_MHZ: Field = Field::new(0x0000_FF00, 8);
pub const PHYERR_CODE: Field = Field::new(0x00FF_0000, 16);

// report TLV header
pub const PHYERR_TLV_LEN: Field = Field::new(0x0000_FFFF, 0);
pub const PHYERR_TLV_TAG: Field = Field::new(0x00FF_0000, 16);
pub const PHYERR_TLV_SIG: Field = Field::new(0xFF00_0000, 24);

pub const PHYERR_TLV_SIGNATURE: u32 = 0xBB;
pub const PHYERR_TLV_TAG_SEARCH_FFT_REPORT: u32 = 0xFB;
pub const PHYERR_TLV_TAG_RADAR_PULSE_SUMMARY: u32 = 0xF8;

pub const RADAR_REG0_PULSE_IS_CHIRP: Field = Field::new(0x8000_0000, 31);
pub const RADAR_REG0_PULSE_IS_MAX_WIDTH: Field = Field::new(0x4000_0000, 30);
pub const RADAR_REG0_AGC_TOTAL_GAIN: Field = Field::new(0x3FF0_0000, 20);
pub const RADAR_REG0_PULSE_DELTA_DIFF: Field = Field::new(0x000F_0000, 16);
pub const RADAR_REG0_PULSE_DELTA_PEAK: Field = Field::new(0x0000_FC00, 10);
pub const RADAR_REG0_PULSE_SIDX: Field = Field::new(0x0000_03FF, 0);

pub const RADAR_REG1_PULSE_SRCH_FFT_VALID: Field = Field::new(0x8000_0000, 31);
pub const RADAR_REG1_PULSE_AGC_MB_GAIN: Field = Field::new(0x7F00_0000, 24);
pub const RADAR_REG1_PULSE_SUBCHAN_MASK: Field = Field::new(0x00FF_0000, 16);
pub const RADAR_REG1_PULSE_TSF_OFFSET: Field = Field::new(0x0000_FF00, 8);
pub const RADAR_REG1_PULSE_DUR: Field = Field::new(0x0000_00FF, 0);

pub const FFT_REG0_TOTAL_GAIN_DB: Field = Field::new(0xFF80_0000, 23);
pub const FFT_REG0_BASE_PWR_DB: Field = Field::new(0x007F_C000, 14);
pub const FFT_REG0_FFT_CHN_IDX: Field = Field::new(0x0000_3000, 12);
pub const FFT_REG0_PEAK_SIDX: Field = Field::new(0x0000_0FFF, 0);

pub const FFT_REG1_RELPWR_DB: Field = Field::new(0xFC00_0000, 26);
pub const FFT_REG1_AVGPWR_DB: Field = Field::new(0x03FC_0000, 18);
pub const FFT_REG1_PEAK_MAG: Field = Field::new(0x0003_FF00, 8);
pub const FFT_REG1_NUM_STR_BINS_IB: Field = Field::new(0x0000_00FF, 0);

/// Radar reports below this RSSI may be false detections.
pub const DFS_RSSI_POSSIBLY_FALSE: u8 = 50;
/// FFT peak magnitudes below this may be false detections.
pub const DFS_PEAK_MAG_THOLD_POSSIBLY_FALSE: u32 = 40;

const REPORT_REGS_SIZE: usize = 2 * 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadarReport {
    pub is_chirp: bool,
    pub is_max_width: bool,
    pub agc_total_gain: u32,
    pub delta_diff: u32,
    pub delta_peak: u32,
    pub sidx: u32,
    pub srch_fft_valid: bool,
    pub agc_mb_gain: u32,
    pub subchan_mask: u32,
    pub tsf_offset: u32,
    /// Pulse duration in microseconds.
    pub dur: u32,
}

impl RadarReport {
    pub fn from_regs(reg0: u32, reg1: u32) -> Self {
        Self {
            is_chirp: RADAR_REG0_PULSE_IS_CHIRP.is_set(reg0),
            is_max_width: RADAR_REG0_PULSE_IS_MAX_WIDTH.is_set(reg0),
            agc_total_gain: RADAR_REG0_AGC_TOTAL_GAIN.get(reg0),
            delta_diff: RADAR_REG0_PULSE_DELTA_DIFF.get(reg0),
            delta_peak: RADAR_REG0_PULSE_DELTA_PEAK.get(reg0),
            sidx: RADAR_REG0_PULSE_SIDX.get(reg0),
            srch_fft_valid: RADAR_REG1_PULSE_SRCH_FFT_VALID.is_set(reg1),
            agc_mb_gain: RADAR_REG1_PULSE_AGC_MB_GAIN.get(reg1),
            subchan_mask: RADAR_REG1_PULSE_SUBCHAN_MASK.get(reg1),
            tsf_offset: RADAR_REG1_PULSE_TSF_OFFSET.get(reg1),
            dur: RADAR_REG1_PULSE_DUR.get(reg1),
        }
    }

    pub fn to_regs(&self) -> (u32, u32) {
        let reg0 = pack(&[
            (RADAR_REG0_PULSE_IS_CHIRP, self.is_chirp as u32),
            (RADAR_REG0_PULSE_IS_MAX_WIDTH, self.is_max_width as u32),
            (RADAR_REG0_AGC_TOTAL_GAIN, self.agc_total_gain),
            (RADAR_REG0_PULSE_DELTA_DIFF, self.delta_diff),
            (RADAR_REG0_PULSE_DELTA_PEAK, self.delta_peak),
            (RADAR_REG0_PULSE_SIDX, self.sidx),
        ]);
        let reg1 = pack(&[
            (RADAR_REG1_PULSE_SRCH_FFT_VALID, self.srch_fft_valid as u32),
            (RADAR_REG1_PULSE_AGC_MB_GAIN, self.agc_mb_gain),
            (RADAR_REG1_PULSE_SUBCHAN_MASK, self.subchan_mask),
            (RADAR_REG1_PULSE_TSF_OFFSET, self.tsf_offset),
            (RADAR_REG1_PULSE_DUR, self.dur),
        ]);
        (reg0, reg1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FftReport {
    pub total_gain_db: u32,
    pub base_pwr_db: u32,
    pub fft_chn_idx: u32,
    pub peak_sidx: u32,
    pub relpwr_db: u32,
    pub avgpwr_db: u32,
    pub peak_mag: u32,
    pub num_str_bins_ib: u32,
    /// FFT bin magnitudes following the two report words.
    pub bins: Bytes,
}

impl FftReport {
    pub fn from_regs(reg0: u32, reg1: u32, bins: Bytes) -> Self {
        Self {
            total_gain_db: FFT_REG0_TOTAL_GAIN_DB.get(reg0),
            base_pwr_db: FFT_REG0_BASE_PWR_DB.get(reg0),
            fft_chn_idx: FFT_REG0_FFT_CHN_IDX.get(reg0),
            peak_sidx: FFT_REG0_PEAK_SIDX.get(reg0),
            relpwr_db: FFT_REG1_RELPWR_DB.get(reg1),
            avgpwr_db: FFT_REG1_AVGPWR_DB.get(reg1),
            peak_mag: FFT_REG1_PEAK_MAG.get(reg1),
            num_str_bins_ib: FFT_REG1_NUM_STR_BINS_IB.get(reg1),
            bins,
        }
    }

    pub fn to_regs(&self) -> (u32, u32) {
        let reg0 = pack(&[
            (FFT_REG0_TOTAL_GAIN_DB, self.total_gain_db),
            (FFT_REG0_BASE_PWR_DB, self.base_pwr_db),
            (FFT_REG0_FFT_CHN_IDX, self.fft_chn_idx),
            (FFT_REG0_PEAK_SIDX, self.peak_sidx),
        ]);
        let reg1 = pack(&[
            (FFT_REG1_RELPWR_DB, self.relpwr_db),
            (FFT_REG1_AVGPWR_DB, self.avgpwr_db),
            (FFT_REG1_PEAK_MAG, self.peak_mag),
            (FFT_REG1_NUM_STR_BINS_IB, self.num_str_bins_ib),
        ]);
        (reg0, reg1)
    }
}

/// One decoded report TLV from a PHY error buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhyErrReport {
    Radar(RadarReport),
    Fft(FftReport),
}

impl PhyErrReport {
    /// Append this report as a signed TLV.
    pub fn encode(&self, w: &mut RecordWriter) {
        let (tag, (reg0, reg1), extra) = match self {
            PhyErrReport::Radar(r) => (PHYERR_TLV_TAG_RADAR_PULSE_SUMMARY, r.to_regs(), &[][..]),
            PhyErrReport::Fft(f) => (PHYERR_TLV_TAG_SEARCH_FFT_REPORT, f.to_regs(), &f.bins[..]),
        };
        let len = REPORT_REGS_SIZE + extra.len();
        w.put_u32(pack(&[
            (PHYERR_TLV_LEN, len as u32),
            (PHYERR_TLV_TAG, tag),
            (PHYERR_TLV_SIG, PHYERR_TLV_SIGNATURE),
        ]));
        w.put_words(&[reg0, reg1]);
        w.put_bytes_padded(extra);
    }
}

/// One PHY error from a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhyErr {
    pub tsf_timestamp: u32,
    /// Primary and secondary center frequency in MHz.
    pub freq1: u16,
    pub freq2: u16,
    pub rssi_combined: u8,
    pub chan_width_mhz: u8,
    pub phy_err_code: u8,
    pub rssi_chains: [u32; 4],
    pub nf_list_1: u32,
    pub nf_list_2: u32,
    pub buf: Bytes,
}

impl PhyErr {
    pub const HEADER_SIZE: usize = 10 * 4;

    pub fn is_radar(&self) -> bool {
        matches!(
            self.phy_err_code,
            PHY_ERROR_RADAR | PHY_ERROR_FALSE_RADAR_EXT
        )
    }

    pub fn is_spectral(&self) -> bool {
        self.phy_err_code == PHY_ERROR_SPECTRAL_SCAN
    }

    /// Walk the report TLVs in the buffer.
    ///
    /// Stops at the first block without the report signature or whose
    /// length runs past the buffer. Unknown tags are skipped.
    pub fn reports(&self) -> Vec<PhyErrReport> {
        let mut reports = Vec::new();
        let mut r = RecordReader::new("phyerr_tlv", self.buf.clone());
        while r.remaining() >= 4 {
            let Ok(header) = r.get_u32() else { break };
            let sig = PHYERR_TLV_SIG.get(header);
            let tag = PHYERR_TLV_TAG.get(header);
            let len = PHYERR_TLV_LEN.get(header) as usize;
            if sig != PHYERR_TLV_SIGNATURE {
                warn!(sig = format_args!("{sig:#x}"), "bad phyerr tlv signature");
                break;
            }
            let Ok(body) = r.get_bytes_padded(len) else {
                warn!(tag = format_args!("{tag:#x}"), len, "phyerr tlv runs past buffer");
                break;
            };
            if let Some(report) = Self::parse_report(tag, body) {
                reports.push(report);
            }
        }
        reports
    }

    fn parse_report(tag: u32, body: Bytes) -> Option<PhyErrReport> {
        match tag {
            PHYERR_TLV_TAG_RADAR_PULSE_SUMMARY | PHYERR_TLV_TAG_SEARCH_FFT_REPORT
                if body.len() < REPORT_REGS_SIZE =>
            {
                warn!(tag = format_args!("{tag:#x}"), len = body.len(), "phyerr report too short");
                None
            }
            PHYERR_TLV_TAG_RADAR_PULSE_SUMMARY => {
                let mut r = RecordReader::new("radar_report", body);
                let [reg0, reg1] = r.get_words::<2>().ok()?;
                Some(PhyErrReport::Radar(RadarReport::from_regs(reg0, reg1)))
            }
            PHYERR_TLV_TAG_SEARCH_FFT_REPORT => {
                let mut r = RecordReader::new("fft_report", body);
                let [reg0, reg1] = r.get_words::<2>().ok()?;
                Some(PhyErrReport::Fft(FftReport::from_regs(reg0, reg1, r.rest())))
            }
            _ => {
                trace!(tag = format_args!("{tag:#x}"), "skipping phyerr tlv");
                None
            }
        }
    }

    fn put(&self, w: &mut RecordWriter) {
        w.put_u32(self.tsf_timestamp);
        w.put_u32(pack(&[
            (PHYERR_FREQ1, self.freq1 as u32),
            (PHYERR_FREQ2, self.freq2 as u32),
        ]));
        w.put_u32(pack(&[
            (PHYERR_RSSI_COMBINED, self.rssi_combined as u32),
            (PHYERR_CHAN_WIDTH_MHZ, self.chan_width_mhz as u32),
            (PHYERR_CODE, self.phy_err_code as u32),
        ]));
        w.put_words(&self.rssi_chains);
        w.put_words(&[self.nf_list_1, self.nf_list_2, self.buf.len() as u32]);
        w.put_record(&self.buf);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let tsf_timestamp = r.get_u32()?;
        let freq = r.get_u32()?;
        let info = r.get_u32()?;
        let rssi_chains = r.get_words::<4>()?;
        let [nf_list_1, nf_list_2, buf_len] = r.get_words::<3>()?;
        Ok(Self {
            tsf_timestamp,
            freq1: PHYERR_FREQ1.get(freq) as u16,
            freq2: PHYERR_FREQ2.get(freq) as u16,
            rssi_combined: PHYERR_RSSI_COMBINED.get(info) as u8,
            chan_width_mhz: PHYERR_CHAN_WIDTH_MHZ.get(info) as u8,
            phy_err_code: PHYERR_CODE.get(info) as u8,
            rssi_chains,
            nf_list_1,
            nf_list_2,
            buf: r.get_bytes(buf_len as usize)?,
        })
    }
}

/// PHYERR: a batch of PHY errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhyErrEvent {
    /// Count the firmware declared; may exceed `errors.len()` when the
    /// batch was cut short.
    pub num_phyerr_events: u32,
    pub tsf: u64,
    pub errors: Vec<PhyErr>,
}

impl PhyErrEvent {
    pub const HEADER_SIZE: usize = 3 * 4;
}

impl Record for PhyErrEvent {
    const NAME: &'static str = "phyerr";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_words(&[
            self.num_phyerr_events,
            self.tsf as u32,
            (self.tsf >> 32) as u32,
        ]);
        for err in &self.errors {
            err.put(w);
        }
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let [num_phyerr_events, tsf_l32, tsf_u32] = r.get_words::<3>()?;
        let mut errors = Vec::new();
        for index in 0..num_phyerr_events {
            if r.remaining() == 0 {
                warn!(index, num_phyerr_events, "phyerr batch ended early");
                break;
            }
            match PhyErr::get(r) {
                Ok(err) => errors.push(err),
                Err(err) => {
                    warn!(index, error = %err, "dropping rest of phyerr batch");
                    break;
                }
            }
        }
        Ok(Self {
            num_phyerr_events,
            tsf: (u64::from(tsf_u32) << 32) | u64::from(tsf_l32),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ProtocolGeneration;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::TenX)
    }

    fn radar() -> RadarReport {
        RadarReport {
            is_chirp: true,
            agc_total_gain: 0x155,
            delta_peak: 0x3F,
            sidx: 0x201,
            srch_fft_valid: true,
            agc_mb_gain: 0x22,
            subchan_mask: 0x0F,
            tsf_offset: 0x10,
            dur: 55,
            ..Default::default()
        }
    }

    fn radar_err() -> PhyErr {
        let mut w = RecordWriter::new();
        PhyErrReport::Radar(radar()).encode(&mut w);
        PhyErr {
            tsf_timestamp: 1000,
            freq1: 5260,
            freq2: 0,
            rssi_combined: 60,
            chan_width_mhz: 20,
            phy_err_code: PHY_ERROR_RADAR,
            buf: w.freeze(),
            ..Default::default()
        }
    }

    #[test]
    fn header_subfields() {
        let event = PhyErrEvent {
            num_phyerr_events: 1,
            tsf: 0x0000_0001_0000_0002,
            errors: vec![radar_err()],
        };
        let bytes = event.to_bytes(&ctx()).unwrap();
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        // freq word: freq1 low half
        assert_eq!(&bytes[16..20], &5260u32.to_le_bytes());
        // rssi, width, code
        assert_eq!(&bytes[20..24], &[60, 20, PHY_ERROR_RADAR, 0]);

        let decoded = PhyErrEvent::from_bytes(&ctx(), bytes).unwrap();
        assert_eq!(decoded, event);
        assert!(decoded.errors[0].is_radar());
    }

    #[test]
    fn radar_report_fields() {
        let reports = radar_err().reports();
        assert_eq!(reports, vec![PhyErrReport::Radar(radar())]);

        let (reg0, reg1) = radar().to_regs();
        assert_eq!(reg0 >> 31, 1);
        assert_eq!(reg0 & 0x3FF, 0x201);
        assert_eq!(reg1 & 0xFF, 55);
    }

    #[test]
    fn fft_report_keeps_bins_and_skips_unknown_tags() {
        let fft = FftReport {
            total_gain_db: 0x1FF,
            base_pwr_db: 0x100,
            fft_chn_idx: 2,
            peak_sidx: 0xABC,
            relpwr_db: 0x3F,
            avgpwr_db: 0x80,
            peak_mag: 0x3FF,
            num_str_bins_ib: 3,
            bins: Bytes::from_static(&[1, 2, 3, 4]),
        };
        let mut w = RecordWriter::new();
        w.put_u32(pack(&[
            (PHYERR_TLV_LEN, 4),
            (PHYERR_TLV_TAG, 0xAA),
            (PHYERR_TLV_SIG, PHYERR_TLV_SIGNATURE),
        ]));
        w.put_u32(0xDEAD_BEEF);
        PhyErrReport::Fft(fft.clone()).encode(&mut w);
        let err = PhyErr {
            phy_err_code: PHY_ERROR_SPECTRAL_SCAN,
            buf: w.freeze(),
            ..Default::default()
        };
        assert!(err.is_spectral());
        assert_eq!(err.reports(), vec![PhyErrReport::Fft(fft)]);
    }

    #[test]
    fn bad_signature_stops_walk() {
        let mut w = RecordWriter::new();
        w.put_u32(pack(&[
            (PHYERR_TLV_LEN, 8),
            (PHYERR_TLV_TAG, PHYERR_TLV_TAG_RADAR_PULSE_SUMMARY),
            (PHYERR_TLV_SIG, 0xAA),
        ]));
        w.put_words(&[0, 0]);
        let err = PhyErr {
            buf: w.freeze(),
            ..Default::default()
        };
        assert!(err.reports().is_empty());
    }

    #[test]
    fn overlong_entry_keeps_earlier_errors() {
        let mut w = RecordWriter::new();
        w.put_words(&[3, 0, 0]);
        radar_err().put(&mut w);
        // second header claims more buffer than remains
        w.put_zeros(9);
        w.put_u32(512);
        w.put_zeros(2);
        let event = PhyErrEvent::from_bytes(&ctx(), w.freeze()).unwrap();
        assert_eq!(event.num_phyerr_events, 3);
        assert_eq!(event.errors, vec![radar_err()]);
    }

    #[test]
    fn short_combined_header_is_truncated() {
        assert!(PhyErrEvent::from_bytes(&ctx(), vec![0u8; 8]).is_err());
    }
}
