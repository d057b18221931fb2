//! UPDATE_STATS: the answer to REQUEST_STATS.

use athwmi_wire::{check_count, MacAddr, RecordReader, RecordWriter};

use crate::cmd::pdev::StatsId;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

/// Most entries accepted in any one stats section.
pub const MAX_STATS_ENTRIES: usize = 256;

/// Firmware transmit-path debug counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxDbgStats {
    pub comp_queued: u32,
    pub comp_delivered: u32,
    pub msdu_enqued: u32,
    pub mpdu_enqued: u32,
    pub wmm_drop: u32,
    pub local_enqued: u32,
    pub local_freed: u32,
    pub hw_queued: u32,
    pub hw_reaped: u32,
    pub underrun: u32,
    pub tx_abort: u32,
    pub mpdus_requed: u32,
    pub tx_ko: u32,
    pub data_rc: u32,
    pub self_triggers: u32,
    pub sw_retry_failure: u32,
    pub illgl_rate_phy_err: u32,
    pub pdev_cont_xretry: u32,
    pub pdev_tx_timeout: u32,
    pub pdev_resets: u32,
    pub phy_underrun: u32,
    pub txop_ovf: u32,
}

impl TxDbgStats {
    pub const WIRE_SIZE: usize = 22 * 4;

    fn to_words(self) -> [u32; 22] {
        [
            self.comp_queued,
            self.comp_delivered,
            self.msdu_enqued,
            self.mpdu_enqued,
            self.wmm_drop,
            self.local_enqued,
            self.local_freed,
            self.hw_queued,
            self.hw_reaped,
            self.underrun,
            self.tx_abort,
            self.mpdus_requed,
            self.tx_ko,
            self.data_rc,
            self.self_triggers,
            self.sw_retry_failure,
            self.illgl_rate_phy_err,
            self.pdev_cont_xretry,
            self.pdev_tx_timeout,
            self.pdev_resets,
            self.phy_underrun,
            self.txop_ovf,
        ]
    }

    fn from_words(words: [u32; 22]) -> Self {
        let [comp_queued, comp_delivered, msdu_enqued, mpdu_enqued, wmm_drop, local_enqued, local_freed, hw_queued, hw_reaped, underrun, tx_abort, mpdus_requed, tx_ko, data_rc, self_triggers, sw_retry_failure, illgl_rate_phy_err, pdev_cont_xretry, pdev_tx_timeout, pdev_resets, phy_underrun, txop_ovf] =
            words;
        Self {
            comp_queued,
            comp_delivered,
            msdu_enqued,
            mpdu_enqued,
            wmm_drop,
            local_enqued,
            local_freed,
            hw_queued,
            hw_reaped,
            underrun,
            tx_abort,
            mpdus_requed,
            tx_ko,
            data_rc,
            self_triggers,
            sw_retry_failure,
            illgl_rate_phy_err,
            pdev_cont_xretry,
            pdev_tx_timeout,
            pdev_resets,
            phy_underrun,
            txop_ovf,
        }
    }
}

/// Firmware receive-path debug counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxDbgStats {
    pub mid_ppdu_route_change: u32,
    pub status_rcvd: u32,
    /// Extra fragments on rings 0-3.
    pub ring_frags: [u32; 4],
    pub htt_msdus: u32,
    pub htt_mpdus: u32,
    pub loc_msdus: u32,
    pub loc_mpdus: u32,
    pub oversize_amsdu: u32,
    pub phy_errs: u32,
    pub phy_err_drop: u32,
    pub mpdu_errs: u32,
}

impl RxDbgStats {
    pub const WIRE_SIZE: usize = 14 * 4;

    fn put(&self, w: &mut RecordWriter) {
        w.put_words(&[self.mid_ppdu_route_change, self.status_rcvd]);
        w.put_words(&self.ring_frags);
        w.put_words(&[
            self.htt_msdus,
            self.htt_mpdus,
            self.loc_msdus,
            self.loc_mpdus,
            self.oversize_amsdu,
            self.phy_errs,
            self.phy_err_drop,
            self.mpdu_errs,
        ]);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let [mid_ppdu_route_change, status_rcvd] = r.get_words::<2>()?;
        let ring_frags = r.get_words::<4>()?;
        let [htt_msdus, htt_mpdus, loc_msdus, loc_mpdus, oversize_amsdu, phy_errs, phy_err_drop, mpdu_errs] =
            r.get_words::<8>()?;
        Ok(Self {
            mid_ppdu_route_change,
            status_rcvd,
            ring_frags,
            htt_msdus,
            htt_mpdus,
            loc_msdus,
            loc_mpdus,
            oversize_amsdu,
            phy_errs,
            phy_err_drop,
            mpdu_errs,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdevStats {
    /// Noise floor in dBm.
    pub chan_nf: i32,
    pub tx_frame_count: u32,
    pub rx_frame_count: u32,
    pub rx_clear_count: u32,
    pub cycle_count: u32,
    pub phy_err_count: u32,
    pub chan_tx_power: u32,
    pub tx: TxDbgStats,
    pub rx: RxDbgStats,
}

impl PdevStats {
    /// Seven base words, the debug counters, and one reserved peer word.
    pub const WIRE_SIZE: usize = 7 * 4 + TxDbgStats::WIRE_SIZE + RxDbgStats::WIRE_SIZE + 4;

    fn put(&self, w: &mut RecordWriter) {
        w.put_i32(self.chan_nf);
        w.put_words(&[
            self.tx_frame_count,
            self.rx_frame_count,
            self.rx_clear_count,
            self.cycle_count,
            self.phy_err_count,
            self.chan_tx_power,
        ]);
        w.put_words(&self.tx.to_words());
        self.rx.put(w);
        w.put_zeros(1);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let chan_nf = r.get_i32()?;
        let [tx_frame_count, rx_frame_count, rx_clear_count, cycle_count, phy_err_count, chan_tx_power] =
            r.get_words::<6>()?;
        let tx = TxDbgStats::from_words(r.get_words::<22>()?);
        let rx = RxDbgStats::get(r)?;
        r.skip(4)?;
        Ok(Self {
            chan_nf,
            tx_frame_count,
            rx_frame_count,
            rx_clear_count,
            cycle_count,
            phy_err_count,
            chan_tx_power,
            tx,
            rx,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerStats {
    pub peer: MacAddr,
    pub rssi: u32,
    pub tx_rate: u32,
}

impl PeerStats {
    pub const WIRE_SIZE: usize = MacAddr::WIRE_SIZE + 2 * 4;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsEvent {
    /// Raw so firmware-initiated reports with unknown ids still decode.
    pub stats_id: u32,
    pub pdev: Vec<PdevStats>,
    pub vdev_ids: Vec<u32>,
    pub peers: Vec<PeerStats>,
    /// Beacon filter stats are counted but carry no layout this host reads.
    pub num_bcnflt_stats: u32,
}

impl StatsEvent {
    pub const HEADER_SIZE: usize = 5 * 4;

    pub fn stats_id(&self) -> Option<StatsId> {
        StatsId::from_u32(self.stats_id).ok()
    }
}

impl Record for StatsEvent {
    const NAME: &'static str = "stats";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        check_count("num_pdev_stats", self.pdev.len(), MAX_STATS_ENTRIES)?;
        check_count("num_vdev_stats", self.vdev_ids.len(), MAX_STATS_ENTRIES)?;
        check_count("num_peer_stats", self.peers.len(), MAX_STATS_ENTRIES)?;
        w.put_words(&[
            self.stats_id,
            self.pdev.len() as u32,
            self.vdev_ids.len() as u32,
            self.peers.len() as u32,
            self.num_bcnflt_stats,
        ]);
        for pdev in &self.pdev {
            pdev.put(w);
        }
        w.put_words(&self.vdev_ids);
        for peer in &self.peers {
            w.put_mac(peer.peer);
            w.put_words(&[peer.rssi, peer.tx_rate]);
        }
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::HEADER_SIZE)?;
        let stats_id = r.get_u32()?;
        let num_pdev = r.get_count("num_pdev_stats", MAX_STATS_ENTRIES)?;
        let num_vdev = r.get_count("num_vdev_stats", MAX_STATS_ENTRIES)?;
        let num_peer = r.get_count("num_peer_stats", MAX_STATS_ENTRIES)?;
        let num_bcnflt_stats = r.get_u32()?;
        r.require(
            num_pdev * PdevStats::WIRE_SIZE + num_vdev * 4 + num_peer * PeerStats::WIRE_SIZE,
        )?;

        let mut pdev = Vec::with_capacity(num_pdev);
        for _ in 0..num_pdev {
            pdev.push(PdevStats::get(r)?);
        }
        let mut vdev_ids = Vec::with_capacity(num_vdev);
        for _ in 0..num_vdev {
            vdev_ids.push(r.get_u32()?);
        }
        let mut peers = Vec::with_capacity(num_peer);
        for _ in 0..num_peer {
            let peer = r.get_mac()?;
            let [rssi, tx_rate] = r.get_words::<2>()?;
            peers.push(PeerStats {
                peer,
                rssi,
                tx_rate,
            });
        }
        Ok(Self {
            stats_id,
            pdev,
            vdev_ids,
            peers,
            num_bcnflt_stats,
        })
    }
}
