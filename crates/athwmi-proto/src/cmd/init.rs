use athwmi_wire::{check_count, RecordReader, RecordWriter};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::event::ready::MAX_MEM_REQS;
use crate::generation::{AbiContext, ProtocolGeneration};
use crate::ids::Command;
use crate::record::{get_main_only, put_main_only, CommandRecord, Record};

/// Receive decapsulation modes.
pub const DECAP_RAW: u32 = 0;
pub const DECAP_NATIVE_WIFI: u32 = 1;
pub const DECAP_ETHERNET: u32 = 2;

const RX_TIMEOUT_LO_PRI: u32 = 100;
const RX_TIMEOUT_HI_PRI: u32 = 40;

/// Limits the host negotiates with the firmware at INIT.
///
/// The 10.x layout has no offload peer, offload reorder buffer or GTK
/// offload fields; they are skipped on the wire and read back as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub num_vdevs: u32,
    pub num_peers: u32,
    pub num_offload_peers: u32,
    pub num_offload_reorder_bufs: u32,
    pub num_peer_keys: u32,
    pub num_tids: u32,
    pub ast_skid_limit: u32,
    pub tx_chain_mask: u32,
    pub rx_chain_mask: u32,
    /// Per access category: vi, vo, be, bk.
    pub rx_timeout_pri: [u32; 4],
    pub rx_decap_mode: u32,
    pub scan_max_pending_reqs: u32,
    pub bmiss_offload_max_vdev: u32,
    pub roam_offload_max_vdev: u32,
    pub roam_offload_max_ap_profiles: u32,
    pub num_mcast_groups: u32,
    pub num_mcast_table_elems: u32,
    pub mcast2ucast_mode: u32,
    pub tx_dbg_log_size: u32,
    pub num_wds_entries: u32,
    pub dma_burst_size: u32,
    pub mac_aggr_delim: u32,
    pub rx_skip_defrag_timeout_dup_detection_check: u32,
    pub vow_config: u32,
    pub gtk_offload_max_vdev: u32,
    pub num_msdu_desc: u32,
    pub max_frag_entries: u32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self::defaults_for(ProtocolGeneration::Main)
    }
}

impl ResourceConfig {
    /// Stock limits for each generation.
    pub fn defaults_for(generation: ProtocolGeneration) -> Self {
        let main = Self {
            num_vdevs: 8,
            num_peers: 16,
            num_offload_peers: 0,
            num_offload_reorder_bufs: 0,
            num_peer_keys: 2,
            num_tids: 2 * (16 + 8),
            ast_skid_limit: 16,
            tx_chain_mask: 0x7,
            rx_chain_mask: 0x7,
            rx_timeout_pri: [
                RX_TIMEOUT_LO_PRI,
                RX_TIMEOUT_LO_PRI,
                RX_TIMEOUT_LO_PRI,
                RX_TIMEOUT_HI_PRI,
            ],
            rx_decap_mode: DECAP_ETHERNET,
            scan_max_pending_reqs: 4,
            bmiss_offload_max_vdev: 3,
            roam_offload_max_vdev: 3,
            roam_offload_max_ap_profiles: 8,
            num_mcast_groups: 0,
            num_mcast_table_elems: 0,
            mcast2ucast_mode: 0,
            tx_dbg_log_size: 1024,
            num_wds_entries: 32,
            dma_burst_size: 0,
            mac_aggr_delim: 0,
            rx_skip_defrag_timeout_dup_detection_check: 0,
            vow_config: 0,
            gtk_offload_max_vdev: 3,
            num_msdu_desc: 1024 + 400,
            max_frag_entries: 0,
        };
        match generation {
            ProtocolGeneration::Main => main,
            ProtocolGeneration::TenX => Self {
                num_vdevs: 16,
                num_peers: 128 + 16,
                num_tids: 256,
                rx_decap_mode: DECAP_NATIVE_WIFI,
                bmiss_offload_max_vdev: 2,
                roam_offload_max_vdev: 2,
                rx_skip_defrag_timeout_dup_detection_check: 1,
                gtk_offload_max_vdev: 0,
                ..main
            },
        }
    }

    /// Encoded size for the given generation.
    pub fn wire_size(generation: ProtocolGeneration) -> usize {
        match generation {
            ProtocolGeneration::Main => 30 * 4,
            ProtocolGeneration::TenX => 27 * 4,
        }
    }
}

impl Record for ResourceConfig {
    const NAME: &'static str = "resource_config";

    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.num_vdevs);
        w.put_u32(self.num_peers);
        put_main_only(ctx, w, self.num_offload_peers);
        put_main_only(ctx, w, self.num_offload_reorder_bufs);
        w.put_u32(self.num_peer_keys);
        w.put_u32(self.num_tids);
        w.put_u32(self.ast_skid_limit);
        w.put_u32(self.tx_chain_mask);
        w.put_u32(self.rx_chain_mask);
        w.put_words(&self.rx_timeout_pri);
        w.put_u32(self.rx_decap_mode);
        w.put_u32(self.scan_max_pending_reqs);
        w.put_u32(self.bmiss_offload_max_vdev);
        w.put_u32(self.roam_offload_max_vdev);
        w.put_u32(self.roam_offload_max_ap_profiles);
        w.put_u32(self.num_mcast_groups);
        w.put_u32(self.num_mcast_table_elems);
        w.put_u32(self.mcast2ucast_mode);
        w.put_u32(self.tx_dbg_log_size);
        w.put_u32(self.num_wds_entries);
        w.put_u32(self.dma_burst_size);
        w.put_u32(self.mac_aggr_delim);
        w.put_u32(self.rx_skip_defrag_timeout_dup_detection_check);
        w.put_u32(self.vow_config);
        put_main_only(ctx, w, self.gtk_offload_max_vdev);
        w.put_u32(self.num_msdu_desc);
        w.put_u32(self.max_frag_entries);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::wire_size(ctx.generation()))?;
        Ok(Self {
            num_vdevs: r.get_u32()?,
            num_peers: r.get_u32()?,
            num_offload_peers: get_main_only(ctx, r)?,
            num_offload_reorder_bufs: get_main_only(ctx, r)?,
            num_peer_keys: r.get_u32()?,
            num_tids: r.get_u32()?,
            ast_skid_limit: r.get_u32()?,
            tx_chain_mask: r.get_u32()?,
            rx_chain_mask: r.get_u32()?,
            rx_timeout_pri: r.get_words::<4>()?,
            rx_decap_mode: r.get_u32()?,
            scan_max_pending_reqs: r.get_u32()?,
            bmiss_offload_max_vdev: r.get_u32()?,
            roam_offload_max_vdev: r.get_u32()?,
            roam_offload_max_ap_profiles: r.get_u32()?,
            num_mcast_groups: r.get_u32()?,
            num_mcast_table_elems: r.get_u32()?,
            mcast2ucast_mode: r.get_u32()?,
            tx_dbg_log_size: r.get_u32()?,
            num_wds_entries: r.get_u32()?,
            dma_burst_size: r.get_u32()?,
            mac_aggr_delim: r.get_u32()?,
            rx_skip_defrag_timeout_dup_detection_check: r.get_u32()?,
            vow_config: r.get_u32()?,
            gtk_offload_max_vdev: get_main_only(ctx, r)?,
            num_msdu_desc: r.get_u32()?,
            max_frag_entries: r.get_u32()?,
        })
    }
}

/// A host memory region handed to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMemoryChunk {
    /// Id of the service-ready request this chunk answers.
    pub req_id: u32,
    /// Bus address of the region.
    pub ptr: u32,
    pub size: u32,
}

impl HostMemoryChunk {
    pub const WIRE_SIZE: usize = 3 * 4;
}

/// INIT: resource limits plus the host memory chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitCmd {
    pub resource: ResourceConfig,
    pub chunks: Vec<HostMemoryChunk>,
}

impl Record for InitCmd {
    const NAME: &'static str = "init";

    /// The record declares a one-element chunk array, so one zeroed chunk
    /// slot always follows the real chunks.
    fn encode(&self, ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        check_count("host_mem_chunks", self.chunks.len(), MAX_MEM_REQS)?;
        self.resource.encode(ctx, w)?;
        w.put_u32(self.chunks.len() as u32);
        for chunk in &self.chunks {
            w.put_words(&[chunk.req_id, chunk.ptr, chunk.size]);
        }
        w.put_zeros(HostMemoryChunk::WIRE_SIZE / 4);
        Ok(())
    }

    fn decode(ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(ResourceConfig::wire_size(ctx.generation()) + 4)?;
        let resource = ResourceConfig::decode(ctx, r)?;
        let count = r.get_count("host_mem_chunks", MAX_MEM_REQS)?;
        r.require(count * HostMemoryChunk::WIRE_SIZE)?;
        let mut chunks = Vec::with_capacity(count);
        for _ in 0..count {
            let [req_id, ptr, size] = r.get_words::<3>()?;
            chunks.push(HostMemoryChunk { req_id, ptr, size });
        }
        let slot = r.remaining().min(HostMemoryChunk::WIRE_SIZE);
        r.skip(slot)?;
        Ok(Self { resource, chunks })
    }
}

impl CommandRecord for InitCmd {
    const COMMANDS: &'static [Command] = &[Command::Init];
}
