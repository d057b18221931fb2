//! Beacon timing events for AP interfaces.

use athwmi_wire::{pack, Field, RecordReader, RecordWriter, WireError};

use crate::cmd::vdev::NoaDescriptor;
use crate::error::Result;
use crate::generation::AbiContext;
use crate::record::Record;

/// AP interfaces the firmware can beacon for at once.
pub const MAX_AP_VDEV: usize = 16;
pub const TIM_BITMAP_WORDS: usize = 4;
pub const P2P_MAX_NOA_DESCRIPTORS: usize = 4;

// p2p noa info word
pub const NOA_CHANGED: Field = Field::new(0x0000_00FF, 0);
pub const NOA_INDEX: Field = Field::new(0x0000_FF00, 8);
pub const NOA_CTWINDOW_OPPPS: Field = Field::new(0x00FF_0000, 16);
pub const NOA_NUM_DESCRIPTORS: Field = Field::new(0xFF00_0000, 24);

pub const P2P_NOA_CHANGED_BIT: u32 = 1 << 0;
pub const P2P_OPPPS_ENABLE_BIT: u32 = 1 << 0;
pub const P2P_OPPPS_CTWINDOW_OFFSET: u32 = 1;

/// Iterate the vdev ids set in a vdev map, lowest first.
pub fn vdev_ids(vdev_map: u32) -> impl Iterator<Item = u32> {
    (0..32u32).filter(move |&bit| vdev_map & (1u32 << bit) != 0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimInfo {
    pub tim_len: u32,
    pub tim_mcast: u32,
    /// One bit per association id, 128 clients.
    pub tim_bitmap: [u32; TIM_BITMAP_WORDS],
    pub tim_changed: bool,
    pub tim_num_ps_pending: u32,
}

impl TimInfo {
    pub const WIRE_SIZE: usize = 8 * 4;

    fn put(&self, w: &mut RecordWriter) {
        w.put_words(&[self.tim_len, self.tim_mcast]);
        w.put_words(&self.tim_bitmap);
        w.put_bool(self.tim_changed);
        w.put_u32(self.tim_num_ps_pending);
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let [tim_len, tim_mcast] = r.get_words::<2>()?;
        Ok(Self {
            tim_len,
            tim_mcast,
            tim_bitmap: r.get_words::<TIM_BITMAP_WORDS>()?,
            tim_changed: r.get_bool()?,
            tim_num_ps_pending: r.get_u32()?,
        })
    }
}

/// P2P notice-of-absence schedule for a GO interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct P2pNoaInfo {
    pub changed: u8,
    pub index: u8,
    /// Bit 0 is opportunistic PS, bits 1-7 the CT window in TUs.
    pub ctwindow_oppps: u8,
    pub num_descriptors: u8,
    pub descriptors: [NoaDescriptor; P2P_MAX_NOA_DESCRIPTORS],
}

impl P2pNoaInfo {
    pub const WIRE_SIZE: usize = 4 + P2P_MAX_NOA_DESCRIPTORS * NoaDescriptor::WIRE_SIZE;

    pub fn is_changed(&self) -> bool {
        u32::from(self.changed) & P2P_NOA_CHANGED_BIT != 0
    }

    pub fn oppps_enabled(&self) -> bool {
        u32::from(self.ctwindow_oppps) & P2P_OPPPS_ENABLE_BIT != 0
    }

    pub fn ctwindow(&self) -> u8 {
        self.ctwindow_oppps >> P2P_OPPPS_CTWINDOW_OFFSET
    }

    /// Descriptors actually in use; the count is clamped to the array.
    pub fn active_descriptors(&self) -> &[NoaDescriptor] {
        let count = (self.num_descriptors as usize).min(P2P_MAX_NOA_DESCRIPTORS);
        &self.descriptors[..count]
    }

    fn put(&self, w: &mut RecordWriter) {
        w.put_u32(pack(&[
            (NOA_CHANGED, self.changed as u32),
            (NOA_INDEX, self.index as u32),
            (NOA_CTWINDOW_OPPPS, self.ctwindow_oppps as u32),
            (NOA_NUM_DESCRIPTORS, self.num_descriptors as u32),
        ]));
        for desc in &self.descriptors {
            desc.put(w);
        }
    }

    fn get(r: &mut RecordReader) -> Result<Self> {
        let word = r.get_u32()?;
        let mut descriptors = [NoaDescriptor::default(); P2P_MAX_NOA_DESCRIPTORS];
        for desc in &mut descriptors {
            *desc = NoaDescriptor::get(r)?;
        }
        Ok(Self {
            changed: NOA_CHANGED.get(word) as u8,
            index: NOA_INDEX.get(word) as u8,
            ctwindow_oppps: NOA_CTWINDOW_OPPPS.get(word) as u8,
            num_descriptors: NOA_NUM_DESCRIPTORS.get(word) as u8,
            descriptors,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeaconInfo {
    pub vdev_id: u32,
    pub tim_info: TimInfo,
    pub p2p_noa_info: P2pNoaInfo,
}

impl BeaconInfo {
    pub const WIRE_SIZE: usize = TimInfo::WIRE_SIZE + P2pNoaInfo::WIRE_SIZE;
}

/// HOST_SWBA: time to hand the firmware the next beacon for each AP vdev.
///
/// Carries one beacon-info record per bit set in `vdev_map`, in bit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSwbaEvent {
    pub vdev_map: u32,
    pub beacons: Vec<BeaconInfo>,
}

impl Record for HostSwbaEvent {
    const NAME: &'static str = "host_swba";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        athwmi_wire::check_count("swba vdevs", self.beacons.len(), MAX_AP_VDEV)?;
        if self.beacons.len() != self.vdev_map.count_ones() as usize {
            return Err(WireError::InvalidValue {
                field: "swba vdev_map",
                value: self.vdev_map,
            }
            .into());
        }
        for (beacon, vdev_id) in self.beacons.iter().zip(vdev_ids(self.vdev_map)) {
            if beacon.vdev_id != vdev_id {
                return Err(WireError::InvalidValue {
                    field: "swba vdev_id",
                    value: beacon.vdev_id,
                }
                .into());
            }
        }
        w.put_u32(self.vdev_map);
        for beacon in &self.beacons {
            beacon.tim_info.put(w);
            beacon.p2p_noa_info.put(w);
        }
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        let vdev_map = r.get_u32()?;
        let count = vdev_map.count_ones() as usize;
        athwmi_wire::check_count("swba vdevs", count, MAX_AP_VDEV)?;
        r.require(count * BeaconInfo::WIRE_SIZE)?;
        let mut beacons = Vec::with_capacity(count);
        for vdev_id in vdev_ids(vdev_map) {
            beacons.push(BeaconInfo {
                vdev_id,
                tim_info: TimInfo::get(r)?,
                p2p_noa_info: P2pNoaInfo::get(r)?,
            });
        }
        Ok(Self { vdev_map, beacons })
    }
}

/// TBTTOFFSET_UPDATE: per-vdev beacon offsets, indexed by vdev id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TbttOffsetEvent {
    pub vdev_map: u32,
    pub tbtt_offsets: [u32; MAX_AP_VDEV],
}

impl TbttOffsetEvent {
    pub const WIRE_SIZE: usize = 4 + MAX_AP_VDEV * 4;

    /// `(vdev_id, offset)` for every vdev present in the map.
    pub fn offsets(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        vdev_ids(self.vdev_map)
            .filter(|&id| (id as usize) < MAX_AP_VDEV)
            .map(|id| (id, self.tbtt_offsets[id as usize]))
    }
}

impl Record for TbttOffsetEvent {
    const NAME: &'static str = "tbtt_offset";

    fn encode(&self, _ctx: &AbiContext, w: &mut RecordWriter) -> Result<()> {
        w.put_u32(self.vdev_map);
        w.put_words(&self.tbtt_offsets);
        Ok(())
    }

    fn decode(_ctx: &AbiContext, r: &mut RecordReader) -> Result<Self> {
        r.require(Self::WIRE_SIZE)?;
        Ok(Self {
            vdev_map: r.get_u32()?,
            tbtt_offsets: r.get_words::<MAX_AP_VDEV>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtoError;
    use crate::generation::ProtocolGeneration;
    use athwmi_wire::WireError;

    fn ctx() -> AbiContext {
        AbiContext::new(ProtocolGeneration::Main)
    }

    #[test]
    fn one_record_per_set_bit() {
        let event = HostSwbaEvent {
            vdev_map: 0b1010,
            beacons: vec![
                BeaconInfo {
                    vdev_id: 1,
                    tim_info: TimInfo {
                        tim_len: 4,
                        tim_bitmap: [0x2, 0, 0, 0],
                        tim_changed: true,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                BeaconInfo {
                    vdev_id: 3,
                    p2p_noa_info: P2pNoaInfo {
                        changed: 1,
                        index: 2,
                        ctwindow_oppps: (10 << 1) | 1,
                        num_descriptors: 1,
                        descriptors: [
                            NoaDescriptor {
                                type_count: 255,
                                duration: 20,
                                interval: 100,
                                start_time: 0,
                            },
                            NoaDescriptor::default(),
                            NoaDescriptor::default(),
                            NoaDescriptor::default(),
                        ],
                    },
                    ..Default::default()
                },
            ],
        };
        let bytes = event.to_bytes(&ctx()).unwrap();
        assert_eq!(bytes.len(), 4 + 2 * BeaconInfo::WIRE_SIZE);
        assert_eq!(BeaconInfo::WIRE_SIZE, 25 * 4);

        let decoded = HostSwbaEvent::from_bytes(&ctx(), bytes).unwrap();
        assert_eq!(decoded, event);
        let noa = decoded.beacons[1].p2p_noa_info;
        assert!(noa.is_changed());
        assert!(noa.oppps_enabled());
        assert_eq!(noa.ctwindow(), 10);
        assert_eq!(noa.active_descriptors().len(), 1);
    }

    #[test]
    fn encode_rejects_beacons_that_disagree_with_map() {
        let missing = HostSwbaEvent {
            vdev_map: 0b11,
            beacons: vec![BeaconInfo::default()],
        };
        assert_eq!(
            missing.to_bytes(&ctx()).unwrap_err(),
            ProtoError::Wire(WireError::InvalidValue {
                field: "swba vdev_map",
                value: 0b11
            })
        );

        let misplaced = HostSwbaEvent {
            vdev_map: 0b100,
            beacons: vec![BeaconInfo {
                vdev_id: 1,
                ..Default::default()
            }],
        };
        assert_eq!(
            misplaced.to_bytes(&ctx()).unwrap_err(),
            ProtoError::Wire(WireError::InvalidValue {
                field: "swba vdev_id",
                value: 1
            })
        );

        let empty = HostSwbaEvent::default();
        let decoded = HostSwbaEvent::from_bytes(&ctx(), empty.to_bytes(&ctx()).unwrap()).unwrap();
        assert_eq!(decoded, empty);
    }

    #[test]
    fn vdev_map_past_payload_is_truncated() {
        let mut w = RecordWriter::new();
        w.put_u32(0b111);
        w.put_zeros(25);
        let err = HostSwbaEvent::from_bytes(&ctx(), w.freeze()).unwrap_err();
        assert!(matches!(err, ProtoError::Wire(WireError::Truncated { .. })));
    }

    #[test]
    fn vdev_map_with_too_many_bits_is_rejected() {
        let mut w = RecordWriter::new();
        w.put_u32(0x0001_FFFF);
        let err = HostSwbaEvent::from_bytes(&ctx(), w.freeze()).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::Wire(WireError::CountTooLarge { count: 17, .. })
        ));
    }

    #[test]
    fn tbtt_offsets_follow_map() {
        let mut offsets = [0u32; MAX_AP_VDEV];
        offsets[0] = 100;
        offsets[5] = 250;
        let event = TbttOffsetEvent {
            vdev_map: 0b10_0001,
            tbtt_offsets: offsets,
        };
        let decoded =
            TbttOffsetEvent::from_bytes(&ctx(), event.to_bytes(&ctx()).unwrap()).unwrap();
        assert_eq!(decoded.offsets().collect::<Vec<_>>(), vec![(0, 100), (5, 250)]);
    }
}
