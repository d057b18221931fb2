//! Host memory planning for INIT.
//!
//! SERVICE_READY lists blocks of host memory the firmware wants. The host
//! sizes each one, allocates it through a [`HostMemory`] collaborator and
//! hands the resulting chunks back in INIT.

use athwmi_proto::cmd::{HostMemoryChunk, ResourceConfig};
use athwmi_proto::event::ready::{NUM_UNITS_IS_NUM_PEERS, NUM_UNITS_IS_NUM_VDEVS};
use athwmi_proto::event::MemRequest;
use tracing::debug;

use crate::error::{Result, SessionError};

/// Source of DMA-able host memory.
pub trait HostMemory {
    /// Allocate `size` bytes for request `req_id`, returning the bus address.
    ///
    /// `None` means the allocation failed; attach is abandoned.
    fn allocate(&mut self, req_id: u32, size: u32) -> Option<u32>;
}

impl<F> HostMemory for F
where
    F: FnMut(u32, u32) -> Option<u32>,
{
    fn allocate(&mut self, req_id: u32, size: u32) -> Option<u32> {
        self(req_id, size)
    }
}

/// Bump allocator over a fixed address window.
///
/// Regions are 4-byte aligned and never freed. Suitable for simulators.
#[derive(Debug, Clone)]
pub struct BumpAllocator {
    next: u32,
    end: u32,
}

impl BumpAllocator {
    pub fn new(base: u32, len: u32) -> Self {
        Self {
            next: base,
            end: base.saturating_add(len),
        }
    }
}

impl HostMemory for BumpAllocator {
    fn allocate(&mut self, _req_id: u32, size: u32) -> Option<u32> {
        let start = self.next.checked_add(3)? & !3;
        let end = start.checked_add(size)?;
        if end > self.end {
            return None;
        }
        self.next = end;
        Some(start)
    }
}

/// Number of units request `req` needs under `resource`.
pub fn units_for(req: &MemRequest, resource: &ResourceConfig) -> u32 {
    if req.num_unit_info & NUM_UNITS_IS_NUM_PEERS != 0 {
        // one extra for the self peer
        resource.num_peers.saturating_add(1)
    } else if req.num_unit_info & NUM_UNITS_IS_NUM_VDEVS != 0 {
        resource.num_vdevs.saturating_add(1)
    } else {
        req.num_units
    }
}

/// Size and allocate every memory request.
pub fn plan_chunks(
    requests: &[MemRequest],
    resource: &ResourceConfig,
    memory: &mut impl HostMemory,
) -> Result<Vec<HostMemoryChunk>> {
    let mut chunks = Vec::with_capacity(requests.len());
    for req in requests {
        let units = units_for(req, resource);
        let size = units.checked_mul(req.unit_size).ok_or_else(|| {
            SessionError::AttachFailed(format!(
                "memory request {}: {} units of {} bytes overflows",
                req.req_id, units, req.unit_size
            ))
        })?;
        let ptr = memory.allocate(req.req_id, size).ok_or_else(|| {
            SessionError::AttachFailed(format!(
                "could not allocate {} bytes for memory request {}",
                size, req.req_id
            ))
        })?;
        debug!(req_id = req.req_id, units, size, ptr = format_args!("{:#x}", ptr), "allocated host memory");
        chunks.push(HostMemoryChunk {
            req_id: req.req_id,
            ptr,
            size,
        });
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use athwmi_proto::ProtocolGeneration;

    fn req(req_id: u32, unit_size: u32, num_unit_info: u32, num_units: u32) -> MemRequest {
        MemRequest {
            req_id,
            unit_size,
            num_unit_info,
            num_units,
        }
    }

    #[test]
    fn units_follow_resource_limits() {
        let resource = ResourceConfig {
            num_vdevs: 8,
            num_peers: 16,
            ..ResourceConfig::defaults_for(ProtocolGeneration::Main)
        };
        assert_eq!(units_for(&req(0, 4, NUM_UNITS_IS_NUM_PEERS, 0), &resource), 17);
        assert_eq!(units_for(&req(0, 4, NUM_UNITS_IS_NUM_VDEVS, 0), &resource), 9);
        assert_eq!(units_for(&req(0, 4, 0, 5), &resource), 5);
    }

    #[test]
    fn plan_allocates_each_request() {
        let resource = ResourceConfig {
            num_peers: 3,
            ..Default::default()
        };
        let requests = [req(1, 100, NUM_UNITS_IS_NUM_PEERS, 0), req(2, 6, 0, 2)];
        let mut memory = BumpAllocator::new(0x1000, 0x1000);
        let chunks = plan_chunks(&requests, &resource, &mut memory).unwrap();
        assert_eq!(
            chunks,
            vec![
                HostMemoryChunk {
                    req_id: 1,
                    ptr: 0x1000,
                    size: 400
                },
                HostMemoryChunk {
                    req_id: 2,
                    ptr: 0x1190,
                    size: 12
                },
            ]
        );
    }

    #[test]
    fn overflow_and_exhaustion_fail_attach() {
        let resource = ResourceConfig::default();
        let mut memory = BumpAllocator::new(0, u32::MAX);
        let err = plan_chunks(&[req(1, u32::MAX, 0, 2)], &resource, &mut memory).unwrap_err();
        assert!(matches!(err, SessionError::AttachFailed(_)));

        let mut tiny = BumpAllocator::new(0, 16);
        let err = plan_chunks(&[req(1, 32, 0, 1)], &resource, &mut tiny).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn closure_collaborator() {
        let mut seen = Vec::new();
        let mut memory = |req_id: u32, size: u32| {
            seen.push((req_id, size));
            Some(0x8000)
        };
        let chunks = plan_chunks(&[req(5, 8, 0, 2)], &ResourceConfig::default(), &mut memory).unwrap();
        assert_eq!(chunks[0].ptr, 0x8000);
        assert_eq!(seen, vec![(5, 16)]);
    }
}
