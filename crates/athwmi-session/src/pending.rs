//! Outstanding-operation tracking.
//!
//! WMI has no request correlation id. Responses that answer a specific
//! command are matched on content: the vdev id of a start response, the value
//! echoed back, the scan id of a scan event. Each tracked operation carries
//! its own deadline; [`PendingTable::expire`] turns overdue ones into
//! reported failures.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use athwmi_proto::event::{ScanEventType, VdevResponseType};
use athwmi_proto::WmiEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Content key an inbound event is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKey {
    VdevStart { vdev_id: u32 },
    VdevRestart { vdev_id: u32 },
    VdevStop { vdev_id: u32 },
    Echo { value: u32 },
    ScanStart { scan_id: u32 },
}

impl PendingKey {
    /// The key an inbound event completes, if any.
    pub fn completed_by(event: &WmiEvent) -> Option<Self> {
        match event {
            WmiEvent::VdevStartResp(resp) => Some(match resp.resp_type {
                VdevResponseType::Start => PendingKey::VdevStart {
                    vdev_id: resp.vdev_id,
                },
                VdevResponseType::Restart => PendingKey::VdevRestart {
                    vdev_id: resp.vdev_id,
                },
            }),
            WmiEvent::VdevStopped(stopped) => Some(PendingKey::VdevStop {
                vdev_id: stopped.vdev_id,
            }),
            WmiEvent::Echo(echo) => Some(PendingKey::Echo { value: echo.value }),
            WmiEvent::Scan(scan)
                if scan.event_type.contains(ScanEventType::STARTED)
                    || scan.event_type.contains(ScanEventType::START_FAILED) =>
            {
                Some(PendingKey::ScanStart {
                    scan_id: scan.scan_id,
                })
            }
            _ => None,
        }
    }
}

/// A tracked operation whose deadline passed without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingFailure {
    pub key: PendingKey,
    pub waited: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    issued: Instant,
    deadline: Instant,
}

/// Table of operations awaiting a firmware response.
///
/// Shared between the issuing and receiving sides, so every method takes
/// `&self` and locks internally.
#[derive(Debug)]
pub struct PendingTable {
    entries: Mutex<HashMap<PendingKey, Entry>>,
    max_outstanding: usize,
}

impl PendingTable {
    pub fn new(max_outstanding: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_outstanding,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PendingKey, Entry>> {
        // Entries are plain data, so a poisoned table is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start tracking `key` with a deadline `timeout` from now.
    pub fn register(&self, key: PendingKey, timeout: Duration) -> Result<()> {
        self.register_at(key, Instant::now(), timeout)
    }

    pub(crate) fn register_at(&self, key: PendingKey, now: Instant, timeout: Duration) -> Result<()> {
        let mut entries = self.lock();
        if entries.contains_key(&key) {
            return Err(SessionError::AlreadyPending(key));
        }
        if entries.len() >= self.max_outstanding {
            return Err(SessionError::TooManyPending {
                max: self.max_outstanding,
            });
        }
        entries.insert(
            key,
            Entry {
                issued: now,
                deadline: now + timeout,
            },
        );
        debug!(key = ?key, ?timeout, "tracking operation");
        Ok(())
    }

    /// Stop tracking `key` without a response, e.g. when sending failed.
    pub fn cancel(&self, key: &PendingKey) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Complete the operation `event` answers, if one is tracked.
    pub fn resolve(&self, event: &WmiEvent) -> Option<PendingKey> {
        let key = PendingKey::completed_by(event)?;
        let entry = self.lock().remove(&key)?;
        debug!(key = ?key, elapsed = ?entry.issued.elapsed(), "operation completed");
        Some(key)
    }

    /// Remove and report every operation whose deadline is at or before `now`.
    pub fn expire(&self, now: Instant) -> Vec<PendingFailure> {
        let mut failures = Vec::new();
        self.lock().retain(|key, entry| {
            if entry.deadline > now {
                return true;
            }
            let waited = now.saturating_duration_since(entry.issued);
            warn!(key = ?key, ?waited, "operation timed out");
            failures.push(PendingFailure { key: *key, waited });
            false
        });
        failures
    }

    pub fn contains(&self, key: &PendingKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use athwmi_proto::event::{
        EchoEvent, ScanCompletionReason, ScanEvent, VdevIdEvent, VdevStartResp,
    };

    fn scan_event(event_type: ScanEventType, scan_id: u32) -> WmiEvent {
        WmiEvent::Scan(ScanEvent {
            event_type,
            reason: ScanCompletionReason::Completed,
            channel_freq: 0,
            scan_req_id: 1,
            scan_id,
            vdev_id: 0,
        })
    }

    #[test]
    fn start_response_matches_by_type_and_vdev() {
        let table = PendingTable::new(8);
        table
            .register(PendingKey::VdevStart { vdev_id: 1 }, Duration::from_secs(1))
            .unwrap();
        table
            .register(PendingKey::VdevRestart { vdev_id: 1 }, Duration::from_secs(1))
            .unwrap();

        let resp = WmiEvent::VdevStartResp(VdevStartResp {
            vdev_id: 1,
            req_id: 0,
            resp_type: VdevResponseType::Restart,
            status: 0,
        });
        assert_eq!(
            table.resolve(&resp),
            Some(PendingKey::VdevRestart { vdev_id: 1 })
        );
        assert!(table.contains(&PendingKey::VdevStart { vdev_id: 1 }));
        assert_eq!(table.resolve(&resp), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn stop_echo_and_scan_match() {
        let table = PendingTable::new(8);
        let timeout = Duration::from_secs(1);
        table.register(PendingKey::VdevStop { vdev_id: 3 }, timeout).unwrap();
        table.register(PendingKey::Echo { value: 9 }, timeout).unwrap();
        table.register(PendingKey::ScanStart { scan_id: 4 }, timeout).unwrap();

        assert_eq!(
            table.resolve(&WmiEvent::VdevStopped(VdevIdEvent { vdev_id: 3 })),
            Some(PendingKey::VdevStop { vdev_id: 3 })
        );
        assert_eq!(
            table.resolve(&WmiEvent::Echo(EchoEvent { value: 8 })),
            None
        );
        assert_eq!(
            table.resolve(&WmiEvent::Echo(EchoEvent { value: 9 })),
            Some(PendingKey::Echo { value: 9 })
        );
        assert_eq!(table.resolve(&scan_event(ScanEventType::COMPLETED, 4)), None);
        assert_eq!(
            table.resolve(&scan_event(ScanEventType::START_FAILED, 4)),
            Some(PendingKey::ScanStart { scan_id: 4 })
        );
        assert!(table.is_empty());
    }

    #[test]
    fn expire_reports_overdue_only() {
        let table = PendingTable::new(8);
        let start = Instant::now();
        table
            .register_at(PendingKey::Echo { value: 1 }, start, Duration::from_millis(10))
            .unwrap();
        table
            .register_at(PendingKey::Echo { value: 2 }, start, Duration::from_secs(10))
            .unwrap();

        assert!(table.expire(start).is_empty());

        let failures = table.expire(start + Duration::from_millis(10));
        assert_eq!(
            failures,
            vec![PendingFailure {
                key: PendingKey::Echo { value: 1 },
                waited: Duration::from_millis(10),
            }]
        );
        assert_eq!(table.len(), 1);
        assert!(table.contains(&PendingKey::Echo { value: 2 }));
    }

    #[test]
    fn register_is_bounded_and_unique() {
        let table = PendingTable::new(1);
        let key = PendingKey::Echo { value: 1 };
        table.register(key, Duration::from_secs(1)).unwrap();
        assert!(matches!(
            table.register(key, Duration::from_secs(1)),
            Err(SessionError::AlreadyPending(k)) if k == key
        ));
        assert!(matches!(
            table.register(PendingKey::Echo { value: 2 }, Duration::from_secs(1)),
            Err(SessionError::TooManyPending { max: 1 })
        ));
        assert!(table.cancel(&key));
        assert!(!table.cancel(&key));
        assert!(table.is_empty());
    }
}
