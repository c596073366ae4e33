//! Process-wide bookkeeping of live child identifiers.
//!
//! Launchers register a pid when a spawn succeeds and release it when the
//! child's termination is observed or its handle is dropped. This is the
//! only global mutable state besides the signal table, behind a single lock.

use std::sync::Mutex;

use crate::ProcessId;

static LIVE: Mutex<Vec<ProcessId>> = Mutex::new(Vec::new());

pub fn register(pid: ProcessId) {
    let mut live = LIVE.lock().expect("child registry lock poisoned");
    if !live.contains(&pid) {
        live.push(pid);
    }
}

pub fn release(pid: ProcessId) {
    let mut live = LIVE.lock().expect("child registry lock poisoned");
    live.retain(|p| *p != pid);
}

pub fn is_live(pid: ProcessId) -> bool {
    LIVE.lock()
        .expect("child registry lock poisoned")
        .contains(&pid)
}

/// Snapshot of currently registered children.
pub fn live_children() -> Vec<ProcessId> {
    LIVE.lock().expect("child registry lock poisoned").clone()
}
