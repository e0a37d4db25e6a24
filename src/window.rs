//! # Window Module
//!
//! Groups time-sorted usage events into fixed-duration session blocks.
//!
//! A block opens at the enclosing UTC hour of its first event and nominally
//! spans the window duration (5 hours by default). An event starts a new
//! block when it falls at/after the current block's nominal end, or when the
//! silence since the block's last event is at least one window. Silences of
//! at least one window between a finalized block and the next event are
//! recorded as explicit gap blocks carrying no events.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use tracing::debug;

use crate::models::{LimitSignal, SessionBlock, UsageEvent};

/// Floor to the enclosing UTC clock hour.
pub fn floor_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_minute(0)
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(ts)
}

fn starts_new_block(block: &SessionBlock, event: &UsageEvent, window: TimeDelta) -> bool {
    if event.ts >= block.end {
        return true;
    }
    block
        .entries
        .last()
        .is_some_and(|last| event.ts - last.ts >= window)
}

fn gap_between(done: &SessionBlock, next: &UsageEvent, window: TimeDelta) -> Option<SessionBlock> {
    let last = done.actual_end?;
    if next.ts - last < window {
        return None;
    }
    Some(SessionBlock::gap(last, next.ts))
}

/// Build blocks from events sorted ascending by timestamp, then mark the
/// active block relative to `now`.
pub fn identify_blocks(
    events: &[UsageEvent],
    window: TimeDelta,
    now: DateTime<Utc>,
) -> Vec<SessionBlock> {
    let mut blocks: Vec<SessionBlock> = Vec::new();
    let mut current: Option<SessionBlock> = None;

    for event in events {
        let open_new = current
            .as_ref()
            .is_none_or(|b| starts_new_block(b, event, window));
        if open_new {
            if let Some(mut done) = current.take() {
                done.finalize();
                let gap = gap_between(&done, event, window);
                blocks.push(done);
                blocks.extend(gap);
            }
            let start = floor_to_hour(event.ts);
            current = Some(SessionBlock::new(start, start + window));
        }
        if let Some(block) = current.as_mut() {
            block.add_event(event.clone());
        }
    }

    if let Some(mut done) = current {
        done.finalize();
        blocks.push(done);
    }

    mark_active(&mut blocks, now);
    debug!(
        events = events.len(),
        blocks = blocks.len(),
        gaps = blocks.iter().filter(|b| b.is_gap).count(),
        "session blocks built"
    );
    blocks
}

/// Only the latest non-gap block whose nominal end is after `now` is active.
pub fn mark_active(blocks: &mut [SessionBlock], now: DateTime<Utc>) {
    for b in blocks.iter_mut() {
        b.is_active = false;
    }
    if let Some(b) = blocks
        .iter_mut()
        .filter(|b| !b.is_gap && b.end > now)
        .max_by_key(|b| b.end)
    {
        b.is_active = true;
    }
}

/// The active block, if any.
pub fn active_block(blocks: &[SessionBlock]) -> Option<&SessionBlock> {
    blocks.iter().rev().find(|b| b.is_active && !b.is_gap)
}

/// Attach each signal to every block whose `[start, end]` span contains it.
pub fn attach_limits(blocks: &mut [SessionBlock], signals: &[LimitSignal]) {
    for block in blocks.iter_mut() {
        block.limit_signals = signals
            .iter()
            .filter(|s| block.start <= s.ts && s.ts <= block.end)
            .cloned()
            .collect();
    }
}
