//! Interrupt-driven event queue for the main task.
//!
//! Only slow-path work goes through here.  The zero-cross and settle-timer
//! interrupts run their half-cycle logic directly on the shared controller;
//! they never queue anything.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Control timer    │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Holder/lever ISR │────▶│  (lock-free) │     │  (consumer)  │
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// Periodic control tick timer fired.
    ControlTick  = 0,
    /// Holder switch or tip-change lever changed level.
    InputChanged = 1,
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// ISRs and timer callbacks write (produce), main loop reads (consume).

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
// SAFETY: a slot is written only by the producer before it publishes
// `EVENT_HEAD`, and read only by the consumer before it publishes
// `EVENT_TAIL`.  Acquire/Release on the indices orders those accesses.
static mut EVENT_BUFFER: [u8; EVENT_QUEUE_CAP] = [0; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from ISR context (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false;
    }

    // SAFETY: slot `head` is not visible to the consumer until the store below.
    unsafe {
        EVENT_BUFFER[head as usize] = event as u8;
    }

    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None;
    }

    // SAFETY: slot `tail` was published by the producer's Release store.
    let raw = unsafe { EVENT_BUFFER[tail as usize] };
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    event_from_u8(raw)
}

/// Drain all pending events into a callback, FIFO.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

// ── Internal ──────────────────────────────────────────────────

fn event_from_u8(raw: u8) -> Option<Event> {
    match raw {
        0 => Some(Event::ControlTick),
        1 => Some(Event::InputChanged),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The queue is a process-wide static; keep every assertion in one test
    // so parallel test threads do not interleave.
    #[test]
    fn fifo_and_overflow() {
        drain_events(|_| {});
        assert!(queue_is_empty());

        assert!(push_event(Event::InputChanged));
        assert!(push_event(Event::ControlTick));
        assert_eq!(pop_event(), Some(Event::InputChanged));
        assert_eq!(pop_event(), Some(Event::ControlTick));
        assert_eq!(pop_event(), None);

        let mut accepted = 0;
        while push_event(Event::ControlTick) {
            accepted += 1;
        }
        assert_eq!(accepted, EVENT_QUEUE_CAP - 1);

        let mut drained = 0;
        drain_events(|e| {
            assert_eq!(e, Event::ControlTick);
            drained += 1;
        });
        assert_eq!(drained, accepted);
        assert!(queue_is_empty());
    }
}
