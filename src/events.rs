//! Main-loop event queue.
//!
//! Events are produced by:
//! - Bluedroid GATT server callbacks (connect, disconnect, RX writes)
//!
//! and consumed by the main loop, which feeds them to the
//! [`DeviceService`](crate::app::service::DeviceService) one at a time in
//! FIFO order.  Producers never touch device state directly.  Connect and
//! disconnect reports are never crowded out by received lines; see
//! [`EventQueue`].
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GATTS        │────▶│  Event Queue │────▶│  Main Loop   │
//! │ callbacks    │     │  (bounded)   │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::Mutex;

use log::warn;

use crate::app::events::LinkEvent;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 16;

/// Slots that RX lines may never occupy, kept free for connect and
/// disconnect reports.
pub const LIFECYCLE_RESERVE: usize = 2;

/// Everything the main loop can be woken for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Connection lifecycle or received command from the BLE link.
    Link(LinkEvent),
}

impl Event {
    /// Connect and disconnect reports.  These outrank received lines.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Event::Link(LinkEvent::Connected { .. } | LinkEvent::Disconnected { .. })
        )
    }
}

/// Bounded FIFO with room held back for lifecycle events.
///
/// - RX lines are refused once `EVENT_QUEUE_CAP - LIFECYCLE_RESERVE`
///   events are pending.
/// - A lifecycle event arriving at a full queue evicts the newest pending
///   RX line.  With no RX line to evict, the oldest event goes.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: heapless::Deque<Event, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            inner: heapless::Deque::new(),
        }
    }

    /// Enqueue an event.  Returns `false` if it was dropped.
    pub fn push(&mut self, event: Event) -> bool {
        if !event.is_lifecycle() {
            if self.inner.len() >= EVENT_QUEUE_CAP - LIFECYCLE_RESERVE {
                warn!("event queue busy, dropping {:?}", event);
                return false;
            }
            return self.inner.push_back(event).is_ok();
        }

        if self.inner.is_full() {
            match self.evict_newest_line() {
                Some(evicted) => warn!("event queue full, evicted {:?}", evicted),
                None => {
                    let oldest = self.inner.pop_front();
                    warn!("event queue full of lifecycle events, dropped {:?}", oldest);
                }
            }
        }
        self.inner.push_back(event).is_ok()
    }

    /// Remove the most recent RX line, keeping every other event in order.
    fn evict_newest_line(&mut self) -> Option<Event> {
        let mut held: heapless::Vec<Event, EVENT_QUEUE_CAP> = heapless::Vec::new();
        let mut evicted = None;
        while let Some(event) = self.inner.pop_back() {
            if !event.is_lifecycle() {
                evicted = Some(event);
                break;
            }
            // `held` has the same capacity as the queue it drains.
            let _ = held.push(event);
        }
        while let Some(event) = held.pop() {
            let _ = self.inner.push_back(event);
        }
        evicted
    }

    /// Dequeue the oldest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.inner.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// The queue is written from the Bluedroid task and drained from the main
// task; `Mutex` keeps the two apart.
static EVENT_QUEUE: Mutex<EventQueue> = Mutex::new(EventQueue::new());

fn with_queue<R>(f: impl FnOnce(&mut EventQueue) -> R) -> R {
    let mut queue = match EVENT_QUEUE.lock() {
        Ok(q) => q,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut queue)
}

/// Push an event onto the queue.
/// Returns `false` if the event was dropped.
pub fn push_event(event: Event) -> bool {
    with_queue(|q| q.push(event))
}

/// Pop the oldest pending event.
pub fn pop_event() -> Option<Event> {
    with_queue(EventQueue::pop)
}

/// Drain all pending events into a callback, in FIFO order.
///
/// The lock is released before each callback runs, so the handler may
/// itself push events.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Number of pending events.
pub fn queue_len() -> usize {
    with_queue(|q| q.len())
}
