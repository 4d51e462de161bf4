//! Deterministic discrete-event queue

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SimTime;

/// An event waiting in the queue
#[derive(Debug, Clone)]
pub struct QueuedEvent<E> {
    pub time: SimTime,
    /// Channel-model trace index in effect when the event fires
    pub trace_index: u32,
    /// Insertion order; breaks ties between equal timestamps
    pub sequence: u64,
    pub payload: E,
}

impl<E> PartialEq for QueuedEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.sequence == other.sequence
    }
}

impl<E> Eq for QueuedEvent<E> {}

impl<E> PartialOrd for QueuedEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for QueuedEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest time, then earliest insert)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-time event queue with FIFO order among equal timestamps
///
/// Popping an event advances the queue's notion of "now" and the current
/// trace index; time never runs backwards.
#[derive(Debug)]
pub struct EventQueue<E> {
    heap: BinaryHeap<QueuedEvent<E>>,
    next_sequence: u64,
    now: SimTime,
    trace_index: u32,
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
            now: SimTime::ZERO,
            trace_index: 0,
        }
    }

    /// Insert an event at an absolute time
    ///
    /// Times earlier than `now()` are clamped to `now()`.
    pub fn push_at(&mut self, time: SimTime, trace_index: u32, payload: E) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedEvent {
            time: time.max(self.now),
            trace_index,
            sequence,
            payload,
        });
    }

    /// Remove the earliest event and advance the clock to it
    pub fn pop(&mut self) -> Option<QueuedEvent<E>> {
        let event = self.heap.pop()?;
        self.now = event.time;
        self.trace_index = event.trace_index;
        Some(event)
    }

    /// Time of the next event without removing it
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|e| e.time)
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn trace_index(&self) -> u32 {
        self.trace_index
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push_at(SimTime(30), 0, "c");
        queue.push_at(SimTime(10), 0, "a");
        queue.push_at(SimTime(20), 0, "b");

        let order: Vec<_> = std::iter::from_fn(|| queue.pop().map(|e| e.payload)).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(queue.now(), SimTime(30));
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut queue = EventQueue::new();
        for name in ["first", "second", "third"] {
            queue.push_at(SimTime(5), 0, name);
        }
        assert_eq!(queue.pop().unwrap().payload, "first");
        assert_eq!(queue.pop().unwrap().payload, "second");
        assert_eq!(queue.pop().unwrap().payload, "third");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_past_events_clamped_to_now() {
        let mut queue = EventQueue::new();
        queue.push_at(SimTime(100), 7, "late");
        queue.pop();
        queue.push_at(SimTime(50), 7, "past");
        let event = queue.pop().unwrap();
        assert_eq!(event.time, SimTime(100));
        assert_eq!(queue.trace_index(), 7);
    }
}
