use std::collections::VecDeque;

use ffmpeg_types::Packet;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

struct State {
    packets: VecDeque<Packet>,
    bytes: usize,
    closed: bool,
}

/**
    Blocking FIFO handing packets from the demux thread to one decode consumer.

    `get` blocks until a packet is available, so consumers never observe an
    empty queue. When built with a capacity, `put` blocks the producer while
    the queue is full; without one the queue grows without bound.

    A single mutex and condition variable guard the whole queue. Only one
    side can ever be waiting (the queue cannot be full and empty at once),
    so each transition wakes a single waiter; `close` and `abort` wake all.
*/
pub struct PacketQueue {
    state: Mutex<State>,
    changed: Condvar,
    capacity: Option<usize>,
}

impl PacketQueue {
    /**
        Create a new queue. `None` means unbounded.
    */
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(State {
                packets: VecDeque::new(),
                bytes: 0,
                closed: false,
            }),
            changed: Condvar::new(),
            capacity,
        }
    }

    /**
        Append a packet at the tail, blocking while the queue is full.

        Fails with [`Error::Closed`] once the queue has been closed.
    */
    pub fn put(&self, packet: Packet) -> Result<()> {
        let mut state = self.state.lock();
        while !state.closed && self.is_full(&state) {
            self.changed.wait(&mut state);
        }
        if state.closed {
            return Err(Error::Closed);
        }

        state.bytes += packet.size();
        state.packets.push_back(packet);
        self.changed.notify_one();
        Ok(())
    }

    /**
        Remove and return the packet at the head, blocking until one exists.

        Returns `None` only after the queue is closed and drained, or aborted.
    */
    pub fn get(&self) -> Option<Packet> {
        let mut state = self.state.lock();
        loop {
            if let Some(packet) = state.packets.pop_front() {
                state.bytes -= packet.size();
                self.changed.notify_one();
                return Some(packet);
            }
            if state.closed {
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /**
        Mark the end of input. Queued packets stay available to `get`.
    */
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.changed.notify_all();
    }

    /**
        Close the queue and discard everything still queued.
    */
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.packets.clear();
        state.bytes = 0;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /**
        Number of queued packets.
    */
    pub fn len(&self) -> usize {
        self.state.lock().packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /**
        Total payload bytes of queued packets.
    */
    pub fn byte_size(&self) -> usize {
        self.state.lock().bytes
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn is_full(&self, state: &State) -> bool {
        self.capacity
            .is_some_and(|capacity| state.packets.len() >= capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use ffmpeg_types::{Pts, Rational};

    fn packet(seq: i64) -> Packet {
        Packet::new(0, vec![0u8; 10], Rational::new(1, 1000)).with_timestamps(Some(Pts(seq)), None)
    }

    fn seq(packet: &Packet) -> i64 {
        packet.pts.map(|p| p.0).unwrap_or(-1)
    }

    #[test]
    fn fifo_order_and_tally() {
        let queue = PacketQueue::new(None);
        for i in 0..3 {
            queue.put(packet(i)).unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.byte_size(), 30);

        assert_eq!(seq(&queue.get().unwrap()), 0);
        assert_eq!(seq(&queue.get().unwrap()), 1);
        assert_eq!(queue.byte_size(), 10);
    }

    #[test]
    fn get_blocks_until_put() {
        let queue = Arc::new(PacketQueue::new(None));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.get().map(|p| seq(&p)))
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!consumer.is_finished());

        queue.put(packet(7)).unwrap();
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn close_drains_then_ends() {
        let queue = PacketQueue::new(None);
        queue.put(packet(1)).unwrap();
        queue.close();

        assert!(matches!(queue.put(packet(2)), Err(Error::Closed)));
        assert_eq!(queue.get().map(|p| seq(&p)), Some(1));
        assert!(queue.get().is_none());
    }

    #[test]
    fn close_wakes_blocked_consumer() {
        let queue = Arc::new(PacketQueue::new(None));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.get().is_none())
        };

        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert!(consumer.join().unwrap());
    }

    #[test]
    fn abort_discards_queued_packets() {
        let queue = PacketQueue::new(None);
        queue.put(packet(1)).unwrap();
        queue.put(packet(2)).unwrap();
        queue.abort();

        assert!(queue.get().is_none());
        assert_eq!(queue.byte_size(), 0);
    }

    #[test]
    fn bounded_put_blocks_until_space() {
        let queue = Arc::new(PacketQueue::new(Some(2)));
        queue.put(packet(0)).unwrap();
        queue.put(packet(1)).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.put(packet(2)))
        };

        thread::sleep(Duration::from_millis(30));
        assert!(!producer.is_finished());
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.get().map(|p| seq(&p)), Some(0));
        producer.join().unwrap().unwrap();
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn abort_wakes_blocked_producer() {
        let queue = Arc::new(PacketQueue::new(Some(1)));
        queue.put(packet(0)).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.put(packet(1)))
        };

        thread::sleep(Duration::from_millis(20));
        queue.abort();
        assert!(matches!(producer.join().unwrap(), Err(Error::Closed)));
    }

    #[test]
    fn concurrent_transfer_is_lossless_and_ordered() {
        const COUNT: i64 = 5_000;

        for capacity in [None, Some(8)] {
            let queue = Arc::new(PacketQueue::new(capacity));

            let producer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..COUNT {
                        queue.put(packet(i)).unwrap();
                    }
                    queue.close();
                })
            };

            let mut received = Vec::with_capacity(COUNT as usize);
            while let Some(p) = queue.get() {
                received.push(seq(&p));
            }
            producer.join().unwrap();

            let expected: Vec<i64> = (0..COUNT).collect();
            assert_eq!(received, expected);
        }
    }
}
