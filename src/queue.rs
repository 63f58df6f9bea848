// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A multi-producer, single-consumer linked queue.

use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicPtr;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

// spins on a mid-flight push before yielding the thread
const SPIN_LIMIT: u32 = 64;

struct Node<T> {
    // uninit for the sentinel, or once the payload has been moved out
    value: MaybeUninit<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn alloc(value: MaybeUninit<T>) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            value,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// A queue built on a singly linked list with a permanent sentinel head.
///
/// [`push`](Self::push) is lock-free and never blocks: it swings the tail with a compare-and-swap
/// retry loop, then links the previous tail to the new node. Consumers are serialized by an
/// internal lock that producers never touch, so a node is reclaimed by exactly one consumer and
/// never while another consumer may still read it.
///
/// [`len`](Self::len) is approximate. It is meant for backpressure heuristics, never for
/// correctness.
pub struct ConcurrentQueue<T> {
    head: AtomicPtr<Node<T>>,
    tail: AtomicPtr<Node<T>>,
    len: AtomicUsize,
    consumer: Mutex<()>,
}

// SAFETY: values are moved in by producers and moved out by the single active consumer; nodes are
// only reachable through the queue.
unsafe impl<T: Send> Send for ConcurrentQueue<T> {}
unsafe impl<T: Send> Sync for ConcurrentQueue<T> {}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<T> ConcurrentQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        let sentinel = Node::alloc(MaybeUninit::uninit());
        Self {
            head: AtomicPtr::new(sentinel),
            tail: AtomicPtr::new(sentinel),
            len: AtomicUsize::new(0),
            consumer: Mutex::new(()),
        }
    }

    /// Append a value at the tail.
    pub fn push(&self, value: T) {
        let node = Node::alloc(MaybeUninit::new(value));

        // count before the node becomes visible so a racing pop never underflows
        self.len.fetch_add(1, Ordering::Relaxed);

        let mut prev = self.tail.load(Ordering::Acquire);
        loop {
            match self
                .tail
                .compare_exchange_weak(prev, node, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(actual) => prev = actual,
            }
        }

        // SAFETY: `prev` cannot be reclaimed yet: the consumer only frees a node after moving the
        // head past it, which requires the `next` link we are about to store.
        unsafe { (*prev).next.store(node, Ordering::Release) };
    }

    /// Remove the value at the head, if any.
    ///
    /// Never blocks on producers. A push that already swung the tail but has not linked its node
    /// yet is waited out rather than reported as an empty queue.
    pub fn try_pop(&self) -> Option<T> {
        let _guard = self.lock_consumer();
        // SAFETY: the consumer lock is held.
        unsafe { self.pop_locked() }
    }

    /// Remove up to `max` values in FIFO order.
    pub fn pop_batch(&self, max: usize) -> Vec<T> {
        let mut batch = Vec::with_capacity(max.min(self.len()));
        self.pop_batch_into(&mut batch, max);
        batch
    }

    /// Remove up to `max` values in FIFO order, appending them to `batch`.
    ///
    /// Returns the number of values removed.
    pub fn pop_batch_into(&self, batch: &mut Vec<T>, max: usize) -> usize {
        let _guard = self.lock_consumer();
        let mut count = 0;
        while count < max {
            // SAFETY: the consumer lock is held.
            match unsafe { self.pop_locked() } {
                Some(value) => batch.push(value),
                None => break,
            }
            count += 1;
        }
        count
    }

    /// Remove and drop every remaining value, returning how many were removed.
    pub fn clear(&self) -> usize {
        let _guard = self.lock_consumer();
        let mut count = 0;
        // SAFETY: the consumer lock is held.
        while unsafe { self.pop_locked() }.is_some() {
            count += 1;
        }
        count
    }

    /// The approximate number of queued values.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Whether the queue appears empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_consumer(&self) -> MutexGuard<'_, ()> {
        self.consumer.lock().unwrap_or_else(|e| e.into_inner())
    }

    // SAFETY: the caller must hold the consumer lock.
    unsafe fn pop_locked(&self) -> Option<T> {
        let head = self.head.load(Ordering::Acquire);

        let mut spins = 0;
        let next = loop {
            // SAFETY: the head node is only freed by the consumer, which is us.
            let next = unsafe { (*head).next.load(Ordering::Acquire) };
            if !next.is_null() {
                break next;
            }
            if self.tail.load(Ordering::Acquire) == head {
                return None;
            }
            // the tail moved but the link is not visible yet
            if spins < SPIN_LIMIT {
                spins += 1;
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        };

        let swung = self
            .head
            .compare_exchange(head, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        debug_assert!(swung, "queue head moved while the consumer lock was held");

        // SAFETY: `next` was fully initialized by its producer before being linked, and it becomes
        // the new sentinel whose payload is considered moved out from now on.
        let value = unsafe { (*next).value.assume_init_read() };
        // SAFETY: the old sentinel is unreachable; its payload is uninit or already moved out, and
        // `MaybeUninit` never drops it.
        drop(unsafe { Box::from_raw(head) });

        self.len.fetch_sub(1, Ordering::Relaxed);
        Some(value)
    }
}

impl<T> Drop for ConcurrentQueue<T> {
    fn drop(&mut self) {
        let sentinel = *self.head.get_mut();
        // SAFETY: exclusive access; the sentinel holds no live payload, every later node does.
        unsafe {
            let mut next = (*sentinel).next.load(Ordering::Relaxed);
            drop(Box::from_raw(sentinel));
            while !next.is_null() {
                let mut node = Box::from_raw(next);
                next = node.next.load(Ordering::Relaxed);
                node.value.assume_init_drop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::thread;

    use super::*;

    #[test]
    fn test_fifo_single_thread() {
        let queue = ConcurrentQueue::new();
        assert!(queue.try_pop().is_none());

        for i in 0..10 {
            queue.push(i);
        }
        assert_eq!(queue.len(), 10);
        assert_eq!(queue.try_pop(), Some(0));
        assert_eq!(queue.pop_batch(4), vec![1, 2, 3, 4]);
        assert_eq!(queue.pop_batch(100), vec![5, 6, 7, 8, 9]);
        assert!(queue.pop_batch(100).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear() {
        let queue = ConcurrentQueue::new();
        for i in 0..5 {
            queue.push(i.to_string());
        }
        assert_eq!(queue.clear(), 5);
        assert!(queue.is_empty());

        queue.push("again".to_string());
        assert_eq!(queue.try_pop().as_deref(), Some("again"));
    }

    #[derive(Debug)]
    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_values_dropped_exactly_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        {
            let queue = ConcurrentQueue::new();
            for _ in 0..8 {
                queue.push(DropCounter(drops.clone()));
            }
            drop(queue.pop_batch(3));
            assert_eq!(drops.load(Ordering::SeqCst), 3);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_concurrent_producers_single_consumer() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 10_000;

        let queue = Arc::new(ConcurrentQueue::new());
        let producers = (0..PRODUCERS)
            .map(|p| {
                let queue = queue.clone();
                thread::spawn(move || {
                    for seq in 0..PER_PRODUCER {
                        queue.push((p, seq));
                    }
                })
            })
            .collect::<Vec<_>>();

        let mut next_seq = [0usize; PRODUCERS];
        let mut received = 0;
        let mut batch = Vec::new();
        while received < PRODUCERS * PER_PRODUCER {
            batch.clear();
            queue.pop_batch_into(&mut batch, 128);
            for &(p, seq) in &batch {
                assert_eq!(seq, next_seq[p], "producer {p} out of order");
                next_seq[p] += 1;
            }
            received += batch.len();
        }

        for handle in producers {
            handle.join().unwrap();
        }
        assert!(queue.try_pop().is_none());
        assert_eq!(queue.len(), 0);
        assert_eq!(next_seq, [PER_PRODUCER; PRODUCERS]);
    }

    #[test]
    fn test_concurrent_consumers_are_serialized() {
        let queue = Arc::new(ConcurrentQueue::new());
        for i in 0..20_000 {
            queue.push(i);
        }

        let popped = Arc::new(AtomicUsize::new(0));
        let consumers = (0..4)
            .map(|_| {
                let queue = queue.clone();
                let popped = popped.clone();
                thread::spawn(move || {
                    while queue.try_pop().is_some() {
                        popped.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in consumers {
            handle.join().unwrap();
        }

        assert_eq!(popped.load(Ordering::Relaxed), 20_000);
    }
}
