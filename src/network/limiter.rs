//! Connection limiter
//!
//! Optional ceiling on concurrently served connections, applied around
//! accept. A bounded channel serves as the permit pool: each live
//! connection holds one token in it.

use crossbeam::channel::{bounded, Receiver, Sender};

/// Counting semaphore over connection slots
#[derive(Clone)]
pub struct ConnectionLimiter {
    slots: Sender<()>,
    released: Receiver<()>,
}

/// A held connection slot, returned to the pool on drop
pub struct Permit {
    released: Receiver<()>,
}

impl ConnectionLimiter {
    /// Create a limiter allowing `max` concurrent permits (`max` ≥ 1)
    pub fn new(max: usize) -> Self {
        let (slots, released) = bounded(max);
        Self { slots, released }
    }

    /// Take a slot, blocking while all are in use
    pub fn acquire(&self) -> Permit {
        // Both ends are owned by `self`, so the channel cannot disconnect
        let _ = self.slots.send(());
        Permit {
            released: self.released.clone(),
        }
    }

    /// Take a slot if one is free
    pub fn try_acquire(&self) -> Option<Permit> {
        self.slots.try_send(()).ok().map(|()| Permit {
            released: self.released.clone(),
        })
    }

    /// Number of slots currently held
    pub fn in_use(&self) -> usize {
        self.slots.len()
    }

    /// Maximum number of slots
    pub fn max(&self) -> usize {
        self.slots.capacity().unwrap_or(usize::MAX)
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let _ = self.released.try_recv();
    }
}
