// SPDX-License-Identifier: Apache-2.0 OR MIT
// Bounded hand-off queue between the drain thread and the worker pool (L2)

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Create a bounded dispatch queue holding at most `capacity` entries.
///
/// The queue closes once every sender has been dropped; receivers still
/// get everything that was queued before that.
pub fn dispatch_queue<T>(capacity: usize) -> (DispatchSender<T>, DispatchReceiver<T>) {
    let (tx, rx) = bounded(capacity.max(1));
    (DispatchSender { tx }, DispatchReceiver { rx })
}

/// Producer side. Blocks when the queue is full.
pub struct DispatchSender<T> {
    tx: Sender<T>,
}

impl<T> DispatchSender<T> {
    /// Queue an entry, waiting for room if necessary.
    ///
    /// Fails only when every receiver is gone; the entry is handed back.
    pub fn send(&self, item: T) -> Result<(), T> {
        self.tx.send(item).map_err(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl<T> Clone for DispatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Consumer side.
pub struct DispatchReceiver<T> {
    rx: Receiver<T>,
}

impl<T> DispatchReceiver<T> {
    /// Wait for the next entry. `None` means the queue is closed and empty.
    pub fn receive(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Like `receive`, but gives up after `timeout`.
    ///
    /// Returns `Ok(None)` on timeout and `Err(())` once the queue is closed.
    #[allow(clippy::result_unit_err)]
    pub fn receive_timeout(&self, timeout: Duration) -> Result<Option<T>, ()> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Ok(Some(item)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.rx.capacity().unwrap_or(usize::MAX)
    }
}

impl<T> Clone for DispatchReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> Iterator for DispatchReceiver<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receive()
    }
}
