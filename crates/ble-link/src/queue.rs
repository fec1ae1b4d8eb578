//! The C1 write serializer.
//!
//! GATT allows a single outstanding write per characteristic, so all
//! outbound buffers pass through this FIFO. The head of the queue is always
//! the write currently in flight: `enqueue` on an empty queue both issues
//! the radio write and pushes the buffer, and only the matching completion
//! callback pops it.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::LinkError;
use crate::radio::{RadioError, RadioHandle};

#[derive(Debug, Default)]
pub struct WriteQueue {
    queue: VecDeque<Vec<u8>>,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues a buffer for transmission, issuing the radio write immediately
    /// when nothing is in flight. Never blocks.
    pub fn enqueue(&mut self, value: Vec<u8>, radio: &RadioHandle) -> Result<(), RadioError> {
        if self.queue.is_empty() {
            debug!(len = value.len(), payload = %hex::encode(&value), "C1 write");
            radio.write_c1(value.clone())?;
        } else {
            debug!(
                len = value.len(),
                backlog = self.queue.len(),
                "ongoing C1 write, queueing"
            );
        }
        self.queue.push_back(value);
        Ok(())
    }

    /// Handles a write-completion callback: pops the in-flight head and
    /// issues the next queued write, if any.
    ///
    /// A failed write is not retried; its payload is dropped so the queue
    /// keeps moving, and `WriteFailed` is returned for diagnostics. A
    /// completion with an empty queue means the radio stack and our
    /// bookkeeping disagree; that is reported as `UnexpectedCallback` and
    /// left to the caller to log.
    pub fn on_write_complete(
        &mut self,
        success: bool,
        radio: &RadioHandle,
    ) -> Result<(), LinkError> {
        let Some(done) = self.queue.pop_front() else {
            return Err(LinkError::UnexpectedCallback(
                "C1 write completion with empty queue",
            ));
        };

        if !success {
            warn!(len = done.len(), "C1 write failed, dropping payload");
        }

        if let Some(next) = self.queue.front() {
            debug!(len = next.len(), payload = %hex::encode(next), "C1 write");
            radio.write_c1(next.clone())?;
        }

        if success {
            Ok(())
        } else {
            Err(LinkError::WriteFailed)
        }
    }

    /// Drops all queued buffers, the in-flight one included. Used on
    /// disconnect; undelivered writes are lost by design.
    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            debug!(dropped = self.queue.len(), "clearing C1 write queue");
        }
        self.queue.clear();
    }
}
