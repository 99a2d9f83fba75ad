//! Bounded producer/consumer bridge for streaming load and save.
//!
//! A streaming load or save call runs exactly two units of work: one
//! spawned task and the calling thread, connected by a fixed-capacity
//! property queue. The producer suspends when the queue is full, the
//! consumer when it is empty.
//!
//! The consumer may stop early. To keep that from parking the
//! producer forever on a full queue, [`PropertySource`] drains and
//! discards everything still queued or in flight when it is dropped;
//! release of the source is the mandatory drain, not an optional
//! courtesy.

use crate::error::{CodecError, CodecResult};
use crate::value::Property;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// The producing end of a property bridge.
///
/// Dropping the sink closes the queue; that closure is how the
/// consumer learns the producer pushed its last item.
pub struct PropertySink {
    tx: SyncSender<Property>,
}

impl PropertySink {
    /// Pushes one property, suspending while the queue is full.
    ///
    /// Fails with [`CodecError::ChannelClosed`] once the consuming
    /// side has been torn down completely.
    pub fn send(&self, property: Property) -> CodecResult<()> {
        self.tx
            .send(property)
            .map_err(|_| CodecError::ChannelClosed)
    }
}

/// The consuming end of a property bridge.
///
/// Iterate it to pull properties in the order the producer pushed
/// them. On drop, any properties not yet pulled are received and
/// discarded so the producer can run to completion.
pub struct PropertySource {
    rx: Receiver<Property>,
}

impl Iterator for PropertySource {
    type Item = Property;

    fn next(&mut self) -> Option<Property> {
        self.rx.recv().ok()
    }
}

impl Drop for PropertySource {
    fn drop(&mut self) {
        let mut discarded = 0usize;
        while self.rx.recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::trace!(discarded, "drained undelivered properties");
        }
    }
}

/// Creates a bounded property bridge with the given queue capacity.
pub fn property_channel(capacity: usize) -> (PropertySink, PropertySource) {
    let (tx, rx) = sync_channel(capacity);
    (PropertySink { tx }, PropertySource { rx })
}

/// Joins a scoped bridge task, re-raising its panic on the calling
/// thread instead of swallowing it.
pub(crate) fn join_scoped<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

/// A custom streaming host value.
///
/// Implementors take over property conversion themselves: `save`
/// produces the property sequence an entity is built from, and
/// `load` consumes the sequence decoded from an entity.
pub trait PropertyLoadSave {
    /// Consumes decoded properties, in source order (indexed
    /// properties first, then raw).
    ///
    /// Returning early is allowed; the source's drop drains whatever
    /// the producer still has queued.
    fn load(&mut self, properties: PropertySource) -> CodecResult<()>;

    /// Produces the properties to store. Dropping `out` (by letting
    /// it go out of scope) signals that the last property has been
    /// pushed.
    fn save(&self, out: PropertySink) -> CodecResult<()>;
}
