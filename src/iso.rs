use crate::error::Result;
use crate::timestamp::Timestamp;

/// A frame the streaming device reports as filled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameInfo {
    /// Ring slot index the frame landed in.
    pub slot: usize,
    /// Time the last packet of the frame was written.
    pub fill_time: Timestamp,
}

/// Isochronous streaming device filling a ring of frame buffers.
///
/// Implementations wrap the kernel/OS DMA engine. The device owns the
/// backing memory of the ring; the capture engine tracks slot ownership and
/// decides when a slot may be refilled.
///
/// Slot readiness must be published atomically: once `poll_ready` or
/// `wait_ready` reports a slot, its data is complete and stable until the
/// slot is requeued.
pub trait IsoDevice {
    /// Reserves an isochronous channel and bus bandwidth.
    ///
    /// When `channel` is given, that specific channel is requested;
    /// otherwise the device picks a free one. Returns the channel in use.
    fn reserve(&mut self, channel: Option<u8>, bandwidth: u32) -> Result<u8>;

    /// Releases a previously reserved channel and its bandwidth.
    fn release(&mut self, channel: u8) -> Result<()>;

    /// Allocates the DMA ring: `count` buffers of `frame_size` bytes each.
    fn arm(&mut self, count: usize, frame_size: usize) -> Result<()>;

    /// Tears the ring down and stops filling.
    fn disarm(&mut self) -> Result<()>;

    /// Returns the next filled frame, or `None` when nothing is ready.
    fn poll_ready(&mut self) -> Result<Option<FrameInfo>>;

    /// Blocks until the next frame is filled. There is no timeout; callers
    /// needing a deadline poll instead.
    fn wait_ready(&mut self) -> Result<FrameInfo>;

    /// Contents of a filled slot.
    fn frame_data(&self, slot: usize) -> &[u8];

    /// Hands a slot back to the device for refilling.
    fn requeue(&mut self, slot: usize) -> Result<()>;
}

/// An outstanding ISO channel / bandwidth reservation.
///
/// At most one reservation exists per capture session, and it is released
/// exactly once. A channel the caller pinned beforehand is considered
/// externally assigned: the session uses it but does not release it.
#[derive(Debug, PartialEq, Eq)]
pub struct Reservation {
    pub channel: u8,
    pub bandwidth: u32,
    /// Whether this session allocated the channel and must release it.
    pub owned: bool,
}

impl Reservation {
    /// Releases the reservation against the device. Consumes `self`, so a
    /// double release does not compile.
    pub fn release<D: IsoDevice>(self, dev: &mut D) -> Result<()> {
        if self.owned {
            log::debug!(
                "releasing iso channel {} ({} bandwidth units)",
                self.channel,
                self.bandwidth
            );
            dev.release(self.channel)?;
        } else {
            log::debug!(
                "leaving externally assigned iso channel {} reserved",
                self.channel
            );
        }
        Ok(())
    }
}
