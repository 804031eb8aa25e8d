use crate::timestamp::Timestamp;

/// Frame delivery policy for a capture call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Block until a frame is available.
    Wait,
    /// Return immediately; "no frame" is an informational outcome.
    Poll,
}

/// What to do with frames that pile up faster than the caller consumes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropPolicy {
    /// Hand out the oldest ready frame; the ring back-pressures.
    Buffer,
    /// Skip to the newest ready frame, returning older ones to the ring.
    DropFrames,
}

/// Capture lifecycle of a camera.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CaptureState {
    NotConfigured,
    Configured,
    Streaming,
}

/// Ownership of one ring slot.
///
/// The streaming device fills `Free` slots in the background; the engine
/// marks them `Ready` as the device reports completion and `CheckedOut`
/// while the caller inspects the contents.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Free,
    Ready,
    CheckedOut,
}

/// The slot currently lent to the caller.
///
/// Tracked as index plus generation so a stale release attempt can be told
/// apart from the live checkout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Checkout {
    pub slot: usize,
    pub generation: u64,
    pub fill_time: Timestamp,
}

/// Capture-session state of one camera: the buffer ring bookkeeping plus
/// the frame geometry frozen at setup time.
#[derive(Debug)]
pub(crate) struct Session {
    pub slots: Vec<Slot>,
    pub checked_out: Option<Checkout>,
    pub generation: u64,
    pub drop_policy: DropPolicy,
    pub streaming: bool,

    pub width: u32,
    pub height: u32,
    pub bytes_per_frame: usize,
}

impl Session {
    pub fn new(count: usize, width: u32, height: u32, bytes_per_frame: usize, drop_policy: DropPolicy) -> Self {
        Session {
            slots: vec![Slot::Free; count],
            checked_out: None,
            generation: 0,
            drop_policy,
            streaming: false,
            width,
            height,
            bytes_per_frame,
        }
    }

    /// Latches `slot` as the caller-visible frame. At most one slot is
    /// checked out at any time; callers must not have one outstanding.
    pub fn latch(&mut self, slot: usize, fill_time: Timestamp) {
        debug_assert!(self.checked_out.is_none());
        self.slots[slot] = Slot::CheckedOut;
        self.generation += 1;
        self.checked_out = Some(Checkout {
            slot,
            generation: self.generation,
            fill_time,
        });
    }

    /// Returns the checked-out slot to the ring, if any.
    pub fn unlatch(&mut self) -> Option<Checkout> {
        let checkout = self.checked_out.take()?;
        self.slots[checkout.slot] = Slot::Free;
        Some(checkout)
    }
}
