use crate::error::Result;

/// Quadlet-level access to a camera's control-and-status registers.
///
/// Implementations wrap the actual bus (historically a raw 1394 port) and
/// are produced by discovery together with the camera's identity. Offsets
/// are relative to the command register base resolved at session open.
///
/// Implementations must normalize bus faults (no response, bus error,
/// unsupported request) into the crate [`Error`](crate::error::Error)
/// taxonomy. When one transport instance serves several camera handles on
/// the same bus, it must serialize read/write pairs internally so responses
/// cannot be mis-attributed; the core performs no cross-camera locking.
pub trait RegisterTransport {
    /// Reads the quadlet at `offset`.
    fn read(&mut self, offset: u32) -> Result<u32>;

    /// Writes the quadlet at `offset`.
    fn write(&mut self, offset: u32, value: u32) -> Result<()>;

    /// Switches subsequent writes between unicast and bus-wide broadcast
    /// addressing.
    ///
    /// Broadcast writes are executed by every identical device on the bus.
    /// Callers never toggle this directly;
    /// [`Camera::broadcast`](crate::camera::Camera::broadcast) brackets the
    /// switch so unicast addressing is always restored.
    fn set_broadcast(&mut self, on: bool) -> Result<()>;
}
