use crate::camera::Camera;
use crate::capture::{CaptureState, Checkout, DropPolicy, Policy, Session, Slot};
use crate::error::{Error, Result};
use crate::iso::{FrameInfo, IsoDevice, Reservation};
use crate::timestamp::Timestamp;
use crate::transport::RegisterTransport;

impl<D: RegisterTransport + IsoDevice> Camera<D> {
    /// Pins the isochronous channel to use before capture is set up.
    ///
    /// A pinned channel counts as externally assigned: the session streams
    /// on it but never releases it. Fails once capture is configured.
    pub fn specify_iso_channel(&mut self, channel: u8) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::Failure);
        }
        self.pinned_channel = Some(channel);
        Ok(())
    }

    /// Capture lifecycle state of this camera.
    pub fn capture_state(&self) -> CaptureState {
        match &self.session {
            None => CaptureState::NotConfigured,
            Some(session) if session.streaming => CaptureState::Streaming,
            Some(_) => CaptureState::Configured,
        }
    }

    /// Frame geometry of the current video mode: width, height and bytes
    /// per frame.
    fn current_frame_geometry(&mut self) -> Result<(u32, u32, usize)> {
        let mode = self.video_mode()?;
        if let Some((width, height, coding)) = mode.fixed_geometry() {
            let bytes = coding.bytes_for_pixels(u64::from(width) * u64::from(height));
            Ok((width, height, bytes as usize))
        } else if mode.is_scalable() {
            let (width, height) = self.format7_image_size(mode)?;
            let total = self.format7_total_bytes(mode)?;
            Ok((width, height, total as usize))
        } else {
            Err(Error::InvalidFormat)
        }
    }

    /// Configures capture: allocates the buffer ring and reserves the
    /// isochronous channel and bandwidth for the current video setup.
    ///
    /// On any failure everything this call allocated is released again and
    /// the camera stays unconfigured.
    pub fn capture_setup(&mut self, num_buffers: usize, drop_policy: DropPolicy) -> Result<()> {
        if self.session.is_some() || self.reservation.is_some() {
            return Err(Error::NoIsoChannel);
        }
        if num_buffers == 0 {
            return Err(Error::MemoryAllocationFailure);
        }

        let (width, height, frame_size) = self.current_frame_geometry()?;
        if frame_size == 0 {
            return Err(Error::MemoryAllocationFailure);
        }
        let bandwidth = self.bandwidth_usage()?;

        let reservation = match self.pinned_channel {
            Some(channel) => Reservation {
                channel,
                bandwidth,
                owned: false,
            },
            None => {
                let channel = self.dev.reserve(None, bandwidth)?;
                Reservation {
                    channel,
                    bandwidth,
                    owned: true,
                }
            }
        };

        let armed = self
            .write_iso_channel(reservation.channel)
            .and_then(|()| self.dev.arm(num_buffers, frame_size));
        if let Err(e) = armed {
            if let Err(release_err) = reservation.release(&mut self.dev) {
                log::warn!("release after failed capture setup failed: {}", release_err);
            }
            return Err(e);
        }

        log::debug!(
            "capture configured: {} buffers of {} bytes, channel {}, {} bandwidth units",
            num_buffers,
            frame_size,
            reservation.channel,
            bandwidth
        );
        self.reservation = Some(reservation);
        self.session = Some(Session::new(
            num_buffers,
            width,
            height,
            frame_size,
            drop_policy,
        ));
        Ok(())
    }

    /// Stops capture and releases the ring, channel and bandwidth.
    ///
    /// Idempotent: calling it on an already-stopped camera is a no-op. All
    /// cleanup steps run even when an earlier one fails; the first failure
    /// is reported.
    pub fn capture_stop(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Some(session) = self.session.take() {
            if session.streaming {
                if let Err(e) = self.set_transmission(false) {
                    first_err.get_or_insert(e);
                }
            }
            if let Err(e) = self.dev.disarm() {
                first_err.get_or_insert(e);
            }
            log::debug!("capture stopped");
        }
        if let Some(reservation) = self.reservation.take() {
            if let Err(e) = reservation.release(&mut self.dev) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Forcefully reclaims channel and bandwidth reservations.
    ///
    /// Also forgets a pinned channel, so the next setup allocates freshly.
    pub fn cleanup_iso_channels_and_bandwidth(&mut self) -> Result<()> {
        if let Some(reservation) = self.reservation.take() {
            log::debug!("forced reclaim of iso resources");
            reservation.release(&mut self.dev)?;
        }
        self.pinned_channel = None;
        Ok(())
    }

    /// Fetches the next frame according to `policy`.
    ///
    /// Under [`Policy::Wait`] this blocks the calling thread until the
    /// streaming device fills a buffer; under [`Policy::Poll`] it returns
    /// [`Error::NoFrame`] (informational, not a failure) when nothing is
    /// ready yet.
    ///
    /// When a frame is already checked out it stays latched and untouched;
    /// release it with [`Camera::done_with_buffer`] before fetching the
    /// next one.
    pub fn capture(&mut self, policy: Policy) -> Result<()> {
        let session = self.session.as_ref().ok_or(Error::CameraNotInitialized)?;
        if session.checked_out.is_some() {
            return Ok(());
        }
        let first = match policy {
            Policy::Wait => self.dev.wait_ready()?,
            Policy::Poll => match self.dev.poll_ready()? {
                Some(frame) => frame,
                None => return Err(Error::NoFrame),
            },
        };
        self.latch_ready(first)
    }

    fn latch_ready(&mut self, first: FrameInfo) -> Result<()> {
        let mut session = self.session.take().ok_or(Error::CameraNotInitialized)?;
        let result = (|| {
            let mut newest = first;
            session.slots[newest.slot] = Slot::Ready;
            if session.drop_policy == DropPolicy::DropFrames {
                // skip ahead to the freshest frame, returning stale ones
                while let Some(next) = self.dev.poll_ready()? {
                    session.slots[next.slot] = Slot::Ready;
                    self.dev.requeue(newest.slot)?;
                    session.slots[newest.slot] = Slot::Free;
                    newest = next;
                }
            }
            session.latch(newest.slot, newest.fill_time);
            Ok(())
        })();
        self.session = Some(session);
        result
    }

    /// Session with a frame currently checked out, the precondition of
    /// every frame accessor.
    fn latched_session(&self) -> Result<&Session> {
        match self.session.as_ref() {
            Some(session) if session.checked_out.is_some() => Ok(session),
            _ => Err(Error::NoFrame),
        }
    }

    fn checkout(&self) -> Result<Checkout> {
        self.latched_session()?.checked_out.ok_or(Error::NoFrame)
    }

    /// Contents of the currently checked-out frame.
    pub fn frame(&self) -> Result<&[u8]> {
        let checkout = self.checkout()?;
        Ok(self.dev.frame_data(checkout.slot))
    }

    /// Time the currently checked-out frame finished filling.
    pub fn fill_time(&self) -> Result<Timestamp> {
        Ok(self.checkout()?.fill_time)
    }

    /// Width of the currently checked-out frame.
    pub fn frame_width(&self) -> Result<u32> {
        Ok(self.latched_session()?.width)
    }

    /// Height of the currently checked-out frame.
    pub fn frame_height(&self) -> Result<u32> {
        Ok(self.latched_session()?.height)
    }

    /// Size of the currently checked-out frame in bytes.
    pub fn bytes_per_frame(&self) -> Result<usize> {
        Ok(self.latched_session()?.bytes_per_frame)
    }

    /// Returns the checked-out frame to the ring so hardware can refill
    /// it.
    ///
    /// Calling this with nothing checked out is a no-op, not an error; the
    /// engine tracks the slot internally, so there is no handle a caller
    /// could mismatch.
    pub fn done_with_buffer(&mut self) -> Result<()> {
        let released = match self.session.as_mut() {
            None => return Ok(()),
            Some(session) => session.unlatch(),
        };
        match released {
            Some(checkout) => self.dev.requeue(checkout.slot),
            None => {
                log::debug!("done_with_buffer with no outstanding buffer");
                Ok(())
            }
        }
    }
}

/// Fetches frames across a set of cameras, e.g. a synchronized rig.
///
/// Under [`Policy::Wait`] every camera in the set blocks in turn until its
/// frame arrives; under [`Policy::Poll`] each camera latches a frame only
/// if one is ready. Returns how many cameras hold a checked-out frame
/// afterwards; zero under polling means "no frame yet" and is not an
/// error. Buffer tracking stays per camera: one checked-out frame each.
pub fn capture_set<D: RegisterTransport + IsoDevice>(
    cameras: &mut [&mut Camera<D>],
    policy: Policy,
) -> Result<usize> {
    let mut latched = 0;
    for camera in cameras.iter_mut() {
        match camera.capture(policy) {
            Ok(()) => latched += 1,
            Err(Error::NoFrame) if policy == Policy::Poll => {}
            Err(e) => return Err(e),
        }
    }
    Ok(latched)
}
