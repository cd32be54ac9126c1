//! Drive control, generalized across the v1 `roll`/`set_raw_motors` pair and
//! the v2 `drive_with_heading`/`reset_yaw` pair.
//!
//! `roll_start`/`roll_stop` carry the sign-to-direction conversion
//! (`spherov2/controls/{v1,v2}.py`'s `DriveControl.roll_start`): a negative
//! speed flips the direction flag and adds a half turn to the heading
//! instead of being passed through as a literal negative speed, since the
//! wire command only carries an unsigned speed byte plus a direction flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::commands::{drive as v2_drive, sphero_legacy};
use crate::error::Error;
use crate::packet::Processor;
use crate::toy::types::ToyCapabilities;
use crate::transactor::{Transactor, WireVariant};

/// Abstract motor mode for `set_raw_motors`, identical on both wire variants
/// (`RawMotorModes` in `spherov2/commands/sphero.py` and `drive.py`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MotorMode {
    Off = 0,
    Forward = 1,
    Reverse = 2,
}

/// Normalizes a signed heading (degrees, any range) into `[0, 360)`.
fn normalize_heading(heading: i32) -> u16 {
    heading.rem_euclid(360) as u16
}

/// Splits a signed speed into `(magnitude clamped to 255, is_backward)` and
/// folds a direction reversal into the heading when the speed was negative.
fn decompose(heading: i32, speed: i32) -> (u8, u16, bool) {
    if speed < 0 {
        (speed.unsigned_abs().min(255) as u8, normalize_heading(heading + 180), true)
    } else {
        (speed.min(255) as u8, normalize_heading(heading), false)
    }
}

/// Drives a toy forward/backward at a heading and speed, tracking a sticky
/// boost flag the way the v2 `DriveControl.roll_start` does (`__is_boosting`
/// in `spherov2/controls/v2.py`): once set, every subsequent roll carries
/// `TURBO` until explicitly cleared.
pub struct DriveController {
    transactor: Transactor,
    wire: WireVariant,
    capabilities: &'static ToyCapabilities,
    target: Option<Processor>,
    boosting: AtomicBool,
}

impl DriveController {
    pub fn new(
        transactor: Transactor,
        wire: WireVariant,
        capabilities: &'static ToyCapabilities,
        target: Option<Processor>,
    ) -> Arc<Self> {
        Arc::new(DriveController { transactor, wire, capabilities, target, boosting: AtomicBool::new(false) })
    }

    /// Sets or clears the sticky boost flag (`spec.md` §4.6): while set,
    /// every subsequent `roll_start`/`roll_stop` carries `TURBO` until
    /// cleared again.
    pub fn set_boost(&self, boosting: bool) {
        self.boosting.store(boosting, Ordering::SeqCst);
    }

    /// Rejects a call before it reaches the wire when the model's
    /// capability record doesn't declare `(did, cid)` (`spec.md` §4.5/§7 —
    /// `UnsupportedOperation`, never dispatched to the transport).
    fn ensure(&self, did: u8, cid: u8) -> Result<(), Error> {
        if self.capabilities.implements(did, cid) {
            Ok(())
        } else {
            Err(Error::UnsupportedOperation { did, cid })
        }
    }

    async fn roll(&self, speed: u8, heading: u16, backward: bool) -> Result<(), Error> {
        match self.wire {
            WireVariant::V1 => {
                self.ensure(sphero_legacy::DID, 48)?;
                let mode = if speed == 0 { sphero_legacy::RollMode::Stop } else { sphero_legacy::RollMode::Go };
                let cmd = sphero_legacy::roll(speed, heading, mode, backward, self.target);
                self.transactor.execute(cmd).await?;
            }
            WireVariant::V2 => {
                self.ensure(v2_drive::DID, 7)?;
                let mut flags = if backward { v2_drive::DriveFlags::BACKWARD } else { v2_drive::DriveFlags::FORWARD };
                if self.boosting.load(Ordering::SeqCst) {
                    flags |= v2_drive::DriveFlags::TURBO;
                }
                let cmd = v2_drive::drive_with_heading(speed, heading, flags, self.target);
                self.transactor.execute(cmd).await?;
            }
        }
        Ok(())
    }

    /// `heading` is degrees, any signed range — normalized modulo 360.
    /// `speed` is signed: a negative speed reverses direction (flag or v1
    /// reverse bit) and adds 180 degrees to the heading instead, since the
    /// wire protocol only carries an unsigned magnitude.
    pub async fn roll_start(&self, heading: i32, speed: i32) -> Result<(), Error> {
        let (speed, heading, backward) = decompose(heading, speed);
        self.roll(speed, heading, backward).await
    }

    /// Stops at `heading`, equivalent to `roll_start(heading, 0)`.
    pub async fn roll_stop(&self, heading: i32) -> Result<(), Error> {
        self.roll_start(heading, 0).await
    }

    pub async fn stop(&self) -> Result<(), Error> {
        self.roll(0, 0, false).await
    }

    /// Calibrates the toy's zero heading to `heading` without moving it
    /// (v1: `RollMode::Calibrate`; v2: a zero-speed `drive_with_heading`,
    /// since the v2 catalogue has no discrete calibrate command).
    pub async fn set_heading(&self, heading: u16) -> Result<(), Error> {
        match self.wire {
            WireVariant::V1 => {
                self.ensure(sphero_legacy::DID, 1)?;
                let cmd = sphero_legacy::roll(0, heading, sphero_legacy::RollMode::Calibrate, false, self.target);
                self.transactor.execute(cmd).await?;
            }
            WireVariant::V2 => {
                self.ensure(v2_drive::DID, 7)?;
                let cmd = v2_drive::drive_with_heading(0, heading, v2_drive::DriveFlags::FORWARD, self.target);
                self.transactor.execute(cmd).await?;
            }
        }
        Ok(())
    }

    /// Re-zeroes the toy's heading reference. v1 toys have no equivalent
    /// command and treat this as a no-op (matching the source toy, which
    /// simply never exposes `reset_heading` on v1 models).
    pub async fn reset_heading(&self) -> Result<(), Error> {
        match self.wire {
            WireVariant::V1 => Ok(()),
            WireVariant::V2 => {
                self.ensure(v2_drive::DID, 6)?;
                self.transactor.execute(v2_drive::reset_yaw(self.target)).await?;
                Ok(())
            }
        }
    }

    pub async fn set_stabilization(&self, stabilize: bool) -> Result<(), Error> {
        let cmd = match self.wire {
            WireVariant::V1 => {
                self.ensure(sphero_legacy::DID, 2)?;
                sphero_legacy::set_stabilization(stabilize, self.target)
            }
            WireVariant::V2 => {
                self.ensure(v2_drive::DID, 12)?;
                v2_drive::set_stabilization(stabilize, self.target)
            }
        };
        self.transactor.execute(cmd).await?;
        Ok(())
    }

    pub async fn set_raw_motors(
        &self,
        left_mode: MotorMode,
        left_speed: u8,
        right_mode: MotorMode,
        right_speed: u8,
    ) -> Result<(), Error> {
        let cmd = match self.wire {
            WireVariant::V1 => {
                self.ensure(sphero_legacy::DID, 51)?;
                sphero_legacy::set_raw_motors(left_mode as u8, left_speed, right_mode as u8, right_speed, self.target)
            }
            WireVariant::V2 => {
                self.ensure(v2_drive::DID, 1)?;
                v2_drive::set_raw_motors(left_mode as u8, left_speed, right_mode as u8, right_speed, self.target)
            }
        };
        self.transactor.execute(cmd).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_start_scenario_reverses_direction_and_heading() {
        // roll_start(heading=30, speed=-100) -> (speed=100, heading=210, backward=true)
        let (speed, heading, backward) = decompose(30, -100);
        assert_eq!((speed, heading, backward), (100, 210, true));
    }

    #[test]
    fn roll_stop_scenario_keeps_heading_forward() {
        let (speed, heading, backward) = decompose(30, 0);
        assert_eq!((speed, heading, backward), (0, 30, false));
    }

    #[test]
    fn speed_clamps_to_255() {
        let (speed, _, backward) = decompose(0, -1000);
        assert_eq!(speed, 255);
        assert!(backward);
    }

    #[test]
    fn heading_normalizes_modulo_360() {
        assert_eq!(normalize_heading(-30), 330);
        assert_eq!(normalize_heading(390), 30);
    }
}
