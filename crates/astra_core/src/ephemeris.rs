//! Ephemeris service boundary.
//!
//! The scene graph consumes body states and frame rotations through the
//! [`Ephemeris`] trait and treats the provider as a black box. A kernel-backed
//! implementation (e.g. wrapping SPICE) lives outside this crate and must
//! deliver values in meters and seconds; [`FixedEphemeris`] is a table-backed
//! implementation for tests and hosts without kernel data.

use std::collections::HashMap;

use astra_math::{DVec3, Rotation};
use thiserror::Error;

use crate::time::Time;

const SPEED_OF_LIGHT: f64 = 299_792_458.0; // m/s

/// Errors from ephemeris lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("no ephemeris data for body {body:?} at et {et}")]
    UnknownBody { body: String, et: f64 },

    #[error("no ephemeris data for frame {frame:?} at et {et}")]
    UnknownFrame { frame: String, et: f64 },
}

/// Position, velocity, and one-way light time of a body relative to an
/// observer, expressed in a named frame. Meters and seconds.
#[derive(Clone, Copy, Debug)]
pub struct BodyState {
    pub position: DVec3,
    pub velocity: DVec3,
    pub light_time: f64,
}

/// Blocking, synchronous ephemeris queries.
///
/// Failures are fatal to the query: there are no retries and no fallback
/// values, and errors must name the body or frame that failed to resolve.
pub trait Ephemeris: Send + Sync {
    /// State of `target` relative to `observer`, expressed in `frame`.
    fn state(
        &self,
        target: &str,
        time: Time,
        frame: &str,
        observer: &str,
    ) -> Result<BodyState, EphemerisError>;

    /// Rotation taking vectors from frame `from` into frame `to`.
    fn rotation(&self, from: &str, to: &str, time: Time) -> Result<Rotation, EphemerisError>;

    /// Rotation from `from` into `to` plus the angular velocity of `from`
    /// relative to `to`, expressed in `to`.
    fn rotation_and_rate(
        &self,
        from: &str,
        to: &str,
        time: Time,
    ) -> Result<(Rotation, DVec3), EphemerisError>;
}

#[derive(Clone, Copy, Debug)]
struct LinearMotion {
    position: DVec3,
    velocity: DVec3,
}

#[derive(Clone, Copy, Debug)]
struct FrameSpec {
    to_base: Rotation,
    /// Angular velocity of the frame's axes relative to the base frame,
    /// expressed in the base frame.
    rate: DVec3,
}

/// Table-backed ephemeris with linearly-propagated body states and fixed
/// frame orientations.
///
/// Bodies move as `position + velocity * et`; frames are registered by their
/// rotation into a common base frame. Good enough to exercise every scene
/// graph path without kernel data.
pub struct FixedEphemeris {
    base_frame: String,
    bodies: HashMap<String, LinearMotion>,
    frames: HashMap<String, FrameSpec>,
}

impl FixedEphemeris {
    /// Create an ephemeris whose frames are all registered relative to
    /// `base_frame`. The base frame itself resolves to the identity.
    pub fn new(base_frame: &str) -> Self {
        let mut frames = HashMap::new();
        frames.insert(
            base_frame.to_string(),
            FrameSpec {
                to_base: Rotation::IDENTITY,
                rate: DVec3::ZERO,
            },
        );
        Self {
            base_frame: base_frame.to_string(),
            bodies: HashMap::new(),
            frames,
        }
    }

    /// Register a body with a position and velocity (base frame, meters) at
    /// et 0.
    pub fn with_body(mut self, name: &str, position: DVec3, velocity: DVec3) -> Self {
        self.bodies
            .insert(name.to_string(), LinearMotion { position, velocity });
        self
    }

    /// Register a frame by its rotation into the base frame and its angular
    /// velocity relative to the base frame (expressed in the base frame).
    pub fn with_frame(mut self, name: &str, to_base: Rotation, rate: DVec3) -> Self {
        self.frames
            .insert(name.to_string(), FrameSpec { to_base, rate });
        self
    }

    fn motion(&self, body: &str, time: Time) -> Result<LinearMotion, EphemerisError> {
        let entry = self
            .bodies
            .get(body)
            .ok_or_else(|| EphemerisError::UnknownBody {
                body: body.to_string(),
                et: time.et(),
            })?;
        Ok(LinearMotion {
            position: entry.position + entry.velocity * time.et(),
            velocity: entry.velocity,
        })
    }

    fn frame(&self, name: &str, time: Time) -> Result<FrameSpec, EphemerisError> {
        self.frames
            .get(name)
            .copied()
            .ok_or_else(|| EphemerisError::UnknownFrame {
                frame: name.to_string(),
                et: time.et(),
            })
    }
}

impl Ephemeris for FixedEphemeris {
    fn state(
        &self,
        target: &str,
        time: Time,
        frame: &str,
        observer: &str,
    ) -> Result<BodyState, EphemerisError> {
        // Relative state of a body to itself is zero regardless of data.
        let relative = if target == observer {
            LinearMotion {
                position: DVec3::ZERO,
                velocity: DVec3::ZERO,
            }
        } else {
            let target = self.motion(target, time)?;
            let observer = self.motion(observer, time)?;
            LinearMotion {
                position: target.position - observer.position,
                velocity: target.velocity - observer.velocity,
            }
        };
        let into_frame = self.rotation(&self.base_frame, frame, time)?;
        Ok(BodyState {
            position: into_frame * relative.position,
            velocity: into_frame * relative.velocity,
            light_time: relative.position.length() / SPEED_OF_LIGHT,
        })
    }

    fn rotation(&self, from: &str, to: &str, time: Time) -> Result<Rotation, EphemerisError> {
        if from == to {
            return Ok(Rotation::IDENTITY);
        }
        let from = self.frame(from, time)?;
        let to = self.frame(to, time)?;
        Ok(to.to_base.inverse() * from.to_base)
    }

    fn rotation_and_rate(
        &self,
        from: &str,
        to: &str,
        time: Time,
    ) -> Result<(Rotation, DVec3), EphemerisError> {
        if from == to {
            return Ok((Rotation::IDENTITY, DVec3::ZERO));
        }
        let from_spec = self.frame(from, time)?;
        let to_spec = self.frame(to, time)?;
        let rotation = to_spec.to_base.inverse() * from_spec.to_base;
        let rate = to_spec.to_base.inverse() * (from_spec.rate - to_spec.rate);
        Ok((rotation, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ephemeris() -> FixedEphemeris {
        FixedEphemeris::new("J2000")
            .with_body("SSB", DVec3::ZERO, DVec3::ZERO)
            .with_body(
                "MARS",
                DVec3::new(2.0e11, 0.0, 0.0),
                DVec3::new(0.0, 24_000.0, 0.0),
            )
            .with_body("PROBE", DVec3::new(2.0e11, 1.0e7, 0.0), DVec3::ZERO)
            .with_frame(
                "IAU_MARS",
                Rotation::from_local_to_parent_axis_angle(DVec3::Z, std::f64::consts::FRAC_PI_2)
                    .unwrap(),
                DVec3::new(0.0, 0.0, 7.0e-5),
            )
    }

    #[test]
    fn test_state_relative_to_observer() {
        let eph = ephemeris();
        let st = eph
            .state("PROBE", Time::from_et(0.0), "J2000", "MARS")
            .unwrap();
        assert!((st.position - DVec3::new(0.0, 1.0e7, 0.0)).length() < 1e-3);
        assert!((st.velocity - DVec3::new(0.0, -24_000.0, 0.0)).length() < 1e-9);
        assert!((st.light_time - 1.0e7 / SPEED_OF_LIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_state_propagates_linearly() {
        let eph = ephemeris();
        let st = eph
            .state("MARS", Time::from_et(10.0), "J2000", "SSB")
            .unwrap();
        assert!((st.position - DVec3::new(2.0e11, 240_000.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_state_of_body_relative_to_itself_is_zero() {
        let eph = ephemeris();
        let st = eph
            .state("MARS", Time::from_et(5.0), "J2000", "MARS")
            .unwrap();
        assert_eq!(st.position, DVec3::ZERO);
        assert_eq!(st.velocity, DVec3::ZERO);
    }

    #[test]
    fn test_unknown_body_is_an_error() {
        let eph = ephemeris();
        match eph.state("VENUS", Time::from_et(1.0), "J2000", "SSB") {
            Err(EphemerisError::UnknownBody { body, et }) => {
                assert_eq!(body, "VENUS");
                assert_eq!(et, 1.0);
            }
            other => panic!("expected UnknownBody, got {other:?}"),
        }
    }

    #[test]
    fn test_frame_rotation_round_trip() {
        let eph = ephemeris();
        let t = Time::from_et(0.0);
        let to_mars = eph.rotation("J2000", "IAU_MARS", t).unwrap();
        let back = eph.rotation("IAU_MARS", "J2000", t).unwrap();
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert!((back * (to_mars * v) - v).length() < 1e-10);
    }

    #[test]
    fn test_rotation_and_rate() {
        let eph = ephemeris();
        let (rot, rate) = eph
            .rotation_and_rate("IAU_MARS", "J2000", Time::from_et(0.0))
            .unwrap();
        // IAU_MARS x-axis is J2000 y-axis for this 90 degree registration.
        assert!((rot * DVec3::X - DVec3::Y).length() < 1e-10);
        assert!((rate - DVec3::new(0.0, 0.0, 7.0e-5)).length() < 1e-15);
    }
}
