//! Sensor readout: received radiometric power to a quantized digital image.
//!
//! The readout chain per pixel and per color channel: power and exposure
//! time give energy, energy over the channel's photon energy gives a photon
//! count, quantum efficiency gives photoelectrons, dark current adds
//! thermally generated electrons, shot noise perturbs the count (Gaussian
//! approximation to Poisson), the full well clamps it, read noise perturbs
//! the measurement, and the ADC applies gain, bias, floor quantization, and
//! the bit-depth ceiling before normalizing to [0, 1].

use astra_core::{Image, Spectrum};
use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framebuffer::FrameBuffer;

const PLANCK: f64 = 6.626_070_15e-34; // J s
const SPEED_OF_LIGHT: f64 = 299_792_458.0; // m/s

/// Errors from sensor configuration and readout.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("gain in dB must be finite, got {0}")]
    NonFiniteGain(f32),

    #[error("frame buffer has no received-power channel to read out")]
    MissingPowerChannel,
}

/// Physical and electronic sensor parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Photoelectrons per photon, per color channel.
    pub quantum_efficiency: Spectrum,

    /// Representative wavelength per color channel, nanometers. Sets the
    /// photon energy used for the energy-to-count conversion.
    pub wavelengths_nm: Vec3,

    /// Full well capacity in electrons.
    pub full_well_capacity: f32,

    /// Read noise RMS in electrons.
    pub read_noise: f32,

    /// Dark current in electrons per second.
    pub dark_current: f32,

    /// Bias offset added by the ADC, in DN.
    pub bias_level_dn: f32,

    /// ADC bit depth.
    pub bit_depth: u32,

    /// Conversion gain in electrons per DN.
    pub gain: f32,

    /// Reference level for the dB gain interface.
    pub unity_db: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            quantum_efficiency: Spectrum::splat(0.7),
            wavelengths_nm: Vec3::new(620.0, 550.0, 460.0),
            full_well_capacity: 20_000.0,
            read_noise: 10.0,
            dark_current: 1.0,
            bias_level_dn: 10.0,
            bit_depth: 12,
            gain: 1.22,
            unity_db: 0.0,
        }
    }
}

impl SensorConfig {
    /// Largest representable digital number.
    pub fn max_dn(&self) -> f32 {
        ((1u64 << self.bit_depth) - 1) as f32
    }

    /// Set the conversion gain from a dB value relative to `unity_db`.
    pub fn set_gain_db(&mut self, gain_db: f32) -> Result<(), SensorError> {
        if !gain_db.is_finite() {
            return Err(SensorError::NonFiniteGain(gain_db));
        }
        self.gain = 10.0f32.powf((self.unity_db - gain_db) / 20.0);
        Ok(())
    }

    /// The conversion gain expressed in dB relative to `unity_db`.
    pub fn gain_db(&self) -> f32 {
        self.unity_db - 20.0 * self.gain.log10()
    }
}

/// A sensor that converts accumulated received power into a digital image.
pub trait SensorModel: Send + Sync {
    /// Read the frame buffer's received-power channel out into its response
    /// channel (enabled if missing). `exposure_time` in seconds; `seed`
    /// makes the noise reproducible.
    fn readout(
        &self,
        frame_buffer: &mut FrameBuffer,
        exposure_time: f32,
        seed: Option<u64>,
    ) -> Result<(), SensorError>;
}

/// Basic sensor with shot noise, read noise, full-well clamping, and ADC
/// quantization.
pub struct SimpleSensor {
    pub config: SensorConfig,
}

impl SimpleSensor {
    pub fn new(config: SensorConfig) -> Self {
        Self { config }
    }

    /// Read out one power image into a normalized response image.
    fn readout_image(
        &self,
        power: &Image<Spectrum>,
        exposure_time: f32,
        rng: &mut StdRng,
    ) -> Image<Spectrum> {
        let cfg = &self.config;
        let max_dn = cfg.max_dn();
        let mut response = Image::filled(power.width(), power.height(), Spectrum::ZERO);

        for (out, received) in response.pixels_mut().iter_mut().zip(power.pixels()) {
            let mut pixel = Spectrum::ZERO;
            for channel in 0..3 {
                let photon_energy =
                    PLANCK * SPEED_OF_LIGHT / (cfg.wavelengths_nm[channel] as f64 * 1e-9);
                let energy = received[channel] as f64 * exposure_time as f64;
                let photons = energy / photon_energy;

                let mut electrons = photons * cfg.quantum_efficiency[channel] as f64
                    + cfg.dark_current as f64 * exposure_time as f64;
                if electrons > 0.0 {
                    let shot = Normal::new(0.0, electrons.sqrt())
                        .expect("shot noise sigma is finite and non-negative");
                    electrons += shot.sample(rng);
                }
                electrons = electrons.clamp(0.0, cfg.full_well_capacity as f64);
                if cfg.read_noise > 0.0 {
                    let read = Normal::new(0.0, cfg.read_noise as f64)
                        .expect("read noise sigma is finite and non-negative");
                    electrons += read.sample(rng);
                }

                let dn = (electrons / cfg.gain as f64 + cfg.bias_level_dn as f64).floor();
                pixel[channel] = (dn.clamp(0.0, max_dn as f64) / max_dn as f64) as f32;
            }
            *out = pixel;
        }
        response
    }

    /// Read one rasterized frame out at several exposure times, each with
    /// independent noise. Frames are independent, so they run in parallel.
    pub fn readout_series(
        &self,
        power: &Image<Spectrum>,
        exposure_times: &[f32],
        seed: Option<u64>,
    ) -> Vec<Image<Spectrum>> {
        let base_seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        exposure_times
            .par_iter()
            .enumerate()
            .map(|(i, &exposure_time)| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                self.readout_image(power, exposure_time, &mut rng)
            })
            .collect()
    }
}

impl SensorModel for SimpleSensor {
    fn readout(
        &self,
        frame_buffer: &mut FrameBuffer,
        exposure_time: f32,
        seed: Option<u64>,
    ) -> Result<(), SensorError> {
        let power = frame_buffer
            .received_power()
            .ok_or(SensorError::MissingPowerChannel)?;
        debug!(
            "sensor readout: {}x{} at {exposure_time} s",
            power.width(),
            power.height()
        );
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let response = self.readout_image(power, exposure_time, &mut rng);
        frame_buffer.enable_response();
        *frame_buffer
            .response_mut()
            .expect("response channel enabled above") = response;
        Ok(())
    }
}
