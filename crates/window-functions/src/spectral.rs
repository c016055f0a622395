//! FFT-based Band Power Window Function

use crate::{single_input, FunctionError, WindowFunction};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use time_sequence::SequenceView;

thread_local! {
    // Plans are cached per FFT length, one planner per worker thread
    static PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

/// Power spectral density summary of one window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralFeatures {
    /// Power per configured band, in band order
    pub band_powers: Vec<f64>,
    /// Dominant frequency
    pub dominant_frequency: f64,
    /// Total spectral power
    pub total_power: f64,
}

/// Band powers, dominant frequency and total power of a single input.
///
/// Present values are treated as uniformly sampled at `sample_rate` Hz;
/// absent samples are dropped, not interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralBands {
    sample_rate: f64,
    /// Half-open `[low, high)` bands in Hz
    bands: Vec<(f64, f64)>,
}

impl SpectralBands {
    /// Analyzer with the default low (0-2 Hz), medium (2-5 Hz) and high (5-10 Hz) bands
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            bands: vec![(0.0, 2.0), (2.0, 5.0), (5.0, 10.0)],
        }
    }

    /// Replace the frequency bands
    pub fn with_bands(mut self, bands: Vec<(f64, f64)>) -> Self {
        self.bands = bands;
        self
    }

    /// Sampling frequency (Hz)
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Apply Hamming window to reduce spectral leakage
    fn apply_hamming_window(signal: &mut [f64]) {
        let n = signal.len();
        for (i, sample) in signal.iter_mut().enumerate() {
            let window = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
            *sample *= window;
        }
    }

    /// Compute spectral features from a signal of at least two samples
    pub fn analyze(&self, signal: &[f64]) -> SpectralFeatures {
        let n = signal.len();
        if n < 2 {
            return SpectralFeatures {
                band_powers: vec![0.0; self.bands.len()],
                ..Default::default()
            };
        }

        let mut windowed = signal.to_vec();
        Self::apply_hamming_window(&mut windowed);

        let mut buffer: Vec<Complex<f64>> = windowed.iter().map(|&v| Complex::new(v, 0.0)).collect();

        let fft = PLANNER.with(|planner| planner.borrow_mut().plan_fft_forward(n));
        fft.process(&mut buffer);

        // Positive frequencies only, magnitude squared normalized
        let power_spectrum: Vec<f64> = buffer
            .iter()
            .take(n / 2)
            .map(|c| c.norm_sqr() / n as f64)
            .collect();

        let freq_resolution = self.sample_rate / n as f64;

        let mut band_powers = vec![0.0; self.bands.len()];
        let mut max_power = 0.0;
        let mut dominant_freq_idx = 0;

        for (i, &power) in power_spectrum.iter().enumerate() {
            let freq = i as f64 * freq_resolution;

            if let Some(band) = self.bands.iter().position(|(lo, hi)| freq >= *lo && freq < *hi) {
                band_powers[band] += power;
            }

            if power > max_power {
                max_power = power;
                dominant_freq_idx = i;
            }
        }

        SpectralFeatures {
            band_powers,
            dominant_frequency: dominant_freq_idx as f64 * freq_resolution,
            total_power: power_spectrum.iter().sum(),
        }
    }
}

impl WindowFunction for SpectralBands {
    fn name(&self) -> &str {
        "spectral"
    }

    fn outputs(&self) -> Vec<String> {
        self.bands
            .iter()
            .map(|(lo, hi)| format!("power_{}-{}Hz", lo, hi))
            .chain(["dominant_frequency".to_string(), "total_power".to_string()])
            .collect()
    }

    fn invoke(&self, inputs: &[SequenceView<'_>]) -> Result<Vec<f64>, FunctionError> {
        if self.sample_rate.is_nan() || self.sample_rate <= 0.0 {
            return Err(FunctionError::failed(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }

        let signal = single_input(inputs)?.present_values();
        if signal.len() < 2 {
            return Err(FunctionError::InsufficientData {
                needed: 2,
                actual: signal.len(),
            });
        }

        let features = self.analyze(&signal);
        let mut out = features.band_powers;
        out.push(features.dominant_frequency);
        out.push(features.total_power);
        Ok(out)
    }
}
