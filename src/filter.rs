use core::f64::consts::PI;
use nalgebra::Vector3;

/// First-order low-pass filter over a 3-axis signal.
///
/// A cutoff of zero disables filtering and passes every sample through.
#[derive(Clone, Debug, PartialEq)]
pub struct LowPassFilter {
    output: Option<Vector3<f64>>,
    alpha: f64,
}

impl LowPassFilter {
    pub fn with_sample_rate_and_cutoff(sample_hz: f64, cutoff_hz: f64) -> Self {
        Self {
            output: None,
            alpha: compute_alpha(sample_hz, cutoff_hz),
        }
    }

    pub fn output(&self) -> Option<Vector3<f64>> {
        self.output
    }

    pub fn apply(&mut self, sample: Vector3<f64>) -> Vector3<f64> {
        let output = match self.output {
            Some(output) => sample * self.alpha + output * (1. - self.alpha),
            None => sample,
        };
        self.output = Some(output);
        output
    }

    pub fn reset(&mut self) {
        self.output = None;
    }
}

fn compute_alpha(sample_hz: f64, cutoff_hz: f64) -> f64 {
    if cutoff_hz <= 0. {
        return 1.;
    }

    let dt = 1. / sample_hz;
    let rc = 1. / (2. * PI * cutoff_hz);
    dt / (dt + rc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_sample_initialises() {
        let mut filter = LowPassFilter::with_sample_rate_and_cutoff(100., 5.);
        assert_eq!(filter.output(), None);
        assert_eq!(filter.apply(Vector3::new(1., 2., 3.)), Vector3::new(1., 2., 3.));
    }

    #[test]
    fn step_response_converges() {
        let mut filter = LowPassFilter::with_sample_rate_and_cutoff(100., 5.);
        filter.apply(Vector3::zeros());

        let first = filter.apply(Vector3::x());
        assert!(first.x > 0. && first.x < 1.);

        for _ in 0..500 {
            filter.apply(Vector3::x());
        }
        assert_relative_eq!(filter.output().unwrap(), Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn zero_cutoff_passes_through() {
        let mut filter = LowPassFilter::with_sample_rate_and_cutoff(100., 0.);
        filter.apply(Vector3::zeros());
        assert_eq!(filter.apply(Vector3::new(4., 5., 6.)), Vector3::new(4., 5., 6.));
    }
}
