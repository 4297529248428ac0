use crate::constrain;
use nalgebra::Vector2;

/// Thrust floor (in Newtons) keeping the inversion finite near free-fall.
const THRUST_EPSILON: f64 = 1e-6;

/// Inverts the outer loop's virtual horizontal forces into a desired roll and pitch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceAngleGenerator {
    /// The maximum tilt (in radians) of either reference angle.
    pub max_tilt: f64,
}

impl ReferenceAngleGenerator {
    pub fn new(max_tilt: f64) -> Self {
        Self { max_tilt }
    }

    /// Calculate the reference roll and pitch (in radians) from the horizontal forces `u_x, u_y`,
    /// the total thrust `u_t` and the desired yaw.
    pub fn reference_angles(&self, force: Vector2<f64>, thrust: f64, yaw: f64) -> (f64, f64) {
        let (sin_psi, cos_psi) = yaw.sin_cos();
        let thrust = thrust.max(THRUST_EPSILON);

        let roll = self.inverse(ratio(force.x * sin_psi - force.y * cos_psi, thrust));

        // Roll is already bounded below PI/2 so its cosine is strictly positive
        let pitch = self.inverse(ratio(
            force.x * cos_psi + force.y * sin_psi,
            thrust * roll.cos(),
        ));

        (roll, pitch)
    }

    fn inverse(&self, sin: f64) -> f64 {
        constrain(sin, -1., 1.)
            .asin()
            .clamp(-self.max_tilt, self.max_tilt)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    let ratio = num / den;
    if ratio.is_nan() {
        0.
    } else {
        ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::FRAC_PI_2;

    const MAX_TILT: f64 = 0.35;

    #[test]
    fn zero_force_is_level() {
        let generator = ReferenceAngleGenerator::new(MAX_TILT);
        let (roll, pitch) = generator.reference_angles(Vector2::zeros(), 4.905, 0.);
        assert_eq!(roll, 0.);
        assert_eq!(pitch, 0.);

        let (roll, pitch) = generator.reference_angles(Vector2::zeros(), 0., 0.);
        assert_eq!(roll, 0.);
        assert_eq!(pitch, 0.);
    }

    #[test]
    fn forward_force_pitches_forward() {
        let generator = ReferenceAngleGenerator::new(FRAC_PI_2 - 0.01);
        let (roll, pitch) = generator.reference_angles(Vector2::new(1., 0.), 5., 0.);
        assert_relative_eq!(roll, 0.);
        assert_relative_eq!(pitch, (0.2f64).asin());
    }

    #[test]
    fn lateral_force_rolls_with_yaw() {
        let generator = ReferenceAngleGenerator::new(FRAC_PI_2 - 0.01);

        // Heading along +y, a force along +y becomes a forward pitch
        let (roll, pitch) = generator.reference_angles(Vector2::new(0., 1.), 5., FRAC_PI_2);
        assert_relative_eq!(roll, 0., epsilon = 1e-12);
        assert_relative_eq!(pitch, (0.2f64).asin(), epsilon = 1e-12);

        // Heading along +x, a force along +y rolls left (negative roll)
        let (roll, _) = generator.reference_angles(Vector2::new(0., 1.), 5., 0.);
        assert_relative_eq!(roll, -(0.2f64).asin());
    }

    #[test]
    fn vanishing_thrust_stays_finite_and_bounded() {
        let generator = ReferenceAngleGenerator::new(MAX_TILT);

        for thrust in [0., 1e-12, -3., f64::MIN_POSITIVE] {
            let (roll, pitch) = generator.reference_angles(Vector2::new(2., -3.), thrust, 0.7);
            assert!(roll.is_finite() && pitch.is_finite());
            assert!(roll.abs() <= MAX_TILT && pitch.abs() <= MAX_TILT);
        }

        let (roll, pitch) = generator.reference_angles(Vector2::new(2., -3.), 0., 0.);
        assert_eq!(roll, MAX_TILT);
        assert_eq!(pitch, MAX_TILT);
    }
}
