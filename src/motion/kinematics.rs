//! Closed-form inverse kinematics for a three-legged delta arm.
//!
//! Each leg is a 3-bar linkage; the closure constraint reduces to a
//! quadratic in `tan(theta/2)` once the target is projected into the
//! leg's local frame. Legs are spaced 120 degrees around the base with
//! leg 1 aligned with the +X axis.

use thiserror::Error;

use crate::motion::Position;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KinematicsError {
    /// The requested position cannot be realized by the given leg at the
    /// current geometry. Expected at envelope edges; never fatal.
    #[error("position unreachable for leg {leg}")]
    Unreachable { leg: u8 },
}

/// Arm dimensions, millimeters. All four values must be strictly
/// positive; that is enforced at the configuration boundary, not here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// End-effector platform radius (r).
    pub end_effector_radius: f64,
    /// End-effector to mid joint length (l).
    pub mid_joint_length: f64,
    /// Mid joint to base length (L).
    pub base_arm_length: f64,
    /// Base platform radius (R).
    pub base_radius: f64,
}

impl Geometry {
    /// True when every dimension is strictly positive. The solver's
    /// output is mathematically undefined otherwise.
    pub fn is_valid(&self) -> bool {
        self.end_effector_radius > 0.0
            && self.mid_joint_length > 0.0
            && self.base_arm_length > 0.0
            && self.base_radius > 0.0
    }
}

/// Actuator angles in degrees, one per leg. Derived from Position and
/// Geometry; never stored as authoritative state.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct JointAngles {
    pub theta1: f64,
    pub theta2: f64,
    pub theta3: f64,
}

/// Solve the IK for all three legs. Pure and deterministic; cheap
/// enough to re-run on every position or geometry change.
pub fn solve(position: Position, geometry: &Geometry) -> Result<JointAngles, KinematicsError> {
    let Position { x, y, z } = position;
    let r = geometry.end_effector_radius;
    let l = geometry.mid_joint_length;
    let big_l = geometry.base_arm_length;
    let big_r = geometry.base_radius;

    let half_sqrt3 = 3.0_f64.sqrt() / 2.0;

    // Leg 1 sits on the +X axis, so its local frame is the base frame
    // shifted by the platform offset r - R.
    let a1 = x + r - big_r;
    let k1 = a1 * a1 + y * y + z * z + l * l - big_l * big_l;
    let theta1 = leg_angle(k1 + 2.0 * a1 * l, -4.0 * z * l, k1 - 2.0 * a1 * l, 1)?;

    // Legs 2 and 3 are rotated +/-120 degrees; the rotation folds into
    // the linear terms below.
    let a2 = x - 0.5 * r + 0.5 * big_r;
    let b2 = y + half_sqrt3 * (r - big_r);
    let k2 = a2 * a2 + b2 * b2 + z * z + l * l - big_l * big_l;
    let u2 = a2 * l - 3.0_f64.sqrt() * b2 * l;
    let theta2 = leg_angle(k2 - u2, -4.0 * z * l, k2 + u2, 2)?;

    let a3 = x - 0.5 * r + 0.5 * big_r;
    let b3 = y - half_sqrt3 * (r - big_r);
    let k3 = a3 * a3 + b3 * b3 + z * z + l * l - big_l * big_l;
    let u3 = a3 * l + 3.0_f64.sqrt() * b3 * l;
    let theta3 = leg_angle(k3 - u3, -4.0 * z * l, k3 + u3, 3)?;

    Ok(JointAngles {
        theta1,
        theta2,
        theta3,
    })
}

/// Solve one leg's quadratic in `tan(theta/2)` and pick a branch.
///
/// Both candidate angles come from the same discriminant `B^2 - 4AC`.
/// The branch rule prefers the candidate within +/-90 degrees; that is a
/// physical-plausibility heuristic for this geometry's working envelope,
/// not an algebraic guarantee, so it stays an explicit two-candidate
/// select rather than a collapsed formula.
fn leg_angle(a: f64, b: f64, c: f64, leg: u8) -> Result<f64, KinematicsError> {
    if a == 0.0 {
        return Err(KinematicsError::Unreachable { leg });
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(KinematicsError::Unreachable { leg });
    }

    let root = discriminant.sqrt();
    let first = (2.0 * ((-b + root) / (2.0 * a)).atan()).to_degrees();
    if first > 90.0 || first < -90.0 {
        let second = (2.0 * ((-b - root) / (2.0 * a)).atan()).to_degrees();
        Ok(second)
    } else {
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_geometry() -> Geometry {
        Geometry {
            end_effector_radius: 45.0,
            mid_joint_length: 100.0,
            base_arm_length: 446.0,
            base_radius: 52.5,
        }
    }

    #[test]
    fn home_pose_is_threefold_symmetric() {
        let angles = solve(Position::new(0.0, 0.0, 432.0), &default_geometry()).unwrap();
        assert!((angles.theta1 - angles.theta2).abs() < 1e-6);
        assert!((angles.theta2 - angles.theta3).abs() < 1e-6);
        assert!(angles.theta1.abs() < 5.0, "home pose should be near level");
    }

    #[test]
    fn solver_is_pure_and_reproducible() {
        let geometry = default_geometry();
        let position = Position::new(12.0, -34.0, 410.0);
        let first = solve(position, &geometry).unwrap();
        for _ in 0..10 {
            assert_eq!(solve(position, &geometry).unwrap(), first);
        }
    }

    #[test]
    fn interior_positions_stay_within_branch_limits() {
        let geometry = default_geometry();
        for x in [-150.0, -50.0, 0.0, 50.0, 150.0] {
            for y in [-150.0, -50.0, 0.0, 50.0, 150.0] {
                for z in [390.0, 432.0, 480.0] {
                    let position = Position::new(x, y, z);
                    // Points near the envelope edge may legitimately be
                    // unreachable; the invariant applies to solved poses.
                    if let Ok(angles) = solve(position, &geometry) {
                        for theta in [angles.theta1, angles.theta2, angles.theta3] {
                            assert!(
                                theta.abs() <= 90.0 + 1e-9,
                                "branch rule violated at ({x},{y},{z}): {theta}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn reachable_spot_checks_solve() {
        let geometry = default_geometry();
        for position in [
            Position::new(0.0, 0.0, 432.0),
            Position::new(100.0, 100.0, 432.0),
            Position::new(-100.0, -100.0, 432.0),
            Position::new(150.0, 0.0, 432.0),
            Position::new(0.0, 0.0, 380.0),
            Position::new(0.0, 0.0, 500.0),
        ] {
            assert!(solve(position, &geometry).is_ok(), "expected {position:?} reachable");
        }
    }

    #[test]
    fn far_pose_is_unreachable() {
        let geometry = default_geometry();
        let result = solve(Position::new(0.0, 0.0, 800.0), &geometry);
        assert!(matches!(result, Err(KinematicsError::Unreachable { .. })));
    }

    #[test]
    fn geometry_validity_rejects_non_positive_dimensions() {
        let mut geometry = default_geometry();
        assert!(geometry.is_valid());
        geometry.base_radius = 0.0;
        assert!(!geometry.is_valid());
        geometry.base_radius = -10.0;
        assert!(!geometry.is_valid());
    }
}
