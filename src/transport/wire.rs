//! Angle wire format: exactly three decimal numbers separated by a
//! single comma, e.g. `12.5,-3.200001,0`. No terminator, no escaping.
//! The same format is used outbound (commanded angles) and inbound
//! (measured-angle telemetry).

use crate::motion::JointAngles;

pub const ANGLE_SEPARATOR: char = ',';

pub fn encode(angles: &JointAngles) -> String {
    format!(
        "{}{ANGLE_SEPARATOR}{}{ANGLE_SEPARATOR}{}",
        angles.theta1, angles.theta2, angles.theta3
    )
}

/// Parse a telemetry payload. Anything other than exactly three
/// float-parseable fields yields `None` ("no actual angles known"),
/// never an error.
pub fn parse(text: &str) -> Option<JointAngles> {
    let mut fields = text.split(ANGLE_SEPARATOR);
    let theta1 = fields.next()?.trim().parse().ok()?;
    let theta2 = fields.next()?.trim().parse().ok()?;
    let theta3 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(JointAngles {
        theta1,
        theta2,
        theta3,
    })
}
