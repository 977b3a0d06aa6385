//! Geometry helpers shared by the combat systems.

use bevy::prelude::*;

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % std::f32::consts::TAU;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    } else if a <= -std::f32::consts::PI {
        a += std::f32::consts::TAU;
    }
    a
}

/// Smallest absolute difference between two angles.
pub fn angle_between(a: f32, b: f32) -> f32 {
    wrap_angle(a - b).abs()
}

/// Unit vector for a facing angle.
pub fn facing_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Direction from `from` to `to`, falling back to +X when they coincide.
pub fn dir_towards(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).try_normalize().unwrap_or(Vec2::X)
}

/// Clamp a velocity's magnitude into [min, max], leaving zero untouched.
pub fn clamp_speed(velocity: Vec2, min: f32, max: f32) -> Vec2 {
    let speed = velocity.length();
    if speed < f32::EPSILON {
        return velocity;
    }
    let clamped = speed.clamp(min, max);
    velocity * (clamped / speed)
}

/// True if two circles overlap.
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) <= (ra + rb) * (ra + rb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_stays_in_range() {
        for raw in [-10.0_f32, -3.2, 0.0, 3.2, 10.0, 25.0] {
            let wrapped = wrap_angle(raw);
            assert!(wrapped > -std::f32::consts::PI - 1e-5);
            assert!(wrapped <= std::f32::consts::PI + 1e-5);
        }
    }

    #[test]
    fn test_angle_between_is_symmetric() {
        let d1 = angle_between(0.1, 3.0);
        let d2 = angle_between(3.0, 0.1);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_speed_bounds() {
        let slow = clamp_speed(Vec2::new(1.0, 0.0), 6.0, 16.0);
        assert!((slow.length() - 6.0).abs() < 1e-4);

        let fast = clamp_speed(Vec2::new(0.0, 40.0), 6.0, 16.0);
        assert!((fast.length() - 16.0).abs() < 1e-4);

        let zero = clamp_speed(Vec2::ZERO, 6.0, 16.0);
        assert_eq!(zero, Vec2::ZERO);
    }
}
