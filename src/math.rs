//! Spherical-coordinate and angle helpers shared by the camera engine.

use std::f32::consts::PI;

use nalgebra_glm as glm;

/// Normalize an angle into the `[-PI, PI]` range.
pub fn normalize_angle(angle: f32) -> f32 {
    let mut normalized = angle % (2.0 * PI);
    if normalized > PI {
        normalized -= 2.0 * PI;
    } else if normalized < -PI {
        normalized += 2.0 * PI;
    }
    normalized
}

/// Returns an equivalent target azimuth so that interpolating from
/// `current` travels the short way around the circle. The returned
/// value keeps `current`'s winding: only the delta is normalized.
/// Guarantees the travelled arc is at most PI.
pub fn shortest_path_azimuth(current: f32, target: f32) -> f32 {
    let normalized_current = normalize_angle(current);
    let normalized_target = normalize_angle(target);

    let mut diff = normalized_target - normalized_current;
    if diff > PI {
        diff -= 2.0 * PI;
    } else if diff < -PI {
        diff += 2.0 * PI;
    }

    current + diff
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_vec3(a: &glm::Vec3, b: &glm::Vec3, t: f32) -> glm::Vec3 {
    glm::lerp(a, b, t)
}

/// World position of a camera orbiting `look_at` at the given spherical
/// coordinates (y-up, azimuth negated so positive azimuth orbits
/// counter-clockwise when seen from above).
pub fn spherical_to_position(
    look_at: &glm::Vec3,
    distance: f32,
    polar_angle: f32,
    azimuth_angle: f32,
) -> glm::Vec3 {
    glm::vec3(
        look_at.x + distance * polar_angle.sin() * (-azimuth_angle).cos(),
        look_at.y + distance * polar_angle.cos(),
        look_at.z + distance * polar_angle.sin() * (-azimuth_angle).sin(),
    )
}

/// Inverse of [`spherical_to_position`]: `(distance, polar, azimuth)` of
/// `position` relative to `look_at`. A degenerate zero-distance input maps
/// to the equator facing azimuth 0.
pub fn position_to_spherical(position: &glm::Vec3, look_at: &glm::Vec3) -> (f32, f32, f32) {
    let relative = position - look_at;
    let distance = glm::length(&relative);

    if distance <= f32::EPSILON {
        return (0.0, PI / 2.0, 0.0);
    }

    let polar = (relative.y / distance).clamp(-1.0, 1.0).acos();
    let azimuth = (-relative.z).atan2(relative.x);

    (distance, polar, azimuth)
}

/// Perpendicular distance from `point` to the ray going from `from`
/// towards `to`. Used for nearest-splat picking.
pub fn ray_point_distance(from: &glm::Vec3, to: &glm::Vec3, point: &glm::Vec3) -> f32 {
    let ray_direction = glm::normalize(&(to - from));
    let to_point = point - from;

    let projection_length = glm::dot(&to_point, &ray_direction);
    let closest_on_ray = from + ray_direction * projection_length;

    glm::distance(&closest_on_ray, point)
}

/// Parse a `#RRGGBB` / `#RRGGBBAA` color string into linear float RGBA.
/// Unparsable strings yield transparent black, matching the hosted
/// viewer's lenient handling of authored background colors.
pub fn hex_to_rgba(hex: &str) -> [f32; 4] {
    let digits: Vec<u8> = hex
        .trim_start_matches('#')
        .as_bytes()
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .filter_map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect();

    match digits.as_slice() {
        [r, g, b] => [
            f32::from(*r) / 255.0,
            f32::from(*g) / 255.0,
            f32::from(*b) / 255.0,
            1.0,
        ],
        [r, g, b, a] => [
            f32::from(*r) / 255.0,
            f32::from(*g) / 255.0,
            f32::from(*b) / 255.0,
            f32::from(*a) / 255.0,
        ],
        _ => [0.0, 0.0, 0.0, 0.0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn normalize_wraps_into_pi_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < EPS);
        assert!((normalize_angle(-3.0 * PI) + PI).abs() < EPS);
        assert!((normalize_angle(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn shortest_path_crosses_the_seam_forward() {
        // real just below +PI, target just above -PI: the short way is
        // forward through the seam, not back through zero.
        let current = PI - 0.1;
        let target = -PI + 0.1;
        let adjusted = shortest_path_azimuth(current, target);
        assert!(adjusted > current);
        assert!((adjusted - (PI + 0.1)).abs() < EPS);
    }

    #[test]
    fn shortest_path_arc_never_exceeds_pi() {
        let mut angle = -PI + 0.01;
        while angle < PI {
            let mut other = -PI + 0.01;
            while other < PI {
                let adjusted = shortest_path_azimuth(angle, other);
                assert!((adjusted - angle).abs() <= PI + EPS);
                other += 0.7;
            }
            angle += 0.7;
        }
    }

    #[test]
    fn shortest_path_preserves_winding() {
        // A current angle outside [-PI, PI] keeps its winding count.
        let current = 3.0 * PI;
        let adjusted = shortest_path_azimuth(current, 0.1);
        assert!((adjusted - current).abs() <= PI + EPS);
    }

    #[test]
    fn spherical_round_trip() {
        let look_at = glm::vec3(1.0, 2.0, -3.0);
        let position = spherical_to_position(&look_at, 5.0, 1.1, 2.3);
        let (distance, polar, azimuth) = position_to_spherical(&position, &look_at);
        assert!((distance - 5.0).abs() < 1e-4);
        assert!((polar - 1.1).abs() < 1e-4);
        assert!((normalize_angle(azimuth - 2.3)).abs() < 1e-4);
    }

    #[test]
    fn degenerate_position_maps_to_equator() {
        let p = glm::vec3(4.0, 5.0, 6.0);
        let (distance, polar, azimuth) = position_to_spherical(&p, &p);
        assert_eq!(distance, 0.0);
        assert!((polar - PI / 2.0).abs() < EPS);
        assert_eq!(azimuth, 0.0);
    }

    #[test]
    fn ray_distance_of_point_on_ray_is_zero() {
        let from = glm::vec3(0.0, 0.0, 0.0);
        let to = glm::vec3(10.0, 0.0, 0.0);
        let on_ray = glm::vec3(4.0, 0.0, 0.0);
        let off_ray = glm::vec3(4.0, 3.0, 0.0);
        assert!(ray_point_distance(&from, &to, &on_ray) < EPS);
        assert!((ray_point_distance(&from, &to, &off_ray) - 3.0).abs() < EPS);
    }

    #[test]
    fn hex_colors_parse() {
        let rgba = hex_to_rgba("#FF0080");
        assert!((rgba[0] - 1.0).abs() < EPS);
        assert!(rgba[1].abs() < EPS);
        assert!((rgba[2] - 128.0 / 255.0).abs() < EPS);
        assert!((rgba[3] - 1.0).abs() < EPS);

        assert_eq!(hex_to_rgba("garbage"), [0.0, 0.0, 0.0, 0.0]);
    }
}
