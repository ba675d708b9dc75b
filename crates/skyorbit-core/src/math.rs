use cgmath::{InnerSpace, Matrix3, Rad, Vector3};

pub type Vec3 = Vector3<f64>;

pub const ORIGIN: Vec3 = Vector3 {
    x: 0.0,
    y: 0.0,
    z: 0.0,
};

pub const UNIT_X: Vec3 = Vector3 {
    x: 1.0,
    y: 0.0,
    z: 0.0,
};

pub const UNIT_Y: Vec3 = Vector3 {
    x: 0.0,
    y: 1.0,
    z: 0.0,
};

const DEGENERATE_LENGTH: f64 = 1.0e-12;

pub fn rotate_around_axis(point: Vec3, origin: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let length2 = axis.magnitude2();
    if length2.is_nan() || length2 <= DEGENERATE_LENGTH {
        return point;
    }
    let rotation = Matrix3::from_axis_angle(axis.normalize(), Rad(angle));
    origin + rotation * (point - origin)
}

// A zero-length vector takes the `fallback` unit direction.
pub fn clamp_length(vector: Vec3, min: f64, max: f64, fallback: Vec3) -> Vec3 {
    let length = vector.magnitude();
    let direction = if length > DEGENERATE_LENGTH {
        vector / length
    } else {
        fallback
    };
    direction * length.max(min).min(max)
}

pub fn perpendicular(axis: Vec3) -> Vec3 {
    let candidate = UNIT_X.cross(axis);
    if candidate.magnitude2() > DEGENERATE_LENGTH {
        candidate.normalize()
    } else {
        axis.cross(UNIT_Y).normalize()
    }
}

pub fn within(length: f64, min: f64, max: f64) -> bool {
    length >= min && length <= max
}
