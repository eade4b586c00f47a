use glam::{Mat4, Vec3};

/// Placement of an overlay within the frame.
///
/// `size` is relative to the frame (`[1, 1]` covers it), `position` is the
/// overlay centre in frame coordinates with the origin at the top left,
/// `rotation` is in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub size: [f32; 2],
    pub position: [f32; 2],
    pub rotation: f32,
    pub opacity: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            size: [1.0, 1.0],
            position: [0.5, 0.5],
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// The view-projection matrix of a frame with the given aspect ratio,
/// rotated by `rotation` degrees.
///
/// The frame spans `[-aspect, aspect]` horizontally and `[-1, 1]` vertically.
pub fn vp_matrix(rotation: f32, aspect: f32) -> Mat4 {
    let up = match rotation.rem_euclid(360.0) {
        r if r == 0.0 => Vec3::Y,
        r if r == 90.0 => Vec3::X,
        r if r == 180.0 => Vec3::NEG_Y,
        r if r == 270.0 => Vec3::NEG_X,
        r => {
            let (sin, cos) = r.to_radians().sin_cos();
            Vec3::new(sin, cos, 0.0)
        }
    };

    let projection = Mat4::orthographic_rh_gl(-aspect, aspect, -1.0, 1.0, -1.0, 1.0);
    let view = Mat4::look_at_rh(Vec3::Z, Vec3::ZERO, up);
    projection * view
}

/// The model-view-projection matrix that places a unit quad according to
/// `transform` inside a frame with the view-projection matrix `vp`.
pub fn filter_mvp_matrix(vp: &Mat4, transform: &Transform) -> Mat4 {
    // a view rotated by 90 or 270 degrees has no x component in its first column
    let portrait = vp.x_axis.x == 0.0;
    let aspect = if portrait {
        1.0 / vp.y_axis.x.abs()
    } else {
        1.0 / vp.x_axis.x.abs()
    };

    let [width, height] = transform.size;
    let [x, y] = transform.position;
    let (scale_x, scale_y, translate_x, translate_y) = if portrait {
        (width, height * aspect, x * 2.0 - 1.0, (1.0 - y * 2.0) * aspect)
    } else {
        (width * aspect, height, (x * 2.0 - 1.0) * aspect, 1.0 - y * 2.0)
    };

    let model = Mat4::from_translation(Vec3::new(translate_x, translate_y, 0.0))
        * Mat4::from_rotation_z(transform.rotation.to_radians())
        * Mat4::from_scale(Vec3::new(scale_x, scale_y, 1.0));
    *vp * model
}

/// An adjustment of the texture coordinates of a frame, applied about the
/// frame centre before the decoder transform.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureTransform {
    /// Zoom factor. Values above 1 crop into the centre of the frame.
    pub scale: [f32; 2],
    /// Rotation in degrees.
    pub rotation: f32,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for TextureTransform {
    fn default() -> Self {
        TextureTransform {
            scale: [1.0, 1.0],
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl TextureTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `base * self`: texture coordinates are adjusted first, then
    /// passed through `base`.
    pub fn apply(&self, base: &Mat4) -> Mat4 {
        if self.is_identity() {
            return *base;
        }

        let [scale_x, scale_y] = self.scale.map(|s| if s == 0.0 { 1.0 } else { 1.0 / s });
        let flip = Vec3::new(
            if self.flip_x { -1.0 } else { 1.0 },
            if self.flip_y { -1.0 } else { 1.0 },
            1.0,
        );
        let centre = Vec3::new(0.5, 0.5, 0.0);
        let zoom = Mat4::from_translation(Vec3::new(
            (1.0 - scale_x) / 2.0,
            (1.0 - scale_y) / 2.0,
            0.0,
        )) * Mat4::from_scale(Vec3::new(scale_x, scale_y, 1.0));
        let m = zoom
            * Mat4::from_translation(centre)
            * Mat4::from_rotation_z(self.rotation.to_radians())
            * Mat4::from_scale(flip)
            * Mat4::from_translation(-centre);
        *base * m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Vec3, expected: Vec3) {
        assert!(actual.abs_diff_eq(expected, 1e-5), "{actual:?} != {expected:?}");
    }

    #[test]
    fn default_overlay_covers_frame() {
        let vp = vp_matrix(0.0, 16.0 / 9.0);
        let mvp = filter_mvp_matrix(&vp, &Transform::default());
        assert_close(
            mvp.transform_point3(Vec3::new(-1.0, -1.0, 0.0)),
            Vec3::new(-1.0, -1.0, 1.0),
        );
        assert_close(
            mvp.transform_point3(Vec3::new(1.0, 1.0, 0.0)),
            Vec3::new(1.0, 1.0, 1.0),
        );
    }

    #[test]
    fn overlay_position_is_top_left_origin() {
        let vp = vp_matrix(0.0, 1.0);
        let transform = Transform {
            size: [0.5, 0.5],
            position: [0.25, 0.25],
            ..Transform::default()
        };
        let mvp = filter_mvp_matrix(&vp, &transform);
        assert_close(mvp.transform_point3(Vec3::ZERO), Vec3::new(-0.5, 0.5, 1.0));
    }

    #[test]
    fn rotated_view_is_portrait() {
        let vp = vp_matrix(90.0, 2.0);
        assert_eq!(vp.x_axis.x, 0.0);
        assert!((1.0 / vp.y_axis.x.abs() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn flip_y_mirrors_vertically() {
        let t = TextureTransform {
            flip_y: true,
            ..TextureTransform::default()
        };
        let m = t.apply(&Mat4::IDENTITY);
        assert_close(
            m.transform_point3(Vec3::new(0.25, 0.0, 0.0)),
            Vec3::new(0.25, 1.0, 0.0),
        );
    }

    #[test]
    fn zoom_crops_centre() {
        let t = TextureTransform {
            scale: [2.0, 2.0],
            ..TextureTransform::default()
        };
        let m = t.apply(&Mat4::IDENTITY);
        assert_close(m.transform_point3(Vec3::ZERO), Vec3::new(0.25, 0.25, 0.0));
        assert_close(
            m.transform_point3(Vec3::new(1.0, 1.0, 0.0)),
            Vec3::new(0.75, 0.75, 0.0),
        );
    }

    #[test]
    fn half_turn_swaps_corners() {
        let t = TextureTransform {
            rotation: 180.0,
            ..TextureTransform::default()
        };
        let m = t.apply(&Mat4::IDENTITY);
        assert_close(
            m.transform_point3(Vec3::new(0.25, 0.25, 0.0)),
            Vec3::new(0.75, 0.75, 0.0),
        );
    }
}
