/// Camera transform in surface pixels: translate to `anchor`, scale, then
/// translate by the negated camera centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub scale: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl ViewTransform {
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.anchor_x + (x - self.center_x) * self.scale,
            self.anchor_y + (y - self.center_y) * self.scale,
        )
    }

    pub fn invert(&self, x: f32, y: f32) -> (f32, f32) {
        let scale = if self.scale.abs() > f32::EPSILON {
            self.scale
        } else {
            1.0
        };
        (
            (x - self.anchor_x) / scale + self.center_x,
            (y - self.anchor_y) / scale + self.center_y,
        )
    }
}

/// Maps a destination rect through an optional transform and snaps it to
/// whole pixels as `(left, top, right, bottom)`.
pub fn project_rect(
    transform: Option<&ViewTransform>,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> (i32, i32, i32, i32) {
    let (left, top, right, bottom) = match transform {
        Some(view) => {
            let (left, top) = view.apply(x, y);
            let (right, bottom) = view.apply(x + width, y + height);
            (left, top, right, bottom)
        }
        None => (x, y, x + width, y + height),
    };
    (
        left.round() as i32,
        top.round() as i32,
        right.round() as i32,
        bottom.round() as i32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoomed() -> ViewTransform {
        ViewTransform {
            anchor_x: 800.0,
            anchor_y: 608.0,
            scale: 2.0,
            center_x: 1056.0,
            center_y: 992.0,
        }
    }

    #[test]
    fn camera_centre_maps_to_anchor() {
        let view = zoomed();
        assert_eq!(view.apply(1056.0, 992.0), (800.0, 608.0));
    }

    #[test]
    fn offsets_from_centre_are_scaled() {
        let view = zoomed();
        assert_eq!(view.apply(1066.0, 982.0), (820.0, 588.0));
    }

    #[test]
    fn invert_round_trips_apply() {
        let view = zoomed();
        let (sx, sy) = view.apply(123.0, 456.0);
        let (x, y) = view.invert(sx, sy);
        assert!((x - 123.0).abs() < 0.001);
        assert!((y - 456.0).abs() < 0.001);
    }

    #[test]
    fn project_rect_without_transform_is_identity() {
        assert_eq!(project_rect(None, 64.0, 128.0, 64.0, 64.0), (64, 128, 128, 192));
    }

    #[test]
    fn project_rect_scales_size_under_zoom() {
        let view = zoomed();
        let (left, top, right, bottom) = project_rect(Some(&view), 1056.0, 992.0, 64.0, 64.0);
        assert_eq!((left, top), (800, 608));
        assert_eq!((right - left, bottom - top), (128, 128));
    }
}
