#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Largest viewport with the texture's aspect ratio that fits the window, centered
    /// along the axis that has room to spare.
    pub fn letterbox(
        window_dimensions: (u32, u32),
        texture_dimensions: (u32, u32),
    ) -> Self {
        let (window_width, window_height) = (window_dimensions.0 as f32, window_dimensions.1 as f32);
        let (texture_width, texture_height) = (
            texture_dimensions.0.max(1) as f32,
            texture_dimensions.1.max(1) as f32,
        );

        let width_if_full_height = window_height / texture_height * texture_width;
        let height_if_full_width = window_width / texture_width * texture_height;

        if width_if_full_height > window_width {
            // Width-limited
            Self {
                x: 0,
                y: ((window_height - height_if_full_width) as u32) / 2,
                width: window_dimensions.0,
                height: height_if_full_width as u32,
            }
        } else {
            // Height-limited
            Self {
                x: ((window_width - width_if_full_height) as u32) / 2,
                y: 0,
                width: width_if_full_height as u32,
                height: window_dimensions.1,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_window_is_height_limited() {
        assert_eq!(
            Viewport::letterbox((800, 600), (400, 400)),
            Viewport {
                x: 100,
                y: 0,
                width: 600,
                height: 600,
            }
        );
    }

    #[test]
    fn tall_window_is_width_limited() {
        assert_eq!(
            Viewport::letterbox((400, 800), (400, 400)),
            Viewport {
                x: 0,
                y: 200,
                width: 400,
                height: 400,
            }
        );
    }

    #[test]
    fn matching_aspect_fills_the_window() {
        assert_eq!(
            Viewport::letterbox((1024, 512), (256, 128)),
            Viewport {
                x: 0,
                y: 0,
                width: 1024,
                height: 512,
            }
        );
    }

    #[test]
    fn wide_texture_is_centered_vertically() {
        let viewport = Viewport::letterbox((640, 480), (512, 128));
        assert_eq!(viewport.width, 640);
        assert_eq!(viewport.height, 160);
        assert_eq!(viewport.y, 160);
    }

    #[test]
    fn odd_remainder_is_truncated_before_halving() {
        let viewport = Viewport::letterbox((801, 600), (400, 400));
        assert_eq!(viewport.x, 100);
        assert_eq!(viewport.width, 600);
    }

    #[test]
    fn zero_sized_window_gives_an_empty_viewport() {
        assert!(Viewport::letterbox((0, 0), (64, 64)).is_empty());
        assert!(!Viewport::letterbox((64, 64), (64, 64)).is_empty());
    }
}
