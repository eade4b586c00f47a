use crate::Size;

/// The rendering output of a filter chain.
///
/// Viewport coordinates are relative to the bottom-left origin of the
/// output. For a full-frame transcode `x` and `y` should be 0 and `size`
/// should match the size of the output.
#[derive(Debug, Clone, Copy)]
pub struct Viewport<'a, T> {
    /// The x offset to start rendering from.
    pub x: i32,
    /// The y offset to start rendering from.
    pub y: i32,
    /// An optional MVP to use when rendering the final pass to the viewport.
    pub mvp: Option<&'a [f32; 16]>,
    /// The output to render the final image to.
    pub output: T,
    /// The extent of the viewport starting from the origin defined by x and y.
    pub size: Size<u32>,
}

impl<'a, T> Viewport<'a, T> {
    /// A viewport covering `size` from the origin, without a custom MVP.
    pub fn new_render_target_sized_origin(output: T, size: Size<u32>) -> Self {
        Viewport {
            x: 0,
            y: 0,
            mvp: None,
            output,
            size,
        }
    }
}
