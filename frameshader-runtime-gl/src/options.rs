/// Options for a [`GlContext`](crate::GlContext).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlContextOptions {
    /// A line prepended to every shader source, such as `#version 100` or
    /// `#version 120`. Sources are compiled unchanged if `None`.
    pub glsl_header: Option<String>,
}
