//! Filters shipped with the runtime.
//!
//! The chain does not depend on any of these. Filters defined outside the
//! crate implement [`Filter`](crate::filter::Filter) the same way.

mod color;
mod custom;
mod geometry;
mod identity;
mod overlay;

pub use color::ColorAdjustFilter;
pub use custom::{FragmentSource, ShaderFilter};
pub use geometry::GeometryFilter;
pub use identity::IdentityFilter;
pub use overlay::OverlayFilter;
