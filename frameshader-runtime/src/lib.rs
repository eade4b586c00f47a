//! Backend-independent GPU filter chain runtime.
//!
//! A [`FilterChain`](chain::FilterChain) applies an ordered list of
//! [`Filter`](filter::Filter)s to each decoded video frame, routing every
//! stage's output into the next stage's input through offscreen framebuffers.
//! The last stage draws into the caller's destination, typically the
//! encoder's input surface.
//!
//! All GPU access goes through the [`RenderContext`](context::RenderContext)
//! trait. The OpenGL implementation lives in `frameshader-runtime-gl`; the
//! [`headless`] module provides a CPU reference context for tests.

/// The render context abstraction.
pub mod context;

/// Context loss detection.
pub mod binding;

/// Error types.
pub mod error;

/// Shader program ownership and lazy compilation.
pub mod program;

/// Default shader sources and the agreed uniform names.
pub mod shaders;

/// The filter capability contract.
pub mod filter;

/// Shared scaffolding for concrete filters.
pub mod base;

/// The built-in filter catalog.
pub mod filters;

/// The filter chain.
pub mod chain;

/// Uniform values and named shader parameters.
pub mod uniforms;

/// Runtime parameter access for filter chains.
pub mod parameters;

/// Input textures and owned render targets.
pub mod texture;

/// Geometry helpers for frame orientation and overlay placement.
pub mod transform;

/// Image loading helpers.
pub mod image;

/// Filter chain and per-frame options.
pub mod options;

#[cfg(feature = "headless")]
pub mod headless;

pub use frameshader_common::{FilterMode, ImageFormat, Size, Viewport, WrapMode};
pub use glam;
pub use glam::Mat4;
