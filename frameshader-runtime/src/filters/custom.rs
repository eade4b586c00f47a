use crate::base::BaseFilter;
use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::filter::{DrawParams, Filter};
use crate::shaders::{create_default_vertex_shader, fragment_shader};
use crate::uniforms::{ShaderParameter, UniformValue};
use frameshader_common::Size;

/// Fragment source of a [`ShaderFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentSource {
    /// Everything after the standard declarations. The prelude for the input
    /// target is prepended, so the body works with any input.
    Body(String),
    /// A complete shader, used as is for every input target.
    Complete(String),
}

impl FragmentSource {
    pub fn for_target(&self, target: TextureTarget) -> String {
        match self {
            FragmentSource::Body(body) => fragment_shader(target, body),
            FragmentSource::Complete(source) => source.clone(),
        }
    }
}

/// A filter built from externally authored shader source.
///
/// Named parameters are uploaded as uniforms on every draw. Parameters the
/// program does not declare are skipped.
pub struct ShaderFilter<C: RenderContext> {
    base: BaseFilter<C>,
    name: String,
    fragment: FragmentSource,
    vertex: Option<String>,
}

impl<C: RenderContext> ShaderFilter<C> {
    /// A filter from a fragment body, see [`FragmentSource::Body`].
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::from_source(name, FragmentSource::Body(body.into()))
    }

    pub fn from_source(name: impl Into<String>, fragment: FragmentSource) -> Self {
        ShaderFilter {
            base: BaseFilter::new(),
            name: name.into(),
            fragment,
            vertex: None,
        }
    }

    /// Replace the default vertex shader.
    pub fn with_vertex_shader(mut self, source: impl Into<String>) -> Self {
        self.vertex = Some(source.into());
        self
    }

    pub fn with_parameter(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.base.uniforms_mut().set(name, value);
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = ShaderParameter>) -> Self {
        for parameter in parameters {
            self.base.uniforms_mut().set(&parameter.name, parameter.value);
        }
        self
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.base.uniforms().get(name)
    }

    /// Set a uniform of any type, adding it if it is not present yet.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Option<UniformValue> {
        self.base.uniforms_mut().set(name, value)
    }
}

impl<C: RenderContext> Clone for ShaderFilter<C> {
    fn clone(&self) -> Self {
        ShaderFilter {
            base: self.base.clone(),
            name: self.name.clone(),
            fragment: self.fragment.clone(),
            vertex: self.vertex.clone(),
        }
    }
}

impl<C: RenderContext> Filter<C> for ShaderFilter<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn fragment_shader(&self, target: TextureTarget) -> String {
        self.fragment.for_target(target)
    }

    fn vertex_shader(&self) -> String {
        self.vertex
            .clone()
            .unwrap_or_else(create_default_vertex_shader)
    }

    fn set_size(&mut self, _ctx: &C, size: Size<u32>) -> Result<()> {
        self.base.set_size(size);
        Ok(())
    }

    fn prepare(&mut self, ctx: &C, target: TextureTarget) -> Result<()> {
        let sources = self.base.needs_compile(target).then(|| self.sources(target));
        self.base.prepare(ctx, target, sources)
    }

    fn draw(&mut self, ctx: &C, params: &DrawParams<'_, C::Texture>) -> Result<()> {
        self.prepare(ctx, params.input.target)?;
        self.base.draw(ctx, params)
    }

    fn program(&self) -> Option<C::Program> {
        self.base.program()
    }

    fn release(&mut self, ctx: &C) {
        self.base.release(ctx)
    }

    fn invalidate(&mut self) {
        self.base.invalidate()
    }

    fn parameter(&self, name: &str) -> Option<f32> {
        self.base.parameter(name)
    }

    fn set_parameter(&mut self, name: &str, value: f32) -> Option<f32> {
        self.base.set_parameter(name, value)
    }

    fn parameter_names(&self) -> Vec<&str> {
        self.base.parameter_names()
    }
}
