use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::filter::DrawParams;
use crate::program::{LazyProgram, ProgramState, ShaderSources};
use crate::shaders::{
    FRAME_SIZE_UNIFORM, MVP_UNIFORM, SAMPLER_UNIFORM, TEX_MATRIX_UNIFORM, TIME_UNIFORM,
};
use crate::uniforms::{ShaderParameter, UniformStorage, UniformValue};
use frameshader_common::Size;
use std::fmt::{Debug, Formatter};
use tracing::debug;

/// Program lifecycle and uniform upload shared by the concrete filters.
///
/// The program is compiled lazily on first use for the kind of texture the
/// filter samples, from the sources of the filter composing it. The outcome
/// is cached: a failed compile is reported on every later use without being
/// retried. Filter parameters are kept as
/// named uniforms and uploaded on every draw.
pub struct BaseFilter<C: RenderContext> {
    program: LazyProgram<C>,
    size: Option<Size<u32>>,
    uniforms: UniformStorage,
}

impl<C: RenderContext> BaseFilter<C> {
    pub fn new() -> Self {
        Self::with_uniforms(Vec::new())
    }

    pub fn with_uniforms(uniforms: Vec<ShaderParameter>) -> Self {
        BaseFilter {
            program: LazyProgram::new(),
            size: None,
            uniforms: UniformStorage::new(uniforms),
        }
    }

    pub fn size(&self) -> Option<Size<u32>> {
        self.size
    }

    pub fn set_size(&mut self, size: Size<u32>) {
        self.size = Some(size);
    }

    pub fn uniforms(&self) -> &UniformStorage {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformStorage {
        &mut self.uniforms
    }

    /// Get a float uniform.
    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.uniforms.get(name).and_then(UniformValue::as_float)
    }

    /// Set a float uniform that the filter already declares.
    pub fn set_parameter(&mut self, name: &str, value: f32) -> Option<f32> {
        self.parameter(name)?;
        self.uniforms.set(name, value).and_then(|old| old.as_float())
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.uniforms
            .iter()
            .filter(|p| p.value.as_float().is_some())
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn state(&self) -> &ProgramState<C> {
        self.program.state()
    }

    pub fn program(&self) -> Option<C::Program> {
        match self.program.state() {
            ProgramState::Ready(program) => Some(program.handle()),
            _ => None,
        }
    }

    /// Whether [`prepare`](Self::prepare) needs sources for `target`.
    ///
    /// Filters build their sources only when this holds.
    pub fn needs_compile(&self, target: TextureTarget) -> bool {
        self.program.needs_compile(target)
    }

    pub fn prepare(
        &mut self,
        ctx: &C,
        target: TextureTarget,
        sources: Option<ShaderSources>,
    ) -> Result<()> {
        self.program.get_or_compile(ctx, target, sources).map(|_| ())
    }

    /// Bind the program, upload the standard and filter uniforms, and draw
    /// the quad into the currently bound target.
    ///
    /// The program must have been prepared for the input's target.
    pub fn draw(&mut self, ctx: &C, params: &DrawParams<'_, C::Texture>) -> Result<()> {
        let program = self
            .program
            .get_or_compile(ctx, params.input.target, None)?;

        ctx.use_program(Some(program.handle()));
        ctx.bind_texture(0, params.input.target, Some(params.input.handle));
        ctx.set_sampling(
            0,
            params.input.target,
            params.input.filter,
            params.input.wrap,
        );

        program.set_uniform(ctx, SAMPLER_UNIFORM, &UniformValue::Int(0));
        program.set_uniform(ctx, MVP_UNIFORM, &UniformValue::from(*params.mvp));
        program.set_uniform(
            ctx,
            TEX_MATRIX_UNIFORM,
            &UniformValue::from(*params.tex_matrix),
        );

        // optional builtins
        let seconds = params.timestamp_nanos as f64 / 1_000_000_000.0;
        program.set_uniform(ctx, TIME_UNIFORM, &UniformValue::Float(seconds as f32));
        program.set_uniform(
            ctx,
            FRAME_SIZE_UNIFORM,
            &UniformValue::Vec2(params.output_size.into()),
        );

        for parameter in self.uniforms.iter() {
            if !program.set_uniform(ctx, &parameter.name, &parameter.value) {
                debug!(name = %parameter.name, "skipping uniform not declared by the program");
            }
        }

        ctx.draw_quad()
    }

    pub fn release(&mut self, ctx: &C) {
        self.program.release(ctx);
    }

    pub fn invalidate(&mut self) {
        self.program.invalidate();
    }
}

impl<C: RenderContext> Default for BaseFilter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RenderContext> Clone for BaseFilter<C> {
    fn clone(&self) -> Self {
        BaseFilter {
            program: self.program.clone(),
            size: self.size,
            uniforms: self.uniforms.clone(),
        }
    }
}

impl<C: RenderContext> Debug for BaseFilter<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseFilter")
            .field("program", &self.program)
            .field("size", &self.size)
            .field("uniforms", &self.uniforms)
            .finish()
    }
}
