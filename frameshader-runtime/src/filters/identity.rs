use crate::base::BaseFilter;
use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use crate::filter::{DrawParams, Filter};
use crate::shaders::create_default_fragment_shader;
use frameshader_common::Size;

/// Copies the input unchanged.
pub struct IdentityFilter<C: RenderContext> {
    base: BaseFilter<C>,
}

impl<C: RenderContext> IdentityFilter<C> {
    pub fn new() -> Self {
        IdentityFilter {
            base: BaseFilter::new(),
        }
    }

    pub fn base(&self) -> &BaseFilter<C> {
        &self.base
    }
}

impl<C: RenderContext> Default for IdentityFilter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RenderContext> Clone for IdentityFilter<C> {
    fn clone(&self) -> Self {
        IdentityFilter {
            base: self.base.clone(),
        }
    }
}

impl<C: RenderContext> Filter<C> for IdentityFilter<C> {
    fn name(&self) -> &str {
        "identity"
    }

    fn fragment_shader(&self, target: TextureTarget) -> String {
        create_default_fragment_shader(target)
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
}
