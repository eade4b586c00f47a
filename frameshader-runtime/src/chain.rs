use crate::binding::{ContextBinding, ContextStatus};
use crate::context::{RenderContext, TextureTarget};
use crate::error::{FilterError, Result};
use crate::filter::{DrawParams, Filter};
use crate::filters::IdentityFilter;
use crate::options::{FilterChainOptions, FrameOptions};
use crate::parameters::FilterChainParameters;
use crate::texture::{InputTexture, OwnedFramebuffer};
use frameshader_common::{Size, Viewport};
use glam::Mat4;
use tracing::{info, trace, warn};

/// The configuration state of a [`FilterChain`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChainState {
    /// No size is known, or the context was lost since the last configuration.
    Unconfigured,
    /// Intermediate targets are allocated but not every filter compiled.
    Sized,
    /// Every filter compiled. Frames can be drawn.
    Ready,
}

/// An ordered list of filters applied to every frame.
///
/// The output of filter `i` is rendered into an intermediate target that
/// filter `i + 1` samples. The last filter draws into the destination of
/// the frame. A chain without filters copies the input to the destination.
///
/// The chain borrows the render context and must only be used on the
/// thread that owns it.
pub struct FilterChain<'ctx, C: RenderContext> {
    ctx: &'ctx C,
    filters: Vec<Box<dyn Filter<C>>>,
    passthrough: IdentityFilter<C>,
    intermediates: Vec<OwnedFramebuffer<'ctx, C>>,
    binding: ContextBinding,
    state: ChainState,
    size: Option<Size<u32>>,
    options: FilterChainOptions,
}

impl<'ctx, C: RenderContext> FilterChain<'ctx, C> {
    /// Create an unconfigured chain. Nothing is allocated until
    /// [`set_size`](Self::set_size).
    pub fn new(
        ctx: &'ctx C,
        filters: Vec<Box<dyn Filter<C>>>,
        options: Option<&FilterChainOptions>,
    ) -> Self {
        FilterChain {
            ctx,
            filters,
            passthrough: IdentityFilter::new(),
            intermediates: Vec::new(),
            binding: ContextBinding::new(ctx),
            state: ChainState::Unconfigured,
            size: None,
            options: options.cloned().unwrap_or_default(),
        }
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// The last size the chain was configured with.
    pub fn size(&self) -> Option<Size<u32>> {
        self.size
    }

    pub fn options(&self) -> &FilterChainOptions {
        &self.options
    }

    pub fn context(&self) -> &'ctx C {
        self.ctx
    }

    pub fn filters(&self) -> &[Box<dyn Filter<C>>] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The number of intermediate targets currently allocated.
    pub fn intermediate_count(&self) -> usize {
        self.intermediates.len()
    }

    fn stage_count(&self) -> usize {
        self.filters.len().max(1)
    }

    fn stage_mut(&mut self, index: usize) -> &mut dyn Filter<C> {
        if self.filters.is_empty() {
            &mut self.passthrough
        } else {
            self.filters[index].as_mut()
        }
    }

    fn stage_target(&self, index: usize) -> TextureTarget {
        if index == 0 {
            self.options.input_target
        } else {
            TextureTarget::Texture2D
        }
    }

    /// Configure the chain for frames of `size`.
    ///
    /// Previous intermediate targets are released, `size` is propagated to
    /// every filter and every filter is compiled. On a compile or link failure
    /// the chain stays [`Sized`](ChainState::Sized) and the error is returned.
    pub fn set_size(&mut self, size: Size<u32>) -> Result<()> {
        if size.is_empty() {
            return Err(FilterError::InvalidSize(size));
        }
        self.check_context()?;
        self.size = Some(size);
        self.configure(size)
    }

    fn configure(&mut self, size: Size<u32>) -> Result<()> {
        info!(
            width = size.width,
            height = size.height,
            filters = self.filters.len(),
            "configuring filter chain"
        );

        self.state = ChainState::Unconfigured;
        self.intermediates.clear();

        let ctx = self.ctx;
        let mut intermediates = Vec::with_capacity(self.stage_count() - 1);
        for _ in 1..self.stage_count() {
            intermediates.push(OwnedFramebuffer::new(
                ctx,
                size,
                self.options.intermediate_format,
                self.options.intermediate_filter,
            )?);
        }
        self.intermediates = intermediates;

        for index in 0..self.stage_count() {
            self.stage_mut(index).set_size(ctx, size)?;
        }
        self.state = ChainState::Sized;

        self.prepare()?;
        self.state = ChainState::Ready;
        Ok(())
    }

    fn prepare(&mut self) -> Result<()> {
        let ctx = self.ctx;
        for index in 0..self.stage_count() {
            let target = self.stage_target(index);
            self.stage_mut(index).prepare(ctx, target)?;
        }
        Ok(())
    }

    /// Draw one frame through every filter.
    ///
    /// `transform` is the decoder's texture transform for `input` and is
    /// applied by the first filter only. The last filter draws into
    /// `viewport.output`, where `None` is the default framebuffer of the
    /// context. When this returns, the default framebuffer is bound.
    ///
    /// If the context was recreated since the chain was configured, the chain
    /// is reconfigured with its last size before drawing.
    ///
    /// Only the last filter touches `viewport.output`. An error from an
    /// earlier filter leaves the destination as it was; an error from the last
    /// filter leaves it cleared or partially drawn.
    pub fn frame(
        &mut self,
        input: &InputTexture<C::Texture>,
        viewport: &Viewport<Option<C::Framebuffer>>,
        transform: &Mat4,
        timestamp_nanos: i64,
        options: Option<&FrameOptions>,
    ) -> Result<()> {
        self.check_context()?;

        match self.state {
            ChainState::Ready => {}
            ChainState::Sized => {
                self.prepare()?;
                self.state = ChainState::Ready;
            }
            ChainState::Unconfigured => match self.size {
                Some(size) => self.configure(size)?,
                None => return Err(FilterError::NotReady),
            },
        }

        if input.target != self.options.input_target {
            return Err(FilterError::InvalidInput(format!(
                "expected a {:?} input, got {:?}",
                self.options.input_target, input.target
            )));
        }
        if input.size.is_empty() {
            return Err(FilterError::InvalidInput(format!(
                "input texture is {}x{}",
                input.size.width, input.size.height
            )));
        }

        trace!(timestamp_nanos, "drawing frame");
        let frame_options = options.copied().unwrap_or_default();
        let result = self.draw_stages(input, viewport, transform, timestamp_nanos, &frame_options);
        self.ctx.bind_framebuffer(None);
        result
    }

    fn draw_stages(
        &mut self,
        input: &InputTexture<C::Texture>,
        viewport: &Viewport<Option<C::Framebuffer>>,
        transform: &Mat4,
        timestamp_nanos: i64,
        options: &FrameOptions,
    ) -> Result<()> {
        let ctx = self.ctx;
        let last = self.stage_count() - 1;
        let clear_color = self.options.clear_color;
        let viewport_mvp = viewport
            .mvp
            .map(Mat4::from_cols_array)
            .unwrap_or(Mat4::IDENTITY);

        for index in 0..=last {
            let source = match index {
                0 => *input,
                _ => self.intermediates[index - 1].as_input(),
            };
            let tex_matrix = if index == 0 { transform } else { &Mat4::IDENTITY };

            let (mvp, output_size) = if index == last {
                if ctx.is_lost() {
                    return Err(FilterError::ContextLost);
                }
                ctx.bind_framebuffer(viewport.output);
                ctx.set_viewport(viewport.x, viewport.y, viewport.size);
                if options.clear {
                    ctx.clear(clear_color);
                }
                (&viewport_mvp, viewport.size)
            } else {
                let target = &self.intermediates[index];
                ctx.bind_framebuffer(Some(target.framebuffer()));
                ctx.set_viewport(0, 0, target.size());
                ctx.clear(clear_color);
                (&Mat4::IDENTITY, target.size())
            };

            let params = DrawParams {
                input: &source,
                tex_matrix,
                mvp,
                output_size,
                timestamp_nanos,
            };
            self.stage_mut(index).draw(ctx, &params)?;
        }
        Ok(())
    }

    /// Replace the filters of the chain.
    ///
    /// The previous filters are released. If the chain was sized before, it
    /// is reconfigured at the same size.
    pub fn set_filters(&mut self, filters: Vec<Box<dyn Filter<C>>>) -> Result<()> {
        self.release_filters();
        self.filters = filters;
        self.state = ChainState::Unconfigured;

        match self.size {
            Some(size) => {
                self.check_context()?;
                self.configure(size)
            }
            None => Ok(()),
        }
    }

    /// Signal that the context is gone.
    ///
    /// Every handle owned by the chain is forgotten and the chain rebuilds
    /// itself on the next frame.
    pub fn notify_context_lost(&mut self) {
        warn!("render context lost, dropping filter chain resources");
        self.invalidate();
    }

    fn invalidate(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.invalidate();
        }
        self.passthrough.invalidate();
        for intermediate in self.intermediates.drain(..) {
            intermediate.invalidate();
        }
        self.state = ChainState::Unconfigured;
    }

    fn check_context(&mut self) -> Result<()> {
        match self.binding.status(self.ctx) {
            ContextStatus::Current => Ok(()),
            ContextStatus::Lost => {
                if self.state != ChainState::Unconfigured || !self.intermediates.is_empty() {
                    self.notify_context_lost();
                }
                Err(FilterError::ContextLost)
            }
            ContextStatus::Recreated => {
                warn!(
                    previous = self.binding.generation(),
                    current = self.ctx.generation(),
                    "render context was recreated, rebuilding filter chain"
                );
                self.invalidate();
                self.binding.rebind(self.ctx);
                Ok(())
            }
        }
    }

    fn release_filters(&mut self) {
        let ctx = self.ctx;
        let current = self.binding.status(ctx) == ContextStatus::Current;
        for filter in self.filters.iter_mut() {
            if current {
                filter.release(ctx);
            } else {
                filter.invalidate();
            }
        }
    }

    /// Release every GPU object owned by the chain.
    ///
    /// The chain returns to [`Unconfigured`](ChainState::Unconfigured) and
    /// forgets its size. Calling this more than once is harmless. It is also
    /// called on drop.
    pub fn teardown(&mut self) {
        let ctx = self.ctx;
        if self.binding.status(ctx) == ContextStatus::Current {
            self.release_filters();
            self.passthrough.release(ctx);
            self.intermediates.clear();
        } else {
            self.invalidate();
        }
        self.state = ChainState::Unconfigured;
        self.size = None;
    }
}

impl<C: RenderContext> FilterChainParameters for FilterChain<'_, C> {
    fn get_parameter(&self, index: usize, name: &str) -> Option<f32> {
        self.filters.get(index)?.parameter(name)
    }

    fn set_parameter(&mut self, index: usize, name: &str, value: f32) -> Option<f32> {
        self.filters.get_mut(index)?.set_parameter(name, value)
    }

    fn parameters(&self) -> Vec<(usize, String, f32)> {
        self.filters
            .iter()
            .enumerate()
            .flat_map(|(index, filter)| {
                filter
                    .parameter_names()
                    .into_iter()
                    .filter_map(move |name| {
                        filter
                            .parameter(name)
                            .map(|value| (index, name.to_owned(), value))
                    })
            })
            .collect()
    }
}

impl<C: RenderContext> Drop for FilterChain<'_, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}
