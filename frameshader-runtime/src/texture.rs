use crate::context::{RenderContext, TextureTarget};
use crate::error::Result;
use frameshader_common::{FilterMode, ImageFormat, Size, WrapMode};

/// A texture sampled by a filter.
///
/// For the first stage of a chain this is the decoded frame. Later stages
/// receive the previous stage's intermediate target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InputTexture<T> {
    /// A handle to the texture.
    pub handle: T,
    /// The kind of texture the handle refers to.
    pub target: TextureTarget,
    /// The size of the texture.
    pub size: Size<u32>,
    /// The filter mode to use when sampling the texture.
    pub filter: FilterMode,
    /// The wrap mode to use when sampling the texture.
    pub wrap: WrapMode,
}

impl<T> InputTexture<T> {
    /// A 2D texture with linear filtering, clamped to its edges.
    pub fn new(handle: T, size: Size<u32>) -> Self {
        InputTexture {
            handle,
            target: TextureTarget::Texture2D,
            size,
            filter: FilterMode::Linear,
            wrap: WrapMode::ClampToEdge,
        }
    }

    /// An external image texture, as handed out by hardware decoders.
    pub fn external(handle: T, size: Size<u32>) -> Self {
        InputTexture {
            target: TextureTarget::ExternalOes,
            ..Self::new(handle, size)
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }
}

/// A texture with a framebuffer attached, owned by the caller that created it.
///
/// Both objects are deleted on drop. If the context was lost, call
/// [`invalidate`](Self::invalidate) instead so that the stale handles are
/// forgotten rather than deleted against a new context.
pub struct OwnedFramebuffer<'ctx, C: RenderContext> {
    ctx: &'ctx C,
    texture: C::Texture,
    framebuffer: C::Framebuffer,
    size: Size<u32>,
    format: ImageFormat,
    filter: FilterMode,
    owned: bool,
}

impl<'ctx, C: RenderContext> OwnedFramebuffer<'ctx, C> {
    pub fn new(
        ctx: &'ctx C,
        size: Size<u32>,
        format: ImageFormat,
        filter: FilterMode,
    ) -> Result<Self> {
        let texture = ctx.create_texture(size, format, filter, WrapMode::ClampToEdge)?;
        let framebuffer = match ctx.create_framebuffer(texture) {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                ctx.delete_texture(texture);
                return Err(e);
            }
        };

        Ok(OwnedFramebuffer {
            ctx,
            texture,
            framebuffer,
            size,
            format,
            filter,
            owned: true,
        })
    }

    pub fn texture(&self) -> C::Texture {
        self.texture
    }

    pub fn framebuffer(&self) -> C::Framebuffer {
        self.framebuffer
    }

    pub fn size(&self) -> Size<u32> {
        self.size
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// The texture of this framebuffer as the input of the next stage.
    pub fn as_input(&self) -> InputTexture<C::Texture> {
        InputTexture {
            handle: self.texture,
            target: TextureTarget::Texture2D,
            size: self.size,
            filter: self.filter,
            wrap: WrapMode::ClampToEdge,
        }
    }

    /// Forget the handles without deleting them.
    pub fn invalidate(mut self) {
        self.owned = false;
    }
}

impl<C: RenderContext> Drop for OwnedFramebuffer<'_, C> {
    fn drop(&mut self) {
        if self.owned {
            self.ctx.delete_framebuffer(self.framebuffer);
            self.ctx.delete_texture(self.texture);
        }
    }
}
