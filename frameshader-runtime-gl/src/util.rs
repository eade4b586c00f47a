use frameshader_runtime::context::TextureTarget;
use frameshader_runtime::error::ShaderStage;
use std::borrow::Cow;

/// `GL_TEXTURE_EXTERNAL_OES` from `OES_EGL_image_external`.
pub const TEXTURE_EXTERNAL_OES: u32 = 0x8D65;

/// `GL_CONTEXT_LOST` from `KHR_robustness`.
pub const CONTEXT_LOST: u32 = 0x0507;

pub fn gl_texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::ExternalOes => TEXTURE_EXTERNAL_OES,
    }
}

pub fn gl_shader_stage(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

pub fn with_glsl_header<'a>(header: Option<&str>, source: &'a str) -> Cow<'a, str> {
    match header {
        Some(header) => Cow::Owned(format!("{}\n{}", header.trim_end(), source)),
        None => Cow::Borrowed(source),
    }
}

pub fn gl_error_name(error: u32) -> &'static str {
    match error {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        CONTEXT_LOST => "GL_CONTEXT_LOST",
        _ => "unknown GL error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_goes_first() {
        let source = with_glsl_header(Some("#version 100\n"), "void main() {}");
        assert_eq!(source, "#version 100\nvoid main() {}");
    }

    #[test]
    fn no_header_borrows() {
        let source = with_glsl_header(None, "void main() {}");
        assert!(matches!(source, Cow::Borrowed(_)));
    }

    #[test]
    fn external_target() {
        assert_eq!(
            gl_texture_target(TextureTarget::ExternalOes),
            TEXTURE_EXTERNAL_OES
        );
        assert_eq!(gl_texture_target(TextureTarget::Texture2D), glow::TEXTURE_2D);
    }
}
