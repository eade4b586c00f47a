use frameshader_runtime::error::{FilterError, Result};
use frameshader_runtime::shaders::{POSITION_LOCATION, TEXCOORD_LOCATION};
use glow::HasContext;

#[rustfmt::skip]
static QUAD_VBO_DATA: &[f32; 16] = &[
    -1.0, -1.0, 0.0, 0.0,
     1.0, -1.0, 1.0, 0.0,
    -1.0,  1.0, 0.0, 1.0,
     1.0,  1.0, 1.0, 1.0,
];

const STRIDE: i32 = 4 * std::mem::size_of::<f32>() as i32;

/// The full-screen quad every filter draws.
pub struct GlDrawQuad {
    vbo: glow::NativeBuffer,
    vao: glow::NativeVertexArray,
}

impl GlDrawQuad {
    pub fn new(ctx: &glow::Context) -> Result<Self> {
        unsafe {
            let vbo = ctx.create_buffer().map_err(FilterError::Gl)?;
            ctx.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            ctx.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(QUAD_VBO_DATA.as_slice()),
                glow::STATIC_DRAW,
            );
            ctx.bind_buffer(glow::ARRAY_BUFFER, None);

            let vao = match ctx.create_vertex_array() {
                Ok(vao) => vao,
                Err(e) => {
                    ctx.delete_buffer(vbo);
                    return Err(FilterError::Gl(e));
                }
            };

            Ok(Self { vbo, vao })
        }
    }

    /// Draw the quad as a triangle strip with the currently bound program.
    ///
    /// # Safety
    /// The quad must have been created on `ctx`, which must be current.
    pub unsafe fn draw(&self, ctx: &glow::Context) {
        ctx.bind_vertex_array(Some(self.vao));
        ctx.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        ctx.enable_vertex_attrib_array(POSITION_LOCATION);
        ctx.enable_vertex_attrib_array(TEXCOORD_LOCATION);
        ctx.vertex_attrib_pointer_f32(POSITION_LOCATION, 2, glow::FLOAT, false, STRIDE, 0);
        ctx.vertex_attrib_pointer_f32(
            TEXCOORD_LOCATION,
            2,
            glow::FLOAT,
            false,
            STRIDE,
            2 * std::mem::size_of::<f32>() as i32,
        );

        ctx.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

        ctx.disable_vertex_attrib_array(POSITION_LOCATION);
        ctx.disable_vertex_attrib_array(TEXCOORD_LOCATION);
        ctx.bind_buffer(glow::ARRAY_BUFFER, None);
        ctx.bind_vertex_array(None);
    }

    /// # Safety
    /// The quad must have been created on `ctx`, which must be current.
    pub unsafe fn delete(self, ctx: &glow::Context) {
        ctx.delete_vertex_array(self.vao);
        ctx.delete_buffer(self.vbo);
    }
}
