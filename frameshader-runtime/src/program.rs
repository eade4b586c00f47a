use crate::context::{RenderContext, TextureTarget};
use crate::error::{FilterError, Result, ShaderStage};
use crate::shaders::ATTRIBUTE_BINDINGS;
use crate::uniforms::UniformValue;
use frameshader_common::map::FastHashMap;
use std::fmt::{Debug, Formatter};
use tracing::{debug, warn};

/// Vertex and fragment source of a program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        ShaderSources {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// A linked shader program.
///
/// Uniform locations are looked up once per name and cached. The program is
/// not deleted on drop: it must be handed back with [`release`](Self::release),
/// which consumes it, or forgotten when the context is gone.
pub struct ShaderProgram<C: RenderContext> {
    handle: C::Program,
    sources: ShaderSources,
    locations: FastHashMap<String, Option<C::UniformLocation>>,
}

impl<C: RenderContext> ShaderProgram<C> {
    /// Compile both stages and link them with the standard attribute bindings.
    pub fn compile(ctx: &C, sources: ShaderSources) -> Result<Self> {
        let vertex = ctx.compile_shader(ShaderStage::Vertex, &sources.vertex)?;
        let fragment = match ctx.compile_shader(ShaderStage::Fragment, &sources.fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                ctx.delete_shader(vertex);
                return Err(e);
            }
        };

        let program = ctx.link_program(vertex, fragment, &ATTRIBUTE_BINDINGS);
        ctx.delete_shader(vertex);
        ctx.delete_shader(fragment);
        let handle = program?;

        debug!(?handle, "linked shader program");
        Ok(ShaderProgram {
            handle,
            sources,
            locations: FastHashMap::default(),
        })
    }

    pub fn handle(&self) -> C::Program {
        self.handle
    }

    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// The location of a uniform, or `None` if the program does not declare it.
    pub fn location(&mut self, ctx: &C, name: &str) -> Option<C::UniformLocation> {
        if let Some(location) = self.locations.get(name) {
            return location.clone();
        }
        let location = ctx.uniform_location(self.handle, name);
        self.locations.insert(name.to_owned(), location.clone());
        location
    }

    /// Upload a uniform to this program, which must be bound.
    ///
    /// Returns `false` if the program does not declare the uniform.
    pub fn set_uniform(&mut self, ctx: &C, name: &str, value: &UniformValue) -> bool {
        match self.location(ctx, name) {
            Some(location) => {
                ctx.set_uniform(&location, value);
                true
            }
            None => false,
        }
    }

    pub fn release(self, ctx: &C) {
        ctx.delete_program(self.handle);
    }
}

impl<C: RenderContext> Debug for ShaderProgram<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

/// The compile state of a filter's program.
pub enum ProgramState<C: RenderContext> {
    /// Not compiled yet, or forgotten after the context was lost.
    Uncompiled,
    Ready(ShaderProgram<C>),
    /// Compiling or linking failed. The error is returned on every use
    /// without recompiling.
    Failed(FilterError),
}

impl<C: RenderContext> ProgramState<C> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProgramState::Ready(_))
    }

    pub fn error(&self) -> Option<&FilterError> {
        match self {
            ProgramState::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl<C: RenderContext> Debug for ProgramState<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramState::Uncompiled => f.write_str("Uncompiled"),
            ProgramState::Ready(program) => f.debug_tuple("Ready").field(program).finish(),
            ProgramState::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// A program compiled on first use for a given input texture target.
///
/// Failures are remembered per target until the program is released or
/// invalidated, so switching targets back and forth never retries a source
/// that is known not to compile.
///
/// Cloning yields an uncompiled program: GPU handles are never shared.
pub struct LazyProgram<C: RenderContext> {
    state: ProgramState<C>,
    target: TextureTarget,
    failures: Vec<(TextureTarget, FilterError)>,
}

impl<C: RenderContext> LazyProgram<C> {
    pub fn new() -> Self {
        LazyProgram {
            state: ProgramState::Uncompiled,
            target: TextureTarget::Texture2D,
            failures: Vec::new(),
        }
    }

    pub fn state(&self) -> &ProgramState<C> {
        &self.state
    }

    /// The target the current state was compiled for.
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    fn failure(&self, target: TextureTarget) -> Option<&FilterError> {
        self.failures
            .iter()
            .find(|(failed, _)| *failed == target)
            .map(|(_, e)| e)
    }

    /// Whether [`get_or_compile`](Self::get_or_compile) would need sources
    /// for `target`.
    pub fn needs_compile(&self, target: TextureTarget) -> bool {
        let current = self.target == target && !matches!(self.state, ProgramState::Uncompiled);
        !current && self.failure(target).is_none()
    }

    /// Get the program for `target`, compiling it from `sources` if needed.
    ///
    /// A program compiled for a different target is released and rebuilt.
    /// Returns [`FilterError::NotReady`] if a compile is needed and no
    /// sources were given.
    pub fn get_or_compile(
        &mut self,
        ctx: &C,
        target: TextureTarget,
        sources: Option<ShaderSources>,
    ) -> Result<&mut ShaderProgram<C>> {
        if self.target != target {
            if let ProgramState::Ready(program) =
                std::mem::replace(&mut self.state, ProgramState::Uncompiled)
            {
                program.release(ctx);
            }
            self.target = target;
        }

        if let ProgramState::Uncompiled = self.state {
            if let Some(e) = self.failure(target) {
                self.state = ProgramState::Failed(e.clone());
            } else {
                let sources = sources.ok_or(FilterError::NotReady)?;
                self.state = match ShaderProgram::compile(ctx, sources) {
                    Ok(program) => ProgramState::Ready(program),
                    Err(FilterError::ContextLost) => return Err(FilterError::ContextLost),
                    Err(e) => {
                        debug!(error = %e, ?target, "caching shader program failure");
                        self.failures.push((target, e.clone()));
                        ProgramState::Failed(e)
                    }
                };
            }
        }

        match &mut self.state {
            ProgramState::Ready(program) => Ok(program),
            ProgramState::Failed(e) => Err(e.clone()),
            ProgramState::Uncompiled => Err(FilterError::NotReady),
        }
    }

    /// Delete the program and forget cached failures. Safe to call any
    /// number of times.
    pub fn release(&mut self, ctx: &C) {
        match std::mem::replace(&mut self.state, ProgramState::Uncompiled) {
            ProgramState::Ready(program) => program.release(ctx),
            ProgramState::Failed(e) => warn!(error = %e, "releasing filter that failed to compile"),
            ProgramState::Uncompiled => {}
        }
        self.failures.clear();
    }

    /// Forget the program and cached failures without deleting anything.
    pub fn invalidate(&mut self) {
        self.state = ProgramState::Uncompiled;
        self.failures.clear();
    }
}

impl<C: RenderContext> Default for LazyProgram<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RenderContext> Clone for LazyProgram<C> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<C: RenderContext> Debug for LazyProgram<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyProgram")
            .field("state", &self.state)
            .field("target", &self.target)
            .finish()
    }
}
