use crate::context::RenderContext;

/// The state of a render context relative to the resources bound to it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ContextStatus {
    /// Resources created earlier are still valid.
    Current,
    /// The context was recreated. Earlier handles are stale.
    Recreated,
    /// The context is currently unusable.
    Lost,
}

/// Tracks which generation of a render context a set of GPU handles
/// belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ContextBinding {
    generation: u64,
}

impl ContextBinding {
    pub fn new<C: RenderContext>(ctx: &C) -> Self {
        ContextBinding {
            generation: ctx.generation(),
        }
    }

    pub fn status<C: RenderContext>(&self, ctx: &C) -> ContextStatus {
        if ctx.is_lost() {
            ContextStatus::Lost
        } else if ctx.generation() != self.generation {
            ContextStatus::Recreated
        } else {
            ContextStatus::Current
        }
    }

    /// Adopt the current generation of the context.
    pub fn rebind<C: RenderContext>(&mut self, ctx: &C) {
        self.generation = ctx.generation();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
