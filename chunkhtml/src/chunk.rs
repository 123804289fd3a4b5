//! The unit of streamed output and the buffers that collect it.
//!
//! Rendering a tree produces a sequence of [`Chunk`]s rather than bytes. Static chunks are
//! pre-baked markup; dynamic chunks are callbacks that run when the sequence is executed
//! against a sink, which is how deferred properties and components see the render-time
//! [`Context`]. Every chunk of a render pass lives in that pass's arena.

use std::fmt;
use std::io::Write;

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

use crate::{Context, RenderResult};

/// The callback behind a dynamic chunk.
pub type DynamicFn<'r> = dyn Fn(&Context, &mut dyn Write) -> RenderResult<()> + 'r;

/// A unit of output.
#[derive(Clone, Copy)]
pub enum Chunk<'r> {
    /// Bytes written verbatim.
    Static(&'r [u8]),
    /// A callback producing bytes at execution time.
    Dynamic(&'r DynamicFn<'r>),
}

impl<'r> Chunk<'r> {
    /// Write this chunk to `sink`.
    ///
    /// Dynamic chunks receive `ctx`, or [`Context::background`] when no context was given.
    /// Errors from the sink or the callback are returned unchanged.
    pub fn execute(&self, ctx: Option<&Context>, sink: &mut dyn Write) -> RenderResult<()> {
        match *self {
            Chunk::Static(bytes) => {
                sink.write_all(bytes)?;
                Ok(())
            }
            Chunk::Dynamic(callback) => {
                let ctx = ctx.unwrap_or_else(|| Context::background());
                callback(ctx, sink)
            }
        }
    }

    /// Returns `true` if the chunk is [`Static`].
    ///
    /// [`Static`]: Chunk::Static
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    /// Returns `true` if the chunk is [`Dynamic`].
    ///
    /// [`Dynamic`]: Chunk::Dynamic
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl fmt::Debug for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Static(bytes) => f
                .debug_tuple("Static")
                .field(&String::from_utf8_lossy(bytes))
                .finish(),
            Chunk::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Execute chunks in order, stopping at the first error.
pub fn execute_all<'r>(
    chunks: impl IntoIterator<Item = Chunk<'r>>,
    ctx: Option<&Context>,
    sink: &mut dyn Write,
) -> RenderResult<()> {
    for chunk in chunks {
        chunk.execute(ctx, sink)?;
    }
    Ok(())
}

/// Something that accepts chunks during a render pass.
pub trait ChunkWriter<'r> {
    /// The arena that chunk payloads and callbacks are allocated in.
    fn arena(&self) -> &'r Bump;

    /// Accept one chunk.
    fn write_chunk(&mut self, chunk: Chunk<'r>) -> RenderResult<()>;
}

impl<'r, 'w> dyn ChunkWriter<'r> + 'w {
    /// Write a static chunk.
    pub fn write_static(&mut self, bytes: &'r [u8]) -> RenderResult<()> {
        self.write_chunk(Chunk::Static(bytes))
    }

    /// Write a string as a static chunk. The string must already be escaped.
    pub fn write_str(&mut self, markup: &'r str) -> RenderResult<()> {
        self.write_static(markup.as_bytes())
    }

    /// Allocate `callback` in the arena and write it as a dynamic chunk.
    pub fn write_dynamic<F>(&mut self, callback: F) -> RenderResult<()>
    where
        F: Fn(&Context, &mut dyn Write) -> RenderResult<()> + 'r,
    {
        let callback: &'r DynamicFn<'r> = self.arena().alloc(callback);
        self.write_chunk(Chunk::Dynamic(callback))
    }
}

/// An append-only collector of chunks, backed by a render arena.
pub struct ChunkBuffer<'r> {
    arena: &'r Bump,
    chunks: BumpVec<'r, Chunk<'r>>,
}

impl<'r> ChunkBuffer<'r> {
    /// Create an empty buffer allocating in `arena`.
    pub fn new_in(arena: &'r Bump) -> Self {
        ChunkBuffer {
            arena,
            chunks: BumpVec::new_in(arena),
        }
    }

    /// Append any number of chunks. Writing nothing is a no-op.
    pub fn write(&mut self, chunks: impl IntoIterator<Item = Chunk<'r>>) {
        self.chunks.extend(chunks);
    }

    /// Take every buffered chunk, leaving the buffer empty.
    pub fn drain(&mut self) -> BumpVec<'r, Chunk<'r>> {
        std::mem::replace(&mut self.chunks, BumpVec::new_in(self.arena))
    }

    /// The buffered chunks.
    pub fn chunks(&self) -> &[Chunk<'r>] {
        &self.chunks
    }

    /// The number of buffered chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the buffer holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl<'r> ChunkWriter<'r> for ChunkBuffer<'r> {
    fn arena(&self) -> &'r Bump {
        self.arena
    }

    fn write_chunk(&mut self, chunk: Chunk<'r>) -> RenderResult<()> {
        self.chunks.push(chunk);
        Ok(())
    }
}

impl fmt::Debug for ChunkBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.chunks.iter()).finish()
    }
}

/// A buffer decorator that shows every chunk to an observer before recording it.
///
/// Components use this to stream the chunks of a node produced mid-pass straight to the
/// sink, in order, without materializing an intermediate string.
pub struct Tee<'b, 'r, F> {
    buffer: &'b mut ChunkBuffer<'r>,
    observer: F,
}

impl<'b, 'r, F> Tee<'b, 'r, F>
where
    F: FnMut(Chunk<'r>) -> RenderResult<()>,
{
    /// Wrap `buffer` so that `observer` sees each chunk first.
    pub fn new(buffer: &'b mut ChunkBuffer<'r>, observer: F) -> Self {
        Tee { buffer, observer }
    }
}

impl<'r, F> ChunkWriter<'r> for Tee<'_, 'r, F>
where
    F: FnMut(Chunk<'r>) -> RenderResult<()>,
{
    fn arena(&self) -> &'r Bump {
        self.buffer.arena
    }

    fn write_chunk(&mut self, chunk: Chunk<'r>) -> RenderResult<()> {
        (self.observer)(chunk)?;
        self.buffer.write([chunk]);
        Ok(())
    }
}
