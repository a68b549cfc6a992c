//! Copy-on-write pointer to a [`SharedBuffer`].
//!
//! The reference count is the strong count of a non-atomic [`Rc`], so a
//! handle (and everything holding one) is neither `Send` nor `Sync`.
//!
//! Copying a handle shares the buffer, unless the buffer has already been
//! handed out for writing; in that case the copy gets its own clone right
//! away. Taking write access forks only when another handle still points to
//! the same buffer, and always leaves the buffer marked unshareable.

use std::alloc::handle_alloc_error;
use std::rc::Rc;
use log::trace;
use super::buffer::SharedBuffer;
use super::error::Result;
use super::storage::Storage;

pub struct Handle<T, S> {
    buffer: Rc<SharedBuffer<T, S>>,
}

impl<T, S: Storage<T>> Handle<T, S> {
    pub fn new(buffer: SharedBuffer<T, S>) -> Self
    {
        Self { buffer: Rc::new(buffer) }
    }

    pub fn read(&self) -> &SharedBuffer<T, S>
    {
        &self.buffer
    }

    /// Exclusive access to the buffer, forking it first if it is shared.
    ///
    /// If the fork cannot allocate, the handle keeps pointing to the
    /// original buffer and the error is returned.
    pub fn write(&mut self) -> Result<&mut SharedBuffer<T, S>>
    {
        if Rc::strong_count(&self.buffer) > 1 {
            let private = self.buffer.try_clone()?;
            trace!("forking {}x{} buffer shared by {} handles",
                private.height(), private.width(), Rc::strong_count(&self.buffer));
            self.buffer = Rc::new(private);
        }

        // Sole owner by now, so this never copies.
        let buffer = Rc::make_mut(&mut self.buffer);
        buffer.mark_unshareable();
        Ok(buffer)
    }

    /// Copies the handle, sharing the buffer if it is still shareable.
    pub fn try_clone(&self) -> Result<Self>
    {
        if self.buffer.is_shareable() {
            return Ok(Self { buffer: Rc::clone(&self.buffer) });
        }

        trace!("eagerly cloning unshareable {}x{} buffer",
            self.buffer.height(), self.buffer.width());
        Ok(Self::new(self.buffer.try_clone()?))
    }

    /// Swaps in a brand new buffer, releasing the current one.
    pub fn replace(&mut self, buffer: SharedBuffer<T, S>)
    {
        self.buffer = Rc::new(buffer);
    }

    pub fn ref_count(&self) -> usize
    {
        Rc::strong_count(&self.buffer)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool
    {
        Rc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl<T, S: Storage<T>> Clone for Handle<T, S> {
    fn clone(&self) -> Self
    {
        match self.try_clone() {
            Ok(handle) => handle,
            Err(_) => handle_alloc_error(S::layout(self.buffer.len())),
        }
    }
}
