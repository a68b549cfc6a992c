use std::alloc::handle_alloc_error;
use std::marker::PhantomData;
use log::debug;
use super::error::{GridError, Result};
use super::storage::Storage;

/// A block of `height * width` elements, shared between grids through a
/// [`Handle`](super::handle::Handle).
///
/// The element count never changes after construction. `shareable` starts
/// out `true` and is cleared the first time an owner takes write access;
/// from then on copies of the owner clone eagerly instead of sharing.
pub struct SharedBuffer<T, S> {
    height: usize,
    width: usize,
    shareable: bool,
    storage: S,
    _elem: PhantomData<T>,
}

fn element_count(height: usize, width: usize) -> Result<usize>
{
    if height == 0 || width == 0 {
        return Err(GridError::InvalidDimension { height, width });
    }

    height.checked_mul(width)
        .ok_or(GridError::InvalidDimension { height, width })
}

impl<T, S: Storage<T>> SharedBuffer<T, S> {
    fn from_storage(height: usize, width: usize, storage: S) -> Self
    {
        debug!("allocated {}x{} buffer", height, width);
        Self {
            height, width, storage,
            shareable: true,
            _elem: PhantomData,
        }
    }

    pub fn filled(height: usize, width: usize, value: T) -> Result<Self>
    {
        let len = element_count(height, width)?;
        Ok(Self::from_storage(height, width, S::try_filled(len, value)?))
    }

    pub fn from_iter<I: IntoIterator<Item = T>>(height: usize, width: usize, iter: I)
        -> Result<Self>
    {
        let len = element_count(height, width)?;
        Ok(Self::from_storage(height, width, S::try_collect(len, iter)?))
    }

    /// Deep copy. The copy has never been exposed for writing, so it is
    /// shareable regardless of the source.
    pub fn try_clone(&self) -> Result<Self>
    {
        Ok(Self::from_storage(self.height, self.width, self.storage.try_clone()?))
    }

    pub fn height(&self) -> usize
    {
        self.height
    }

    pub fn width(&self) -> usize
    {
        self.width
    }

    pub fn len(&self) -> usize
    {
        self.height * self.width
    }

    pub fn is_shareable(&self) -> bool
    {
        self.shareable
    }

    pub fn mark_unshareable(&mut self)
    {
        self.shareable = false;
    }

    pub fn elements(&self) -> &S::Slice
    {
        self.storage.as_slice()
    }

    pub fn elements_mut(&mut self) -> &mut S::Slice
    {
        self.storage.as_mut_slice()
    }

    pub fn row(&self, idx: usize) -> &S::Slice
    {
        let start = idx * self.width;
        S::subslice(self.elements(), start..start + self.width)
    }

    pub fn row_mut(&mut self, idx: usize) -> &mut S::Slice
    {
        let start = idx * self.width;
        let width = self.width;
        S::subslice_mut(self.elements_mut(), start..start + width)
    }
}

impl<T, S: Storage<T>> Clone for SharedBuffer<T, S> {
    fn clone(&self) -> Self
    {
        match self.try_clone() {
            Ok(buffer) => buffer,
            Err(_) => handle_alloc_error(S::layout(self.len())),
        }
    }
}
