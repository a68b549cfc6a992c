use std::alloc::handle_alloc_error;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut, Index, IndexMut};
use bitvec::vec::BitVec;
use super::buffer::SharedBuffer;
use super::error::{check_index, GridError, Result};
use super::handle::Handle;
use super::storage::Storage;

/// Two-dimensional array with copy-on-write sharing.
///
/// Cloning a `Grid` is cheap: both copies point to the same buffer until
/// one of them asks for write access ([`row_mut`](Self::row_mut),
/// [`set`](Self::set), [`iter_mut`](Self::iter_mut) or `grid[i]` through
/// `IndexMut`). At that point the writer gets a private copy if the buffer
/// was shared, and its buffer is marked unshareable: every later clone of
/// that grid copies the elements immediately.
///
/// Sharing is tracked with a non-atomic count, so grids cannot cross
/// threads.
pub struct Grid<T, S = Vec<T>> {
    handle: Handle<T, S>,
}

/// Grid of bit-packed booleans.
pub type BitGrid = Grid<bool, BitVec>;

/// Read-only window over one row.
pub struct RowView<'a, T, S: Storage<T>> {
    slice: &'a S::Slice,
    _elem: PhantomData<T>,
}

/// Writable window over one row of an exclusively owned buffer.
pub struct RowViewMut<'a, T, S: Storage<T>> {
    slice: &'a mut S::Slice,
    _elem: PhantomData<T>,
}

pub struct RowsIter<'a, T, S> {
    buffer: &'a SharedBuffer<T, S>,
    front: usize,
    back: usize,
}

impl<'a, T, S: Storage<T> + 'a> RowView<'a, T, S> {
    fn new(slice: &'a S::Slice) -> Self
    {
        Self { slice, _elem: PhantomData }
    }

    pub fn len(&self) -> usize
    {
        S::slice_len(self.slice)
    }

    pub fn get(&self, col: usize) -> Result<S::Ref<'a>>
    {
        S::get(self.slice, col)
            .ok_or(GridError::IndexOutOfRange { index: col, len: self.len() })
    }

    pub fn iter(&self) -> S::Iter<'a>
    {
        S::iter(self.slice)
    }

    pub fn as_slice(&self) -> &'a S::Slice
    {
        self.slice
    }
}

impl<'a, T, S: Storage<T> + 'a> Deref for RowView<'a, T, S> {
    type Target = S::Slice;

    fn deref(&self) -> &S::Slice
    {
        self.slice
    }
}

impl<'a, T, S: Storage<T> + 'a> fmt::Debug for RowView<'a, T, S>
    where S::Slice: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        fmt::Debug::fmt(self.slice, f)
    }
}

impl<'a, T, S: Storage<T> + 'a> fmt::Debug for RowViewMut<'a, T, S>
    where S::Slice: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        fmt::Debug::fmt(&*self.slice, f)
    }
}

impl<'a, T, S: Storage<T> + 'a> IntoIterator for RowView<'a, T, S> {
    type Item = S::Ref<'a>;
    type IntoIter = S::Iter<'a>;

    fn into_iter(self) -> S::Iter<'a>
    {
        S::iter(self.slice)
    }
}

impl<'a, T, S: Storage<T> + 'a> RowViewMut<'a, T, S> {
    fn new(slice: &'a mut S::Slice) -> Self
    {
        Self { slice, _elem: PhantomData }
    }

    pub fn len(&self) -> usize
    {
        S::slice_len(&*self.slice)
    }

    pub fn get(&self, col: usize) -> Result<S::Ref<'_>>
    {
        S::get(&*self.slice, col)
            .ok_or(GridError::IndexOutOfRange { index: col, len: self.len() })
    }

    /// Stores `value` at `col`, returning the element it replaced.
    pub fn set(&mut self, col: usize, value: T) -> Result<T>
    {
        check_index(col, self.len())?;
        Ok(S::replace(&mut *self.slice, col, value))
    }

    pub fn iter_mut(&mut self) -> S::IterMut<'_>
    {
        S::iter_mut(&mut *self.slice)
    }
}

impl<'a, T, S: Storage<T> + 'a> Deref for RowViewMut<'a, T, S> {
    type Target = S::Slice;

    fn deref(&self) -> &S::Slice
    {
        &*self.slice
    }
}

impl<'a, T, S: Storage<T> + 'a> DerefMut for RowViewMut<'a, T, S> {
    fn deref_mut(&mut self) -> &mut S::Slice
    {
        &mut *self.slice
    }
}

impl<'a, T, S: Storage<T> + 'a> Iterator for RowsIter<'a, T, S> {
    type Item = RowView<'a, T, S>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.front >= self.back {
            return None;
        }

        let row = RowView::new(self.buffer.row(self.front));
        self.front += 1;

        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T, S: Storage<T> + 'a> DoubleEndedIterator for RowsIter<'a, T, S> {
    fn next_back(&mut self) -> Option<Self::Item>
    {
        if self.front >= self.back {
            return None;
        }

        self.back -= 1;
        Some(RowView::new(self.buffer.row(self.back)))
    }
}

impl<'a, T, S: Storage<T> + 'a> ExactSizeIterator for RowsIter<'a, T, S> {}

impl<T: Default, S: Storage<T>> Grid<T, S> {
    /// Creates a `height` x `width` grid of default values.
    pub fn new(height: usize, width: usize) -> Result<Self>
    {
        Self::filled(height, width, T::default())
    }
}

impl<T, S: Storage<T>> Grid<T, S> {
    pub fn filled(height: usize, width: usize, value: T) -> Result<Self>
    {
        Ok(Self::from_buffer(SharedBuffer::filled(height, width, value)?))
    }

    /// Builds a grid from exactly `height * width` elements in row-major
    /// order.
    pub fn from_iter<I>(height: usize, width: usize, iter: I) -> Result<Self>
        where I: IntoIterator<Item = T>
    {
        Ok(Self::from_buffer(SharedBuffer::from_iter(height, width, iter)?))
    }

    fn from_buffer(buffer: SharedBuffer<T, S>) -> Self
    {
        Self { handle: Handle::new(buffer) }
    }

    pub fn height(&self) -> usize
    {
        self.handle.read().height()
    }

    pub fn width(&self) -> usize
    {
        self.handle.read().width()
    }

    pub fn len(&self) -> usize
    {
        self.handle.read().len()
    }

    pub fn row(&self, idx: usize) -> Result<RowView<'_, T, S>>
    {
        check_index(idx, self.height())?;
        Ok(RowView::new(self.handle.read().row(idx)))
    }

    /// Writable view of row `idx`.
    ///
    /// Forks the buffer if it is shared and marks it unshareable, even if
    /// nothing is written through the view.
    pub fn row_mut(&mut self, idx: usize) -> Result<RowViewMut<'_, T, S>>
    {
        check_index(idx, self.height())?;
        let buffer = self.handle.write()?;
        Ok(RowViewMut::new(buffer.row_mut(idx)))
    }

    pub fn at(&self, row: usize, col: usize) -> Result<S::Ref<'_>>
    {
        self.row(row)?.get(col)
    }

    /// Stores `value` at (`row`, `col`), returning the element it replaced.
    /// Both indices are checked before write access is taken.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<T>
    {
        check_index(row, self.height())?;
        check_index(col, self.width())?;

        let idx = row * self.width() + col;
        let buffer = self.handle.write()?;
        Ok(S::replace(buffer.elements_mut(), idx, value))
    }

    pub fn rows(&self) -> RowsIter<'_, T, S>
    {
        RowsIter {
            buffer: self.handle.read(),
            front: 0,
            back: self.height(),
        }
    }

    /// All elements in row-major order.
    pub fn iter(&self) -> S::Iter<'_>
    {
        S::iter(self.handle.read().elements())
    }

    /// Mutable iteration in row-major order; takes write access like
    /// [`row_mut`](Self::row_mut).
    pub fn iter_mut(&mut self) -> Result<S::IterMut<'_>>
    {
        Ok(S::iter_mut(self.handle.write()?.elements_mut()))
    }

    pub fn as_slice(&self) -> &S::Slice
    {
        self.handle.read().elements()
    }

    pub(crate) fn as_mut_slice(&mut self) -> Result<&mut S::Slice>
    {
        Ok(self.handle.write()?.elements_mut())
    }

    pub(crate) fn replace_buffer(&mut self, buffer: SharedBuffer<T, S>)
    {
        self.handle.replace(buffer);
    }

    /// Copies the grid, sharing the buffer unless it has been written to.
    pub fn try_clone(&self) -> Result<Self>
    {
        Ok(Self { handle: self.handle.try_clone()? })
    }

    pub fn swap(&mut self, other: &mut Self)
    {
        std::mem::swap(&mut self.handle, &mut other.handle);
    }

    /// Number of grids currently sharing this grid's buffer.
    pub fn ref_count(&self) -> usize
    {
        self.handle.ref_count()
    }

    pub fn is_shareable(&self) -> bool
    {
        self.handle.read().is_shareable()
    }

    pub fn shares_buffer_with(&self, other: &Self) -> bool
    {
        self.handle.ptr_eq(&other.handle)
    }
}

impl<T, S: Storage<T>> Clone for Grid<T, S> {
    fn clone(&self) -> Self
    {
        Self { handle: self.handle.clone() }
    }
}

impl<T, S: Storage<T>> PartialEq for Grid<T, S>
    where S::Slice: PartialEq
{
    fn eq(&self, other: &Self) -> bool
    {
        if std::ptr::eq(self, other) || self.shares_buffer_with(other) {
            return true;
        }

        self.height() == other.height()
            && self.width() == other.width()
            && self.as_slice() == other.as_slice()
    }
}

impl<T, S: Storage<T>> Eq for Grid<T, S> where S::Slice: Eq {}

impl<T, S: Storage<T>> fmt::Debug for Grid<T, S>
    where S::Slice: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_list()
            .entries(self.rows().map(|row| row.as_slice()))
            .finish()
    }
}

impl<T, S: Storage<T>> Index<usize> for Grid<T, S> {
    type Output = S::Slice;

    fn index(&self, idx: usize) -> &S::Slice
    {
        match self.row(idx) {
            Ok(row) => row.as_slice(),
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T, S: Storage<T>> IndexMut<usize> for Grid<T, S> {
    fn index_mut(&mut self, idx: usize) -> &mut S::Slice
    {
        if let Err(err) = check_index(idx, self.height()) {
            panic!("{}", err);
        }

        let layout = S::layout(self.len());
        match self.handle.write() {
            Ok(buffer) => buffer.row_mut(idx),
            Err(_) => handle_alloc_error(layout),
        }
    }
}

impl<'a, T, S: Storage<T>> IntoIterator for &'a Grid<T, S> {
    type Item = S::Ref<'a>;
    type IntoIter = S::Iter<'a>;

    fn into_iter(self) -> S::Iter<'a>
    {
        self.iter()
    }
}
