//! Element storage strategies.
//!
//! A [`Storage`] owns the flattened, row-major elements of a buffer. Plain
//! element types are stored in a `Vec<T>`; booleans can be bit-packed in a
//! [`BitVec`], which exposes rows as [`BitSlice`]s instead of `[bool]`.
//!
//! Every constructor reserves the exact capacity up front, so an allocation
//! failure is reported before any element is built and nothing is leaked.

use std::alloc::Layout;
use std::ops::{Deref, Range};
use bitvec::prelude::{BitSlice, BitVec, Lsb0};
use bitvec::ptr::{BitRef, Const};
use super::error::{GridError, Result};

pub trait Storage<T>: Sized {
    /// Borrowed view type of a contiguous run of elements.
    type Slice: ?Sized;

    type Ref<'a>: Deref<Target = T> where Self: 'a;

    type Iter<'a>: Iterator<Item = Self::Ref<'a>> + DoubleEndedIterator + ExactSizeIterator
        where Self: 'a;

    type IterMut<'a>: DoubleEndedIterator + ExactSizeIterator where Self: 'a;

    fn try_filled(len: usize, value: T) -> Result<Self>;

    /// Builds storage from exactly `len` elements of `iter`.
    fn try_collect<I: IntoIterator<Item = T>>(len: usize, iter: I) -> Result<Self>;

    fn try_clone(&self) -> Result<Self>;

    /// Memory layout of `len` elements, reported when an infallible copy
    /// has to give up.
    fn layout(len: usize) -> Layout;

    fn as_slice(&self) -> &Self::Slice;
    fn as_mut_slice(&mut self) -> &mut Self::Slice;

    fn slice_len(slice: &Self::Slice) -> usize;
    fn subslice(slice: &Self::Slice, range: Range<usize>) -> &Self::Slice;
    fn subslice_mut(slice: &mut Self::Slice, range: Range<usize>) -> &mut Self::Slice;

    fn get<'a>(slice: &'a Self::Slice, index: usize) -> Option<Self::Ref<'a>>
        where Self: 'a;

    /// Stores `value` at `index` and returns the previous element.
    /// `index` must already be checked by the caller.
    fn replace(slice: &mut Self::Slice, index: usize, value: T) -> T;

    fn swap(slice: &mut Self::Slice, a: usize, b: usize);

    fn iter<'a>(slice: &'a Self::Slice) -> Self::Iter<'a> where Self: 'a;
    fn iter_mut<'a>(slice: &'a mut Self::Slice) -> Self::IterMut<'a> where Self: 'a;
}

fn reserve<E>(len: usize) -> Result<Vec<E>>
{
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| GridError::AllocationFailure { elements: len })?;
    Ok(data)
}

/// Checks that `iter` supplied `len` elements and has nothing left over.
///
/// Only one element past `len` is pulled, so unbounded sources are
/// rejected too; `actual` is then `len + 1`.
fn check_exhausted(len: usize, taken: usize, mut rest: impl Iterator) -> Result<()>
{
    if taken < len {
        return Err(GridError::LengthMismatch { expected: len, actual: taken });
    }

    if rest.next().is_some() {
        return Err(GridError::LengthMismatch { expected: len, actual: len.saturating_add(1) });
    }

    Ok(())
}

impl<T: Clone> Storage<T> for Vec<T> {
    type Slice = [T];
    type Ref<'a> = &'a T where Self: 'a;
    type Iter<'a> = std::slice::Iter<'a, T> where Self: 'a;
    type IterMut<'a> = std::slice::IterMut<'a, T> where Self: 'a;

    fn try_filled(len: usize, value: T) -> Result<Self>
    {
        let mut data = reserve(len)?;
        data.resize(len, value);
        Ok(data)
    }

    fn try_collect<I: IntoIterator<Item = T>>(len: usize, iter: I) -> Result<Self>
    {
        let mut data = reserve(len)?;
        let mut iter = iter.into_iter();
        data.extend(iter.by_ref().take(len));
        check_exhausted(len, data.len(), iter)?;
        Ok(data)
    }

    fn try_clone(&self) -> Result<Self>
    {
        let mut data = reserve(self.len())?;
        data.extend_from_slice(self);
        Ok(data)
    }

    fn layout(len: usize) -> Layout
    {
        Layout::array::<T>(len).unwrap_or_else(|_| Layout::new::<T>())
    }

    fn as_slice(&self) -> &[T]
    {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T]
    {
        self
    }

    fn slice_len(slice: &[T]) -> usize
    {
        slice.len()
    }

    fn subslice(slice: &[T], range: Range<usize>) -> &[T]
    {
        &slice[range]
    }

    fn subslice_mut(slice: &mut [T], range: Range<usize>) -> &mut [T]
    {
        &mut slice[range]
    }

    fn get<'a>(slice: &'a [T], index: usize) -> Option<&'a T>
        where Self: 'a
    {
        slice.get(index)
    }

    fn replace(slice: &mut [T], index: usize, value: T) -> T
    {
        std::mem::replace(&mut slice[index], value)
    }

    fn swap(slice: &mut [T], a: usize, b: usize)
    {
        slice.swap(a, b);
    }

    fn iter<'a>(slice: &'a [T]) -> Self::Iter<'a>
        where Self: 'a
    {
        slice.iter()
    }

    fn iter_mut<'a>(slice: &'a mut [T]) -> Self::IterMut<'a>
        where Self: 'a
    {
        slice.iter_mut()
    }
}

fn word_count(bits: usize) -> usize
{
    bits / usize::BITS as usize + usize::from(bits % usize::BITS as usize != 0)
}

impl Storage<bool> for BitVec {
    type Slice = BitSlice;
    type Ref<'a> = BitRef<'a, Const, usize, Lsb0>;
    type Iter<'a> = bitvec::slice::Iter<'a, usize, Lsb0>;
    type IterMut<'a> = bitvec::slice::IterMut<'a, usize, Lsb0>;

    fn try_filled(len: usize, value: bool) -> Result<Self>
    {
        let words = word_count(len);
        let mut raw = reserve::<usize>(words)?;
        raw.resize(words, if value { !0 } else { 0 });

        let mut bits = BitVec::from_vec(raw);
        bits.truncate(len);
        Ok(bits)
    }

    fn try_collect<I: IntoIterator<Item = bool>>(len: usize, iter: I) -> Result<Self>
    {
        let mut bits = Self::try_filled(len, false)?;
        let mut iter = iter.into_iter();

        let mut taken = 0;
        for (idx, bit) in iter.by_ref().take(len).enumerate() {
            bits.set(idx, bit);
            taken += 1;
        }
        check_exhausted(len, taken, iter)?;

        Ok(bits)
    }

    fn try_clone(&self) -> Result<Self>
    {
        let raw_words = self.as_raw_slice();
        let mut raw = reserve::<usize>(raw_words.len())?;
        raw.extend_from_slice(raw_words);

        let mut bits = BitVec::from_vec(raw);
        bits.truncate(self.len());
        Ok(bits)
    }

    fn layout(len: usize) -> Layout
    {
        Layout::array::<usize>(word_count(len)).unwrap_or_else(|_| Layout::new::<usize>())
    }

    fn as_slice(&self) -> &BitSlice
    {
        self.as_bitslice()
    }

    fn as_mut_slice(&mut self) -> &mut BitSlice
    {
        self.as_mut_bitslice()
    }

    fn slice_len(slice: &BitSlice) -> usize
    {
        slice.len()
    }

    fn subslice(slice: &BitSlice, range: Range<usize>) -> &BitSlice
    {
        &slice[range]
    }

    fn subslice_mut(slice: &mut BitSlice, range: Range<usize>) -> &mut BitSlice
    {
        &mut slice[range]
    }

    fn get<'a>(slice: &'a BitSlice, index: usize) -> Option<Self::Ref<'a>>
        where Self: 'a
    {
        slice.get(index)
    }

    fn replace(slice: &mut BitSlice, index: usize, value: bool) -> bool
    {
        slice.replace(index, value)
    }

    fn swap(slice: &mut BitSlice, a: usize, b: usize)
    {
        slice.swap(a, b);
    }

    fn iter<'a>(slice: &'a BitSlice) -> Self::Iter<'a>
        where Self: 'a
    {
        slice.iter()
    }

    fn iter_mut<'a>(slice: &'a mut BitSlice) -> Self::IterMut<'a>
        where Self: 'a
    {
        slice.iter_mut()
    }
}
