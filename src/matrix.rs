use std::alloc::handle_alloc_error;
use std::fmt;
use std::io;
use std::ops::{Index, IndexMut};
use bitvec::vec::BitVec;
use delegate::delegate;
use itertools::iproduct;
use log::trace;
use super::buffer::SharedBuffer;
use super::error::{GridError, Result};
use super::grid::{Grid, RowView, RowViewMut, RowsIter};
use super::storage::Storage;

const DEFAULT_SIZE: usize = 3;

/// Square [`Grid`]. Height and width are equal at construction and no
/// operation can change that.
pub struct Matrix<T, S = Vec<T>> {
    grid: Grid<T, S>,
}

pub type BitMatrix = Matrix<bool, BitVec>;

/// Separators used when rendering a matrix as text.
///
/// Every element is followed by `separator` and every row by `line_break`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub separator: String,
    pub line_break: String,
}

impl Default for FormatOptions {
    fn default() -> Self
    {
        Self {
            separator: String::from(" "),
            line_break: String::from("\n"),
        }
    }
}

impl FormatOptions {
    pub fn separator(mut self, separator: impl Into<String>) -> Self
    {
        self.separator = separator.into();
        self
    }

    pub fn line_break(mut self, line_break: impl Into<String>) -> Self
    {
        self.line_break = line_break.into();
        self
    }
}

fn check_square(height: usize, width: usize, size: Option<usize>) -> Result<()>
{
    if height != width || size.map_or(false, |size| size != height) {
        return Err(GridError::NotSquare { height, width });
    }
    Ok(())
}

impl<T: Default, S: Storage<T>> Matrix<T, S> {
    /// `size` x `size` matrix of default values.
    pub fn new(size: usize) -> Result<Self>
    {
        Ok(Self { grid: Grid::new(size, size)? })
    }
}

impl<T: Default, S: Storage<T>> Default for Matrix<T, S> {
    fn default() -> Self
    {
        match Self::new(DEFAULT_SIZE) {
            Ok(matrix) => matrix,
            Err(_) => handle_alloc_error(S::layout(DEFAULT_SIZE * DEFAULT_SIZE)),
        }
    }
}

impl<T, S: Storage<T>> Matrix<T, S> {
    pub fn filled(size: usize, value: T) -> Result<Self>
    {
        Ok(Self { grid: Grid::filled(size, size, value)? })
    }

    pub fn from_iter<I>(size: usize, iter: I) -> Result<Self>
        where I: IntoIterator<Item = T>
    {
        Ok(Self { grid: Grid::from_iter(size, size, iter)? })
    }

    /// Side length.
    pub fn size(&self) -> usize
    {
        self.grid.height()
    }

    delegate! {
        to self.grid {
            pub fn height(&self) -> usize;
            pub fn width(&self) -> usize;
            pub fn len(&self) -> usize;
            pub fn row(&self, idx: usize) -> Result<RowView<'_, T, S>>;
            pub fn row_mut(&mut self, idx: usize) -> Result<RowViewMut<'_, T, S>>;
            pub fn at(&self, row: usize, col: usize) -> Result<S::Ref<'_>>;
            pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<T>;
            pub fn rows(&self) -> RowsIter<'_, T, S>;
            pub fn iter(&self) -> S::Iter<'_>;
            pub fn iter_mut(&mut self) -> Result<S::IterMut<'_>>;
            pub fn as_slice(&self) -> &S::Slice;
            pub fn ref_count(&self) -> usize;
            pub fn is_shareable(&self) -> bool;
        }
    }

    pub fn shares_buffer_with(&self, other: &Self) -> bool
    {
        self.grid.shares_buffer_with(&other.grid)
    }

    pub fn try_clone(&self) -> Result<Self>
    {
        Ok(Self { grid: self.grid.try_clone()? })
    }

    pub fn swap(&mut self, other: &mut Self)
    {
        self.grid.swap(&mut other.grid);
    }

    pub fn as_grid(&self) -> &Grid<T, S>
    {
        &self.grid
    }

    pub fn into_grid(self) -> Grid<T, S>
    {
        self.grid
    }

    /// Transposes in place. The whole operation takes write access once,
    /// so a shared buffer is forked at most once.
    pub fn transpose(&mut self) -> Result<&mut Self>
    {
        let size = self.size();
        trace!("transposing {}x{} matrix", size, size);

        let elements = self.grid.as_mut_slice()?;
        for (i, j) in iproduct!(0..size, 0..size).filter(|(i, j)| j < i) {
            S::swap(elements, i * size + j, j * size + i);
        }

        Ok(self)
    }

    /// Makes this matrix a copy of `source`, which must be square and of
    /// the same size.
    pub fn assign(&mut self, source: &Grid<T, S>) -> Result<()>
    {
        check_square(source.height(), source.width(), Some(self.size()))?;
        self.grid = source.try_clone()?;
        Ok(())
    }

    /// Replaces the contents with exactly `size * size` new elements in
    /// row-major order. On error the matrix is left untouched.
    pub fn refill<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<()>
    {
        let size = self.size();
        self.grid.replace_buffer(SharedBuffer::from_iter(size, size, iter)?);
        Ok(())
    }
}

impl<T: fmt::Display, S: Storage<T>> Matrix<T, S> {
    fn render<W: fmt::Write>(&self, out: &mut W, options: &FormatOptions) -> fmt::Result
    {
        for row in self.grid.rows() {
            for elem in row {
                write!(out, "{}{}", &*elem, options.separator)?;
            }
            out.write_str(&options.line_break)?;
        }
        Ok(())
    }

    /// Renders the matrix. Fails only if an element's `Display` does.
    pub fn format_with(&self, options: &FormatOptions) -> std::result::Result<String, fmt::Error>
    {
        let mut out = String::new();
        self.render(&mut out, options)?;
        Ok(out)
    }

    pub fn format(&self, separator: &str, line_break: &str)
        -> std::result::Result<String, fmt::Error>
    {
        self.format_with(&FormatOptions::default()
            .separator(separator)
            .line_break(line_break))
    }

    pub fn print<W: io::Write>(&self, out: &mut W, options: &FormatOptions) -> io::Result<()>
    {
        let text = self.format_with(options)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        out.write_all(text.as_bytes())
    }
}

impl<T: fmt::Display, S: Storage<T>> fmt::Display for Matrix<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        self.render(f, &FormatOptions::default())
    }
}

impl<T, S: Storage<T>> fmt::Debug for Matrix<T, S>
    where S::Slice: fmt::Debug
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        f.debug_tuple("Matrix").field(&self.grid).finish()
    }
}

impl<T, S: Storage<T>> Clone for Matrix<T, S> {
    fn clone(&self) -> Self
    {
        Self { grid: self.grid.clone() }
    }
}

impl<T, S: Storage<T>> PartialEq for Matrix<T, S>
    where S::Slice: PartialEq
{
    fn eq(&self, other: &Self) -> bool
    {
        self.grid == other.grid
    }
}

impl<T, S: Storage<T>> Eq for Matrix<T, S> where S::Slice: Eq {}

impl<T, S: Storage<T>> TryFrom<Grid<T, S>> for Matrix<T, S> {
    type Error = GridError;

    fn try_from(grid: Grid<T, S>) -> Result<Self>
    {
        check_square(grid.height(), grid.width(), None)?;
        Ok(Self { grid })
    }
}

impl<T, S: Storage<T>> Index<usize> for Matrix<T, S> {
    type Output = S::Slice;

    fn index(&self, idx: usize) -> &S::Slice
    {
        &self.grid[idx]
    }
}

impl<T, S: Storage<T>> IndexMut<usize> for Matrix<T, S> {
    fn index_mut(&mut self, idx: usize) -> &mut S::Slice
    {
        &mut self.grid[idx]
    }
}

impl<'a, T, S: Storage<T>> IntoIterator for &'a Matrix<T, S> {
    type Item = S::Ref<'a>;
    type IntoIter = S::Iter<'a>;

    fn into_iter(self) -> S::Iter<'a>
    {
        self.grid.iter()
    }
}
