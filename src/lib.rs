//! Two-dimensional arrays with implicit sharing.
//!
//! Copies of a [`Grid`] or [`Matrix`] share one reference-counted buffer
//! until one of them takes write access, which gives the writer a private
//! copy (copy-on-write). Once a grid has been written through, its buffer is
//! no longer shared lazily: later copies of it are cloned immediately.
//!
//! ```
//! use cowgrid::{Grid, Matrix};
//!
//! let a: Grid<i32> = Grid::filled(2, 2, 0).unwrap();
//! let mut b = a.clone();
//! assert!(a.shares_buffer_with(&b));
//!
//! b[1][1] = 9;
//! assert_eq!(*a.at(1, 1).unwrap(), 0);
//! assert_eq!(*b.at(1, 1).unwrap(), 9);
//!
//! let mut m: Matrix<i32> = Matrix::from_iter(3, 1..=9).unwrap();
//! m.transpose().unwrap();
//! assert_eq!(m.format(" ", "\n").unwrap(), "1 4 7 \n2 5 8 \n3 6 9 \n");
//! ```
//!
//! Booleans can be stored one bit each through [`BitGrid`] and
//! [`BitMatrix`].
//!
//! Reference counts are not atomic; none of these types are `Send` or
//! `Sync`.

mod buffer;
mod handle;

pub mod error;
pub mod grid;
pub mod matrix;
pub mod storage;

pub use error::{ErrorKind, GridError, Result};
pub use grid::{BitGrid, Grid, RowView, RowViewMut, RowsIter};
pub use matrix::{BitMatrix, FormatOptions, Matrix};
pub use storage::Storage;
