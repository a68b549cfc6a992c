use std::fmt;
use std::io;
use cowgrid::{ErrorKind, FormatOptions, Grid, GridError, Matrix, Result};
use itertools::iproduct;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn init_logger()
{
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Clone, Default)]
struct Cell(Option<i32>);

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self.0 {
            Some(value) => write!(f, "{}", value),
            None => Err(fmt::Error),
        }
    }
}

fn sample() -> Matrix<i32>
{
    Matrix::from_iter(3, 1..=9).unwrap()
}

#[test]
fn test_transpose_scenario() -> Result<()>
{
    init_logger();

    let mut m = sample();
    m.transpose()?;

    let expected: Matrix<i32> = Matrix::from_iter(3, [1, 4, 7, 2, 5, 8, 3, 6, 9])?;
    assert_eq!(m, expected);
    assert_eq!(m.format(" ", "\n").unwrap(), "1 4 7 \n2 5 8 \n3 6 9 \n");

    Ok(())
}

#[test]
fn test_transpose_is_an_involution() -> Result<()>
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);

    for size in 1..12 {
        let original: Matrix<u64> =
            Matrix::from_iter(size, (0..size * size).map(|_| rng.gen()))?;
        let mut m = original.try_clone()?;

        m.transpose()?.transpose()?;
        assert_eq!(m, original);

        m.transpose()?;
        for (i, j) in iproduct!(0..size, 0..size) {
            assert_eq!(m.at(i, j)?, original.at(j, i)?);
        }
    }

    Ok(())
}

#[test]
fn test_transpose_forks_shared_buffer_once() -> Result<()>
{
    init_logger();

    let original = sample();
    let mut m = original.clone();
    assert!(m.shares_buffer_with(&original));

    m.transpose()?;

    assert!(!m.shares_buffer_with(&original));
    assert_eq!(original, sample());
    assert_eq!(original.ref_count(), 1);
    assert_eq!(m.ref_count(), 1);
    assert!(!m.is_shareable());
    assert!(original.is_shareable());

    Ok(())
}

#[test]
fn test_at_bounds() -> Result<()>
{
    let m: Matrix<i32> = Matrix::new(3)?;

    for (i, j) in iproduct!(0..3, 0..3) {
        assert_eq!(*m.at(i, j)?, 0);
    }
    assert_eq!(m.at(3, 0).unwrap_err(), GridError::IndexOutOfRange { index: 3, len: 3 });
    assert_eq!(m.at(0, 3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);

    Ok(())
}

#[test]
fn test_zero_size_is_rejected()
{
    assert_eq!(Matrix::<i32>::new(0).unwrap_err().kind(), ErrorKind::InvalidDimension);
    assert_eq!(Matrix::<i32>::filled(0, 1).unwrap_err().kind(), ErrorKind::InvalidDimension);
}

#[test]
fn test_default_is_three_by_three()
{
    let m: Matrix<f64> = Matrix::default();
    assert_eq!(m.size(), 3);
    assert_eq!((m.height(), m.width()), (3, 3));
    assert!(m.iter().all(|&x| x == 0.0));
}

#[test]
fn test_try_from_grid_checks_squareness() -> Result<()>
{
    let square: Grid<i32> = Grid::from_iter(2, 2, 1..=4)?;
    let m = Matrix::try_from(square)?;
    assert_eq!(m.size(), 2);

    let wide: Grid<i32> = Grid::new(2, 3)?;
    let err = Matrix::try_from(wide).unwrap_err();
    assert_eq!(err, GridError::NotSquare { height: 2, width: 3 });

    assert_eq!(m.into_grid().width(), 2);

    Ok(())
}

#[test]
fn test_assign() -> Result<()>
{
    init_logger();

    let mut m: Matrix<i32> = Matrix::new(3)?;
    let source = sample();

    m.assign(source.as_grid())?;
    assert_eq!(m, source);
    assert!(m.shares_buffer_with(&source));

    let rect: Grid<i32> = Grid::new(3, 2)?;
    assert_eq!(m.assign(&rect).unwrap_err(), GridError::NotSquare { height: 3, width: 2 });

    let small: Grid<i32> = Grid::new(2, 2)?;
    assert_eq!(m.assign(&small).unwrap_err().kind(), ErrorKind::NotSquare);

    assert_eq!(m, source);

    Ok(())
}

#[test]
fn test_assign_from_tainted_source_copies() -> Result<()>
{
    let mut source = sample();
    source.set(0, 0, 10)?;

    let mut m: Matrix<i32> = Matrix::new(3)?;
    m.assign(source.as_grid())?;

    assert!(!m.shares_buffer_with(&source));
    assert_eq!(*m.at(0, 0)?, 10);

    Ok(())
}

#[test]
fn test_refill() -> Result<()>
{
    let mut m = sample();
    let other = m.clone();

    m.refill((10..19).rev())?;
    assert_eq!(m.row(0)?.as_slice(), &[18, 17, 16]);
    assert_eq!(other, sample());

    let err = m.refill(0..4).unwrap_err();
    assert_eq!(err, GridError::LengthMismatch { expected: 9, actual: 4 });
    assert_eq!(m.row(0)?.as_slice(), &[18, 17, 16]);

    let err = m.refill(std::iter::repeat(1)).unwrap_err();
    assert_eq!(err, GridError::LengthMismatch { expected: 9, actual: 10 });
    assert_eq!(m.row(0)?.as_slice(), &[18, 17, 16]);

    Ok(())
}

#[test]
fn test_format_options() -> Result<()>
{
    let m: Matrix<i32> = Matrix::from_iter(2, 1..=4)?;

    assert_eq!(m.to_string(), "1 2 \n3 4 \n");

    let options = FormatOptions::default().separator(",").line_break(";");
    assert_eq!(m.format_with(&options).unwrap(), "1,2,;3,4,;");

    let mut out = Vec::new();
    m.print(&mut out, &options).unwrap();
    assert_eq!(out, b"1,2,;3,4,;");

    Ok(())
}

#[test]
fn test_failing_element_display_is_reported() -> Result<()>
{
    let mut m: Matrix<Cell> = Matrix::filled(2, Cell(Some(1)))?;
    assert_eq!(m.format(" ", "\n").unwrap(), "1 1 \n1 1 \n");

    m.set(1, 0, Cell(None))?;
    assert_eq!(m.format(" ", "\n"), Err(fmt::Error));

    let mut out = Vec::new();
    let err = m.print(&mut out, &FormatOptions::default()).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert!(out.is_empty());

    Ok(())
}

#[test]
fn test_format_never_forks() -> Result<()>
{
    let m = sample();
    let copy = m.clone();

    let _ = m.format("\t", "\n");
    let _ = copy.to_string();

    assert!(m.shares_buffer_with(&copy));
    assert!(m.is_shareable());

    Ok(())
}

#[test]
fn test_index_syntax() -> Result<()>
{
    let mut m = sample();
    let copy = m.clone();

    m[2][0] = 0;

    assert_eq!(m[2][0], 0);
    assert_eq!(copy[2][0], 7);

    Ok(())
}

#[test]
fn test_swap() -> Result<()>
{
    let mut a = sample();
    let mut b: Matrix<i32> = Matrix::filled(2, 1)?;

    a.swap(&mut b);
    assert_eq!(a.size(), 2);
    assert_eq!(b, sample());

    Ok(())
}
