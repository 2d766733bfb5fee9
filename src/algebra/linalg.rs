//! Vectors and matrices over expressions.
//!
//! Matrices are immutable: every operation here returns a new matrix, and
//! "substituting" a solved unknown produces a fresh copy. Vectors are column
//! matrices (`n x 1`).

use crate::{
    algebra::{
        expr::{Equation, Expr, Unknown},
        value::Value,
    },
    error::{Error, Result},
};
use std::fmt;

/// A dense, row-major matrix of expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    entries: Vec<Expr>,
}

impl Matrix {
    /// Create a matrix from row-major entries.
    pub fn new(rows: usize, cols: usize, entries: Vec<Expr>) -> Result<Self> {
        if entries.len() != rows * cols {
            Err(Error::Shape(format!("{} entries cannot fill a {}x{} matrix", entries.len(), rows, cols)))?;
        }
        Ok(Self { rows, cols, entries })
    }

    /// Create a matrix from a list of rows, which must all be the same length.
    pub fn from_rows(rows: Vec<Vec<Expr>>) -> Result<Self> {
        let num_rows = rows.len();
        let num_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != num_cols) {
            Err(Error::Shape("ragged rows".into()))?;
        }
        Self::new(num_rows, num_cols, rows.into_iter().flatten().collect())
    }

    /// Create a matrix of numeric entries.
    pub fn from_values(rows: Vec<Vec<Value>>) -> Result<Self> {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(Expr::from).collect())
                .collect()
        )
    }

    pub fn identity(side: usize) -> Self {
        let entries = (0..side * side)
            .map(|idx| if idx / side == idx % side { Expr::constant(Value::one()) } else { Expr::zero() })
            .collect();
        Self { rows: side, cols: side, entries }
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The side length of a square matrix.
    pub fn side(&self) -> Option<usize> {
        if self.rows == self.cols { Some(self.rows) } else { None }
    }

    pub fn is_vector(&self) -> bool {
        self.cols == 1
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Expr> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.entries.get(row * self.cols + col)
    }

    /// All entries in row-major order.
    pub fn entries(&self) -> &[Expr] {
        &self.entries
    }

    pub fn transpose(&self) -> Matrix {
        let entries = (0..self.rows * self.cols)
            .map(|idx| {
                let (row, col) = (idx % self.rows, idx / self.rows);
                self.entries[row * self.cols + col].clone()
            })
            .collect();
        Matrix { rows: self.cols, cols: self.rows, entries }
    }

    /// Matrix product `self * rhs`.
    pub fn mul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            Err(Error::Shape(format!("cannot multiply {:?} by {:?}", self.shape(), rhs.shape())))?;
        }
        let mut entries = Vec::with_capacity(self.rows * rhs.cols);
        for row in 0..self.rows {
            for col in 0..rhs.cols {
                let entry = (0..self.cols).fold(Expr::zero(), |acc, k| {
                    acc + &self.entries[row * self.cols + k] * &rhs.entries[k * rhs.cols + col]
                });
                entries.push(entry);
            }
        }
        Matrix::new(self.rows, rhs.cols, entries)
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &str, f: F) -> Result<Matrix>
        where F: Fn(&Expr, &Expr) -> Expr,
    {
        if self.shape() != rhs.shape() {
            Err(Error::Shape(format!("cannot {} {:?} and {:?}", op, self.shape(), rhs.shape())))?;
        }
        let entries = self.entries.iter()
            .zip(rhs.entries.iter())
            .map(|(a, b)| f(a, b))
            .collect();
        Matrix::new(self.rows, self.cols, entries)
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    /// Multiply every entry by a scalar expression.
    pub fn scale(&self, factor: &Expr) -> Matrix {
        self.map(|entry| factor * entry)
    }

    fn map<F: Fn(&Expr) -> Expr>(&self, f: F) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            entries: self.entries.iter().map(f).collect(),
        }
    }

    /// Replace an unknown with a value in every entry.
    pub fn subs(&self, unknown: &Unknown, val: &Value) -> Matrix {
        self.map(|entry| entry.subs(unknown.name(), val))
    }

    /// Apply a series of substitutions to every entry.
    pub fn subs_all(&self, unknowns: &[Unknown], vals: &[Value]) -> Matrix {
        self.map(|entry| entry.subs_all(unknowns.iter().zip(vals.iter())))
    }

    /// Determinant by cofactor expansion along the first row. The matrices
    /// we deal with have a handful of rows so this is plenty.
    pub fn determinant(&self) -> Result<Expr> {
        let side = self.side()
            .ok_or_else(|| Error::Shape(format!("determinant of non-square {:?}", self.shape())))?;
        Ok(determinant(&self.entries, side))
    }

    /// The numeric entries of this matrix, row-major. Fails if any entry still
    /// holds an unknown.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.entries.iter()
            .map(|entry| entry.as_value().ok_or_else(|| Error::NonConstant(entry.to_string())))
            .collect()
    }
}

fn determinant(entries: &[Expr], side: usize) -> Expr {
    match side {
        0 => Expr::constant(Value::one()),
        1 => entries[0].clone(),
        _ => {
            let mut det = Expr::zero();
            for col in 0..side {
                let minor: Vec<Expr> = (1..side)
                    .flat_map(|r| (0..side).filter(move |c| *c != col).map(move |c| (r, c)))
                    .map(|(r, c)| entries[r * side + c].clone())
                    .collect();
                let term = &entries[col] * &determinant(&minor, side - 1);
                det = if col % 2 == 0 { det + term } else { det - term };
            }
            det
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = (0..self.rows)
            .map(|r| {
                let row = (0..self.cols)
                    .map(|c| self.entries[r * self.cols + c].to_string())
                    .collect::<Vec<_>>();
                format!("[{}]", row.join(", "))
            })
            .collect::<Vec<_>>();
        write!(f, "[{}]", rows.join(", "))
    }
}

/// Build a column vector.
pub fn vector(entries: Vec<Expr>) -> Matrix {
    let rows = entries.len();
    Matrix { rows, cols: 1, entries }
}

/// Build a column vector of numeric values.
pub fn value_vector(entries: Vec<Value>) -> Matrix {
    vector(entries.into_iter().map(Expr::from).collect())
}

fn assert_vector(v: &Matrix, what: &str) -> Result<()> {
    if !v.is_vector() {
        Err(Error::Shape(format!("{} expects a column vector, got {:?}", what, v.shape())))?;
    }
    Ok(())
}

/// `Σ v1_i * v2_i` for two column vectors of equal length.
pub fn dot(v1: &Matrix, v2: &Matrix) -> Result<Expr> {
    assert_vector(v1, "dot")?;
    assert_vector(v2, "dot")?;
    if v1.rows != v2.rows {
        Err(Error::Shape(format!("dot of vectors with lengths {} and {}", v1.rows, v2.rows)))?;
    }
    let product = v1.transpose().mul(v2)?;
    if product.shape() != (1, 1) {
        Err(Error::Shape(format!("dot produced {:?}", product.shape())))?;
    }
    Ok(product.entries[0].clone())
}

/// Sum the entries of a column vector.
pub fn sum_vector(v: &Matrix) -> Result<Expr> {
    assert_vector(v, "sum_vector")?;
    Ok(v.entries.iter().fold(Expr::zero(), |acc, x| &acc + x))
}

/// Element-wise product of two same-shaped matrices.
pub fn hadamard(m1: &Matrix, m2: &Matrix) -> Result<Matrix> {
    m1.zip_with(m2, "take the hadamard product of", |a, b| a * b)
}

/// Element-wise reciprocal. Every entry must be a nonzero number.
pub fn hadamard_inverse(m: &Matrix) -> Result<Matrix> {
    let entries = m.entries.iter()
        .enumerate()
        .map(|(idx, entry)| -> Result<Expr> {
            let val = entry.as_value().ok_or_else(|| Error::NonConstant(entry.to_string()))?;
            let inv = val.recip().ok_or(Error::Division { row: idx / m.cols, col: idx % m.cols })?;
            Ok(Expr::constant(inv))
        })
        .collect::<Result<Vec<_>>>()?;
    Matrix::new(m.rows, m.cols, entries)
}

/// Equate two same-shaped matrices entry by entry, producing one scalar
/// equation per entry.
pub fn equate(lhs: &Matrix, rhs: &Matrix) -> Result<Vec<Equation>> {
    if lhs.shape() != rhs.shape() {
        Err(Error::Shape(format!("cannot equate {:?} and {:?}", lhs.shape(), rhs.shape())))?;
    }
    Ok(lhs.entries.iter()
        .zip(rhs.entries.iter())
        .map(|(l, r)| Equation::new(l.clone(), r.clone()))
        .collect())
}

/// The entries of a column vector, in order.
pub fn vector_to_tuple(v: &Matrix) -> Result<Vec<Expr>> {
    assert_vector(v, "vector_to_tuple")?;
    Ok(v.entries.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn vals(entries: &[i64]) -> Matrix {
        value_vector(entries.iter().map(|x| Value::integer(*x)).collect())
    }

    fn technology() -> Matrix {
        Matrix::from_values(vec![
            vec![Value::from(dec!(0.3)), Value::from(dec!(0.2))],
            vec![Value::from(dec!(0.2)), Value::from(dec!(0.4))],
        ]).unwrap()
    }

    #[test]
    fn dot_products() {
        let v = vals(&[1, 2, 3]);
        let w = vals(&[4, -5, 6]);
        assert_eq!(dot(&v, &w).unwrap().as_value(), Some(Value::integer(12)));
        assert_eq!(dot(&v, &v).unwrap().as_value(), Some(Value::integer(14)));

        let symbolic = vector(vec![Expr::symbol("w1"), Expr::symbol("w1")]);
        let prices = vector(vec![Expr::symbol("p1"), Expr::constant(Value::one())]);
        let expr = dot(&symbolic, &prices).unwrap();
        assert_eq!(expr.subs("w1", &Value::integer(2)).subs("p1", &Value::integer(3)).as_value(), Some(Value::integer(8)));
    }

    #[test]
    fn dot_rejects_bad_shapes() {
        let res = dot(&vals(&[1, 2]), &vals(&[1, 2, 3]));
        assert!(matches!(res, Err(Error::Shape(_))));
        let res = dot(&technology(), &vals(&[1, 2]));
        assert!(matches!(res, Err(Error::Shape(_))));
    }

    #[test]
    fn sums() {
        assert_eq!(sum_vector(&vals(&[1, 2, 3])).unwrap().as_value(), Some(Value::integer(6)));
        assert!(sum_vector(&technology()).is_err());
    }

    #[test]
    fn hadamard_products() {
        let m1 = technology();
        let m2 = Matrix::from_values(vec![
            vec![Value::integer(2), Value::integer(3)],
            vec![Value::integer(-1), Value::Float(0.5)],
        ]).unwrap();
        assert_eq!(hadamard(&m1, &m2).unwrap(), hadamard(&m2, &m1).unwrap());

        let ones = hadamard(&m2, &hadamard_inverse(&m2).unwrap()).unwrap();
        assert_eq!(ones.shape(), (2, 2));
        for entry in ones.entries() {
            assert!(entry.as_value().unwrap().approx_eq(&Value::one(), 1e-12));
        }
        assert_eq!(ones.get(0, 0).unwrap().as_value(), Some(Value::one()));

        assert!(matches!(hadamard(&m1, &vals(&[1, 2])), Err(Error::Shape(_))));
    }

    #[test]
    fn hadamard_inverse_rejects_zero() {
        let res = hadamard_inverse(&vals(&[1, 0, 3]));
        assert_eq!(res, Err(Error::Division { row: 1, col: 0 }));
        let res = hadamard_inverse(&vector(vec![Expr::symbol("k1")]));
        assert_eq!(res, Err(Error::NonConstant("k1".into())));
    }

    #[test]
    fn products_and_transposes() {
        let a = technology();
        let at = a.transpose();
        assert_eq!(at.get(0, 1), a.get(1, 0));
        let prod = a.mul(&vals(&[1, 1])).unwrap();
        assert_eq!(prod.values().unwrap(), vec![Value::from(dec!(0.5)), Value::from(dec!(0.6))]);
        assert!(a.mul(&vals(&[1, 1, 1])).is_err());
        assert_eq!(Matrix::identity(2).mul(&a).unwrap(), a);
    }

    #[test]
    fn determinants() {
        let a = technology();
        let det = Matrix::identity(2).sub(&a).unwrap().determinant().unwrap();
        assert_eq!(det.as_value(), Some(Value::from(dec!(0.38))));
        let three = Matrix::from_values(vec![
            vec![Value::integer(2), Value::integer(0), Value::integer(1)],
            vec![Value::integer(1), Value::integer(3), Value::integer(2)],
            vec![Value::integer(1), Value::integer(1), Value::integer(2)],
        ]).unwrap();
        assert_eq!(three.determinant().unwrap().as_value(), Some(Value::integer(6)));
        assert!(vals(&[1, 2]).determinant().is_err());
    }

    #[test]
    fn substitution_returns_new_matrix() {
        let k1 = Unknown::real("k1");
        let v = vector(vec![k1.expr(), Expr::constant(Value::integer(4))]);
        let solved = v.subs(&k1, &Value::integer(7));
        assert_eq!(solved.values().unwrap(), vec![Value::integer(7), Value::integer(4)]);
        assert!(v.values().is_err());
        assert_eq!(vector_to_tuple(&solved).unwrap().len(), 2);
    }

    #[test]
    fn equating() {
        let eqs = equate(&vals(&[1, 2]), &vector(vec![Expr::symbol("x"), Expr::symbol("y")])).unwrap();
        assert_eq!(eqs.len(), 2);
        assert_eq!(eqs[1].to_string(), "2 = y");
        assert!(equate(&vals(&[1, 2]), &vals(&[1])).is_err());
    }
}
