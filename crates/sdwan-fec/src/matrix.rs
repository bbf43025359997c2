//! Dense matrices over GF(2^8), sized for generator matrices (at most
//! 255 x 255).

use crate::error::FecError;
use crate::gf256::{gf_add, gf_inv, gf_mul};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    pub fn zero(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0u8; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::zero(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    /// Systematic `(k + m) x k` generator: identity on top, a Cauchy block
    /// `C[i][j] = 1 / (x_i + y_j)` below with `x_i = k + i` and `y_j = j`.
    ///
    /// Every square submatrix of a Cauchy matrix is non-singular, so any `k`
    /// rows of the result are linearly independent.
    pub fn systematic_cauchy(k: usize, m: usize) -> Result<Self, FecError> {
        if k + m > 255 {
            return Err(FecError::TooManyShards {
                total: (k + m) as u32,
            });
        }
        let mut g = Matrix::zero(k + m, k);
        for i in 0..k {
            g.set(i, i, 1);
        }
        for i in 0..m {
            let x = (k + i) as u8;
            for j in 0..k {
                let y = j as u8;
                g.set(k + i, j, gf_inv(gf_add(x, y))?);
            }
        }
        Ok(g)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Matrix {
        let mut out = Matrix::zero(rows.len(), self.cols);
        for (dst, &src) in rows.iter().enumerate() {
            out.data[dst * self.cols..(dst + 1) * self.cols].copy_from_slice(self.row(src));
        }
        out
    }

    pub fn mul(&self, rhs: &Matrix) -> Result<Matrix, FecError> {
        if self.cols != rhs.rows {
            return Err(FecError::DimensionMismatch {
                lhs_cols: self.cols,
                rhs_rows: rhs.rows,
            });
        }
        let mut out = Matrix::zero(self.rows, rhs.cols);
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut acc = 0u8;
                for i in 0..self.cols {
                    acc = gf_add(acc, gf_mul(self.get(r, i), rhs.get(i, c)));
                }
                out.set(r, c, acc);
            }
        }
        Ok(out)
    }

    /// Gauss-Jordan inversion over GF(2^8).
    pub fn invert(&self) -> Result<Matrix, FecError> {
        if self.rows != self.cols {
            return Err(FecError::SingularMatrix);
        }
        let n = self.rows;
        let mut work = self.clone();
        let mut inv = Matrix::identity(n);

        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| work.get(r, col) != 0)
                .ok_or(FecError::SingularMatrix)?;
            if pivot != col {
                work.swap_rows(pivot, col);
                inv.swap_rows(pivot, col);
            }

            let scale = gf_inv(work.get(col, col))?;
            if scale != 1 {
                work.scale_row(col, scale);
                inv.scale_row(col, scale);
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work.get(r, col);
                if factor != 0 {
                    work.add_scaled_row(r, col, factor);
                    inv.add_scaled_row(r, col, factor);
                }
            }
        }
        Ok(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, r: usize, factor: u8) {
        for v in &mut self.data[r * self.cols..(r + 1) * self.cols] {
            *v = gf_mul(*v, factor);
        }
    }

    /// `row[dst] += factor * row[src]`
    fn add_scaled_row(&mut self, dst: usize, src: usize, factor: u8) {
        for c in 0..self.cols {
            let v = gf_mul(factor, self.get(src, c));
            let i = dst * self.cols + c;
            self.data[i] = gf_add(self.data[i], v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_inverts_to_itself() {
        let id = Matrix::identity(5);
        assert_eq!(id.invert().unwrap(), id);
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let g = Matrix::systematic_cauchy(4, 2).unwrap();
        let sub = g.select_rows(&[1, 2, 4, 5]);
        let inv = sub.invert().unwrap();
        assert_eq!(inv.mul(&sub), Ok(Matrix::identity(4)));
        assert_eq!(sub.mul(&inv), Ok(Matrix::identity(4)));
    }

    #[test]
    fn mul_rejects_mismatched_dimensions() {
        let a = Matrix::zero(2, 3);
        let b = Matrix::zero(2, 3);
        assert_eq!(
            a.mul(&b),
            Err(FecError::DimensionMismatch {
                lhs_cols: 3,
                rhs_rows: 2,
            })
        );
        assert_eq!(a.mul(&Matrix::identity(3)), Ok(a.clone()));
    }

    #[test]
    fn singular_matrix_detected() {
        let mut m = Matrix::zero(2, 2);
        m.set(0, 0, 3);
        m.set(0, 1, 5);
        m.set(1, 0, 3);
        m.set(1, 1, 5);
        assert_eq!(m.invert(), Err(FecError::SingularMatrix));
        assert_eq!(Matrix::zero(2, 3).invert(), Err(FecError::SingularMatrix));
    }

    #[test]
    fn systematic_top_is_identity() {
        let g = Matrix::systematic_cauchy(6, 3).unwrap();
        assert_eq!(g.rows(), 9);
        assert_eq!(g.cols(), 6);
        assert_eq!(g.select_rows(&[0, 1, 2, 3, 4, 5]), Matrix::identity(6));
        for r in 6..9 {
            assert!(g.row(r).iter().all(|&v| v != 0), "Cauchy entries are non-zero");
        }
    }

    #[test]
    fn every_k_subset_of_small_generator_is_invertible() {
        let (k, m) = (3usize, 3usize);
        let g = Matrix::systematic_cauchy(k, m).unwrap();
        let n = k + m;
        for mask in 0u32..(1 << n) {
            if mask.count_ones() as usize != k {
                continue;
            }
            let rows: Vec<usize> = (0..n).filter(|i| mask & (1 << i) != 0).collect();
            assert!(g.select_rows(&rows).invert().is_ok(), "rows {rows:?} singular");
        }
    }

    #[test]
    fn field_limit_enforced() {
        assert!(Matrix::systematic_cauchy(200, 55).is_ok());
        assert_eq!(
            Matrix::systematic_cauchy(200, 56),
            Err(FecError::TooManyShards { total: 256 })
        );
    }
}
