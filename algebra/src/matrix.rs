//! Dense matrices over a coefficient field, and the ball linear algebra
//! used by the invariant-subspace search.
//!
//! Vectors are plain `Vec`s acting as columns; subspaces are lists of
//! spanning vectors kept in (reduced) row echelon form. Ball pivoting is
//! optimistic: an entry whose disc contains zero is treated as zero, and
//! a disc that contains zero without being small raises `PrecisionError`.

use serde::{Deserialize, Serialize};

use crate::ball::{Accuracy, CBall, PrecisionError};
use crate::coeff::Coeff;
use crate::poly::Poly;
use crate::rational::{pow2, rat, sqrt_upper, Rat};
use crate::roots::complex_roots_ball;

pub type CMat = Mat<CBall>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct Mat<F: Coeff> {
    nrows: usize,
    ncols: usize,
    data: Vec<F>,
}

impl<F: Coeff> Mat<F> {
    pub fn from_flat(nrows: usize, ncols: usize, data: Vec<F>) -> Self {
        assert_eq!(nrows * ncols, data.len(), "matrix shape mismatch");
        Mat { nrows, ncols, data }
    }

    pub fn from_rows(rows: Vec<Vec<F>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            assert_eq!(row.len(), ncols, "ragged rows");
            data.extend(row);
        }
        Mat { nrows, ncols, data }
    }

    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Mat {
            nrows,
            ncols,
            data: vec![F::zero(); nrows * ncols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            *m.entry_mut(i, i) = F::one();
        }
        m
    }

    pub const fn nrows(&self) -> usize {
        self.nrows
    }

    pub const fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn entry(&self, i: usize, j: usize) -> &F {
        &self.data[i * self.ncols + j]
    }

    pub fn entry_mut(&mut self, i: usize, j: usize) -> &mut F {
        &mut self.data[i * self.ncols + j]
    }

    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[F]> {
        self.data.chunks(self.ncols)
    }

    pub fn entries(&self) -> impl Iterator<Item = &F> {
        self.data.iter()
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for j in 0..self.ncols {
            for i in 0..self.nrows {
                data.push(self.entry(i, j).clone());
            }
        }
        Mat {
            nrows: self.ncols,
            ncols: self.nrows,
            data,
        }
    }

    pub fn map<G: Coeff>(&self, f: impl Fn(&F) -> G) -> Mat<G> {
        Mat {
            nrows: self.nrows,
            ncols: self.ncols,
            data: self.data.iter().map(f).collect(),
        }
    }

    pub fn scale(&self, c: &F) -> Self {
        self.map(|x| x.clone() * c.clone())
    }

    pub fn add(&self, rhs: &Self) -> Self {
        assert_eq!((self.nrows, self.ncols), (rhs.nrows, rhs.ncols));
        Mat {
            nrows: self.nrows,
            ncols: self.ncols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(a, b)| a.clone() + b.clone())
                .collect(),
        }
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        assert_eq!((self.nrows, self.ncols), (rhs.nrows, rhs.ncols));
        Mat {
            nrows: self.nrows,
            ncols: self.ncols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(a, b)| a.clone() - b.clone())
                .collect(),
        }
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        assert_eq!(self.ncols, rhs.nrows, "dimension mismatch");
        let mut out = Self::zeros(self.nrows, rhs.ncols);
        for i in 0..self.nrows {
            for k in 0..self.ncols {
                let a = self.entry(i, k);
                if a.is_zero() {
                    continue;
                }
                for j in 0..rhs.ncols {
                    let t = out.entry(i, j).clone() + a.clone() * rhs.entry(k, j).clone();
                    *out.entry_mut(i, j) = t;
                }
            }
        }
        out
    }

    pub fn mul_vec(&self, v: &[F]) -> Vec<F> {
        assert_eq!(self.ncols, v.len());
        (0..self.nrows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .zip(v)
                    .fold(F::zero(), |acc, (a, b)| acc + a.clone() * b.clone())
            })
            .collect()
    }

    pub fn pow(&self, mut e: usize) -> Self {
        assert_eq!(self.nrows, self.ncols);
        let mut base = self.clone();
        let mut acc = Self::identity(self.nrows);
        while e > 0 {
            if e & 1 == 1 {
                acc = acc.mul(&base);
            }
            base = base.mul(&base);
            e >>= 1;
        }
        acc
    }

    pub fn trace(&self) -> F {
        assert_eq!(self.nrows, self.ncols);
        (0..self.nrows).fold(F::zero(), |acc, i| acc + self.entry(i, i).clone())
    }

    /// Exact inverse over a field; `None` when singular.
    pub fn exact_inverse(&self) -> Option<Self> {
        assert_eq!(self.nrows, self.ncols);
        let n = self.nrows;
        let mut a = self.clone();
        let mut inv = Self::identity(n);
        for col in 0..n {
            let pivot = (col..n).find(|&i| !a.entry(i, col).is_zero())?;
            for j in 0..n {
                self_swap(&mut a, pivot, col, j);
                self_swap(&mut inv, pivot, col, j);
            }
            let p_inv = a.entry(col, col).try_inverse()?;
            for j in 0..n {
                *a.entry_mut(col, j) = a.entry(col, j).clone() * p_inv.clone();
                *inv.entry_mut(col, j) = inv.entry(col, j).clone() * p_inv.clone();
            }
            for i in 0..n {
                if i == col || a.entry(i, col).is_zero() {
                    continue;
                }
                let f = a.entry(i, col).clone();
                for j in 0..n {
                    let t = a.entry(i, j).clone() - f.clone() * a.entry(col, j).clone();
                    *a.entry_mut(i, j) = t;
                    let t = inv.entry(i, j).clone() - f.clone() * inv.entry(col, j).clone();
                    *inv.entry_mut(i, j) = t;
                }
            }
        }
        Some(inv)
    }

    /// Exact right kernel basis over a field.
    pub fn exact_kernel(&self) -> Vec<Vec<F>> {
        let (rref, pivots) = exact_rref(self);
        let pivot_cols: Vec<usize> = pivots.iter().map(|&(c, _)| c).collect();
        let mut out = Vec::new();
        for free in 0..self.ncols {
            if pivot_cols.contains(&free) {
                continue;
            }
            let mut v = vec![F::zero(); self.ncols];
            v[free] = F::one();
            for &(c, r) in &pivots {
                v[c] = -rref.entry(r, free).clone();
            }
            out.push(v);
        }
        out
    }
}

fn self_swap<F: Coeff>(m: &mut Mat<F>, i1: usize, i2: usize, j: usize) {
    if i1 != i2 {
        let a = m.entry(i1, j).clone();
        let b = m.entry(i2, j).clone();
        *m.entry_mut(i1, j) = b;
        *m.entry_mut(i2, j) = a;
    }
}

fn exact_rref<F: Coeff>(m: &Mat<F>) -> (Mat<F>, Vec<(usize, usize)>) {
    let mut a = m.clone();
    let mut pivots = Vec::new();
    let mut r = 0;
    for col in 0..a.ncols {
        let Some(pivot) = (r..a.nrows).find(|&i| !a.entry(i, col).is_zero()) else {
            continue;
        };
        for j in 0..a.ncols {
            self_swap(&mut a, pivot, r, j);
        }
        let p_inv = a.entry(r, col).inverse();
        for j in 0..a.ncols {
            *a.entry_mut(r, j) = a.entry(r, j).clone() * p_inv.clone();
        }
        for i in 0..a.nrows {
            if i == r || a.entry(i, col).is_zero() {
                continue;
            }
            let f = a.entry(i, col).clone();
            for j in 0..a.ncols {
                let t = a.entry(i, j).clone() - f.clone() * a.entry(r, j).clone();
                *a.entry_mut(i, j) = t;
            }
        }
        pivots.push((col, r));
        r += 1;
        if r == a.nrows {
            break;
        }
    }
    (a, pivots)
}

impl Accuracy for Mat<CBall> {
    fn customized_accuracy(&self) -> u32 {
        self.data.customized_accuracy()
    }
}

impl Accuracy for [Mat<CBall>] {
    fn customized_accuracy(&self) -> u32 {
        self.iter()
            .map(Accuracy::customized_accuracy)
            .min()
            .unwrap_or(0)
    }
}

// Discs containing zero are zeros; a disc containing zero with a radius
// above this absolute size is too fuzzy to classify.
const FUZZY_RAD_BITS: i64 = 12;

fn is_fuzzy(b: &CBall) -> bool {
    b.contains_zero() && b.rad > pow2(-FUZZY_RAD_BITS)
}

fn certified_nonzero(b: &CBall) -> bool {
    !b.contains_zero()
}

/// A generalized eigenspace of a ball matrix.
#[derive(Clone, Debug)]
pub struct EigenSpace {
    pub eigenvalue: CBall,
    pub multiplicity: usize,
    pub basis: Vec<Vec<CBall>>,
}

impl Mat<CBall> {
    pub fn ball_identity(n: usize, prec: u32) -> Self {
        Mat::<CBall>::identity(n).map(|b| b.clone().at_prec(prec))
    }

    /// Upper bound on the Frobenius norm.
    pub fn frobenius_upper(&self) -> Rat {
        let sum = self.data.iter().fold(Rat::zero(), |acc, b| {
            let m = b.modulus_upper();
            acc + &m * &m
        });
        sqrt_upper(&sum, 32)
    }

    /// Ball inverse by Gauss-Jordan elimination with certified pivots.
    pub fn inverse_ball(&self) -> Result<Self, PrecisionError> {
        assert_eq!(self.nrows, self.ncols);
        let n = self.nrows;
        let mut a = self.clone();
        let mut inv = Self::identity(n);
        for col in 0..n {
            let pivot = (col..n)
                .filter(|&i| certified_nonzero(a.entry(i, col)))
                .max_by(|&i, &j| {
                    a.entry(i, col)
                        .mid_modulus_lower()
                        .cmp(&a.entry(j, col).mid_modulus_lower())
                })
                .ok_or(PrecisionError)?;
            for j in 0..n {
                self_swap(&mut a, pivot, col, j);
                self_swap(&mut inv, pivot, col, j);
            }
            let p_inv = a.entry(col, col).inverse()?;
            for j in 0..n {
                *a.entry_mut(col, j) = a.entry(col, j).mul(&p_inv);
                *inv.entry_mut(col, j) = inv.entry(col, j).mul(&p_inv);
            }
            for i in 0..n {
                if i == col {
                    continue;
                }
                let f = a.entry(i, col).clone();
                if f.contains_zero() && f.rad.is_zero() {
                    continue;
                }
                for j in 0..n {
                    let t = a.entry(i, j).sub(&f.mul(a.entry(col, j)));
                    *a.entry_mut(i, j) = t;
                    let t = inv.entry(i, j).sub(&f.mul(inv.entry(col, j)));
                    *inv.entry_mut(i, j) = t;
                }
            }
        }
        Ok(inv)
    }

    /// Characteristic polynomial by the Faddeev-LeVerrier recurrence.
    pub fn charpoly(&self) -> Poly<CBall> {
        assert_eq!(self.nrows, self.ncols);
        let n = self.nrows;
        let mut coeffs = vec![<CBall as Coeff>::zero(); n + 1];
        coeffs[n] = <CBall as Coeff>::one();
        let mut m = self.clone();
        let mut c = <CBall as Coeff>::zero();
        for k in 1..=n {
            if k > 1 {
                // M_k = A * (M_{k-1} + c_{k-1} * I)
                let mut shifted = m;
                for i in 0..n {
                    let t = shifted.entry(i, i).add(&c);
                    *shifted.entry_mut(i, i) = t;
                }
                m = self.mul(&shifted);
            }
            c = m.trace().scale(&rat(-1, k as i64));
            coeffs[n - k] = c.clone();
        }
        Poly::new(coeffs)
    }
}

/// Row echelon form of a list of spanning vectors, with the pivot map
/// `column -> row`. Entries whose discs contain zero are treated as zero.
pub fn row_echelon(
    rows: Vec<Vec<CBall>>,
    reduce_above: bool,
) -> Result<(Vec<Vec<CBall>>, Vec<(usize, usize)>), PrecisionError> {
    let mut rows = rows;
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    let mut pivots = Vec::new();
    let mut r = 0;
    for col in 0..ncols {
        if r >= nrows {
            break;
        }
        let mut pivot: Option<usize> = None;
        let mut saw_fuzzy = false;
        for i in r..nrows {
            let e = &rows[i][col];
            if certified_nonzero(e) {
                let better = match pivot {
                    None => true,
                    Some(p) => e.mid_modulus_lower() > rows[p][col].mid_modulus_lower(),
                };
                if better {
                    pivot = Some(i);
                }
            } else if is_fuzzy(e) {
                saw_fuzzy = true;
            }
        }
        let Some(p) = pivot else {
            if saw_fuzzy {
                return Err(PrecisionError);
            }
            continue;
        };
        rows.swap(r, p);
        let p_inv = rows[r][col].inverse()?;
        for j in 0..ncols {
            rows[r][j] = rows[r][j].mul(&p_inv);
        }
        let span = if reduce_above { 0..nrows } else { r + 1..nrows };
        for i in span {
            if i == r {
                continue;
            }
            let f = rows[i][col].clone();
            if f.mid_is_zero() && f.rad.is_zero() {
                continue;
            }
            for j in 0..ncols {
                rows[i][j] = rows[i][j].sub(&f.mul(&rows[r][j]));
            }
        }
        pivots.push((col, r));
        r += 1;
    }
    rows.truncate(r);
    Ok((rows, pivots))
}

/// Right kernel basis of a ball matrix.
pub fn ker(m: &Mat<CBall>) -> Result<Vec<Vec<CBall>>, PrecisionError> {
    let rows: Vec<Vec<CBall>> = m.rows().map(|r| r.to_vec()).collect();
    let (rref, pivots) = row_echelon(rows, true)?;
    let pivot_cols: Vec<usize> = pivots.iter().map(|&(c, _)| c).collect();
    let prec = m.data.first().map_or(u32::MAX, |b| b.prec);
    let mut out = Vec::new();
    for free in 0..m.ncols() {
        if pivot_cols.contains(&free) {
            continue;
        }
        let mut v = vec![CBall::zero(prec); m.ncols()];
        v[free] = CBall::one(prec);
        for (k, &(c, _)) in pivots.iter().enumerate() {
            v[c] = rref[k][free].neg();
        }
        out.push(v);
    }
    Ok(out)
}

/// Generalized eigenspaces of a ball matrix, via the characteristic
/// polynomial and clustered root enclosures.
pub fn gen_eigenspaces(m: &Mat<CBall>, prec: u32) -> Result<Vec<EigenSpace>, PrecisionError> {
    let cp = m.charpoly();
    let roots = complex_roots_ball(&cp, prec)?;
    let n = m.nrows();
    let id = Mat::ball_identity(n, prec);
    let mut out = Vec::new();
    for (eigenvalue, multiplicity) in roots {
        let shifted = m.sub(&id.map(|b| b.mul(&eigenvalue)));
        let basis = ker(&shifted.pow(multiplicity))?;
        if basis.is_empty() {
            return Err(PrecisionError);
        }
        out.push(EigenSpace {
            eigenvalue,
            multiplicity,
            basis,
        });
    }
    Ok(out)
}

/// Kernel of `m - lambda*I` (the plain eigenspace).
pub fn eigenspace(m: &Mat<CBall>, lambda: &CBall, prec: u32) -> Result<Vec<Vec<CBall>>, PrecisionError> {
    let id = Mat::ball_identity(m.nrows(), prec);
    ker(&m.sub(&id.map(|b| b.mul(lambda))))
}

/// Echelonized basis of the smallest subspace containing `seeds` and
/// stable under every matrix.
pub fn orbit(
    mats: &[Mat<CBall>],
    seeds: &[Vec<CBall>],
) -> Result<Vec<Vec<CBall>>, PrecisionError> {
    let dim = seeds.first().map_or(0, Vec::len);
    let mut basis: Vec<Vec<CBall>> = Vec::new();
    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut queue: Vec<Vec<CBall>> = seeds.to_vec();
    while let Some(v) = queue.pop() {
        // Reduce against the (fully reduced) echelon basis: every basis
        // row has pivot one and zeros at every other pivot column, so a
        // single pass suffices.
        let mut v = v;
        for (k, &(c, _)) in pivots.iter().enumerate() {
            let f = v[c].clone();
            if f.mid_is_zero() && f.rad.is_zero() {
                continue;
            }
            for j in 0..dim {
                v[j] = v[j].sub(&f.mul(&basis[k][j]));
            }
        }
        let lead = (0..dim).find(|&j| certified_nonzero(&v[j]));
        let Some(col) = lead else {
            if v.iter().any(is_fuzzy) {
                return Err(PrecisionError);
            }
            continue;
        };
        let p_inv = v[col].inverse()?;
        for j in 0..dim {
            v[j] = v[j].mul(&p_inv);
        }
        // Eliminate the new pivot column from the existing rows, keeping
        // the basis fully reduced.
        for row in basis.iter_mut() {
            let f = row[col].clone();
            if f.mid_is_zero() && f.rad.is_zero() {
                continue;
            }
            for j in 0..dim {
                row[j] = row[j].sub(&f.mul(&v[j]));
            }
        }
        for m in mats {
            queue.push(m.mul_vec(&v));
        }
        basis.push(v);
        pivots.push((col, basis.len() - 1));
        if basis.len() == dim {
            break;
        }
    }
    Ok(basis)
}

/// Reduced row echelon form of a list of vectors (full reduction above
/// the pivots as well).
pub fn reduced_row_echelon(rows: Vec<Vec<CBall>>) -> Result<Vec<Vec<CBall>>, PrecisionError> {
    Ok(row_echelon(rows, true)?.0)
}

/// Intersection of two subspaces given by spanning vectors.
pub fn intersect(
    a: &[Vec<CBall>],
    b: &[Vec<CBall>],
) -> Result<Vec<Vec<CBall>>, PrecisionError> {
    if a.is_empty() || b.is_empty() {
        return Ok(Vec::new());
    }
    let dim = a[0].len();
    // Solve x*A = y*B: kernel of the stacked matrix [A; -B] transposed.
    let mut rows: Vec<Vec<CBall>> = Vec::new();
    for v in a {
        rows.push(v.clone());
    }
    for v in b {
        rows.push(v.iter().map(CBall::neg).collect());
    }
    let stacked = Mat::from_rows(rows).transpose();
    let null = ker(&stacked)?;
    let mut out = Vec::new();
    for combo in null {
        let mut v = vec![<CBall as Coeff>::zero(); dim];
        for (i, c) in combo[..a.len()].iter().enumerate() {
            for j in 0..dim {
                v[j] = v[j].add(&c.mul(&a[i][j]));
            }
        }
        if v.iter().any(certified_nonzero) {
            out.push(v);
        }
    }
    reduced_row_echelon(out)
}

/// Searches for a proper subspace stable under all matrices, by closing
/// generalized eigenspaces (and their pairwise intersections) under the
/// generators. `None` means no proper invariant subspace was found.
pub fn invariant_subspace(
    mats: &[Mat<CBall>],
    prec: u32,
) -> Result<Option<Vec<Vec<CBall>>>, PrecisionError> {
    if mats.is_empty() {
        return Ok(None);
    }
    let dim = mats[0].nrows();
    let mut candidate_spaces: Vec<Vec<Vec<CBall>>> = Vec::new();
    for m in mats {
        for space in gen_eigenspaces(m, prec)? {
            if space.basis.len() < dim {
                candidate_spaces.push(space.basis);
            }
        }
    }
    // Close each candidate; then refine by intersecting across generators
    // until stable.
    let mut round: Vec<Vec<Vec<CBall>>> = candidate_spaces.clone();
    for _ in 0..mats.len() + 1 {
        let mut next = Vec::new();
        for cand in &round {
            let closure = orbit(mats, cand)?;
            if !closure.is_empty() && closure.len() < dim {
                return Ok(Some(closure));
            }
            for other in &candidate_spaces {
                let meet = intersect(cand, other)?;
                if !meet.is_empty() && meet.len() < cand.len() {
                    next.push(meet);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        round = next;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::{rat, rat_i64};

    fn bmat(rows: &[&[i64]], prec: u32) -> Mat<CBall> {
        Mat::from_rows(
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|&x| CBall::from_rat(&rat_i64(x), prec))
                        .collect()
                })
                .collect(),
        )
    }

    fn qmat(rows: &[&[i64]]) -> Mat<Rat> {
        Mat::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|&x| rat_i64(x)).collect())
                .collect(),
        )
    }

    #[test]
    fn test_exact_inverse() {
        let m = qmat(&[&[2, 1], &[1, 1]]);
        let inv = m.exact_inverse().unwrap();
        assert_eq!(m.mul(&inv), Mat::identity(2));
        assert!(qmat(&[&[1, 2], &[2, 4]]).exact_inverse().is_none());
    }

    #[test]
    fn test_exact_kernel() {
        let m = qmat(&[&[1, 2, 3], &[2, 4, 6]]);
        let k = m.exact_kernel();
        assert_eq!(k.len(), 2);
        for v in &k {
            let img = m.mul_vec(v);
            assert!(img.iter().all(|x| <Rat as Coeff>::is_zero(x)));
        }
    }

    #[test]
    fn test_ball_inverse() {
        let m = bmat(&[&[3, 1], &[1, 2]], 80);
        let inv = m.inverse_ball().unwrap();
        let prod = m.mul(&inv);
        // The product must enclose the identity.
        assert!(prod.entry(0, 0).contains_point(&rat_i64(1), &Rat::zero()));
        assert!(prod.entry(0, 1).contains_point(&Rat::zero(), &Rat::zero()));
    }

    #[test]
    fn test_charpoly() {
        // [[2, 0], [0, 3]] has charpoly (X-2)(X-3) = X^2 - 5X + 6
        let m = bmat(&[&[2, 0], &[0, 3]], 80);
        let cp = m.charpoly();
        assert!(cp.coeff(0).contains_point(&rat_i64(6), &Rat::zero()));
        assert!(cp.coeff(1).contains_point(&rat_i64(-5), &Rat::zero()));
        assert!(cp.coeff(2).contains_point(&rat_i64(1), &Rat::zero()));
    }

    #[test]
    fn test_gen_eigenspaces_distinct() {
        let m = bmat(&[&[2, 1], &[0, 3]], 100);
        let mut spaces = gen_eigenspaces(&m, 100).unwrap();
        spaces.sort_by_key(|s| s.multiplicity);
        assert_eq!(spaces.len(), 2);
        for s in &spaces {
            assert_eq!(s.multiplicity, 1);
            assert_eq!(s.basis.len(), 1);
        }
    }

    #[test]
    fn test_gen_eigenspaces_nilpotent() {
        // [[0,1],[0,0]]: single eigenvalue 0 with multiplicity 2,
        // generalized eigenspace is everything.
        let m = bmat(&[&[0, 1], &[0, 0]], 80);
        let spaces = gen_eigenspaces(&m, 80).unwrap();
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].multiplicity, 2);
        assert_eq!(spaces[0].basis.len(), 2);
    }

    #[test]
    fn test_orbit() {
        // Upper triangular: e1 spans an invariant line.
        let m = bmat(&[&[1, 4], &[0, -1]], 100);
        let prec = 100;
        let e1 = vec![CBall::one(prec), CBall::zero(prec)];
        let orb = orbit(&[m.clone()], &[e1]).unwrap();
        assert_eq!(orb.len(), 1);
        // A generic vector generates everything.
        let v = vec![CBall::one(prec), CBall::one(prec)];
        let orb = orbit(&[m], &[v]).unwrap();
        assert_eq!(orb.len(), 2);
    }

    #[test]
    fn test_invariant_subspace_found() {
        let mats = vec![
            bmat(&[&[1, 4], &[0, -1]], 100),
            bmat(&[&[2, 1], &[0, 2]], 100),
        ];
        let sub = invariant_subspace(&mats, 100).unwrap();
        let basis = sub.expect("common invariant line");
        assert_eq!(basis.len(), 1);
        // The line is spanned by e1.
        assert!(certified_nonzero(&basis[0][0]));
        assert!(basis[0][1].contains_zero());
    }

    #[test]
    fn test_invariant_subspace_none() {
        // Rotation-like pair with no common invariant line over C of the
        // full algebra: use a matrix with distinct eigenvalues and another
        // swapping the eigenvectors.
        let mats = vec![
            bmat(&[&[2, 0], &[0, 3]], 100),
            bmat(&[&[0, 1], &[1, 0]], 100),
        ];
        let sub = invariant_subspace(&mats, 100).unwrap();
        assert!(sub.is_none());
    }

    #[test]
    fn test_intersect() {
        let prec = 100;
        let span_xy = vec![
            vec![CBall::one(prec), CBall::zero(prec), CBall::zero(prec)],
            vec![CBall::zero(prec), CBall::one(prec), CBall::zero(prec)],
        ];
        let span_yz = vec![
            vec![CBall::zero(prec), CBall::one(prec), CBall::zero(prec)],
            vec![CBall::zero(prec), CBall::zero(prec), CBall::one(prec)],
        ];
        let meet = intersect(&span_xy, &span_yz).unwrap();
        assert_eq!(meet.len(), 1);
        assert!(meet[0][0].contains_zero());
        assert!(certified_nonzero(&meet[0][1]));
        assert!(meet[0][2].contains_zero());
    }

    #[test]
    fn test_frobenius() {
        let m = bmat(&[&[3, 0], &[0, 4]], 64);
        let f = m.frobenius_upper();
        assert!(f >= rat_i64(5));
        assert!(f < rat(51, 10));
    }
}
