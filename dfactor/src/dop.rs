//! Linear differential operators with polynomial and rational-function
//! coefficients.
//!
//! `Dop` is the canonical normal form (coefficients in `K[z]`, content
//! removed); `RatDop` lives over the fraction field `K(z)` and carries
//! the non-commutative Euclidean division. Composition follows the
//! Leibniz rule `D * a = a * D + a'`.

use num::BigInt;
use serde::{Deserialize, Serialize};

use dfactor_algebra::coeff::Coeff;
use dfactor_algebra::poly::Poly;
use dfactor_algebra::ratfunc::RatFunc;
use dfactor_algebra::rational::{binomial, Rat};
use dfactor_algebra::series::Series;

/// A differential operator `sum a_k(z) D^k` with polynomial coefficients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct Dop<F: Coeff> {
    coeffs: Vec<Poly<F>>,
}

impl<F: Coeff> Dop<F> {
    pub fn new(mut coeffs: Vec<Poly<F>>) -> Self {
        while coeffs.last().map_or(false, Poly::is_zero) {
            coeffs.pop();
        }
        Dop { coeffs }
    }

    pub fn zero() -> Self {
        Dop { coeffs: Vec::new() }
    }

    /// The derivation `D`.
    pub fn d() -> Self {
        Dop::new(vec![Poly::zero(), Poly::one()])
    }

    /// The multiplication operator `p(z)`.
    pub fn from_poly(p: Poly<F>) -> Self {
        Dop::new(vec![p])
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(Poly::is_zero)
    }

    /// Order of the operator; zero for the zero operator.
    pub fn order(&self) -> usize {
        (0..self.coeffs.len())
            .rev()
            .find(|&i| !self.coeffs[i].is_zero())
            .unwrap_or(0)
    }

    /// Maximum coefficient degree.
    pub fn degree(&self) -> usize {
        self.coeffs
            .iter()
            .map(|p| p.degree_plus_one().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    pub fn coeff(&self, k: usize) -> Poly<F> {
        self.coeffs.get(k).cloned().unwrap_or_else(Poly::zero)
    }

    pub fn coeffs(&self) -> &[Poly<F>] {
        &self.coeffs
    }

    /// Leading coefficient.
    pub fn lead(&self) -> Poly<F> {
        self.coeff(self.order())
    }

    pub fn map_coeffs<G: Coeff>(&self, f: impl Fn(&F) -> G) -> Dop<G> {
        Dop::new(self.coeffs.iter().map(|p| p.map_coeffs(&f)).collect())
    }

    /// Canonical normal form: the coefficient gcd is divided out, then a
    /// rational scale makes the sequence integral and primitive with a
    /// positive leading sign.
    pub fn normalized(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        let mut g = Poly::zero();
        for c in &self.coeffs {
            if !c.is_zero() {
                g = g.gcd(c);
            }
        }
        let mut coeffs: Vec<Poly<F>> = self
            .coeffs
            .iter()
            .map(|c| c.div_rem(&g).0)
            .collect();
        // Clear denominators and remove the integer content.
        let mut den = BigInt::from(1);
        let mut content = BigInt::from(0);
        for p in &coeffs {
            for c in &p.coeffs {
                den = num::integer::lcm(den, c.denom());
            }
        }
        let den_f = F::from_rat(Rat::from_integer(den));
        for p in coeffs.iter_mut() {
            *p = p.scale(&den_f);
            for c in &p.coeffs {
                content = num::integer::gcd(content, c.int_content());
            }
        }
        if content > BigInt::from(1) {
            let inv = F::from_rat(Rat::new(BigInt::from(1), content));
            for p in coeffs.iter_mut() {
                *p = p.scale(&inv);
            }
        }
        let lead_sign = coeffs
            .last()
            .map_or(1, |p| p.lead().sign_hint());
        if lead_sign < 0 {
            let m = F::from_i64(-1);
            for p in coeffs.iter_mut() {
                *p = p.scale(&m);
            }
        }
        Dop::new(coeffs)
    }

    pub fn add(&self, rhs: &Self) -> Self {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Dop::new((0..n).map(|i| &self.coeff(i) + &rhs.coeff(i)).collect())
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Dop::new((0..n).map(|i| &self.coeff(i) - &rhs.coeff(i)).collect())
    }

    pub fn scale_poly(&self, p: &Poly<F>) -> Self {
        Dop::new(self.coeffs.iter().map(|c| c * p).collect())
    }

    /// Operator composition `self * rhs` (apply `rhs` first).
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut acc = Dop::zero();
        // d_power = D^i applied to rhs.
        let mut d_power = rhs.clone();
        for (i, a) in self.coeffs.iter().enumerate() {
            if i > 0 {
                d_power = d_power.left_mul_d();
            }
            if !a.is_zero() {
                acc = acc.add(&d_power.scale_poly(a));
            }
        }
        acc
    }

    /// `D * self` by the Leibniz rule.
    fn left_mul_d(&self) -> Self {
        let n = self.coeffs.len();
        let mut coeffs = vec![Poly::zero(); n + 1];
        for (j, c) in self.coeffs.iter().enumerate() {
            coeffs[j] = &coeffs[j] + &c.derivative();
            coeffs[j + 1] = &coeffs[j + 1] + c;
        }
        Dop::new(coeffs)
    }

    pub fn pow(&self, e: usize) -> Self {
        let mut acc = Dop::from_poly(Poly::one());
        for _ in 0..e {
            acc = acc.mul(self);
        }
        acc
    }

    /// Formal adjoint `sum (-D)^i * a_i`.
    pub fn adjoint(&self) -> Self {
        let minus_d = Dop::new(vec![Poly::zero(), Poly::constant(F::from_i64(-1))]);
        let mut acc = Dop::zero();
        let mut d_pow = Dop::from_poly(Poly::one());
        for (i, a) in self.coeffs.iter().enumerate() {
            if i > 0 {
                d_pow = d_pow.mul(&minus_d);
            }
            if !a.is_zero() {
                acc = acc.add(&d_pow.mul(&Dop::from_poly(a.clone())));
            }
        }
        acc
    }

    /// The composition `L(z + s)`, acting on `y(z - s)`-shifted solutions.
    pub fn compose_shift(&self, s: &F) -> Self {
        Dop::new(self.coeffs.iter().map(|c| c.shift(s)).collect())
    }

    /// The pullback under `z -> 1/z`, normalized to polynomial form.
    pub fn compose_inverse_z(&self) -> Self {
        // d/dz pulls back to -w^2 d/dw.
        let minus_w2_d = Dop::new(vec![
            Poly::zero(),
            Poly::monomial(F::from_i64(-1), 2),
        ]);
        let mut acc = RatDop::zero();
        let mut d_pow = Dop::from_poly(Poly::one());
        for (k, a) in self.coeffs.iter().enumerate() {
            if k > 0 {
                d_pow = minus_w2_d.mul(&d_pow);
            }
            if a.is_zero() {
                continue;
            }
            // a(1/w) = rev(a)(w) / w^deg.
            let deg = a.degree_plus_one() - 1;
            let c = RatFunc::new(a.reverse(), Poly::monomial(F::one(), deg));
            acc = acc.add(&RatDop::from_dop(&d_pow).scale(&c));
        }
        acc.clear_denominators()
    }

    /// Coefficients with respect to powers of the Euler operator `T = zD`.
    pub fn euler_representation(&self) -> Vec<RatFunc<F>> {
        let n = self.order();
        let mut output: Vec<RatFunc<F>> = vec![RatFunc::zero(); n + 1];
        output[0] = RatFunc::from_poly(self.coeff(0));
        // l holds the coefficients of T(T-1)...(T-k+1) in powers of T.
        let mut l: Vec<F> = vec![F::zero()];
        for k in 1..=n {
            let mut newl = vec![F::zero()];
            for i in 1..l.len() {
                newl.push(F::from_i64(-(k as i64) + 1) * l[i].clone() + l[i - 1].clone());
            }
            newl.push(F::one());
            l = newl;
            let ck = self.coeff(k);
            if ck.is_zero() {
                continue;
            }
            let zk = RatFunc::new(Poly::one(), Poly::monomial(F::one(), k));
            for j in 1..=k {
                if l[j].is_zero() {
                    continue;
                }
                let term = &RatFunc::from_poly(ck.scale(&l[j])) * &zk;
                output[j] = &output[j] + &term;
            }
        }
        output
    }

    /// The substitution `T -> T + e` on the Euler representation, i.e.
    /// multiplication of the solution space by `z^(-e)`.
    pub fn euler_substitution(&self, e: &F) -> Self {
        let mut l = self.euler_representation();
        for i in 0..l.len() {
            let c = l[i].clone();
            if c.is_zero() {
                continue;
            }
            let mut e_pow = F::one();
            for k in (0..i).rev() {
                e_pow = e_pow * e.clone();
                let b = F::from_rat(Rat::from_integer(binomial(i, k)));
                l[k] = &l[k] + &c.scale(&(b * e_pow.clone()));
            }
        }
        // Reassemble sum l_i * T^i with T = z*D.
        let t = Dop::new(vec![Poly::zero(), Poly::x()]);
        let mut acc = RatDop::zero();
        let mut t_pow = Dop::from_poly(Poly::one());
        for (i, c) in l.iter().enumerate() {
            if i > 0 {
                t_pow = t.mul(&t_pow);
            }
            if !c.is_zero() {
                acc = acc.add(&RatDop::from_dop(&t_pow).scale(c));
            }
        }
        acc.clear_denominators()
    }

    /// Indicial polynomial at the origin: the coefficient of the lowest
    /// `z`-power in `L(z^X)`, as a polynomial in `X`.
    pub fn indicial_at_zero(&self) -> Poly<F> {
        let (dmin, cds) = self.local_recurrence();
        cds.into_iter()
            .find(|(d, _)| *d == dmin)
            .map(|(_, p)| p)
            .unwrap_or_else(Poly::zero)
    }

    /// The shift polynomials `c_d(n)` of the coefficient recurrence:
    /// `[z^m] L(sum y_n z^n) = sum_d c_d(m - d) y_{m-d}`. Returns the
    /// minimal shift and the list of `(d, c_d)`.
    fn local_recurrence(&self) -> (i64, Vec<(i64, Poly<F>)>) {
        let mut cds: Vec<(i64, Poly<F>)> = Vec::new();
        // Falling factorial polynomials ff_k(X) = X(X-1)...(X-k+1).
        let mut ff = Poly::one();
        for (k, a) in self.coeffs.iter().enumerate() {
            if k > 0 {
                let lin = Poly::new(vec![F::from_i64(-(k as i64 - 1)), F::one()]);
                ff = &ff * &lin;
            }
            if a.is_zero() {
                continue;
            }
            for (j, c) in a.coeffs.iter().enumerate() {
                if c.is_zero() {
                    continue;
                }
                let d = j as i64 - k as i64;
                let term = ff.scale(c);
                match cds.iter_mut().find(|(dd, _)| *dd == d) {
                    Some((_, p)) => *p = &*p + &term,
                    None => cds.push((d, term)),
                }
            }
        }
        cds.retain(|(_, p)| !p.is_zero());
        cds.sort_by_key(|(d, _)| *d);
        let dmin = cds.first().map_or(0, |(d, _)| *d);
        (dmin, cds)
    }

    /// Power-series solutions at the origin, one per admissible
    /// nonnegative integer exponent, each with `order` known
    /// coefficients and normalized leading coefficient one. Sorted by
    /// valuation. At an ordinary point this is the canonical local basis
    /// `f_i = z^i + O(z^r)`.
    pub fn series_basis(&self, order: usize) -> Vec<Series<F>> {
        let (dmin, cds) = self.local_recurrence();
        let ind = cds
            .iter()
            .find(|(d, _)| *d == dmin)
            .map(|(_, p)| p.clone())
            .unwrap_or_else(Poly::zero);
        if ind.is_zero() {
            return Vec::new();
        }
        let n_max = order;
        let int_roots: Vec<usize> = (0..n_max)
            .filter(|&n| ind.eval(&F::from_i64(n as i64)).is_zero())
            .collect();
        let mut basis = Vec::new();
        'roots: for &v0 in &int_roots {
            let mut y = vec![F::zero(); n_max];
            for v in 0..n_max {
                let mut rhs = F::zero();
                for (d, cd) in &cds {
                    if *d == dmin {
                        continue;
                    }
                    let idx = v as i64 + dmin - d;
                    if idx < 0 || idx as usize >= v {
                        continue;
                    }
                    let c = cd.eval(&F::from_i64(idx));
                    rhs = rhs + c * y[idx as usize].clone();
                }
                let mu = ind.eval(&F::from_i64(v as i64));
                if v == v0 {
                    if !rhs.is_zero() {
                        continue 'roots;
                    }
                    y[v] = F::one();
                } else if !mu.is_zero() {
                    y[v] = -(rhs * mu.inverse());
                } else if rhs.is_zero() {
                    y[v] = F::zero();
                } else {
                    // Logarithmic case: no power-series solution here.
                    continue 'roots;
                }
            }
            basis.push(Series::new(y));
        }
        basis
    }

    /// Applies the operator to a polynomial (exactly).
    pub fn apply_poly(&self, p: &Poly<F>) -> Poly<F> {
        let mut acc = Poly::zero();
        let mut der = p.clone();
        for (k, a) in self.coeffs.iter().enumerate() {
            if k > 0 {
                der = der.derivative();
            }
            if !a.is_zero() {
                acc = &acc + &(a * &der);
            }
        }
        acc
    }

    /// Applies the operator to a truncated series.
    pub fn apply_series(&self, f: &Series<F>) -> Series<F> {
        let r = self.order();
        let n = f.order().saturating_sub(self.degree() + r);
        let mut acc = Series::zero(n);
        let mut der = f.clone();
        for (k, a) in self.coeffs.iter().enumerate() {
            if k > 0 {
                der = der.derivative();
            }
            if a.is_zero() {
                continue;
            }
            let ap = Series::new(a.coeffs.clone());
            acc = acc.add(&der.mul_trunc(&ap, n));
        }
        acc
    }

    /// Right-divisibility test: whether `rhs` is a right factor.
    pub fn is_divisible_by(&self, rhs: &Self) -> bool {
        RatDop::from_dop(self).right_rem(&RatDop::from_dop(rhs)).is_zero()
    }

    /// Exact right quotient, when `rhs` right-divides `self`.
    pub fn exact_div(&self, rhs: &Self) -> Option<RatDop<F>> {
        let (q, r) = RatDop::from_dop(self).right_div_rem(&RatDop::from_dop(rhs));
        r.is_zero().then_some(q)
    }
}

impl<F: Coeff> PartialEq for Dop<F> {
    fn eq(&self, other: &Self) -> bool {
        let n = self.coeffs.len().max(other.coeffs.len());
        (0..n).all(|i| self.coeff(i) == other.coeff(i))
    }
}

impl<F: Coeff> std::fmt::Display for Dop<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (k, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            write!(f, "(")?;
            let mut lead = true;
            for (j, x) in c.coeffs.iter().enumerate().rev() {
                if x.is_zero() {
                    continue;
                }
                if !lead {
                    write!(f, " + ")?;
                }
                match j {
                    0 => write!(f, "{x}")?,
                    1 => write!(f, "{x}*z")?,
                    _ => write!(f, "{x}*z^{j}")?,
                }
                lead = false;
            }
            write!(f, ")")?;
            match k {
                0 => {}
                1 => write!(f, "*D")?,
                _ => write!(f, "*D^{k}")?,
            }
            first = false;
        }
        Ok(())
    }
}

/// A differential operator over the fraction field `K(z)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "F: Serialize + serde::de::DeserializeOwned")]
pub struct RatDop<F: Coeff> {
    coeffs: Vec<RatFunc<F>>,
}

impl<F: Coeff> RatDop<F> {
    pub fn new(mut coeffs: Vec<RatFunc<F>>) -> Self {
        while coeffs.last().map_or(false, RatFunc::is_zero) {
            coeffs.pop();
        }
        RatDop { coeffs }
    }

    pub fn zero() -> Self {
        RatDop { coeffs: Vec::new() }
    }

    pub fn from_dop(dop: &Dop<F>) -> Self {
        RatDop::new(
            dop.coeffs()
                .iter()
                .map(|c| RatFunc::from_poly(c.clone()))
                .collect(),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(RatFunc::is_zero)
    }

    pub fn order(&self) -> usize {
        (0..self.coeffs.len())
            .rev()
            .find(|&i| !self.coeffs[i].is_zero())
            .unwrap_or(0)
    }

    pub fn coeff(&self, k: usize) -> RatFunc<F> {
        self.coeffs.get(k).cloned().unwrap_or_else(RatFunc::zero)
    }

    pub fn coeffs(&self) -> &[RatFunc<F>] {
        &self.coeffs
    }

    pub fn lead(&self) -> RatFunc<F> {
        self.coeff(self.order())
    }

    pub fn add(&self, rhs: &Self) -> Self {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        RatDop::new((0..n).map(|i| &self.coeff(i) + &rhs.coeff(i)).collect())
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        let n = self.coeffs.len().max(rhs.coeffs.len());
        RatDop::new((0..n).map(|i| &self.coeff(i) - &rhs.coeff(i)).collect())
    }

    pub fn scale(&self, c: &RatFunc<F>) -> Self {
        RatDop::new(self.coeffs.iter().map(|x| x * c).collect())
    }

    fn left_mul_d(&self) -> Self {
        let n = self.coeffs.len();
        let mut coeffs = vec![RatFunc::zero(); n + 1];
        for (j, c) in self.coeffs.iter().enumerate() {
            coeffs[j] = &coeffs[j] + &c.derivative();
            coeffs[j + 1] = &coeffs[j + 1] + c;
        }
        RatDop::new(coeffs)
    }

    /// Operator composition `self * rhs`.
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut acc = RatDop::zero();
        let mut d_power = rhs.clone();
        for (i, a) in self.coeffs.iter().enumerate() {
            if i > 0 {
                d_power = d_power.left_mul_d();
            }
            if !a.is_zero() {
                acc = acc.add(&d_power.scale(a));
            }
        }
        acc
    }

    /// Right Euclidean division: `self = q * rhs + r` with
    /// `ord(r) < ord(rhs)`.
    pub fn right_div_rem(&self, rhs: &Self) -> (Self, Self) {
        assert!(!rhs.is_zero(), "division by zero operator");
        let ord_rhs = rhs.order();
        let mut q = RatDop::zero();
        let mut r = self.clone();
        while !r.is_zero() && r.order() >= ord_rhs {
            let k = r.order() - ord_rhs;
            let c = &r.lead() * &rhs.lead().inverse();
            let mut term_coeffs = vec![RatFunc::zero(); k + 1];
            term_coeffs[k] = c;
            let term = RatDop::new(term_coeffs);
            r = r.sub(&term.mul(rhs));
            q = q.add(&term);
            if ord_rhs == 0 && r.is_zero() {
                break;
            }
        }
        (q, r)
    }

    pub fn right_rem(&self, rhs: &Self) -> Self {
        self.right_div_rem(rhs).1
    }

    /// Divides every coefficient by the leading one.
    pub fn monic(&self) -> Self {
        if self.is_zero() {
            return Self::zero();
        }
        self.scale(&self.lead().inverse())
    }

    /// Clears denominators into the polynomial normal form.
    pub fn clear_denominators(&self) -> Dop<F> {
        let mut lcm = Poly::one();
        for c in &self.coeffs {
            let den = c.denom();
            let g = lcm.gcd(den);
            lcm = &lcm.div_rem(&g).0 * den;
        }
        let cleared: Vec<Poly<F>> = self
            .coeffs
            .iter()
            .map(|c| {
                let scaled = &(c.numer() * &lcm);
                scaled.div_rem(c.denom()).0
            })
            .collect();
        Dop::new(cleared).normalized()
    }
}

impl<F: Coeff> std::fmt::Display for RatDop<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.clear_denominators())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfactor_algebra::rational::{rat, rat_i64};

    fn p(cs: &[i64]) -> Poly<Rat> {
        Poly::new(cs.iter().map(|&c| rat_i64(c)).collect())
    }

    /// D*z*D = z*D^2 + D.
    fn d_z_d() -> Dop<Rat> {
        Dop::d().mul(&Dop::from_poly(p(&[0, 1]))).mul(&Dop::d())
    }

    #[test]
    fn test_mul_leibniz() {
        // D * z = z*D + 1.
        let dz = Dop::d().mul(&Dop::from_poly(p(&[0, 1])));
        assert_eq!(dz, Dop::new(vec![p(&[1]), p(&[0, 1])]));
        let l = d_z_d();
        assert_eq!(l, Dop::new(vec![p(&[]), p(&[1]), p(&[0, 1])]));
        assert_eq!(l.order(), 2);
        assert_eq!(l.degree(), 1);
    }

    #[test]
    fn test_right_division() {
        // D*z*D = (z*D + 1) * D exactly.
        let l = d_z_d();
        let r = Dop::d();
        assert!(l.is_divisible_by(&r));
        let q = l.exact_div(&r).unwrap();
        assert_eq!(
            q.clear_denominators(),
            Dop::new(vec![p(&[1]), p(&[0, 1])])
        );
        // z*D + 1 does not right-divide D^2.
        let zd1 = Dop::new(vec![p(&[1]), p(&[0, 1])]);
        assert!(!Dop::<Rat>::new(vec![p(&[]), p(&[]), p(&[1])]).is_divisible_by(&zd1));
    }

    #[test]
    fn test_division_property() {
        // Random-ish product: (zD + 3)(2z^2 D - z) recomposes under
        // division.
        let a = Dop::new(vec![p(&[3]), p(&[0, 1])]);
        let b = Dop::new(vec![p(&[0, -1]), p(&[0, 0, 2])]);
        let l = a.mul(&b);
        let (q, r) = RatDop::from_dop(&l).right_div_rem(&RatDop::from_dop(&b));
        assert!(r.is_zero());
        assert_eq!(q.clear_denominators(), a.normalized());
    }

    #[test]
    fn test_adjoint() {
        // (D^2 + z D + 1)* = D^2 - z*D + (1 - 1) ... computed by hand:
        // adjoint = D^2 - zD + (1 - 1) = D^2 - zD. Check involution
        // and the product-reversal property instead.
        let a = Dop::new(vec![p(&[1]), p(&[0, 1]), p(&[1])]);
        let b = Dop::new(vec![p(&[0, 2]), p(&[1])]);
        assert_eq!(a.adjoint().adjoint(), a);
        assert_eq!(a.mul(&b).adjoint(), b.adjoint().mul(&a.adjoint()));
    }

    #[test]
    fn test_compose_shift() {
        // L = (z-1)D; shifting by 1 gives z*D.
        let l = Dop::new(vec![p(&[]), p(&[-1, 1])]);
        let shifted = l.compose_shift(&rat_i64(1));
        assert_eq!(shifted, Dop::new(vec![p(&[]), p(&[0, 1])]));
    }

    #[test]
    fn test_compose_inverse_z() {
        // The Euler operator T = zD pulls back to -T under z -> 1/z,
        // so z*D maps to an operator proportional to w*D.
        let t = Dop::new(vec![p(&[]), p(&[0, 1])]);
        let back = t.compose_inverse_z();
        assert_eq!(back, Dop::new(vec![p(&[]), p(&[0, 1])]));
        // Involution up to normalization for a second-order example.
        let l = Dop::new(vec![p(&[1]), p(&[]), p(&[0, 0, 1])]);
        let twice = l.compose_inverse_z().compose_inverse_z();
        assert_eq!(twice, l.normalized());
    }

    #[test]
    fn test_indicial_at_zero() {
        // T = zD has indicial polynomial X.
        let t = Dop::new(vec![p(&[]), p(&[0, 1])]);
        assert_eq!(t.indicial_at_zero(), p(&[0, 1]));
        // D^2 at an ordinary point: X(X-1).
        let d2 = Dop::new(vec![p(&[]), p(&[]), p(&[1])]);
        assert_eq!(d2.indicial_at_zero(), p(&[0, -1, 1]));
        // ssw-like: t*D + 2 has indicial X + 2.
        let l = Dop::new(vec![p(&[2]), p(&[0, 1])]);
        assert_eq!(l.indicial_at_zero(), p(&[2, 1]));
    }

    #[test]
    fn test_series_basis_ordinary() {
        // y'' = y: basis 1 + z^2/2 + ..., z + z^3/6 + ...
        let l = Dop::new(vec![p(&[-1]), p(&[]), p(&[1])]);
        let basis = l.series_basis(6);
        assert_eq!(basis.len(), 2);
        assert_eq!(basis[0].coeff(0), rat_i64(1));
        assert_eq!(basis[0].coeff(2), rat(1, 2));
        assert_eq!(basis[1].coeff(1), rat_i64(1));
        assert_eq!(basis[1].coeff(3), rat(1, 6));
        // Both are annihilated to the known order.
        for f in &basis {
            assert!(l.apply_series(f).is_zero());
        }
    }

    #[test]
    fn test_series_basis_singular() {
        // T - 2 = zD - 2: single power-series solution z^2.
        let l = Dop::new(vec![p(&[-2]), p(&[0, 1])]);
        let basis = l.series_basis(8);
        assert_eq!(basis.len(), 1);
        assert_eq!(basis[0].valuation(), Some(2));
        assert!(l.apply_series(&basis[0]).is_zero());
    }

    #[test]
    fn test_euler_substitution() {
        // Shifting T -> T + 2 on zD - 2 yields an operator with z^0
        // solutions: zD - 2 annihilates z^2, the substituted operator
        // annihilates 1, i.e. it is proportional to zD.
        let l = Dop::new(vec![p(&[-2]), p(&[0, 1])]);
        let shifted = l.euler_substitution(&rat_i64(2));
        assert_eq!(shifted.normalized(), Dop::new(vec![p(&[]), p(&[0, 1])]));
    }

    #[test]
    fn test_normalized() {
        // Common polynomial factor and rational content are removed.
        let l = Dop::new(vec![p(&[0, 2, 2]), p(&[0, 0, 4, 4])]);
        let n = l.normalized();
        assert_eq!(n, Dop::new(vec![p(&[1]), p(&[0, 2])]));
    }
}
