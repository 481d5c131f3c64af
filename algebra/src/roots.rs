//! Numeric root isolation for polynomials, producing ball enclosures.
//!
//! Simultaneous Weierstrass (Durand-Kerner) iteration on exact dyadic
//! midpoints, with a posteriori residual radii `n*|p(w)|/|p'(w)|` and
//! cluster detection for multiple roots. The enclosures feed the
//! eigenvalue and exponent machinery; a bad enclosure surfaces later as a
//! `PrecisionError` and triggers a retry at higher precision.

use crate::ball::{CBall, PrecisionError};
use crate::coeff::Coeff;
use crate::factorize::squarefree_decomposition;
use crate::poly::Poly;
use crate::rational::{dyadic_round, pow2, rat, sqrt_lower, sqrt_upper, Rat};

/// Exact complex dyadic pair used inside the iteration.
#[derive(Clone, Debug)]
struct Cpx {
    re: Rat,
    im: Rat,
}

impl Cpx {
    fn zero() -> Self {
        Cpx {
            re: Rat::zero(),
            im: Rat::zero(),
        }
    }

    fn round(&self, bits: u32) -> Self {
        Cpx {
            re: dyadic_round(&self.re, bits).0,
            im: dyadic_round(&self.im, bits).0,
        }
    }

    fn add(&self, o: &Self) -> Self {
        Cpx {
            re: &self.re + &o.re,
            im: &self.im + &o.im,
        }
    }

    fn sub(&self, o: &Self) -> Self {
        Cpx {
            re: &self.re - &o.re,
            im: &self.im - &o.im,
        }
    }

    fn mul(&self, o: &Self) -> Self {
        Cpx {
            re: &self.re * &o.re - &self.im * &o.im,
            im: &self.re * &o.im + &self.im * &o.re,
        }
    }

    fn mod_sq(&self) -> Rat {
        &self.re * &self.re + &self.im * &self.im
    }

    fn div(&self, o: &Self) -> Option<Self> {
        let m = o.mod_sq();
        if m.is_zero() {
            return None;
        }
        let conj = Cpx {
            re: o.re.clone(),
            im: -o.im.clone(),
        };
        let p = self.mul(&conj);
        Some(Cpx {
            re: p.re / &m,
            im: p.im / &m,
        })
    }
}

fn eval_cpx(coeffs: &[Cpx], x: &Cpx, bits: u32) -> Cpx {
    let mut acc = Cpx::zero();
    for c in coeffs.iter().rev() {
        acc = acc.mul(x).add(c).round(bits);
    }
    acc
}

/// Cauchy bound: all roots have modulus below `1 + max |a_i| / |a_n|`.
fn root_bound(coeffs: &[Cpx]) -> Rat {
    let lead = coeffs.last().expect("nonempty").mod_sq();
    let lead_low = sqrt_lower(&lead, 16);
    let mut best = Rat::zero();
    for c in &coeffs[..coeffs.len() - 1] {
        let m = sqrt_upper(&c.mod_sq(), 16);
        if m > best {
            best = m;
        }
    }
    Rat::one() + best / lead_low
}

fn weierstrass(coeffs: &[Cpx], prec: u32) -> Vec<Cpx> {
    let n = coeffs.len() - 1;
    let bits = prec + 16;
    let bound = root_bound(coeffs);
    // Spread the initial guesses on a spiral of non-real angles.
    let seed = Cpx {
        re: rat(2, 5),
        im: rat(9, 10),
    };
    let mut ws: Vec<Cpx> = Vec::with_capacity(n);
    let mut cur = Cpx {
        re: bound.clone(),
        im: Rat::zero(),
    };
    for _ in 0..n {
        cur = cur.mul(&seed).round(bits);
        ws.push(cur.clone());
    }
    let tol = pow2(-(prec as i64 + 8));
    let max_iters = 64 + prec as usize;
    for _ in 0..max_iters {
        let mut done = true;
        for i in 0..n {
            let num = eval_cpx(coeffs, &ws[i], bits);
            let mut den = coeffs.last().expect("nonempty").clone();
            for j in 0..n {
                if j != i {
                    den = den.mul(&ws[i].sub(&ws[j])).round(bits);
                }
            }
            let delta = match num.div(&den) {
                Some(d) => d,
                // Collided guesses: nudge apart and keep iterating.
                None => {
                    ws[i] = ws[i]
                        .add(&Cpx {
                            re: pow2(-(prec as i64 / 2)),
                            im: pow2(-(prec as i64 / 2)),
                        })
                        .round(bits);
                    done = false;
                    continue;
                }
            };
            let scale = Rat::one() + ws[i].mod_sq();
            if delta.mod_sq() > &tol * &tol * scale {
                done = false;
            }
            ws[i] = ws[i].sub(&delta).round(bits);
        }
        if done {
            break;
        }
    }
    ws
}

/// Residual radius `n * |p(w)| / |p'(w)|`, or `None` when the derivative
/// is numerically zero (cluster case).
fn residual_radius(coeffs: &[Cpx], dcoeffs: &[Cpx], w: &Cpx, prec: u32) -> Option<Rat> {
    let n = coeffs.len() - 1;
    let pv = eval_cpx(coeffs, w, prec + 16);
    let dv = eval_cpx(dcoeffs, w, prec + 16);
    let dlow = sqrt_lower(&dv.mod_sq(), 32);
    if dlow.is_zero() {
        return None;
    }
    let pup = sqrt_upper(&pv.mod_sq(), 32);
    Some(Rat::from_integer(n.into()) * pup / dlow)
}

fn ball_from(w: &Cpx, rad: Rat, prec: u32) -> CBall {
    CBall::exact(w.re.clone(), w.im.clone(), prec).with_rad(rad).rounded()
}

fn poly_to_cpx(p: &Poly<CBall>) -> (Vec<Cpx>, Rat) {
    let mut max_rad = Rat::zero();
    let coeffs = p
        .coeffs
        .iter()
        .map(|c| {
            if c.rad > max_rad {
                max_rad = c.rad.clone();
            }
            Cpx {
                re: c.re.clone(),
                im: c.im.clone(),
            }
        })
        .collect();
    (coeffs, max_rad)
}

/// Roots of a ball polynomial, clustered into `(enclosure, multiplicity)`
/// pairs. The multiplicities sum to the degree.
pub fn complex_roots_ball(p: &Poly<CBall>, prec: u32) -> Result<Vec<(CBall, usize)>, PrecisionError> {
    let p = p.trimmed();
    if p.degree_plus_one() <= 1 {
        return Ok(Vec::new());
    }
    let (coeffs, coeff_rad) = poly_to_cpx(&p);
    if coeffs.last().expect("nonconstant").mod_sq().is_zero() {
        return Err(PrecisionError);
    }
    let n = coeffs.len() - 1;
    if n == 1 {
        let root = coeffs[0]
            .div(&coeffs[1])
            .expect("nonzero lead")
            .round(prec + 16);
        let w = Cpx {
            re: -root.re,
            im: -root.im,
        };
        let rad = &coeff_rad * (Rat::one() + sqrt_upper(&w.mod_sq(), 16));
        return Ok(vec![(ball_from(&w, rad, prec), 1)]);
    }
    let ws = weierstrass(&coeffs, prec);
    let dcoeffs: Vec<Cpx> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| {
            Cpx {
                re: &c.re * Rat::from_integer(i.into()),
                im: &c.im * Rat::from_integer(i.into()),
            }
        })
        .collect();
    let bound = root_bound(&coeffs);
    // Coefficient-interval contribution to each residual.
    let coeff_term = &coeff_rad
        * Rat::from_integer((n + 1).into())
        * bound.max(Rat::one()).pow(n as i32);
    let radii: Vec<Option<Rat>> = ws
        .iter()
        .map(|w| residual_radius(&coeffs, &dcoeffs, w, prec).map(|r| r + &coeff_term))
        .collect();
    // Union-find style clustering on overlapping or unresolved discs.
    let tau = pow2(-(prec as i64 / 3));
    let mut cluster_of: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in 0..i {
            let dist = sqrt_upper(&ws[i].sub(&ws[j]).mod_sq(), 32);
            let merge = match (&radii[i], &radii[j]) {
                (Some(ri), Some(rj)) => dist <= ri + rj || dist <= tau,
                _ => dist <= tau,
            };
            if merge {
                let (a, b) = (cluster_of[i], cluster_of[j]);
                let target = a.min(b);
                for c in cluster_of.iter_mut() {
                    if *c == a || *c == b {
                        *c = target;
                    }
                }
            }
        }
    }
    let mut out = Vec::new();
    let mut reps: Vec<usize> = cluster_of.clone();
    reps.sort_unstable();
    reps.dedup();
    for rep in reps {
        let members: Vec<usize> = (0..n).filter(|&i| cluster_of[i] == rep).collect();
        let m = members.len();
        let k = Rat::from_integer((m as i64).into());
        let mut cre = Rat::zero();
        let mut cim = Rat::zero();
        for &i in &members {
            cre += &ws[i].re;
            cim += &ws[i].im;
        }
        let center = Cpx {
            re: cre / &k,
            im: cim / &k,
        };
        let mut rad = tau.clone();
        for &i in &members {
            let d = sqrt_upper(&ws[i].sub(&center).mod_sq(), 32);
            let ri = radii[i].clone().unwrap_or_else(|| tau.clone());
            if &d + &ri > rad {
                rad = d + ri;
            }
        }
        out.push((ball_from(&center, rad, prec), m));
    }
    Ok(out)
}

/// Roots of an exact rational polynomial with multiplicities, as balls.
/// Multiplicities are exact (from the squarefree decomposition); rational
/// roots of linear factors come out with radius zero.
pub fn complex_roots_rat(p: &Poly<Rat>, prec: u32) -> Result<Vec<(CBall, usize)>, PrecisionError> {
    let mut out = Vec::new();
    for (part, mult) in squarefree_decomposition(p) {
        let ball_part = part.map_coeffs(|c| CBall::from_rat(c, prec));
        for (root, m) in complex_roots_ball(&ball_part, prec)? {
            debug_assert_eq!(m, 1);
            out.push((root, mult * m));
        }
    }
    Ok(out)
}

/// Newton-refines an isolated root of `f` near `seed` to precision `prec`.
pub fn refine_root(f: &Poly<Rat>, seed: &CBall, prec: u32) -> Result<CBall, PrecisionError> {
    let bits = prec + 16;
    let coeffs: Vec<Cpx> = f
        .coeffs
        .iter()
        .map(|c| Cpx {
            re: c.clone(),
            im: Rat::zero(),
        })
        .collect();
    if coeffs.len() <= 1 {
        return Err(PrecisionError);
    }
    let dcoeffs: Vec<Cpx> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| Cpx {
            re: &c.re * Rat::from_integer(i.into()),
            im: &c.im * Rat::from_integer(i.into()),
        })
        .collect();
    let mut w = Cpx {
        re: seed.re.clone(),
        im: seed.im.clone(),
    };
    // Newton doubles correct bits per step, so ceil(log2(prec)) + slack
    // iterations suffice.
    let steps = 4 + (u32::BITS - (prec + 1).leading_zeros()) as usize;
    for _ in 0..steps {
        let pv = eval_cpx(&coeffs, &w, bits);
        let dv = eval_cpx(&dcoeffs, &w, bits);
        match pv.div(&dv) {
            Some(delta) => w = w.sub(&delta).round(bits),
            None => return Err(PrecisionError),
        }
    }
    match residual_radius(&coeffs, &dcoeffs, &w, prec) {
        Some(rad) => Ok(ball_from(&w, rad, prec)),
        None => Err(PrecisionError),
    }
}

/// Index of the enclosure whose midpoint lies nearest to `target`.
pub fn nearest_root_index(roots: &[CBall], target: &CBall) -> usize {
    assert!(!roots.is_empty());
    let mut best = 0;
    let mut best_d: Option<Rat> = None;
    for (i, r) in roots.iter().enumerate() {
        let dr = &r.re - &target.re;
        let di = &r.im - &target.im;
        let d = &dr * &dr + &di * &di;
        if best_d.as_ref().map_or(true, |b| &d < b) {
            best = i;
            best_d = Some(d);
        }
    }
    best
}
