//! Embedded number fields `Q[x]/(m)` and their elements.
//!
//! A field is identified by its structural fingerprint (primitive minimal
//! polynomial plus a coarse enclosure of the distinguished root); a
//! registry keyed on the fingerprint unifies equal-but-not-identical
//! fields. Elements with `field: None` are rational constants coercible
//! into any field, which lets the generic operator code run over `Q`
//! without constructing a trivial extension.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use num::{BigInt, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::ball::{CBall, PrecisionError};
use crate::coeff::Coeff;
use crate::poly::Poly;
use crate::rational::{dyadic_round, sqrt_upper, Rat};
use crate::roots::{complex_roots_rat, nearest_root_index, refine_root};

#[derive(Clone, Debug)]
pub struct NumberField {
    minpoly: Poly<Rat>,
    embedding: CBall,
}

impl NumberField {
    /// `minpoly` must be monic, squarefree, of degree >= 2; `embedding`
    /// isolates the distinguished root.
    pub fn try_new(minpoly: Poly<Rat>, embedding: CBall) -> anyhow::Result<Self> {
        anyhow::ensure!(minpoly.degree_plus_one() >= 3, "degree must be >= 2");
        anyhow::ensure!(minpoly.lead().is_one(), "minimal polynomial must be monic");
        Ok(NumberField { minpoly, embedding })
    }

    pub fn new(minpoly: Poly<Rat>, embedding: CBall) -> Self {
        Self::try_new(minpoly, embedding).expect("invalid number field")
    }

    pub fn degree(&self) -> usize {
        self.minpoly.degree()
    }

    pub fn minpoly(&self) -> &Poly<Rat> {
        &self.minpoly
    }

    /// An enclosure of the distinguished root at the requested precision.
    pub fn root_enclosure(&self, prec: u32) -> Result<CBall, PrecisionError> {
        refine_root(&self.minpoly, &self.embedding, prec)
    }

    pub fn fingerprint(&self) -> FieldKey {
        FieldKey {
            minpoly: self.minpoly.coeffs.clone(),
            re: dyadic_round(&self.embedding.re, 12).0,
            im: dyadic_round(&self.embedding.im, 12).0,
        }
    }
}

/// Structural identity of an embedded number field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    minpoly: Vec<Rat>,
    re: Rat,
    im: Rat,
}

/// Process-wide cache reconciling equal-but-not-identical fields.
#[derive(Default)]
pub struct FieldRegistry {
    fields: HashMap<FieldKey, Arc<NumberField>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        FieldRegistry {
            fields: HashMap::new(),
        }
    }

    pub fn intern(&mut self, minpoly: Poly<Rat>, embedding: CBall) -> Arc<NumberField> {
        let field = NumberField::new(minpoly, embedding);
        let key = field.fingerprint();
        if let Some(cached) = self.fields.get(&key) {
            log::trace!("field registry hit for degree-{} field", cached.degree());
            return cached.clone();
        }
        let arc = Arc::new(field);
        self.fields.insert(key, arc.clone());
        arc
    }
}

/// An element of an embedded number field (or a rational constant when
/// `field` is `None`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NfElem {
    coords: Poly<Rat>,
    #[serde(skip)]
    field: Option<Arc<NumberField>>,
}

impl NfElem {
    pub fn rational(q: Rat) -> Self {
        NfElem {
            coords: Poly::constant(q),
            field: None,
        }
    }

    pub fn generator(field: &Arc<NumberField>) -> Self {
        NfElem {
            coords: Poly::x(),
            field: Some(field.clone()),
        }
    }

    pub fn from_coords(coords: Poly<Rat>, field: &Arc<NumberField>) -> Self {
        let coords = coords.rem(field.minpoly());
        NfElem {
            coords,
            field: Some(field.clone()),
        }
    }

    pub fn field(&self) -> Option<&Arc<NumberField>> {
        self.field.as_ref()
    }

    pub fn coords(&self) -> &Poly<Rat> {
        &self.coords
    }

    fn unify_fields(
        a: &Option<Arc<NumberField>>,
        b: &Option<Arc<NumberField>>,
    ) -> Option<Arc<NumberField>> {
        match (a, b) {
            (None, None) => None,
            (Some(f), None) => Some(f.clone()),
            (None, Some(g)) => Some(g.clone()),
            (Some(f), Some(g)) => {
                debug_assert_eq!(f.fingerprint(), g.fingerprint(), "mixed number fields");
                Some(f.clone())
            }
        }
    }

    fn reduced(coords: Poly<Rat>, field: Option<Arc<NumberField>>) -> Self {
        let coords = match &field {
            Some(f) => coords.rem(f.minpoly()),
            None => coords,
        };
        NfElem { coords, field }
    }
}

impl PartialEq for NfElem {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords
    }
}

impl fmt::Display for NfElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coords.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (i, c) in self.coords.coeffs.iter().enumerate() {
            if num::Zero::is_zero(c) {
                continue;
            }
            if !first {
                write!(f, " + ")?;
            }
            match i {
                0 => write!(f, "{c}")?,
                1 => write!(f, "{c}*a")?,
                _ => write!(f, "{c}*a^{i}")?,
            }
            first = false;
        }
        Ok(())
    }
}

impl std::ops::Add for NfElem {
    type Output = NfElem;

    fn add(self, rhs: Self) -> NfElem {
        let field = Self::unify_fields(&self.field, &rhs.field);
        NfElem::reduced(&self.coords + &rhs.coords, field)
    }
}

impl std::ops::Sub for NfElem {
    type Output = NfElem;

    fn sub(self, rhs: Self) -> NfElem {
        let field = Self::unify_fields(&self.field, &rhs.field);
        NfElem::reduced(&self.coords - &rhs.coords, field)
    }
}

impl std::ops::Mul for NfElem {
    type Output = NfElem;

    fn mul(self, rhs: Self) -> NfElem {
        let field = Self::unify_fields(&self.field, &rhs.field);
        NfElem::reduced(&self.coords * &rhs.coords, field)
    }
}

impl std::ops::Neg for NfElem {
    type Output = NfElem;

    fn neg(self) -> NfElem {
        NfElem {
            coords: -&self.coords,
            field: self.field,
        }
    }
}

impl Coeff for NfElem {
    fn zero() -> Self {
        NfElem::rational(<Rat as Coeff>::zero())
    }

    fn one() -> Self {
        NfElem::rational(num::One::one())
    }

    fn is_zero(&self) -> bool {
        self.coords.is_zero()
    }

    fn from_rat(q: Rat) -> Self {
        NfElem::rational(q)
    }

    fn try_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        match &self.field {
            None => {
                let q = self.coords.coeff(0);
                Some(NfElem::rational(q.recip()))
            }
            Some(f) => {
                let (g, u, _) = self.coords.extended_gcd(f.minpoly());
                if g.degree_plus_one() != 1 {
                    // The modulus is not irreducible and the element is a
                    // zero divisor.
                    return None;
                }
                let c = g.coeff(0).recip();
                Some(NfElem::reduced(
                    u.scale(&c),
                    Some(f.clone()),
                ))
            }
        }
    }

    fn as_rat(&self) -> Option<Rat> {
        (self.coords.degree_plus_one() <= 1).then(|| self.coords.coeff(0))
    }

    fn embed(&self, prec: u32) -> CBall {
        match &self.field {
            None => CBall::from_rat(&self.coords.coeff(0), prec),
            Some(f) => {
                let root = f
                    .root_enclosure(prec)
                    .expect("embedding root refinement failed");
                let ball_coords = self.coords.map_coeffs(|c| CBall::from_rat(c, prec));
                ball_coords.eval(&root)
            }
        }
    }

    fn denom(&self) -> BigInt {
        let mut d = BigInt::from(1);
        for c in &self.coords.coeffs {
            d = num::integer::lcm(d, Rat::denom(c).clone());
        }
        d
    }

    fn int_content(&self) -> BigInt {
        let mut g = BigInt::zero();
        for c in &self.coords.coeffs {
            g = num::integer::gcd(g, Rat::numer(c).abs());
        }
        g
    }

    fn sign_hint(&self) -> i32 {
        match self.coords.coeffs.iter().rev().find(|c| !num::Zero::is_zero(*c)) {
            Some(c) if c.is_negative() => -1,
            _ => 1,
        }
    }
}

/// Lifts a rational polynomial into a number-field polynomial.
pub fn lift_poly(p: &Poly<Rat>) -> Poly<NfElem> {
    p.map_coeffs(|c| NfElem::rational(c.clone()))
}

/// An algebraic number presented by its minimal polynomial and an
/// enclosure selecting one of its conjugates.
#[derive(Clone, Debug)]
pub struct AlgebraicNumber {
    pub minpoly: Poly<Rat>,
    pub approx: CBall,
}

fn balls_overlap(a: &CBall, b: &CBall) -> bool {
    let dr = &a.re - &b.re;
    let di = &a.im - &b.im;
    let dist = sqrt_upper(&(&dr * &dr + &di * &di), 32);
    dist <= &a.rad + &b.rad
}

/// Expresses a family of algebraic numbers in one embedded number field.
///
/// Supported configurations: all rational; all conjugates of a common
/// minimal polynomial, fully for degree 2 (conjugates go through the
/// trace) and on embedding match for higher degrees. Anything else is
/// unsupported and yields `None`.
pub fn common_field(
    registry: &mut FieldRegistry,
    values: &[AlgebraicNumber],
    prec: u32,
) -> Option<(Option<Arc<NumberField>>, Vec<NfElem>)> {
    let mut minpoly: Option<Poly<Rat>> = None;
    for v in values {
        if v.minpoly.degree_plus_one() <= 2 {
            continue;
        }
        let m = v.minpoly.monic();
        match &minpoly {
            None => minpoly = Some(m),
            Some(prev) if *prev == m => {}
            Some(_) => return None,
        }
    }
    let Some(m) = minpoly else {
        // Every value is rational.
        let out = values
            .iter()
            .map(|v| {
                let root = -v.minpoly.monic().coeff(0);
                NfElem::rational(root)
            })
            .collect();
        return Some((None, out));
    };
    let d = m.degree();
    let roots: Vec<CBall> = complex_roots_rat(&m, prec)
        .ok()?
        .into_iter()
        .map(|(b, _)| b)
        .collect();
    if roots.len() != d {
        return None;
    }
    let first = values
        .iter()
        .find(|v| v.minpoly.degree_plus_one() > 2)
        .expect("nonrational value exists");
    let gen_idx = nearest_root_index(&roots, &first.approx);
    let field = registry.intern(m.clone(), roots[gen_idx].clone());
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        if v.minpoly.degree_plus_one() <= 2 {
            out.push(NfElem::rational(-v.minpoly.monic().coeff(0)));
            continue;
        }
        let idx = nearest_root_index(&roots, &v.approx);
        let elem = if idx == gen_idx {
            NfElem::generator(&field)
        } else if d == 2 {
            // The other root is trace - a = -m[1] - a.
            let tr = -m.coeff(1);
            NfElem::from_coords(
                Poly::new(vec![tr, -<Rat as Coeff>::one()]),
                &field,
            )
        } else {
            return None;
        };
        if !balls_overlap(&elem.embed(prec), &v.approx) {
            return None;
        }
        out.push(elem);
    }
    Some((Some(field), out))
}
