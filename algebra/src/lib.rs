#![allow(clippy::len_without_is_empty)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::new_without_default)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod ball;
pub mod coeff;
pub mod factorize;
pub mod lattice;
pub mod matrix;
pub mod numberfield;
pub mod poly;
pub mod ratfunc;
pub mod rational;
pub mod roots;
pub mod series;
