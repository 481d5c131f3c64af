#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::type_complexity)]

pub use dfactor_algebra as algebra;

pub mod annihilator;
pub mod dop;
pub mod driver;
pub mod error;
pub mod guessing;
pub mod monodromy;
pub mod normalize;
pub mod shortcut;
pub mod spectral;
pub mod subspace;
