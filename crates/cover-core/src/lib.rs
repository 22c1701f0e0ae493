//! Eph5 and Rang-JPEG steganographic engines over a bundled JPEG coefficient
//! codec: keyed permutation and GF(2) linear algebra primitives feeding two
//! independent embed/extract schemes, plus the `modify_image` helper
//! Rang-JPEG's embedder needs to produce its companion image.

pub mod arcfour;
pub mod bitset;
pub mod container;
pub mod eph5;
pub mod error;
pub mod gf2;
pub mod keys;
pub mod permutation;
pub mod rang;

pub use container::Container;
pub use eph5::{Capacities, Eph5};
pub use error::{CoverError, Result};
pub use rang::{blur::modify_image, Rang};
