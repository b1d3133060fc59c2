//! Geometric primitives for the nesting engine.
//!
//! Everything here is a narrow facade over the `geo` crate family; the
//! placement engine never touches the backing types directly.

mod offset;
mod outline;

#[doc(inline)]
pub use offset::inflate_outer;
#[doc(inline)]
pub use outline::Outline;
