//! Board primitives: the grid, its cells and the pieces that fall into it.
//!
//! - [`Grid`] - 12x20 cell matrix with collision, line clearing and gravity
//! - [`Cell`] - Content of one grid cell
//! - [`Piece`] - A placed, rotated piece of some [`SpawnKind`]
//! - [`PieceKind`] - The seven standard shapes
//!
//! Nothing here knows about time, opponents or currency; see
//! [`crate::engine`] for that.

pub use self::{grid::*, piece::*};

pub(crate) mod grid;
pub(crate) mod piece;
