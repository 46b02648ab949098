mod color;
mod material;
mod piece;
mod position;
mod role;
mod square;

pub use color::*;
pub use material::*;
pub use piece::*;
pub use position::*;
pub use role::*;
pub use square::*;
