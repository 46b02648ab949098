mod record;
mod replay;
mod source;

pub use record::*;
pub use replay::*;
pub use source::*;
