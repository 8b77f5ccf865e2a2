pub mod preprocessing;
pub mod quantize;
pub mod extraction;
pub mod distance;

pub use preprocessing::*;
pub use quantize::*;
pub use extraction::*;
pub use distance::*;
