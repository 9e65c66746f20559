pub mod coord;
pub mod field;
pub mod mesh;
pub mod progress;
pub mod sampler;
pub mod triangle;
pub mod triangulator;

/// Scalar type.
pub type Scalar = f32;

pub mod prelude {
    pub use crate::{
        coord::*, field::*, mesh::*, progress::*, sampler::*, triangle::*, triangulator::*, Scalar,
    };
}
