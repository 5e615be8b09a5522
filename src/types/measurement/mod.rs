pub mod euler;

pub use euler::{wrap, Tilt, DEGREE_PER_DAG};
