mod slp;

pub use slp::*;
