mod serial;

pub use serial::*;
