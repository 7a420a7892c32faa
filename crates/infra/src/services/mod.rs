mod channels;

pub use channels::*;
