mod simplecolor;

pub use simplecolor::{hsv_range, SimpleColor};
