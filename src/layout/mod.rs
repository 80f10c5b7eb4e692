pub mod justified;
pub mod layout_cache;

pub use justified::*;
pub use layout_cache::LayoutCache;
