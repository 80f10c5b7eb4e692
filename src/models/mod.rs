pub mod asset_record;
pub mod page;

pub use asset_record::*;
pub use page::*;
