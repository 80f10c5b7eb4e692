//! Media store gallery: an asset list gateway, an incremental pager over it
//! and a justified row layout for the accumulated assets.

pub mod cli;
pub mod config;
pub mod error;
pub mod gallery;
pub mod gateway;
pub mod layout;
pub mod models;
pub mod pager;
pub mod server;
pub mod upstream;

#[cfg(test)]
mod test_helpers;
