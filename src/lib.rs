pub mod aggregate;
pub mod analysis;
pub mod archetype;
pub mod batch;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod pager;
