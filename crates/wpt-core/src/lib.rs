pub mod config;
pub mod engine;
pub mod errors;
pub mod label;
pub mod model;
pub mod poll;
pub mod providers;
pub mod rows;
pub mod schema;
pub mod storage;
pub mod target;
pub mod template;
pub mod version;

#[cfg(test)]
mod test_support;
