//! Request handlers

pub mod health;
pub mod resource;

pub use resource::Resource;
