pub mod asset;
pub mod entity;
