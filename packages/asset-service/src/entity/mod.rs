pub mod article;
pub mod asset;
pub mod lab;
pub mod submission;
