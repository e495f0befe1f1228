pub mod message;
pub mod product;
pub mod summary;
pub mod upload;
