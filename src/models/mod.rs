pub mod batch;
pub mod label;
pub mod upload;
