pub mod batch;
pub mod extraction;
