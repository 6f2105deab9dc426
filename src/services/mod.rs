pub mod batch;
pub mod batch_store;
pub mod export;
pub mod health_warning;
pub mod ocr;
pub mod pipeline;
pub mod resolver;
pub mod storage;
pub mod validation;
