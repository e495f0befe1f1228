pub mod catalog;
pub mod model;
pub mod ocr;
pub mod payments;
pub mod queue;
pub mod storage;
