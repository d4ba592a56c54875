pub mod rollover;
pub mod row_ops;
pub mod summary;
