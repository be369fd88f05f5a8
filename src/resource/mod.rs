pub mod ibl;
pub mod image;
pub mod obj;
