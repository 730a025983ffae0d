pub mod outcome;
pub mod product;
