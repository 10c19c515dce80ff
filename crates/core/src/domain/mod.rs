pub mod cart;
pub mod matches;
pub mod product;
