pub mod audit;
pub mod fs;
