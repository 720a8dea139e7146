pub mod calculate;
pub mod callbacks;
