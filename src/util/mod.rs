pub mod clock;
pub mod unicode;
