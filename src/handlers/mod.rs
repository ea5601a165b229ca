pub mod gateway;
pub mod orders;
