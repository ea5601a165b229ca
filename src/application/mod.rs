pub mod history;
pub mod order_service;
