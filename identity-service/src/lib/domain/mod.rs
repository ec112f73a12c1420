pub mod account;
pub mod registration;
pub mod token;
