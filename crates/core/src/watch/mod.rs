pub mod compare;
pub mod port;
