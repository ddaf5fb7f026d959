pub mod bot;
pub mod telegram;
