pub mod bot;
pub mod config;
pub mod groq;
pub mod webhook;
