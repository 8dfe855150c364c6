pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod paths;
pub mod quiz;
pub mod services;
pub mod session;
pub mod state;
pub mod vocabulary;

#[cfg(test)]
mod testing;
