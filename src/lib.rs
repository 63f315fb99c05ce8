pub mod client;
pub mod config;
pub mod models;
pub mod openai;
pub mod prompt;
pub mod routes;
pub mod trends;
pub mod view;

#[cfg(test)]
mod testing;
