pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod llm;
pub mod memory;
pub mod server;
pub mod system_prompt;
pub mod tutor;
