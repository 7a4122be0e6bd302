pub mod ollama;
pub mod openai;
