//! Remote store and question generator backends for perlan.
//!
//! Implements the `RemoteStore` and `QuestionGenerator` traits from
//! `perlan-core`, plus the TOML configuration that selects between them.

pub mod config;
pub mod file;
pub mod http;
pub mod memory;
pub mod mock;
pub mod openai;

pub use config::{
    create_generator, create_remote, load_config, load_config_from, GeneratorConfig,
    PerlanConfig, RemoteConfig,
};
pub use file::FileRemote;
pub use http::HttpRemote;
pub use memory::MemoryRemote;
pub use mock::MockGenerator;
pub use openai::OpenAiGenerator;
