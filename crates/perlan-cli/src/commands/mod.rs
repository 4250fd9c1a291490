pub mod generate;
pub mod import;
pub mod init;
pub mod learn;
pub mod modules;
pub mod play;
pub mod questions;
pub mod reset;
pub mod stats;
pub mod sync;
pub mod validate;
