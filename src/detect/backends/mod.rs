pub mod scripted;

pub use scripted::{load_script, ScriptedBackend, ScriptedFrame};
