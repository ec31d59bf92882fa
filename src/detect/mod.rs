mod backend;
mod backends;
mod result;

pub use backend::DetectorBackend;
pub use backends::{load_script, ScriptedBackend, ScriptedFrame};
pub use result::{BBox, Detection};
