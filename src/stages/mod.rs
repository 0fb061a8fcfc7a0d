mod evidence;
mod research;
mod synthesis;

pub use evidence::extract_sources;
pub use research::ResearchStage;
pub use synthesis::{SynthesisInput, SynthesisStage};
