pub mod playback;
pub mod range;
pub mod shortcuts;
pub mod types;
