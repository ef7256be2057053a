pub mod recorder;
pub mod state;
