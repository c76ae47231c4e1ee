pub mod context;
pub mod list;
pub mod synth;
