pub mod breakdown;
pub mod options;
pub mod state;
