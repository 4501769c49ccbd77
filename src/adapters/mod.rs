// Adapters layer: concrete implementations of the domain ports against the
// two external REST subsystems.

pub mod directory;
pub mod mailbox;
