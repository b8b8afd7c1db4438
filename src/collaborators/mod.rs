//! Concrete backend adapters

pub mod memory;

pub use memory::MemoryCollaborator;
