//! Testing utilities: synthetic frames and scripted pipeline collaborators
//!
//! Everything here is deterministic and hardware-free, so pipeline behavior
//! can be exercised offline in unit and integration tests.

mod synthetic;

pub use synthetic::{
    synthetic_frame, MemorySegment, MemorySegmentFactory, ScriptedClassifier, ScriptedSource,
};
