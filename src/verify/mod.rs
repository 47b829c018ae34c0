//! Runtime checks of the state invariants, used by the runner after each
//! dispatch and by the stress and replay tools.

pub mod invariants;
