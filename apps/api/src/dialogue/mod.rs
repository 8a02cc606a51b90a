// Dialogue layer: one utterance in, one reply out.
// The orchestrator picks a task flow per turn, branch handlers compute the next
// state and the writes to persist, and the session service commits both together.

mod cover_letter;
pub mod handlers;
mod interview;
mod job_search;
pub mod orchestrator;
pub mod responses;
pub mod session;
#[cfg(test)]
pub mod testing;
