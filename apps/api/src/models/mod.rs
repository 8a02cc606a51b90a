pub mod conversation;
pub mod cover_letter;
pub mod job;
