pub mod note_service;
pub mod profile_service;

pub use note_service::{parse_note_id, CreateNoteRequest, NoteService, UpdateNoteRequest};
pub use profile_service::{ProfileService, UpdateProfileRequest};
