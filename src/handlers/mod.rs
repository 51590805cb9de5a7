// handlers/mod.rs - HTTP handlers
//
// public:  no authentication (banner, health)
// notes:   /api/notes CRUD, JWT required, ownership enforced by NoteService
// profile: /api/profile, JWT required

pub mod notes;
pub mod profile;
pub mod public;
