// Adapters layer: concrete implementations of the domain ports (backend, scanner, sound).

pub mod capture;
pub mod memory;
pub mod sound;
pub mod supabase;
