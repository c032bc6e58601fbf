pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod pet_dir;
pub mod pg_repo;

pub use app_config::Config;
pub use memory_repo::MemoryAppointmentStore;
pub use pet_dir::{MemoryPetDirectory, PgPetDirectory};
pub use pg_repo::PgAppointmentStore;
