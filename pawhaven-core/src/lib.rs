pub mod appointment;
pub mod error;
pub mod identity;
pub mod pet;
pub mod repository;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment, ServiceType};
pub use error::{SchedulingError, StoreError, SLOT_TAKEN_MSG};
pub use identity::{Identity, Role};
pub use pet::Pet;
pub use repository::{
    AppointmentFilter, AppointmentPage, AppointmentRepository, AppointmentUpdate, PetDirectory,
};
