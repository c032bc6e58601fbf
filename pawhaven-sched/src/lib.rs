pub mod amendment;
pub mod availability;
pub mod booking;
pub mod lifecycle;
pub mod slots;

pub use amendment::{AmendmentRequest, AmendmentService};
pub use availability::{AvailabilityService, DayAvailability, HorizonAvailability};
pub use booking::{BookingRequest, BookingService};
pub use lifecycle::LifecycleService;
