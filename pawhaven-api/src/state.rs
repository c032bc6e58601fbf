use std::sync::Arc;

use pawhaven_core::{AppointmentRepository, PetDirectory};
use pawhaven_sched::{AmendmentService, AvailabilityService, BookingService, LifecycleService};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AppointmentRepository>,
    pub pets: Arc<dyn PetDirectory>,
    pub booking: Arc<BookingService>,
    pub amendments: Arc<AmendmentService>,
    pub lifecycle: Arc<LifecycleService>,
    pub availability: Arc<AvailabilityService>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn AppointmentRepository>,
        pets: Arc<dyn PetDirectory>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            booking: Arc::new(BookingService::new(store.clone(), pets.clone())),
            amendments: Arc::new(AmendmentService::new(store.clone(), pets.clone())),
            lifecycle: Arc::new(LifecycleService::new(store.clone())),
            availability: Arc::new(AvailabilityService::new(store.clone())),
            store,
            pets,
            auth,
        }
    }
}
