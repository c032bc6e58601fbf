use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Read-only view of a pet. The pet catalog lives outside this
/// subsystem; appointments only reference pets by id and look them up
/// through the [`crate::repository::PetDirectory`] collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: String,
}
