//! Pet directory implementations. The pet catalog is owned elsewhere;
//! this subsystem only needs existence checks and the name search that
//! backs the admin listing's `search` filter.

use async_trait::async_trait;
use pawhaven_core::{Pet, PetDirectory, StoreError};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryPetDirectory {
    pets: RwLock<HashMap<Uuid, Pet>>,
}

impl MemoryPetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pets(pets: Vec<Pet>) -> Self {
        let dir = Self::new();
        for pet in pets {
            dir.register(pet);
        }
        dir
    }

    pub fn register(&self, pet: Pet) {
        if let Ok(mut pets) = self.pets.write() {
            pets.insert(pet.id, pet);
        }
    }
}

#[async_trait]
impl PetDirectory for MemoryPetDirectory {
    async fn exists(&self, pet_id: Uuid) -> Result<bool, StoreError> {
        let pets = self
            .pets
            .read()
            .map_err(|_| StoreError::Backend("pet directory lock poisoned".to_string()))?;
        Ok(pets.contains_key(&pet_id))
    }

    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, StoreError> {
        let pets = self
            .pets
            .read()
            .map_err(|_| StoreError::Backend("pet directory lock poisoned".to_string()))?;
        let needle = fragment.to_lowercase();
        Ok(pets
            .values()
            .filter(|pet| pet.name.to_lowercase().contains(&needle))
            .map(|pet| pet.id)
            .collect())
    }
}

pub struct PgPetDirectory {
    pool: PgPool,
}

impl PgPetDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PetDirectory for PgPetDirectory {
    async fn exists(&self, pet_id: Uuid) -> Result<bool, StoreError> {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM pets WHERE id = $1")
            .bind(pet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(found.is_some())
    }

    async fn find_ids_by_name(&self, fragment: &str) -> Result<Vec<Uuid>, StoreError> {
        sqlx::query_scalar("SELECT id FROM pets WHERE name ILIKE '%' || $1 || '%'")
            .bind(fragment)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(name: &str) -> Pet {
        Pet {
            id: Uuid::new_v4(),
            name: name.to_string(),
            species: "Dog".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_directory_search() {
        let dir = MemoryPetDirectory::with_pets(vec![pet("Rex"), pet("Trexie"), pet("Muffin")]);
        let ids = dir.find_ids_by_name("rex").await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(dir.find_ids_by_name("cat").await.unwrap().is_empty());
        assert!(!dir.exists(Uuid::new_v4()).await.unwrap());
    }
}
