//! Factory and equipment CRUD.

use std::sync::Arc;

use crate::store::{EquipmentStore, FactoryStore, StoreError};
use crate::types::{Equipment, EquipmentId};

/// Validated CRUD over the factory and equipment collections.
///
/// Role gating happens in the message router; this layer only validates
/// shape. The factory field on an equipment record is advisory and never
/// cross-checked against the factory list.
pub struct DirectoryService {
    factories: Arc<dyn FactoryStore>,
    equipments: Arc<dyn EquipmentStore>,
}

impl DirectoryService {
    pub fn new(factories: Arc<dyn FactoryStore>, equipments: Arc<dyn EquipmentStore>) -> Self {
        Self {
            factories,
            equipments,
        }
    }

    pub async fn factories(&self) -> Result<Vec<String>, StoreError> {
        self.factories.list_factories().await
    }

    /// Append a factory. Fails on empty (after trim) or duplicate names.
    pub async fn add_factory(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        self.factories.add_factory(name).await
    }

    /// Remove a factory. Returns false when absent.
    pub async fn delete_factory(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(false);
        }
        self.factories.remove_factory(name).await
    }

    /// Append an equipment record. Returns None when factory or name is
    /// empty after trimming.
    pub async fn add_equipment(
        &self,
        factory: &str,
        name: &str,
        kind: &str,
    ) -> Result<Option<Equipment>, StoreError> {
        let factory = factory.trim();
        let name = name.trim();
        if factory.is_empty() || name.is_empty() {
            return Ok(None);
        }
        let equipment = self.equipments.add_equipment(factory, name, kind.trim()).await?;
        Ok(Some(equipment))
    }

    /// Remove equipment by id. Returns false when absent.
    pub async fn delete_equipment(&self, id: EquipmentId) -> Result<bool, StoreError> {
        self.equipments.remove_equipment(id).await
    }

    pub async fn list_equipments(
        &self,
        factory: Option<&str>,
    ) -> Result<Vec<Equipment>, StoreError> {
        self.equipments.list_equipments(factory).await
    }
}
