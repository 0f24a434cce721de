//! Equipment records.

use serde::{Deserialize, Serialize};

/// Type alias for equipment ids (monotonic integers assigned by the store).
pub type EquipmentId = u64;

/// A piece of inspectable equipment.
///
/// The factory field is advisory: equipment and factories are independent
/// collections and deleting a factory never cascades into this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub factory: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}
