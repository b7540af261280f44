mod equipment;

pub use equipment::EquipmentCommands;
