//! Directory domain layer: entities, listing rules, quota policy, site settings

pub mod entities;
pub mod listing;
pub mod quota;
pub mod site;
