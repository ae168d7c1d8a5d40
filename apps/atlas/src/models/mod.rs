pub mod offer;
pub mod skill;
