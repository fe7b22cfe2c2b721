pub mod entity;
pub mod modifiers;
