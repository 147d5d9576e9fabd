mod steps;
mod world;

pub use world::{AssignmentSystem, GameLinkWorld};
