//! Systems module - all ECS systems for the thrown-weapon simulation.

pub mod collision;
pub mod debug;
pub mod homing;
pub mod kinematics;
pub mod launch;
pub mod logic;
pub mod pickup;
pub mod replication;
