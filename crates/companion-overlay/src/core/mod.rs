pub mod items;
pub mod physics;
pub mod scheduler;
pub mod time;
