pub mod entity;
pub mod local_time;
