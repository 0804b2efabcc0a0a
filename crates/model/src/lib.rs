pub mod actor;
pub mod booking;
pub mod exception;
pub mod ids;
pub mod notification;
pub mod profile;
pub mod schedule;
pub mod slot;
pub mod trainer;
pub mod training;
