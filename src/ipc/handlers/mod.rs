pub mod backup_exchange;
pub mod classes;
pub mod core;
pub mod fees;
pub mod receipt;
pub mod students;
