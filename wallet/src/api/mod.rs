//! Response types exchanged with the UMI node and statistics service.

pub mod types;
