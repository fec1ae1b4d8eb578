pub mod connect;
pub mod scan;
