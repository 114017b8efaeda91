pub mod pricing;
pub mod storage_service;
