pub mod emissions;
pub mod erp;
pub mod health;
