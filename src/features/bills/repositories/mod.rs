mod bill_repository;

pub use bill_repository::{BillRepository, PgBillRepository};
