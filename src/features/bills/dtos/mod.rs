mod bill_dto;

pub use bill_dto::*;
