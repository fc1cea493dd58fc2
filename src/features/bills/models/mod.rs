mod bill;

pub use bill::{Attachment, AttachmentRow, Bill, BillRow, NewBill};
