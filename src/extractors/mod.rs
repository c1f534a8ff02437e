mod locals;

pub use locals::{Actor, RequestLocals};
