pub mod errors;
pub mod factory;
pub mod history;
pub mod session;

pub use errors::AppError;
pub use factory::AppFactory;
pub use session::{HistoryKind, Session};
