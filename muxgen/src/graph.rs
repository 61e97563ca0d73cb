mod context;
mod expr;
mod instance;
mod module;
mod net;

pub use context::*;
pub use expr::*;
pub use instance::*;
pub use module::*;
pub use net::*;
