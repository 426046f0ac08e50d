mod defaults;
mod store;
mod types;
mod validate;

pub use defaults::*;
pub use store::*;
pub use types::*;
pub use validate::*;
