pub mod dispatcher;
pub mod push;
pub mod store;
pub mod workers;

pub use dispatcher::*;
pub use push::*;
pub use store::*;
pub use workers::*;
