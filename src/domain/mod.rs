mod attachment;
mod money;
mod transaction;
mod wallet;

pub use attachment::*;
pub use money::*;
pub use transaction::*;
pub use wallet::*;
