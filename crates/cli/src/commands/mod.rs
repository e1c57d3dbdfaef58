pub mod fetch;
pub mod history;
pub mod icons;
pub mod ledger;
pub mod migrate;
pub mod project;
pub mod util;

pub use fetch::*;
pub use history::*;
pub use icons::*;
pub use ledger::*;
pub use migrate::*;
pub use project::*;
pub use util::*;
