mod types;

pub use types::{Account, AccountPatch, NewAccount};
