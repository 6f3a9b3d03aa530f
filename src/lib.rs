pub mod criteria;
pub mod discover;
pub mod domain;
pub mod ena;
pub mod error;
pub mod merge;
pub mod output;
pub mod sra;
pub mod table;
pub mod unify;
