pub mod checkfiles;
pub mod create;
pub mod dumplist;
pub mod protocol;
pub mod summary;
