pub mod ddb_member_directory;
pub mod memory_member_directory;
