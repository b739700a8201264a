pub mod codes;
pub mod db_utils;
pub mod username_cache;
