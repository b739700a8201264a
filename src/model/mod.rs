pub mod attendance;
pub mod contractor;
pub mod meal;
pub mod plant;
pub mod role;
pub mod system_code;
pub mod visitor;
pub mod worker;
