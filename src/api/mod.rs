pub mod attendance;
pub mod camera;
pub mod contractor;
pub mod dashboard;
pub mod meal;
pub mod plant;
pub mod report;
pub mod system_code;
pub mod visitor;
pub mod worker;
