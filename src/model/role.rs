#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Contractor = 3,
    Employee = 4,
    Labour = 5,
    Visitor = 6,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Contractor),
            4 => Some(Role::Employee),
            5 => Some(Role::Labour),
            6 => Some(Role::Visitor),
            _ => None,
        }
    }
}
