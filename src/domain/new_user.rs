use uuid::Uuid;

use crate::domain::date_of_birth::DateOfBirth;
use crate::domain::user_email::UserEmail;
use crate::domain::user_name::UserName;

pub struct NewUser {
    pub id: Uuid,
    pub name: UserName,
    pub email: UserEmail,
    pub date_of_birth: DateOfBirth,
}
