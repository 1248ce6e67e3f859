use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};

use crate::schema::employees;

/// A directory entry for one employee. The directory is maintained by an
/// external system; this service only reads it (plus the boot-time seed).
#[derive(Queryable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = employees)]
pub struct Employee {
    pub id: i32,
    pub user_id: String, // Opaque stable identifier (UUID)
    pub employee_code: String,
    pub full_name: String,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub user_id: String,
    pub employee_code: String,
    pub full_name: String,
    pub role: String,
}
