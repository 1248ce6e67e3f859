//! Database operations for the employee directory.
//!
//! The directory is owned by an external HR system; this module only reads
//! it. The single write path, [`insert_employee`], exists for the boot-time
//! seed fairing and for test setup.

use diesel::prelude::*;

use crate::models::{Employee, NewEmployee};

/// Inserts a directory entry. Seed/test path only.
pub fn insert_employee(
    conn: &mut SqliteConnection,
    new_employee: NewEmployee,
) -> Result<Employee, diesel::result::Error> {
    use crate::schema::employees::dsl::*;

    diesel::insert_into(employees)
        .values(&new_employee)
        .execute(conn)?;

    employees.order(id.desc()).first::<Employee>(conn)
}

/// Looks up an employee by their human-entered code.
///
/// # Returns
/// * `Ok(Some(Employee))` - Employee found with matching code
/// * `Ok(None)` - No employee with that code
pub fn get_employee_by_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> Result<Option<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;

    employees
        .filter(employee_code.eq(code))
        .first::<Employee>(conn)
        .optional()
}

/// Looks up an employee by their opaque user identifier.
pub fn get_employee_by_user_id(
    conn: &mut SqliteConnection,
    user: &str,
) -> Result<Option<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;

    employees
        .filter(user_id.eq(user))
        .first::<Employee>(conn)
        .optional()
}

/// Returns all directory entries in ascending order by id.
pub fn list_employees(conn: &mut SqliteConnection) -> Result<Vec<Employee>, diesel::result::Error> {
    use crate::schema::employees::dsl::*;
    employees.order(id.asc()).load::<Employee>(conn)
}

/// Returns the number of directory entries.
pub fn count_employees(conn: &mut SqliteConnection) -> Result<i64, diesel::result::Error> {
    use crate::schema::employees::dsl::*;
    employees.count().get_result(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::setup_test_db;

    #[test]
    fn test_lookup_by_code_and_user_id() {
        let mut conn = setup_test_db();

        let inserted = insert_employee(
            &mut conn,
            NewEmployee {
                user_id: "7e63b1ec-882d-4b28-80d4-e7a3aa80cb32".to_string(),
                employee_code: "AIP042".to_string(),
                full_name: "Quinn Harper".to_string(),
                role: "Dev".to_string(),
            },
        )
        .expect("insert employee");

        let by_code = get_employee_by_code(&mut conn, "AIP042")
            .expect("query should succeed")
            .expect("employee should exist");
        assert_eq!(by_code.id, inserted.id);
        assert_eq!(by_code.full_name, "Quinn Harper");

        let by_user = get_employee_by_user_id(&mut conn, &inserted.user_id)
            .expect("query should succeed")
            .expect("employee should exist");
        assert_eq!(by_user.employee_code, "AIP042");

        assert!(
            get_employee_by_code(&mut conn, "AIP999")
                .expect("query should succeed")
                .is_none()
        );
    }
}
