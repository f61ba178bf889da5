/// One exportable table: its name and the date column the month window
/// filters on. Table and column names come from this static registry, never
/// from user input, so they are safe to splice into query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub table: &'static str,
    pub date_column: &'static str,
}

/// The fixed registry of tables exported each run, in export order. Every
/// operation takes a `&[TableSpec]` so deployments can extend this list.
pub const TABLES: &[TableSpec] = &[
    TableSpec {
        table: "EmployeeMaster",
        date_column: "JoiningDate",
    },
    TableSpec {
        table: "ExpenseReimbursement",
        date_column: "RegistrationDate",
    },
];
