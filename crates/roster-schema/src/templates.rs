//! Built-in table layouts provisioned on demand.
//!
//! Each template fixes a column list, the rule row beneath it and two frozen
//! rows. Every template ends with the four audit columns.

use roster_core::audit::AUDIT_COLUMNS;
use roster_core::rule::Rule;
use roster_core::{FROZEN_ROWS, same_name};
use roster_sheets::SheetsError;

use crate::catalog::SchemaCatalog;
use crate::error::SchemaError;
use crate::rules::RuleResolver;

const EMAIL_RULE: &str = r"regex:^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
const PHONE_RULE: &str = r"regex:^\+?[1-9]\d{1,14}$";
const STATUS_RULE: &str = "list:active,suspended,inactive";

/// A named table layout: `(column, rule cell)` pairs in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableTemplate {
    pub name: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
}

pub const STUDENTS: TableTemplate = TableTemplate {
    name: "Students",
    columns: &[
        ("name", ""),
        ("age", "regex:^[0-9]{1,3}$"),
        ("group", ""),
        ("phone", PHONE_RULE),
        ("status", STATUS_RULE),
        ("notes", ""),
    ],
};

pub const TEACHERS: TableTemplate = TableTemplate {
    name: "Teachers",
    columns: &[
        ("name", ""),
        ("email", EMAIL_RULE),
        ("phone", PHONE_RULE),
        ("status", STATUS_RULE),
        ("specialization", "list:quran,tajweed,both"),
        ("join_date", ""),
        ("notes", ""),
    ],
};

pub const STUDENT_PROGRESS: TableTemplate = TableTemplate {
    name: "StudentProgress",
    columns: &[
        ("student_name", "list:Students!A:A"),
        ("notes", ""),
        ("pages", "regex:^[0-9,-]*$"),
        ("sura", ""),
        ("date", ""),
    ],
};

/// Every built-in template.
pub const TEMPLATES: [TableTemplate; 3] = [STUDENTS, TEACHERS, STUDENT_PROGRESS];

impl TableTemplate {
    /// Header row: the template columns followed by the audit columns.
    #[must_use]
    pub fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(column, _)| *column)
            .chain(AUDIT_COLUMNS)
            .map(String::from)
            .collect()
    }

    /// Parsed rules of the columns that have one.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidRule`] if a rule cell is not a recognised
    /// directive.
    pub fn rules(&self) -> Result<Vec<(&'static str, Rule)>, SchemaError> {
        let mut rules = Vec::new();
        for (column, cell) in self.columns {
            let parsed = Rule::parse(cell).map_err(|source| SchemaError::InvalidRule {
                table: self.name.to_string(),
                column: (*column).to_string(),
                source,
            })?;
            if let Some(rule) = parsed {
                rules.push((*column, rule));
            }
        }
        Ok(rules)
    }
}

/// Result of [`ensure_template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// Title of the table as it exists in the spreadsheet. May differ in case
    /// from the template name when the table was created by hand.
    pub table: String,
    pub created: bool,
}

/// Title of the table matching `name`, exact match first.
async fn existing_title(
    catalog: &SchemaCatalog,
    name: &str,
) -> Result<Option<String>, SchemaError> {
    let tables = catalog.list_tables().await?;
    Ok(tables
        .iter()
        .find(|t| t.as_str() == name)
        .or_else(|| tables.iter().find(|t| same_name(t, name)))
        .cloned())
}

/// Create and provision `template` unless a table of that name exists.
///
/// An existing table is matched exactly first, then case-insensitively, and
/// left untouched. A failure to freeze the top rows is logged and otherwise
/// ignored.
pub async fn ensure_template(
    catalog: &SchemaCatalog,
    template: &TableTemplate,
) -> Result<Provisioned, SchemaError> {
    let existing = |table: String| Provisioned {
        table,
        created: false,
    };
    if let Some(title) = existing_title(catalog, template.name).await? {
        return Ok(existing(title));
    }

    match catalog.create_table(template.name).await {
        Ok(()) => {}
        // Lost a race with another conversation provisioning the same table.
        Err(SchemaError::Sheets(SheetsError::AlreadyExists(_))) => {
            let title = existing_title(catalog, template.name).await?;
            return Ok(existing(title.unwrap_or_else(|| template.name.to_string())));
        }
        Err(e) => return Err(e),
    }
    catalog.add_columns(template.name, &template.header()).await?;
    RuleResolver::new(catalog.store().clone())
        .write_rules(template.name, &template.rules()?)
        .await?;
    if let Err(e) = catalog.store().freeze_rows(template.name, FROZEN_ROWS).await {
        tracing::warn!(table = template.name, %e, "could not freeze header rows");
    }
    tracing::info!(table = template.name, "provisioned template table");
    Ok(Provisioned {
        table: template.name.to_string(),
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use roster_sheets::{MemorySheets, Operation};

    use super::*;

    #[test]
    fn every_template_rule_parses() {
        for template in TEMPLATES {
            let rules = template.rules().unwrap();
            let header = template.header();
            assert!(rules.iter().all(|(column, _)| header.iter().any(|h| h == column)));
            assert_eq!(template.header().last().map(String::as_str), Some("last_modified_by"));
        }
        assert_eq!(
            STUDENT_PROGRESS.rules().unwrap()[0],
            ("student_name", Rule::list("Students!A:A"))
        );
    }

    #[test]
    fn malformed_template_rule_is_reported() {
        let broken = TableTemplate {
            name: "Broken",
            columns: &[("age", "digits only")],
        };
        assert!(matches!(
            broken.rules(),
            Err(SchemaError::InvalidRule { column, .. }) if column == "age"
        ));
    }

    #[tokio::test]
    async fn provisions_missing_template() {
        let store = Arc::new(MemorySheets::new());
        let catalog = SchemaCatalog::new(store.clone());

        let provisioned = ensure_template(&catalog, &TEACHERS).await.unwrap();
        assert_eq!(
            provisioned,
            Provisioned {
                table: "Teachers".into(),
                created: true
            }
        );

        let rows = store.snapshot("Teachers").unwrap();
        assert_eq!(rows[0], TEACHERS.header());
        assert_eq!(rows[1].len(), TEACHERS.header().len());
        assert_eq!(rows[1][0], "");
        assert_eq!(rows[1][3], STATUS_RULE);
        assert_eq!(store.frozen_rows("Teachers"), Some(2));
        assert_eq!(catalog.columns("Teachers").await.unwrap(), TEACHERS.header());
    }

    #[tokio::test]
    async fn existing_table_is_left_alone() {
        let store = Arc::new(MemorySheets::new().with_table("Students", [vec!["name"]]));
        let catalog = SchemaCatalog::new(store.clone());

        assert!(!ensure_template(&catalog, &STUDENTS).await.unwrap().created);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn existing_table_in_other_case_keeps_its_title() {
        let store = Arc::new(MemorySheets::new().with_table("students", [vec!["name"]]));
        let catalog = SchemaCatalog::new(store.clone());

        let provisioned = ensure_template(&catalog, &STUDENTS).await.unwrap();
        assert_eq!(provisioned.table, "students");
        assert!(!provisioned.created);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn freeze_failure_is_swallowed() {
        let store = Arc::new(MemorySheets::new());
        store.fail_on(Operation::FreezeRows);
        let catalog = SchemaCatalog::new(store.clone());

        assert!(ensure_template(&catalog, &STUDENT_PROGRESS).await.unwrap().created);
        assert_eq!(store.frozen_rows("StudentProgress"), Some(0));
        assert_eq!(store.snapshot("StudentProgress").unwrap()[1][0], "list:Students!A:A");
    }
}
