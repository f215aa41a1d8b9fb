use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    analyzer::{AstDescriber, DescribedColumn, InsertValidator},
    ast::{Node, ParseResult},
    catalog::{CatalogCache, CatalogLoader, CatalogSnapshot},
    config::GenerateOptions,
    error::{DuplicateColumnsError, GenerateError},
    generate::ResolvedStatement,
    render::{Comparison, TypeComparator},
};

/// Column metadata reported by the database for a prepared query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryColumn {
    pub name: String,
    pub type_oid: u32,
    /// Zero when the column is not a plain table column.
    pub table_oid: u32,
    pub column_number: i32,
}

pub struct GenerateParams<'a> {
    pub statement: &'a ResolvedStatement,
    pub parsed: &'a ParseResult,
    pub catalog: &'a CatalogSnapshot,
    pub options: &'a GenerateOptions,
    /// Live metadata used where the parse tree alone gives `unknown`.
    pub described: Option<&'a [QueryColumn]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResult {
    /// `None` for statements that return no rows.
    pub output: Option<Vec<DescribedColumn>>,
    /// Top-level columns still typed `unknown`.
    pub unknown_columns: Vec<String>,
}

/// Validates and describes one statement.
pub fn generate(params: GenerateParams<'_>) -> Result<GenerateResult, GenerateError> {
    let statement = params.parsed.statement()?;
    debug!(kind = statement.kind(), "generating result type");

    if let Node::InsertStmt(insert) = statement {
        let location = usize::try_from(insert.relation.location).unwrap_or(0);
        InsertValidator::validate(insert, params.catalog).map_err(|err| params.statement.locate(err, location))?;
    }

    let describer = AstDescriber::new(params.catalog, &params.options.overrides);
    let Some(mut columns) = describer.describe_statement(statement, None)? else {
        debug!("statement returns no rows");
        return Ok(GenerateResult { output: None, unknown_columns: Vec::new() });
    };

    check_duplicates(&columns, &params.statement.text)?;

    if let Some(described) = params.described {
        fill_unknown(&describer, &mut columns, described);
    }

    let unknown_columns: Vec<String> =
        columns.iter().filter(|column| column.ty.is_unknown()).map(|column| column.name.clone()).collect();
    debug!(columns = columns.len(), unknown = unknown_columns.len(), "statement described");

    Ok(GenerateResult { output: Some(columns), unknown_columns })
}

/// Same output name from two different relations.
fn check_duplicates(columns: &[DescribedColumn], query_text: &str) -> Result<(), DuplicateColumnsError> {
    let mut by_name: IndexMap<&str, Vec<String>> = IndexMap::new();
    for column in columns {
        let Some(origin) = &column.origin else { continue };
        let qualified = format!("{}.{}", origin.relation, origin.column);
        let origins = by_name.entry(column.name.as_str()).or_default();
        if !origins.contains(&qualified) {
            origins.push(qualified);
        }
    }

    match by_name.into_values().find(|origins| origins.len() > 1) {
        Some(columns) => Err(DuplicateColumnsError { columns, query_text: query_text.to_string() }),
        None => Ok(()),
    }
}

/// Replaces `unknown` columns with what the database reported for the same position.
fn fill_unknown(describer: &AstDescriber<'_>, columns: &mut [DescribedColumn], described: &[QueryColumn]) {
    if columns.len() != described.len() {
        debug!(described = described.len(), columns = columns.len(), "column counts differ, skipping live metadata");
        return;
    }

    let catalog = describer.mapper().catalog();
    for (column, live) in columns.iter_mut().zip(described) {
        if !column.ty.is_unknown() {
            continue;
        }
        let row = catalog
            .columns
            .get(&live.table_oid)
            .and_then(|rows| rows.iter().find(|row| row.col_num == live.column_number));
        column.ty = match row {
            Some(row) => describer.column_type(&row.table_name, row),
            None => describer.mapper().from_oid(live.type_oid).with_null(),
        };
        debug!(column = %column.name, ty = ?column.ty, "filled from live metadata");
    }
}

/// Entry point bound to a catalog cache: loads the snapshot for a
/// connection once and describes statements against it.
#[derive(Default)]
pub struct Generator {
    cache: CatalogCache,
}

impl Generator {
    pub fn new(cache: CatalogCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CatalogCache {
        &self.cache
    }

    pub async fn generate<L>(
        &self,
        key: &str,
        loader: &L,
        statement: &ResolvedStatement,
        parsed: &ParseResult,
        options: &GenerateOptions,
    ) -> Result<GenerateResult, GenerateError>
    where
        L: CatalogLoader + Sync,
    {
        let catalog = self.cache.get_or_load(key, loader).await?;
        generate(GenerateParams { statement, parsed, catalog: &catalog, options, described: None })
    }

    /// Generates the row type and compares it with the declared one. `None`
    /// when the statement returns no rows.
    pub async fn check<L>(
        &self,
        key: &str,
        loader: &L,
        statement: &ResolvedStatement,
        parsed: &ParseResult,
        options: &GenerateOptions,
        expected: &str,
    ) -> Result<Option<Comparison>, GenerateError>
    where
        L: CatalogLoader + Sync,
    {
        let result = self.generate(key, loader, statement, parsed, options).await?;
        let Some(columns) = result.output else { return Ok(None) };
        Ok(Some(TypeComparator::compare_row(expected, &columns, options)?))
    }
}
