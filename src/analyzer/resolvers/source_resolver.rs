use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::{
    analyzer::{
        AstDescriber, ColumnOrigin, DescribedColumn, DescribedType, NonNullableColumns, NonNullableResolver,
        RelationResolver,
    },
    ast::{Node, RangeSubselect, RangeVar, SelectStmt, SetOperation, WithClause, alias_columns},
    catalog::ColumnRow,
    error::InvalidQueryError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Table { schema: String, table: String },
    Cte,
    Subselect,
}

/// A FROM-clause contributor and the columns it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub kind: SourceKind,
    pub columns: Vec<DescribedColumn>,
}

impl Source {
    pub fn column(&self, name: &str) -> Option<&DescribedColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    fn set_nullability(&mut self, name: &str, nullable: bool) {
        for column in self.columns.iter_mut().filter(|column| column.name == name) {
            column.ty = column.ty.clone().with_nullability(nullable);
        }
    }
}

/// What a bare identifier in a target list refers to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetField<'a> {
    /// A relation name used as a whole-row value.
    Row { relation: &'a str, columns: &'a [DescribedColumn] },
    Column(&'a DescribedColumn),
}

/// Every name visible to one SELECT (or DML statement): its CTEs, its FROM
/// items and, through `parent`, the enclosing query's scope.
#[derive(Debug, Default)]
pub struct SourcesResolver<'p> {
    parent: Option<&'p SourcesResolver<'p>>,
    ctes: IndexMap<String, Vec<DescribedColumn>>,
    sources: IndexMap<String, Source>,
    using_columns: HashSet<String>,
    non_nullable: NonNullableColumns,
    grouped: bool,
}

impl<'p> SourcesResolver<'p> {
    pub fn new(parent: Option<&'p SourcesResolver<'p>>) -> Self {
        Self { parent, ..Default::default() }
    }

    /// Scope of a plain SELECT: CTEs, FROM items, join nullability and WHERE facts.
    pub fn for_select(
        select: &SelectStmt,
        parent: Option<&'p SourcesResolver<'p>>,
        describer: &AstDescriber<'_>,
    ) -> Result<Self, InvalidQueryError> {
        let mut resolver = Self::new(parent);
        resolver.add_ctes(select.with_clause.as_ref(), describer)?;
        resolver.add_from(&select.from_clause, describer)?;
        resolver.apply_nullability(&select.from_clause, NonNullableResolver::analyze(select));
        resolver.grouped = !select.group_clause.is_empty();
        Ok(resolver)
    }

    /// Describes each CTE in order; later CTEs see earlier ones.
    pub fn add_ctes(&mut self, with: Option<&WithClause>, describer: &AstDescriber<'_>) -> Result<(), InvalidQueryError> {
        let Some(with) = with else { return Ok(()) };

        for cte in with.common_table_exprs() {
            let Some(Node::SelectStmt(query)) = &cte.ctequery else {
                // data-modifying CTEs are described through their RETURNING list
                let columns = match &cte.ctequery {
                    Some(statement) => describer.describe_statement(statement, Some(&*self))?.unwrap_or_default(),
                    None => Vec::new(),
                };
                self.insert_cte(&cte.ctename, columns, &cte.alias_column_names());
                continue;
            };

            if with.recursive && query.op != SetOperation::None {
                if let Some(base) = &query.larg {
                    let seed = describer.describe_select(base, Some(&*self))?;
                    self.insert_cte(&cte.ctename, seed, &cte.alias_column_names());
                }
            }

            let columns = describer.describe_select(query, Some(&*self))?;
            self.insert_cte(&cte.ctename, columns, &cte.alias_column_names());
        }
        Ok(())
    }

    fn insert_cte(&mut self, name: &str, columns: Vec<DescribedColumn>, aliases: &[&str]) {
        let columns = rename_columns(name, columns, aliases);
        self.ctes.insert(name.to_string(), columns);
    }

    pub fn add_from(&mut self, from_clause: &[Node], describer: &AstDescriber<'_>) -> Result<(), InvalidQueryError> {
        for item in from_clause {
            self.add_from_item(item, describer)?;
        }
        Ok(())
    }

    fn add_from_item(&mut self, item: &Node, describer: &AstDescriber<'_>) -> Result<(), InvalidQueryError> {
        match item {
            Node::RangeVar(range) => self.add_relation(range, describer),
            Node::RangeSubselect(subselect) => self.add_subselect(subselect, describer)?,
            Node::JoinExpr(join) => {
                for side in [&join.larg, &join.rarg].into_iter().flatten() {
                    self.add_from_item(side, describer)?;
                }
                self.using_columns.extend(join.using_columns().into_iter().map(str::to_string));
            }
            other => trace!(kind = other.kind(), "skipping unsupported FROM item"),
        }
        Ok(())
    }

    /// Registers a table (or a CTE referenced like one) under its visible name.
    pub fn add_relation(&mut self, range: &RangeVar, describer: &AstDescriber<'_>) {
        let visible = range.visible_name().to_string();
        let aliases = alias_columns(range.alias.as_ref());

        if range.schemaname.is_none() {
            if let Some(columns) = self.cte(&range.relname) {
                let columns = rename_columns(&visible, columns.to_vec(), &aliases);
                self.sources.insert(visible, Source { kind: SourceKind::Cte, columns });
                return;
            }
        }

        let catalog = describer.mapper().catalog();
        let Some(table) = catalog.find_table(range.schemaname.as_deref(), &range.relname) else {
            warn!(table = %range.relname, "relation not found in catalog");
            return;
        };

        let mut rows: Vec<&ColumnRow> = table.columns.iter().collect();
        rows.sort_by_key(|row| row.col_num);

        let mut columns = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            let name = aliases.get(idx).map(|alias| alias.to_string()).unwrap_or_else(|| row.col_name.clone());
            let origin = ColumnOrigin {
                relation: visible.clone(),
                table: Some(table.name.to_string()),
                column: row.col_name.clone(),
            };
            columns.push(DescribedColumn::new(name, describer.column_type(table.name, row)).with_origin(origin));
        }

        let kind = SourceKind::Table { schema: table.schema.to_string(), table: table.name.to_string() };
        self.sources.insert(visible, Source { kind, columns });
    }

    fn add_subselect(&mut self, subselect: &RangeSubselect, describer: &AstDescriber<'_>) -> Result<(), InvalidQueryError> {
        let Some(select) = subselect.select() else { return Ok(()) };
        let name = subselect.alias_name().unwrap_or("unnamed_subquery").to_string();

        let columns = describer.describe_select(select, Some(&*self))?;
        let aliases = alias_columns(subselect.alias.as_ref());
        let columns = rename_columns(&name, columns, &aliases);
        self.sources.insert(name, Source { kind: SourceKind::Subselect, columns });
        Ok(())
    }

    /// Widens outer-joined relations, then narrows columns WHERE proves non-null.
    pub fn apply_nullability(&mut self, from_clause: &[Node], facts: NonNullableColumns) {
        let nullable = RelationResolver::nullable_relations(from_clause);

        for (name, source) in self.sources.iter_mut() {
            let column_names: Vec<String> = source.columns.iter().map(|column| column.name.clone()).collect();
            for column in column_names {
                if nullable.contains(name) {
                    source.set_nullability(&column, true);
                }
                if facts.has_column(name, &column) {
                    source.set_nullability(&column, false);
                }
            }
        }
        self.non_nullable = facts;
    }

    pub fn cte(&self, name: &str) -> Option<&[DescribedColumn]> {
        match self.ctes.get(name) {
            Some(columns) => Some(columns),
            None => self.parent?.cte(name),
        }
    }

    /// A source by visible name, searching enclosing scopes outward.
    pub fn source(&self, name: &str) -> Option<&Source> {
        match self.sources.get(name) {
            Some(source) => Some(source),
            None => self.parent?.source(name),
        }
    }

    pub fn column(&self, qualifier: Option<&str>, name: &str) -> Option<&DescribedColumn> {
        match qualifier {
            Some(qualifier) => self.source(qualifier)?.column(name),
            None => self.unqualified_column(name),
        }
    }

    /// First match wins across this scope's sources; ambiguity is not reported.
    fn unqualified_column(&self, name: &str) -> Option<&DescribedColumn> {
        match self.sources.values().find_map(|source| source.column(name)) {
            Some(column) => Some(column),
            None => self.parent?.unqualified_column(name),
        }
    }

    /// Resolves a bare identifier: a source name first, then a column.
    pub fn target_field(&self, field: &str) -> Option<TargetField<'_>> {
        if let Some((relation, source)) = self.sources.get_key_value(field) {
            return Some(TargetField::Row { relation, columns: &source.columns });
        }
        if let Some(column) = self.sources.values().find_map(|source| source.column(field)) {
            return Some(TargetField::Column(column));
        }
        self.parent?.target_field(field)
    }

    /// `*`: every column of this scope's sources; USING columns appear once.
    pub fn star(&self) -> Vec<DescribedColumn> {
        let mut seen_using = HashSet::new();
        let mut columns = Vec::new();
        for source in self.sources.values() {
            for column in &source.columns {
                if self.using_columns.contains(&column.name) && !seen_using.insert(column.name.clone()) {
                    continue;
                }
                columns.push(column.clone());
            }
        }
        columns
    }

    pub fn sources(&self) -> impl Iterator<Item = (&String, &Source)> {
        self.sources.iter()
    }

    pub fn non_nullable(&self) -> &NonNullableColumns {
        &self.non_nullable
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }
}

/// Columns of a derived source, renamed by an alias column list where one is given.
fn rename_columns(relation: &str, columns: Vec<DescribedColumn>, aliases: &[&str]) -> Vec<DescribedColumn> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let name = aliases.get(idx).copied().unwrap_or(column.name.as_str());
            column.seen_through(relation, name)
        })
        .collect()
}

/// Whole-row value of a relation, as an object of its columns.
pub fn row_object(columns: &[DescribedColumn]) -> DescribedType {
    DescribedType::Object(columns.iter().map(|column| (column.name.clone(), column.ty.clone())).collect())
}
