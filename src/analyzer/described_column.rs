use crate::analyzer::DescribedType;

/// Where a column's value is read from unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrigin {
    /// Name the source is visible under in the query (alias, CTE or table name).
    pub relation: String,
    /// Underlying catalog table, when the value traces back to one.
    pub table: Option<String>,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescribedColumn {
    pub name: String,
    pub ty: DescribedType,
    pub origin: Option<ColumnOrigin>,
}

impl DescribedColumn {
    pub fn new(name: impl Into<String>, ty: DescribedType) -> Self {
        Self { name: name.into(), ty, origin: None }
    }

    pub fn with_origin(mut self, origin: ColumnOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Re-homes the column under a derived source (CTE or subquery alias).
    pub fn seen_through(&self, relation: &str, name: &str) -> Self {
        let (table, column) = match &self.origin {
            Some(origin) if origin.table.is_some() => (origin.table.clone(), origin.column.clone()),
            _ => (None, self.name.clone()),
        };
        Self {
            name: name.to_string(),
            ty: self.ty.clone(),
            origin: Some(ColumnOrigin { relation: relation.to_string(), table, column }),
        }
    }
}
