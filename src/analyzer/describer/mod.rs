pub mod conditional;
pub mod func_call;
pub mod operators;

pub use operators::*;

use tracing::{debug, trace, warn};

use crate::{
    analyzer::{
        ColumnNamer, ColumnOrigin, DescribedColumn, DescribedType, NonNullableResolver, SourcesResolver, TargetField,
        TypeMapper, row_object, string_literal,
    },
    ast::{
        AConst, AExpr, AExprKind, AIndirection, ColumnRef, ColumnRefParts, ConstValue, DeleteStmt, InsertStmt, Node,
        SelectStmt, TypeCast, UpdateStmt, last_name, res_targets,
    },
    catalog::{CatalogSnapshot, ColumnRow, normalize_type_name},
    config::Overrides,
    error::InvalidQueryError,
};

/// Describes the output columns of statements against one catalog snapshot.
///
/// Holds no per-statement state: describing the same tree twice yields the
/// same result.
pub struct AstDescriber<'a> {
    mapper: TypeMapper<'a>,
    overrides: &'a Overrides,
}

impl<'a> AstDescriber<'a> {
    pub fn new(catalog: &'a CatalogSnapshot, overrides: &'a Overrides) -> Self {
        Self { mapper: TypeMapper::new(catalog, overrides), overrides }
    }

    pub fn mapper(&self) -> &TypeMapper<'a> {
        &self.mapper
    }

    /// Type of a catalog column, with `table.column` overrides applied.
    pub fn column_type(&self, table: &str, row: &ColumnRow) -> DescribedType {
        match self.overrides.column(table, &row.col_name) {
            Some(ts) => {
                let pg_type = self.mapper.catalog().column_type_name(row);
                DescribedType::primitive(ts, pg_type).with_nullability(!row.col_not_null)
            }
            None => self.mapper.column_type(row),
        }
    }

    /// Output columns of a statement, `None` when it returns no rows.
    pub fn describe_statement(
        &self,
        statement: &Node,
        parent: Option<&SourcesResolver<'_>>,
    ) -> Result<Option<Vec<DescribedColumn>>, InvalidQueryError> {
        debug!(kind = statement.kind(), "describing statement");
        match statement {
            Node::SelectStmt(select) => self.describe_select(select, parent).map(Some),
            Node::InsertStmt(insert) => self.describe_insert(insert, parent),
            Node::UpdateStmt(update) => self.describe_update(update, parent),
            Node::DeleteStmt(delete) => self.describe_delete(delete, parent),
            _ => Ok(None),
        }
    }

    pub fn describe_select(
        &self,
        select: &SelectStmt,
        parent: Option<&SourcesResolver<'_>>,
    ) -> Result<Vec<DescribedColumn>, InvalidQueryError> {
        if select.is_set_operation() {
            let mut scope = SourcesResolver::new(parent);
            scope.add_ctes(select.with_clause.as_ref(), self)?;
            let (Some(left), Some(right)) = (&select.larg, &select.rarg) else {
                return Ok(Vec::new());
            };
            let left = self.describe_select(left, Some(&scope))?;
            let right = self.describe_select(right, Some(&scope))?;
            return Ok(merge_positional(left, right));
        }

        if select.is_values() {
            let mut scope = SourcesResolver::new(parent);
            scope.add_ctes(select.with_clause.as_ref(), self)?;
            return self.describe_values(select, &scope);
        }

        let scope = SourcesResolver::for_select(select, parent, self)?;
        self.describe_targets(&select.target_list, &scope)
    }

    /// `VALUES (...), (...)`: columns `column1..N`, merged across rows.
    fn describe_values(&self, select: &SelectStmt, scope: &SourcesResolver<'_>) -> Result<Vec<DescribedColumn>, InvalidQueryError> {
        let mut merged: Vec<Vec<DescribedType>> = Vec::new();
        for row in select.values_rows() {
            for (idx, value) in row.iter().enumerate() {
                let ty = self.describe_expr(value, scope)?;
                match merged.get_mut(idx) {
                    Some(types) => types.push(ty),
                    None => merged.push(vec![ty]),
                }
            }
        }

        Ok(merged
            .into_iter()
            .enumerate()
            .map(|(idx, types)| DescribedColumn::new(format!("column{}", idx + 1), DescribedType::merge(types)))
            .collect())
    }

    fn describe_insert(
        &self,
        insert: &InsertStmt,
        parent: Option<&SourcesResolver<'_>>,
    ) -> Result<Option<Vec<DescribedColumn>>, InvalidQueryError> {
        if insert.returning_list.is_empty() {
            return Ok(None);
        }
        let mut scope = SourcesResolver::new(parent);
        scope.add_ctes(insert.with_clause.as_ref(), self)?;
        scope.add_relation(&insert.relation, self);
        self.describe_targets(&insert.returning_list, &scope).map(Some)
    }

    fn describe_update(
        &self,
        update: &UpdateStmt,
        parent: Option<&SourcesResolver<'_>>,
    ) -> Result<Option<Vec<DescribedColumn>>, InvalidQueryError> {
        if update.returning_list.is_empty() {
            return Ok(None);
        }
        let mut scope = SourcesResolver::new(parent);
        scope.add_ctes(update.with_clause.as_ref(), self)?;
        scope.add_relation(&update.relation, self);
        scope.add_from(&update.from_clause, self)?;
        scope.apply_nullability(&update.from_clause, NonNullableResolver::where_facts(update.where_clause.as_ref()));
        self.describe_targets(&update.returning_list, &scope).map(Some)
    }

    fn describe_delete(
        &self,
        delete: &DeleteStmt,
        parent: Option<&SourcesResolver<'_>>,
    ) -> Result<Option<Vec<DescribedColumn>>, InvalidQueryError> {
        if delete.returning_list.is_empty() {
            return Ok(None);
        }
        let mut scope = SourcesResolver::new(parent);
        scope.add_ctes(delete.with_clause.as_ref(), self)?;
        scope.add_relation(&delete.relation, self);
        scope.add_from(&delete.using_clause, self)?;
        scope.apply_nullability(&delete.using_clause, NonNullableResolver::where_facts(delete.where_clause.as_ref()));
        self.describe_targets(&delete.returning_list, &scope).map(Some)
    }

    /// One column per target, except `*` and `t.*` which expand.
    pub fn describe_targets(
        &self,
        targets: &[Node],
        scope: &SourcesResolver<'_>,
    ) -> Result<Vec<DescribedColumn>, InvalidQueryError> {
        let mut columns = Vec::new();

        for (ordinal, target) in res_targets(targets).enumerate() {
            let Some(val) = target.val.as_deref() else { continue };

            if let Node::ColumnRef(column) = val {
                match column.parts() {
                    Some(ColumnRefParts::Star) => {
                        columns.extend(scope.star());
                        continue;
                    }
                    Some(ColumnRefParts::QualifiedStar { table }) => {
                        match scope.source(table) {
                            Some(source) => columns.extend(source.columns.iter().cloned()),
                            None => warn!(relation = table, "unknown relation in qualified star"),
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            let name = ColumnNamer::target_name(target);
            let mut ty = self.describe_expr(val, scope)?;
            if scope.non_nullable().has_target(ordinal) {
                ty = ty.without_null();
            }
            trace!(column = %name, ?ty, "described target");

            columns.push(DescribedColumn { origin: self.column_origin(val, scope), name, ty });
        }

        Ok(columns)
    }

    fn column_origin(&self, node: &Node, scope: &SourcesResolver<'_>) -> Option<ColumnOrigin> {
        let Node::ColumnRef(column) = node else { return None };
        let found = match column.parts()? {
            ColumnRefParts::Column { name } => match scope.target_field(name)? {
                TargetField::Column(column) => column,
                TargetField::Row { .. } => return None,
            },
            ColumnRefParts::QualifiedColumn { table, name } => scope.column(Some(table), name)?,
            _ => return None,
        };
        found.origin.clone()
    }

    pub fn describe_all(&self, nodes: &[Node], scope: &SourcesResolver<'_>) -> Result<Vec<DescribedType>, InvalidQueryError> {
        nodes.iter().map(|node| self.describe_expr(node, scope)).collect()
    }

    fn describe_optional(&self, node: Option<&Node>, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        match node {
            Some(node) => self.describe_expr(node, scope),
            None => Ok(DescribedType::unknown()),
        }
    }

    /// Describes one expression. Constructs without a rule degrade to `unknown`.
    pub fn describe_expr(&self, node: &Node, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        trace!(kind = node.kind(), "describing expression");

        let ty = match node {
            Node::ColumnRef(column) => self.describe_column_ref(column, scope),
            Node::AConst(value) => self.describe_const(value),
            Node::TypeCast(cast) => self.describe_type_cast(cast, scope)?,
            Node::FuncCall(call) => self.describe_func_call(call, scope)?,
            Node::AExpr(expr) => self.describe_a_expr(expr, scope)?,
            Node::CaseExpr(case) => self.describe_case(case, scope)?,
            Node::CoalesceExpr(coalesce) => self.describe_coalesce(coalesce, scope)?,
            Node::MinMaxExpr(min_max) => self.describe_min_max(min_max, scope)?,
            Node::SubLink(sublink) => self.describe_sublink(sublink, scope)?,
            Node::AArrayExpr(array) => {
                let elements = self.describe_all(&array.elements, scope)?;
                DescribedType::array(DescribedType::merge(elements))
            }
            Node::BoolExpr(_) | Node::NullTest(_) => self.mapper.from_name("bool"),
            Node::RowExpr(_) => DescribedType::primitive("string", "record"),
            Node::SqlValueFunction(function) => self.mapper.from_name(function.op.pg_type()),
            Node::AIndirection(indirection) => self.describe_indirection(indirection, scope)?,
            Node::ParamRef(_) => DescribedType::unknown(),
            other => {
                debug!(kind = other.kind(), "unsupported expression, described as unknown");
                DescribedType::unknown()
            }
        };

        Ok(ty)
    }

    fn describe_column_ref(&self, column: &ColumnRef, scope: &SourcesResolver<'_>) -> DescribedType {
        let described = match column.parts() {
            Some(ColumnRefParts::Column { name }) => match scope.target_field(name) {
                Some(TargetField::Row { columns, .. }) => Some(row_object(columns)),
                Some(TargetField::Column(column)) => Some(column.ty.clone()),
                None => None,
            },
            Some(ColumnRefParts::QualifiedColumn { table, name }) => {
                scope.column(Some(table), name).map(|column| column.ty.clone())
            }
            Some(ColumnRefParts::QualifiedStar { table }) => {
                scope.source(table).map(|source| row_object(&source.columns))
            }
            Some(ColumnRefParts::Star) => Some(row_object(&scope.star())),
            None => None,
        };

        described.unwrap_or_else(|| {
            warn!(column = ?column.parts(), "column not found in any source");
            DescribedType::unknown()
        })
    }

    /// Columns behind a whole-row reference (`t`, `t.*`, `*`), if `node` is one.
    pub fn whole_row(&self, node: &Node, scope: &SourcesResolver<'_>) -> Option<Vec<DescribedColumn>> {
        let Node::ColumnRef(column) = node else { return None };
        match column.parts()? {
            ColumnRefParts::Column { name } => match scope.target_field(name)? {
                TargetField::Row { columns, .. } => Some(columns.to_vec()),
                TargetField::Column(_) => None,
            },
            ColumnRefParts::QualifiedStar { table } => scope.source(table).map(|source| source.columns.clone()),
            ColumnRefParts::Star => Some(scope.star()),
            ColumnRefParts::QualifiedColumn { .. } => None,
        }
    }

    fn describe_const(&self, value: &AConst) -> DescribedType {
        match value.value() {
            ConstValue::Null => DescribedType::null(),
            ConstValue::Integer(number) => DescribedType::literal(number.to_string(), self.mapper.from_name("int4")),
            ConstValue::Float(number) => DescribedType::literal(number, self.mapper.from_name("float8")),
            ConstValue::Boolean(flag) => DescribedType::literal(flag.to_string(), self.mapper.from_name("bool")),
            ConstValue::String(text) => {
                DescribedType::literal(string_literal(text), self.mapper.from_name("text"))
            }
            ConstValue::BitString(_) => self.mapper.from_name("bytea"),
        }
    }

    fn describe_type_cast(&self, cast: &TypeCast, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let inner = self.describe_optional(cast.arg.as_deref(), scope)?;

        let name = last_name(&cast.type_name.names).unwrap_or("unknown");
        let name = normalize_type_name(name);
        let target = if cast.type_name.is_array() { format!("_{name}") } else { name.to_string() };

        Ok(self.mapper.from_name(&target).with_nullability(inner.is_nullable()))
    }

    fn describe_a_expr(&self, expr: &AExpr, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let left = match expr.lexpr.as_deref() {
            Some(node) => Some(self.describe_expr(node, scope)?),
            None => None,
        };
        let right = match expr.rexpr.as_deref() {
            Some(Node::List(items)) => DescribedType::merge(self.describe_all(items, scope)?),
            other => self.describe_optional(other, scope)?,
        };
        let operands_nullable = left.as_ref().is_some_and(DescribedType::is_nullable) || right.is_nullable();
        let boolean = self.mapper.from_name("bool");

        let ty = match expr.kind {
            AExprKind::Op => {
                let op = expr.operator();
                let left_key = left.as_ref().map(operand_type);
                let described = match operator_result(left_key.as_deref(), op, &operand_type(&right)) {
                    Some(result) => self.mapper.from_name(&result),
                    None => {
                        warn!(operator = op, "unknown operator, described as unknown");
                        DescribedType::unknown()
                    }
                };
                let json_lookup = matches!(op, "->" | "->>" | "#>" | "#>>");
                described.with_nullability(operands_nullable || json_lookup)
            }
            AExprKind::Distinct | AExprKind::NotDistinct => boolean,
            AExprKind::NullIf => left.unwrap_or_else(DescribedType::unknown).widen().with_null(),
            _ => boolean.with_nullability(operands_nullable),
        };

        Ok(ty)
    }

    fn describe_indirection(&self, indirection: &AIndirection, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let mut ty = self.describe_optional(indirection.arg.as_deref(), scope)?.without_null();

        for step in &indirection.indirection {
            ty = match (step, ty) {
                (Node::AIndices(indices), DescribedType::Array(element)) if !indices.is_slice => *element,
                (Node::AIndices(_), array @ DescribedType::Array(_)) => array,
                (Node::AIndices(_), json @ DescribedType::Type { .. }) if matches!(json.pg_type().as_str(), "json" | "jsonb") => json,
                _ => DescribedType::unknown(),
            };
            ty = ty.without_null();
        }

        Ok(ty.with_null())
    }
}

/// Type name used to pick operators and function signatures: a domain's base,
/// otherwise the non-null part's type name.
pub fn operand_type(ty: &DescribedType) -> String {
    match ty.without_null() {
        DescribedType::Type { base: Some(base), .. } => base,
        other => other.pg_type(),
    }
}

/// Set-operation arms: names from the left, types merged position by position.
fn merge_positional(left: Vec<DescribedColumn>, right: Vec<DescribedColumn>) -> Vec<DescribedColumn> {
    let mut right = right.into_iter();
    left.into_iter()
        .map(|column| match right.next() {
            Some(other) => DescribedColumn { ty: DescribedType::merge([column.ty, other.ty]), ..column },
            None => column,
        })
        .collect()
}
