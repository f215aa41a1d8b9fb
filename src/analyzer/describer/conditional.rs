use tracing::trace;

use crate::{
    analyzer::{AstDescriber, DescribedType, SourcesResolver, pg_functions},
    ast::{CaseExpr, CoalesceExpr, MinMaxExpr, Node, SelectStmt, SubLink, SubLinkType, res_targets},
    error::InvalidQueryError,
};

impl AstDescriber<'_> {
    /// Branch results merged; a missing ELSE adds null.
    pub(crate) fn describe_case(&self, case: &CaseExpr, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let mut branches = Vec::new();
        for when in case.whens() {
            if let Some(result) = when.result.as_deref() {
                branches.push(self.describe_expr(result, scope)?);
            }
        }
        match case.defresult.as_deref() {
            Some(default) => branches.push(self.describe_expr(default, scope)?),
            None => branches.push(DescribedType::null()),
        }
        Ok(DescribedType::merge(branches))
    }

    /// Shape of the first argument; nullable only when every argument is.
    pub(crate) fn describe_coalesce(
        &self,
        coalesce: &CoalesceExpr,
        scope: &SourcesResolver<'_>,
    ) -> Result<DescribedType, InvalidQueryError> {
        let args = self.describe_all(&coalesce.args, scope)?;
        let nullable = args.iter().all(DescribedType::is_nullable);
        let first = args.into_iter().next().unwrap_or_else(DescribedType::unknown);
        Ok(first.with_nullability(nullable))
    }

    /// GREATEST and LEAST ignore nulls, so they follow the COALESCE rule.
    pub(crate) fn describe_min_max(&self, min_max: &MinMaxExpr, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let args = self.describe_all(&min_max.args, scope)?;
        let nullable = args.iter().all(DescribedType::is_nullable);
        let merged = DescribedType::merge(args.into_iter().map(DescribedType::widen));
        Ok(merged.with_nullability(nullable))
    }

    pub(crate) fn describe_sublink(&self, sublink: &SubLink, scope: &SourcesResolver<'_>) -> Result<DescribedType, InvalidQueryError> {
        let boolean = self.mapper().from_name("bool");
        let Some(select) = sublink.select() else {
            trace!(kind = ?sublink.sub_link_type, "sublink without a SELECT");
            return Ok(DescribedType::unknown());
        };

        let ty = match sublink.sub_link_type {
            SubLinkType::Exists => boolean,
            SubLinkType::Any | SubLinkType::All | SubLinkType::RowCompare => boolean.with_null(),
            SubLinkType::Array => {
                let columns = self.describe_select(select, Some(scope))?;
                let element = columns.into_iter().next().map(|column| column.ty).unwrap_or_else(DescribedType::unknown);
                DescribedType::array(element)
            }
            SubLinkType::Expr | SubLinkType::MultiExpr | SubLinkType::Cte => {
                let columns = self.describe_select(select, Some(scope))?;
                let first = columns.into_iter().next().map(|column| column.ty).unwrap_or_else(DescribedType::unknown);
                if returns_one_row(select) { first } else { first.with_null() }
            }
        };
        Ok(ty)
    }
}

/// A scalar subquery that always yields exactly one row: no FROM and no
/// WHERE, or an ungrouped aggregate with no HAVING.
fn returns_one_row(select: &SelectStmt) -> bool {
    if select.is_set_operation() || select.limit_offset.is_some() || select.limit_count.is_some() {
        return false;
    }
    if select.from_clause.is_empty() && select.where_clause.is_none() {
        return true;
    }
    if !select.group_clause.is_empty() || select.having_clause.is_some() {
        return false;
    }
    let first = res_targets(&select.target_list).next().and_then(|target| target.val.as_deref());
    matches!(first, Some(Node::FuncCall(call)) if call.over.is_none()
        && pg_functions::lookup(&call.name()).is_some_and(|function| function.aggregate))
}
