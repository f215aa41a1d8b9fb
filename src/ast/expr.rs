use serde::Deserialize;

use crate::ast::{Node, SelectStmt};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StringValue {
    #[serde(alias = "str")]
    pub sval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntegerValue {
    pub ival: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FloatValue {
    pub fval: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BooleanValue {
    pub boolval: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BitStringValue {
    pub bsval: String,
}

/// A target-list entry (`expr AS name`), also used for INSERT column lists
/// and UPDATE SET items.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResTarget {
    pub name: Option<String>,
    pub indirection: Vec<Node>,
    pub val: Option<Box<Node>>,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ColumnRef {
    pub fields: Vec<Node>,
    pub location: i32,
}

/// The parts of a column reference once the field list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRefParts<'a> {
    /// `*`
    Star,
    /// `t.*` (schema qualifier, if any, is dropped)
    QualifiedStar { table: &'a str },
    /// `col`
    Column { name: &'a str },
    /// `t.col` or `schema.t.col`
    QualifiedColumn { table: &'a str, name: &'a str },
}

impl ColumnRef {
    pub fn parts(&self) -> Option<ColumnRefParts<'_>> {
        let last_is_star = matches!(self.fields.last(), Some(Node::AStar));
        let names: Vec<&str> = self.fields.iter().filter_map(Node::as_str).collect();

        match (last_is_star, names.as_slice()) {
            (true, []) => Some(ColumnRefParts::Star),
            (true, [.., table]) => Some(ColumnRefParts::QualifiedStar { table }),
            (false, [name]) => Some(ColumnRefParts::Column { name }),
            (false, [.., table, name]) => Some(ColumnRefParts::QualifiedColumn { table, name }),
            _ => None,
        }
    }

    pub fn is_star(&self) -> bool {
        matches!(self.fields.last(), Some(Node::AStar))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AConst {
    pub isnull: bool,
    pub ival: Option<IntegerValue>,
    pub fval: Option<FloatValue>,
    pub boolval: Option<BooleanValue>,
    pub sval: Option<StringValue>,
    pub bsval: Option<BitStringValue>,
    pub location: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue<'a> {
    Null,
    Integer(i64),
    Float(&'a str),
    Boolean(bool),
    String(&'a str),
    BitString(&'a str),
}

impl AConst {
    pub fn value(&self) -> ConstValue<'_> {
        if self.isnull {
            return ConstValue::Null;
        }
        if let Some(value) = &self.boolval {
            return ConstValue::Boolean(value.boolval);
        }
        if let Some(value) = &self.bsval {
            return ConstValue::BitString(&value.bsval);
        }
        if let Some(value) = &self.fval {
            return ConstValue::Float(&value.fval);
        }
        if let Some(value) = &self.ival {
            return ConstValue::Integer(value.ival);
        }
        if let Some(value) = &self.sval {
            return ConstValue::String(&value.sval);
        }
        // libpg_query drops `{"ival": 0}` down to an empty body
        ConstValue::Integer(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParamRef {
    pub number: i32,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FuncCall {
    pub funcname: Vec<Node>,
    pub args: Vec<Node>,
    pub agg_order: Vec<Node>,
    pub agg_filter: Option<Box<Node>>,
    pub over: Option<serde_json::Value>,
    pub agg_within_group: bool,
    pub agg_star: bool,
    pub agg_distinct: bool,
    pub func_variadic: bool,
    pub location: i32,
}

impl FuncCall {
    /// Unqualified, lower-cased function name.
    pub fn name(&self) -> String {
        super::last_name(&self.funcname).unwrap_or_default().to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypeName {
    pub names: Vec<Node>,
    pub setof: bool,
    pub typmods: Vec<Node>,
    #[serde(rename = "arrayBounds")]
    pub array_bounds: Vec<Node>,
    pub location: i32,
}

impl TypeName {
    pub fn is_array(&self) -> bool {
        !self.array_bounds.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypeCast {
    pub arg: Option<Box<Node>>,
    #[serde(rename = "typeName")]
    pub type_name: TypeName,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaseExpr {
    pub arg: Option<Box<Node>>,
    pub args: Vec<Node>,
    pub defresult: Option<Box<Node>>,
    pub location: i32,
}

impl CaseExpr {
    pub fn whens(&self) -> impl Iterator<Item = &CaseWhen> {
        self.args.iter().filter_map(|arg| match arg {
            Node::CaseWhen(when) => Some(when.as_ref()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaseWhen {
    pub expr: Option<Box<Node>>,
    pub result: Option<Box<Node>>,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoalesceExpr {
    pub args: Vec<Node>,
    pub location: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MinMaxOp {
    #[default]
    Greatest,
    Least,
}

impl From<String> for MinMaxOp {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IS_LEAST" => MinMaxOp::Least,
            _ => MinMaxOp::Greatest,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MinMaxExpr {
    pub op: MinMaxOp,
    pub args: Vec<Node>,
    pub location: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SubLinkType {
    Exists,
    All,
    Any,
    RowCompare,
    #[default]
    Expr,
    MultiExpr,
    Array,
    Cte,
}

impl From<String> for SubLinkType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "EXISTS_SUBLINK" => SubLinkType::Exists,
            "ALL_SUBLINK" => SubLinkType::All,
            "ANY_SUBLINK" => SubLinkType::Any,
            "ROWCOMPARE_SUBLINK" => SubLinkType::RowCompare,
            "MULTIEXPR_SUBLINK" => SubLinkType::MultiExpr,
            "ARRAY_SUBLINK" => SubLinkType::Array,
            "CTE_SUBLINK" => SubLinkType::Cte,
            _ => SubLinkType::Expr,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubLink {
    #[serde(rename = "subLinkType")]
    pub sub_link_type: SubLinkType,
    pub testexpr: Option<Box<Node>>,
    #[serde(rename = "operName")]
    pub oper_name: Vec<Node>,
    pub subselect: Option<Box<Node>>,
    pub location: i32,
}

impl SubLink {
    pub fn select(&self) -> Option<&SelectStmt> {
        match self.subselect.as_deref() {
            Some(Node::SelectStmt(select)) => Some(select),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum AExprKind {
    #[default]
    Op,
    OpAny,
    OpAll,
    Distinct,
    NotDistinct,
    NullIf,
    In,
    Like,
    ILike,
    Similar,
    Between,
    NotBetween,
    BetweenSym,
    NotBetweenSym,
}

impl From<String> for AExprKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AEXPR_OP_ANY" => AExprKind::OpAny,
            "AEXPR_OP_ALL" => AExprKind::OpAll,
            "AEXPR_DISTINCT" => AExprKind::Distinct,
            "AEXPR_NOT_DISTINCT" => AExprKind::NotDistinct,
            "AEXPR_NULLIF" => AExprKind::NullIf,
            "AEXPR_IN" => AExprKind::In,
            "AEXPR_LIKE" => AExprKind::Like,
            "AEXPR_ILIKE" => AExprKind::ILike,
            "AEXPR_SIMILAR" => AExprKind::Similar,
            "AEXPR_BETWEEN" => AExprKind::Between,
            "AEXPR_NOT_BETWEEN" => AExprKind::NotBetween,
            "AEXPR_BETWEEN_SYM" => AExprKind::BetweenSym,
            "AEXPR_NOT_BETWEEN_SYM" => AExprKind::NotBetweenSym,
            _ => AExprKind::Op,
        }
    }
}

impl AExprKind {
    pub fn is_like(&self) -> bool {
        matches!(self, AExprKind::Like | AExprKind::ILike | AExprKind::Similar)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AExpr {
    pub kind: AExprKind,
    pub name: Vec<Node>,
    pub lexpr: Option<Box<Node>>,
    pub rexpr: Option<Box<Node>>,
    pub location: i32,
}

impl AExpr {
    /// Operator spelling (`+`, `->>`, `~~`, ...).
    pub fn operator(&self) -> &str {
        super::last_name(&self.name).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AArrayExpr {
    pub elements: Vec<Node>,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AIndirection {
    pub arg: Option<Box<Node>>,
    pub indirection: Vec<Node>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AIndices {
    pub is_slice: bool,
    pub lidx: Option<Box<Node>>,
    pub uidx: Option<Box<Node>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BoolExprType {
    #[default]
    And,
    Or,
    Not,
}

impl From<String> for BoolExprType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OR_EXPR" => BoolExprType::Or,
            "NOT_EXPR" => BoolExprType::Not,
            _ => BoolExprType::And,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoolExpr {
    pub boolop: BoolExprType,
    pub args: Vec<Node>,
    pub location: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NullTestType {
    #[default]
    IsNull,
    IsNotNull,
}

impl From<String> for NullTestType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "IS_NOT_NULL" => NullTestType::IsNotNull,
            _ => NullTestType::IsNull,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NullTest {
    pub arg: Option<Box<Node>>,
    pub nulltesttype: NullTestType,
    pub argisrow: bool,
    pub location: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RowExpr {
    pub args: Vec<Node>,
    pub colnames: Vec<Node>,
    pub location: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SqlValueFunctionOp {
    CurrentDate,
    CurrentTime,
    #[default]
    CurrentTimestamp,
    LocalTime,
    LocalTimestamp,
    CurrentRole,
    CurrentUser,
    User,
    SessionUser,
    CurrentCatalog,
    CurrentSchema,
}

impl From<String> for SqlValueFunctionOp {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SVFOP_CURRENT_DATE" => SqlValueFunctionOp::CurrentDate,
            "SVFOP_CURRENT_TIME" | "SVFOP_CURRENT_TIME_N" => SqlValueFunctionOp::CurrentTime,
            "SVFOP_LOCALTIME" | "SVFOP_LOCALTIME_N" => SqlValueFunctionOp::LocalTime,
            "SVFOP_LOCALTIMESTAMP" | "SVFOP_LOCALTIMESTAMP_N" => SqlValueFunctionOp::LocalTimestamp,
            "SVFOP_CURRENT_ROLE" => SqlValueFunctionOp::CurrentRole,
            "SVFOP_CURRENT_USER" => SqlValueFunctionOp::CurrentUser,
            "SVFOP_USER" => SqlValueFunctionOp::User,
            "SVFOP_SESSION_USER" => SqlValueFunctionOp::SessionUser,
            "SVFOP_CURRENT_CATALOG" => SqlValueFunctionOp::CurrentCatalog,
            "SVFOP_CURRENT_SCHEMA" => SqlValueFunctionOp::CurrentSchema,
            _ => SqlValueFunctionOp::CurrentTimestamp,
        }
    }
}

impl SqlValueFunctionOp {
    /// Column name PostgreSQL gives the bare keyword.
    pub fn column_name(&self) -> &'static str {
        match self {
            SqlValueFunctionOp::CurrentDate => "current_date",
            SqlValueFunctionOp::CurrentTime => "current_time",
            SqlValueFunctionOp::CurrentTimestamp => "current_timestamp",
            SqlValueFunctionOp::LocalTime => "localtime",
            SqlValueFunctionOp::LocalTimestamp => "localtimestamp",
            SqlValueFunctionOp::CurrentRole => "current_role",
            SqlValueFunctionOp::CurrentUser => "current_user",
            SqlValueFunctionOp::User => "user",
            SqlValueFunctionOp::SessionUser => "session_user",
            SqlValueFunctionOp::CurrentCatalog => "current_catalog",
            SqlValueFunctionOp::CurrentSchema => "current_schema",
        }
    }

    /// Result type name of the keyword.
    pub fn pg_type(&self) -> &'static str {
        match self {
            SqlValueFunctionOp::CurrentDate => "date",
            SqlValueFunctionOp::CurrentTime => "timetz",
            SqlValueFunctionOp::CurrentTimestamp => "timestamptz",
            SqlValueFunctionOp::LocalTime => "time",
            SqlValueFunctionOp::LocalTimestamp => "timestamp",
            _ => "name",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqlValueFunction {
    pub op: SqlValueFunctionOp,
    pub typmod: i32,
    pub location: i32,
}
