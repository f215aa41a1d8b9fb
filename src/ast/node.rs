use serde::{de::Error as DeError, Deserialize, Deserializer};
use serde_json::Value;

use crate::ast::{
    AArrayExpr, AConst, AExpr, AIndices, AIndirection, BoolExpr, CaseExpr, CaseWhen, CoalesceExpr, ColumnRef,
    CommonTableExpr, DeleteStmt, FuncCall, InsertStmt, IntegerValue, JoinExpr, MinMaxExpr, NullTest, ParamRef,
    RangeSubselect, RangeVar, ResTarget, RowExpr, SelectStmt, SqlValueFunction, StringValue, SubLink, TypeCast,
    UpdateStmt,
};

/// One node of a PostgreSQL parse tree.
///
/// libpg_query serializes every node as a single-key object whose key is the
/// node tag (`{"ColumnRef": {...}}`). Tags the engine does not consume land in
/// `Other` with the tag name, so an unusual construct degrades instead of
/// failing the whole parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    SelectStmt(Box<SelectStmt>),
    InsertStmt(Box<InsertStmt>),
    UpdateStmt(Box<UpdateStmt>),
    DeleteStmt(Box<DeleteStmt>),
    ResTarget(Box<ResTarget>),
    RangeVar(RangeVar),
    RangeSubselect(Box<RangeSubselect>),
    JoinExpr(Box<JoinExpr>),
    CommonTableExpr(Box<CommonTableExpr>),
    ColumnRef(ColumnRef),
    AStar,
    String(StringValue),
    Integer(IntegerValue),
    AConst(AConst),
    ParamRef(ParamRef),
    FuncCall(Box<FuncCall>),
    TypeCast(Box<TypeCast>),
    CaseExpr(Box<CaseExpr>),
    CaseWhen(Box<CaseWhen>),
    CoalesceExpr(Box<CoalesceExpr>),
    MinMaxExpr(Box<MinMaxExpr>),
    SubLink(Box<SubLink>),
    AExpr(Box<AExpr>),
    AArrayExpr(Box<AArrayExpr>),
    AIndirection(Box<AIndirection>),
    AIndices(Box<AIndices>),
    BoolExpr(Box<BoolExpr>),
    NullTest(Box<NullTest>),
    RowExpr(Box<RowExpr>),
    SqlValueFunction(SqlValueFunction),
    SetToDefault,
    List(Vec<Node>),
    Other(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListBody {
    items: Vec<Node>,
}

impl Node {
    /// Build a node from its libpg_query JSON form.
    pub fn from_value(value: Value) -> Result<Node, serde_json::Error> {
        let Value::Object(map) = value else {
            return Err(DeError::custom("parse tree node must be a single-key object"));
        };
        let mut entries = map.into_iter();
        let (Some((tag, body)), None) = (entries.next(), entries.next()) else {
            return Err(DeError::custom("parse tree node must have exactly one tag"));
        };

        let node = match tag.as_str() {
            "SelectStmt" => Node::SelectStmt(Box::new(serde_json::from_value(body)?)),
            "InsertStmt" => Node::InsertStmt(Box::new(serde_json::from_value(body)?)),
            "UpdateStmt" => Node::UpdateStmt(Box::new(serde_json::from_value(body)?)),
            "DeleteStmt" => Node::DeleteStmt(Box::new(serde_json::from_value(body)?)),
            "ResTarget" => Node::ResTarget(Box::new(serde_json::from_value(body)?)),
            "RangeVar" => Node::RangeVar(serde_json::from_value(body)?),
            "RangeSubselect" => Node::RangeSubselect(Box::new(serde_json::from_value(body)?)),
            "JoinExpr" => Node::JoinExpr(Box::new(serde_json::from_value(body)?)),
            "CommonTableExpr" => Node::CommonTableExpr(Box::new(serde_json::from_value(body)?)),
            "ColumnRef" => Node::ColumnRef(serde_json::from_value(body)?),
            "A_Star" => Node::AStar,
            "String" => Node::String(serde_json::from_value(body)?),
            "Integer" => Node::Integer(serde_json::from_value(body)?),
            "A_Const" => Node::AConst(serde_json::from_value(body)?),
            "ParamRef" => Node::ParamRef(serde_json::from_value(body)?),
            "FuncCall" => Node::FuncCall(Box::new(serde_json::from_value(body)?)),
            "TypeCast" => Node::TypeCast(Box::new(serde_json::from_value(body)?)),
            "CaseExpr" => Node::CaseExpr(Box::new(serde_json::from_value(body)?)),
            "CaseWhen" => Node::CaseWhen(Box::new(serde_json::from_value(body)?)),
            "CoalesceExpr" => Node::CoalesceExpr(Box::new(serde_json::from_value(body)?)),
            "MinMaxExpr" => Node::MinMaxExpr(Box::new(serde_json::from_value(body)?)),
            "SubLink" => Node::SubLink(Box::new(serde_json::from_value(body)?)),
            "A_Expr" => Node::AExpr(Box::new(serde_json::from_value(body)?)),
            "A_ArrayExpr" => Node::AArrayExpr(Box::new(serde_json::from_value(body)?)),
            "A_Indirection" => Node::AIndirection(Box::new(serde_json::from_value(body)?)),
            "A_Indices" => Node::AIndices(Box::new(serde_json::from_value(body)?)),
            "BoolExpr" => Node::BoolExpr(Box::new(serde_json::from_value(body)?)),
            "NullTest" => Node::NullTest(Box::new(serde_json::from_value(body)?)),
            "RowExpr" => Node::RowExpr(Box::new(serde_json::from_value(body)?)),
            "SQLValueFunction" => Node::SqlValueFunction(serde_json::from_value(body)?),
            "SetToDefault" => Node::SetToDefault,
            "List" => Node::List(serde_json::from_value::<ListBody>(body)?.items),
            _ => Node::Other(tag),
        };

        Ok(node)
    }

    /// Tag name as libpg_query spells it, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Node::SelectStmt(_) => "SelectStmt",
            Node::InsertStmt(_) => "InsertStmt",
            Node::UpdateStmt(_) => "UpdateStmt",
            Node::DeleteStmt(_) => "DeleteStmt",
            Node::ResTarget(_) => "ResTarget",
            Node::RangeVar(_) => "RangeVar",
            Node::RangeSubselect(_) => "RangeSubselect",
            Node::JoinExpr(_) => "JoinExpr",
            Node::CommonTableExpr(_) => "CommonTableExpr",
            Node::ColumnRef(_) => "ColumnRef",
            Node::AStar => "A_Star",
            Node::String(_) => "String",
            Node::Integer(_) => "Integer",
            Node::AConst(_) => "A_Const",
            Node::ParamRef(_) => "ParamRef",
            Node::FuncCall(_) => "FuncCall",
            Node::TypeCast(_) => "TypeCast",
            Node::CaseExpr(_) => "CaseExpr",
            Node::CaseWhen(_) => "CaseWhen",
            Node::CoalesceExpr(_) => "CoalesceExpr",
            Node::MinMaxExpr(_) => "MinMaxExpr",
            Node::SubLink(_) => "SubLink",
            Node::AExpr(_) => "A_Expr",
            Node::AArrayExpr(_) => "A_ArrayExpr",
            Node::AIndirection(_) => "A_Indirection",
            Node::AIndices(_) => "A_Indices",
            Node::BoolExpr(_) => "BoolExpr",
            Node::NullTest(_) => "NullTest",
            Node::RowExpr(_) => "RowExpr",
            Node::SqlValueFunction(_) => "SQLValueFunction",
            Node::SetToDefault => "SetToDefault",
            Node::List(_) => "List",
            Node::Other(tag) => tag,
        }
    }

    /// The text of a `String` node.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(value) => Some(&value.sval),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Node::from_value(value).map_err(D::Error::custom)
    }
}

/// Last element of a qualified name list such as `pg_catalog.int4` or `public.lower`.
pub fn last_name(names: &[Node]) -> Option<&str> {
    names.iter().rev().find_map(Node::as_str)
}
