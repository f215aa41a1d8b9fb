use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{JoinExpr, JoinType, Node};

/// One join edge recorded against the relation that owns the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRelation {
    pub join_type: JoinType,
    pub joined_relation_name: String,
}

/// Flattened form of [`JoinedRelation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationJoin {
    pub rel_name: String,
    pub join_type: JoinType,
    pub join_rel_name: String,
}

/// Classifies the FROM clause's joins to find relations an outer join can null-extend.
pub struct RelationResolver;

impl RelationResolver {
    /// Owner (left-most relation of a join chain) to the relations joined onto it.
    pub fn relations_with_joins(from_clause: &[Node]) -> IndexMap<String, Vec<JoinedRelation>> {
        let mut relations = IndexMap::new();
        for item in from_clause {
            if let Node::JoinExpr(join) = item {
                Self::record_join(join, &mut relations);
            }
        }
        relations
    }

    pub fn flatten(relations: &IndexMap<String, Vec<JoinedRelation>>) -> Vec<RelationJoin> {
        relations
            .iter()
            .flat_map(|(owner, joins)| {
                joins.iter().map(move |join| RelationJoin {
                    rel_name: owner.clone(),
                    join_type: join.join_type,
                    join_rel_name: join.joined_relation_name.clone(),
                })
            })
            .collect()
    }

    /// Nullable when joined on the right of LEFT/FULL or owning the left of RIGHT/FULL.
    pub fn is_nullable_due_to_join(name: &str, joins: &[RelationJoin]) -> bool {
        joins.iter().any(|join| {
            (join.join_rel_name == name && join.join_type.nulls_right())
                || (join.rel_name == name && join.join_type.nulls_left())
        })
    }

    /// Every relation name an outer join can null-extend, read off the flattened join edges.
    pub fn nullable_relations(from_clause: &[Node]) -> HashSet<String> {
        let joins = Self::flatten(&Self::relations_with_joins(from_clause));
        joins
            .iter()
            .flat_map(|join| [&join.rel_name, &join.join_rel_name])
            .filter(|name| Self::is_nullable_due_to_join(name, &joins))
            .cloned()
            .collect()
    }

    /// Visible names of the relations in a FROM subtree.
    pub fn relation_names(node: &Node) -> Vec<String> {
        let mut names = Vec::new();
        Self::collect_names(node, &mut names);
        names
    }

    /// Records every right-hand relation against the chain owner. A RIGHT/FULL edge
    /// also records them against the rest of the left subtree, which it null-extends too.
    fn record_join(join: &JoinExpr, relations: &mut IndexMap<String, Vec<JoinedRelation>>) {
        let Some(left) = join.larg.as_ref() else { return };
        for side in [Some(left), join.rarg.as_ref()].into_iter().flatten() {
            if let Node::JoinExpr(inner) = side {
                Self::record_join(inner, relations);
            }
        }
        let Some(owner) = Self::owner_name(left) else { return };

        let mut owners = vec![owner.clone()];
        if join.jointype.nulls_left() {
            owners.extend(Self::relation_names(left).into_iter().filter(|name| *name != owner));
        }

        let joined = join.rarg.as_ref().map(Self::relation_names).unwrap_or_default();
        for owner in owners {
            for joined_relation_name in &joined {
                relations.entry(owner.clone()).or_default().push(JoinedRelation {
                    join_type: join.jointype,
                    joined_relation_name: joined_relation_name.clone(),
                });
            }
        }
    }

    fn owner_name(node: &Node) -> Option<String> {
        match node {
            Node::JoinExpr(join) => Self::owner_name(join.larg.as_ref()?),
            other => Self::relation_names(other).into_iter().next(),
        }
    }

    fn collect_names(node: &Node, names: &mut Vec<String>) {
        match node {
            Node::RangeVar(range) => names.push(range.visible_name().to_string()),
            Node::RangeSubselect(subselect) => {
                if let Some(alias) = subselect.alias_name() {
                    names.push(alias.to_string());
                }
            }
            Node::JoinExpr(join) => {
                for side in [&join.larg, &join.rarg].into_iter().flatten() {
                    Self::collect_names(side, names);
                }
            }
            _ => {}
        }
    }
}
