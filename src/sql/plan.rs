//! Explicit statement plan: a chain of named CTE stages plus a final select.
//!
//! The GET planner builds this structure instead of concatenating SQL text so
//! the join/union branching, alias generation, and NULL padding can be tested
//! in isolation; the plan is rendered to text exactly once.

/// Quote an identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// One projected column inside a stage's SELECT list.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectedColumn {
    /// A bare (already stage-local) column: `"Name"`.
    Plain(String),
    /// An expression with an alias: `expr AS "alias"`. The expression is
    /// pre-rendered (identifiers quoted by the builder).
    Aliased { expr: String, alias: String },
    /// NULL padding so stage column sets align for UNION ALL: `NULL AS "alias"`.
    NullAs(String),
}

impl ProjectedColumn {
    fn render(&self) -> String {
        match self {
            ProjectedColumn::Plain(name) => quoted(name),
            ProjectedColumn::Aliased { expr, alias } => format!("{} AS {}", expr, quoted(alias)),
            ProjectedColumn::NullAs(alias) => format!("NULL AS {}", quoted(alias)),
        }
    }
}

/// A LEFT OUTER JOIN inside a stage. Sides are pre-rendered expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinSpec {
    pub table: String,
    pub left: String,
    pub right: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StageSource {
    Table(String),
    Stage(String),
}

impl StageSource {
    fn render(&self) -> String {
        match self {
            StageSource::Table(t) => quoted(t),
            StageSource::Stage(s) => s.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StageSelect {
    All,
    Columns(Vec<ProjectedColumn>),
    Count { alias: String },
}

/// Bound OFFSET/FETCH placeholders: offset rows, then fetch-next rows.
#[derive(Clone, Debug, PartialEq)]
pub struct PagingClause {
    pub offset: String,
    pub fetch: String,
}

impl PagingClause {
    fn render(&self) -> String {
        format!(
            " OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
            self.offset, self.fetch
        )
    }
}

#[derive(Clone, Debug)]
pub struct Stage {
    pub name: String,
    pub select: StageSelect,
    pub from: StageSource,
    pub joins: Vec<JoinSpec>,
    pub where_clause: Option<String>,
    pub order_by: Option<String>,
    pub paging: Option<PagingClause>,
}

impl Stage {
    pub fn new(name: impl Into<String>, select: StageSelect, from: StageSource) -> Self {
        Stage {
            name: name.into(),
            select,
            from,
            joins: Vec::new(),
            where_clause: None,
            order_by: None,
            paging: None,
        }
    }

    fn render_body(&self) -> String {
        let select = match &self.select {
            StageSelect::All => "*".to_string(),
            StageSelect::Columns(cols) => cols
                .iter()
                .map(ProjectedColumn::render)
                .collect::<Vec<_>>()
                .join(", "),
            StageSelect::Count { alias } => format!("COUNT(*) AS {}", quoted(alias)),
        };
        let mut sql = format!("SELECT {} FROM {}", select, self.from.render());
        for join in &self.joins {
            sql.push_str(&format!(
                " LEFT OUTER JOIN {} ON {} = {}",
                quoted(&join.table),
                join.left,
                join.right
            ));
        }
        if let Some(w) = &self.where_clause {
            sql.push_str(&format!(" WHERE {}", w));
        }
        if let Some(o) = &self.order_by {
            sql.push_str(&format!(" ORDER BY {}", o));
        }
        if let Some(p) = &self.paging {
            sql.push_str(&p.render());
        }
        sql
    }
}

/// The final projection: the base stage, UNION ALL union stages, an optional
/// CROSS JOIN against the count stage, ordering, and paging.
#[derive(Clone, Debug, Default)]
pub struct FinalSelect {
    pub base: String,
    pub unions: Vec<String>,
    pub cross_join: Option<String>,
    pub order_by: Option<String>,
    pub paging: Option<PagingClause>,
}

#[derive(Debug, Default)]
pub struct QueryPlan {
    pub stages: Vec<Stage>,
    pub final_select: FinalSelect,
}

impl QueryPlan {
    pub fn render(&self) -> String {
        let mut sql = String::new();
        if !self.stages.is_empty() {
            let ctes: Vec<String> = self
                .stages
                .iter()
                .map(|s| format!("{} AS ({})", s.name, s.render_body()))
                .collect();
            sql.push_str(&format!("WITH {} ", ctes.join(", ")));
        }
        let f = &self.final_select;
        if f.unions.is_empty() {
            sql.push_str(&format!("SELECT * FROM {}", f.base));
        } else {
            let mut union = format!("SELECT * FROM {}", f.base);
            for u in &f.unions {
                union.push_str(&format!(" UNION ALL SELECT * FROM {}", u));
            }
            sql.push_str(&format!("SELECT * FROM ({}) AS x", union));
        }
        if let Some(c) = &f.cross_join {
            sql.push_str(&format!(" CROSS JOIN {}", c));
        }
        if let Some(o) = &f.order_by {
            sql.push_str(&format!(" ORDER BY {}", o));
        }
        if let Some(p) = &f.paging {
            sql.push_str(&p.render());
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_doubles_embedded_quotes() {
        assert_eq!(quoted("ID"), "\"ID\"");
        assert_eq!(quoted("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn renders_stage_with_joins_where_and_null_padding() {
        let mut stage = Stage::new(
            "data_cte",
            StageSelect::Columns(vec![
                ProjectedColumn::Aliased {
                    expr: "\"Case\".\"ID\"".into(),
                    alias: "Case_ID".into(),
                },
                ProjectedColumn::NullAs("Status_ID".into()),
            ]),
            StageSource::Table("Case".into()),
        );
        stage.joins.push(JoinSpec {
            table: "Person".into(),
            left: "\"Case\".\"PersonID\"".into(),
            right: "\"Person\".\"ID\"".into(),
        });
        stage.where_clause = Some("\"Case\".\"ID\" = $1".into());
        let sql = stage.render_body();
        assert_eq!(
            sql,
            "SELECT \"Case\".\"ID\" AS \"Case_ID\", NULL AS \"Status_ID\" FROM \"Case\" \
             LEFT OUTER JOIN \"Person\" ON \"Case\".\"PersonID\" = \"Person\".\"ID\" \
             WHERE \"Case\".\"ID\" = $1"
        );
    }

    #[test]
    fn renders_union_cross_join_and_paging() {
        let mut plan = QueryPlan::default();
        plan.stages.push(Stage::new(
            "data_cte",
            StageSelect::All,
            StageSource::Table("Case".into()),
        ));
        plan.stages.push(Stage::new(
            "count_cte",
            StageSelect::Count { alias: "TotalRows".into() },
            StageSource::Stage("data_cte".into()),
        ));
        plan.final_select = FinalSelect {
            base: "data_cte".into(),
            unions: vec!["union_status".into()],
            cross_join: Some("count_cte".into()),
            order_by: Some("\"Case_ID\"".into()),
            paging: Some(PagingClause { offset: "$1".into(), fetch: "$2".into() }),
        };
        let sql = plan.render();
        assert!(sql.starts_with("WITH data_cte AS (SELECT * FROM \"Case\"), count_cte AS"));
        assert!(sql.contains("UNION ALL SELECT * FROM union_status"));
        assert!(sql.contains("CROSS JOIN count_cte"));
        assert!(sql.ends_with("ORDER BY \"Case_ID\" OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY"));
    }
}
