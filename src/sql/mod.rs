//! Parameterized statement construction: parameter table, stage plan, and
//! the per-method query builder.

pub mod builder;
pub mod params;
pub mod plan;

pub use builder::{build, BuiltStatement, PageSpec, ID_COLUMN};
pub use params::{Param, ParamTable, SqlType};
pub use plan::{quoted, FinalSelect, JoinSpec, PagingClause, ProjectedColumn, QueryPlan, Stage, StageSelect, StageSource};
