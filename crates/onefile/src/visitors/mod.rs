//! AST visitor implementations for onefile
//!
//! Both collectors walk ruff's syntax tree and report identifiers read in
//! `Load` context. They differ in which parts of a definition they look at.

mod definition_time_collector;
mod name_load_collector;

pub use definition_time_collector::DefinitionTimeCollector;
pub use name_load_collector::NameLoadCollector;
