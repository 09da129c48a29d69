pub mod code_generator;
pub mod config;
pub mod error;
pub mod imports;
pub mod line_index;
pub mod module_loader;
pub mod orchestrator;
pub mod resolver;
pub mod symbol_graph;
pub mod symbol_table;
pub mod tree_shaking;
pub mod types;
pub mod visitors;
