pub mod ast;
pub mod cg;
pub mod cg_dot;
pub mod cg_json;
pub mod entry;
pub mod error;
pub mod extract;
pub mod ignore;
pub mod linearize;
pub mod loader;
pub mod lowering;
pub mod model;
pub mod parser;
