pub mod node;
pub mod parser;
pub mod printer;

pub use node::{AtRule, Decl, Node, Rule};
pub use parser::parse;
pub use printer::to_css;
